//! SeaORM entity models used by the database storage backend.
//!
//! These map to the SQLite tables created by `database_storage`:
//! - `users`: user names
//! - `movies`: movie metadata, unique by name
//! - `user_movies`: favorite links, foreign keys to `users` and `movies`
//! - `movie_reviews`: reviews, foreign keys to `users` and `movies`
//!
//! Foreign keys carry no cascade: deleting a referenced user or movie fails.

/// Users table entity model.
pub mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        /// Auto-increment row id
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::user_movies::Entity")]
        UserMovies,
        #[sea_orm(has_many = "super::movie_reviews::Entity")]
        MovieReviews,
    }

    impl Related<super::user_movies::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::UserMovies.def()
        }
    }

    impl Related<super::movie_reviews::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::MovieReviews.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Movies table entity model.
pub mod movies {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "movies")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(unique)]
        pub name: String,
        pub director: String,
        pub year: i32,
        pub rating: f64,
        pub poster: String,
        pub website: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::user_movies::Entity")]
        UserMovies,
        #[sea_orm(has_many = "super::movie_reviews::Entity")]
        MovieReviews,
    }

    impl Related<super::user_movies::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::UserMovies.def()
        }
    }

    impl Related<super::movie_reviews::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::MovieReviews.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Favorite links table entity model.
pub mod user_movies {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "user_movies")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        /// Foreign key to `users.id`
        pub user_id: i32,
        /// Foreign key to `movies.id`
        pub movie_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::users::Entity",
            from = "Column::UserId",
            to = "super::users::Column::Id"
        )]
        User,
        #[sea_orm(
            belongs_to = "super::movies::Entity",
            from = "Column::MovieId",
            to = "super::movies::Column::Id"
        )]
        Movie,
    }

    impl Related<super::users::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl Related<super::movies::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Movie.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Reviews table entity model.
pub mod movie_reviews {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "movie_reviews")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        /// Foreign key to `users.id`
        pub user_id: i32,
        /// Foreign key to `movies.id`
        pub movie_id: i32,
        pub rating: f64,
        pub review_text: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::users::Entity",
            from = "Column::UserId",
            to = "super::users::Column::Id"
        )]
        User,
        #[sea_orm(
            belongs_to = "super::movies::Entity",
            from = "Column::MovieId",
            to = "super::movies::Column::Id"
        )]
        Movie,
    }

    impl Related<super::users::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl Related<super::movies::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Movie.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

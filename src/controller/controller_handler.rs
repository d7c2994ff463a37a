use std::sync::Arc;

use log::info;

use crate::configuration::{Backend, Config};
use crate::error_handling::types::ControllerError;
use crate::metadata::{MetadataProvider, OmdbFetcher};
use crate::repository::Repositories;
use crate::storage::Stores;
use crate::web_interface::WebServer;

/// Wires the configured backend, the metadata provider and the repositories
/// together, then serves them.
pub struct Controller {
    pub config: Config,
    repos: Arc<Repositories>,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        let stores = match config.storage.backend {
            Backend::File => {
                info!("Using JSON file storage in {:?}", config.storage.data_dir);
                Stores::file(&config.storage.data_dir)?
            }
            Backend::Sqlite => {
                info!("Using SQLite storage at {:?}", config.storage.database_path);
                Stores::database(&config.storage.database_path)?
            }
        };
        let metadata: Arc<dyn MetadataProvider> = Arc::new(OmdbFetcher::new(&config.metadata)?);
        let repos = Arc::new(Repositories::new(stores, metadata));
        Ok(Self { config, repos })
    }

    pub fn repositories(&self) -> Arc<Repositories> {
        self.repos.clone()
    }

    pub async fn run(&self) -> Result<(), ControllerError> {
        info!("Starting web server");
        let server = WebServer::new(self.repos.clone(), &self.config.server)?;
        server.start().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::types::MovieDraft;
    use tempfile::TempDir;

    fn config(dir: &TempDir, backend: Backend) -> Config {
        let mut config = Config::default();
        config.storage.backend = backend;
        config.storage.data_dir = dir.path().join("data");
        config.storage.database_path = dir.path().join("cinelog.sqlite3");
        // Nothing listens here, so lookups degrade to placeholders quickly.
        config.metadata.base_url = String::from("http://127.0.0.1:9/");
        config
    }

    #[test]
    fn test_new_selects_backend() {
        let dir = TempDir::new().unwrap();
        let controller = Controller::new(config(&dir, Backend::File)).unwrap();
        let repos = controller.repositories();
        let id = repos
            .movies
            .add_movie(MovieDraft { movie_name: Some("Heat".into()) })
            .unwrap();
        assert_eq!(repos.movies.get_movie(id).unwrap().movie_name, "Heat");
        assert!(dir.path().join("data").join("movies.json").exists());

        let controller = Controller::new(config(&dir, Backend::Sqlite)).unwrap();
        assert!(controller.repositories().movies.get_movies().unwrap().is_empty());
        assert!(dir.path().join("cinelog.sqlite3").exists());
    }
}

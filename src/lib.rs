pub mod configuration;
pub mod controller;
pub mod error_handling;
pub mod metadata;
pub mod repository;
pub mod storage;
pub mod web_interface;

pub use controller::Controller;

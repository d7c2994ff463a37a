//! Error types shared across storage, repositories, configuration and the web shell.

pub mod types;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use log::info;

use super::routes::api;
use crate::configuration::ServerConfig;
use crate::error_handling::types::WebError;
use crate::repository::Repositories;

/// HTTP front of the repositories
pub struct WebServer {
    repos: Arc<Repositories>,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(repos: Arc<Repositories>, config: &ServerConfig) -> Result<Self, WebError> {
        let ip: IpAddr = config
            .bind_address
            .parse()
            .map_err(|_| WebError::BadBindAddress(config.bind_address.clone()))?;
        Ok(Self {
            repos,
            addr: SocketAddr::new(ip, config.port),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves the API until the process is stopped.
    pub async fn start(&self) -> Result<(), WebError> {
        info!("Listening on http://{}", self.addr);
        warp::serve(api(self.repos.clone())).run(self.addr).await;
        Ok(())
    }
}

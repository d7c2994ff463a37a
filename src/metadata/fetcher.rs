use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;

use super::types::ProviderResponse;
use super::{placeholder, MetadataProvider};
use crate::configuration::MetadataConfig;
use crate::error_handling::types::MetadataError;
use crate::storage::types::Movie;

/// OMDb-style title lookup over blocking HTTP.
///
/// One GET per call, bounded by the configured timeout, no retry.
pub struct OmdbFetcher {
    client: Client,
    base_url: String,
    api_key: String,
    reference_base_url: String,
}

impl OmdbFetcher {
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        Self::with_timeout(config, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(config: &MetadataConfig, timeout: Duration) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetadataError::ClientBuildFailed(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            reference_base_url: config.reference_base_url.clone(),
        })
    }

    fn lookup(&self, title: &str) -> Result<ProviderResponse, reqwest::Error> {
        self.client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("t", title)])
            .send()?
            .error_for_status()?
            .json::<ProviderResponse>()
    }
}

impl MetadataProvider for OmdbFetcher {
    fn fetch(&self, title: &str) -> Movie {
        match self.lookup(title) {
            Ok(response) => {
                debug!("Metadata found for '{}'", title);
                response.into_movie(title, &self.reference_base_url)
            }
            Err(e) if e.is_timeout() => {
                warn!("Metadata lookup for '{}' timed out, using placeholder", title);
                placeholder(title)
            }
            Err(e) => {
                warn!("Metadata lookup for '{}' failed, using placeholder: {}", title, e);
                placeholder(title)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    // Answers a single request with `response` and reports the request head.
    fn serve_once(response: String) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let n = stream.read(&mut buf).unwrap_or(0);
                let _ = tx.send(String::from_utf8_lossy(&buf[..n]).to_string());
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (url, rx)
    }

    fn config(base_url: String) -> MetadataConfig {
        MetadataConfig { base_url, api_key: "k3y".into(), ..Default::default() }
    }

    #[test]
    fn test_fetch_maps_provider_fields() {
        let body = r#"{"Title":"Titanic","Year":"1997","Director":"James Cameron","Poster":"p.jpg","imdbRating":"7.9","imdbID":"tt0120338"}"#;
        let (url, requests) = serve_once(http_response("200 OK", body));
        let fetcher = OmdbFetcher::new(&config(url)).unwrap();

        let movie = fetcher.fetch("Titanic");
        assert_eq!(movie.name, "Titanic");
        assert_eq!(movie.year, 1997);
        assert_eq!(movie.rating, 7.9);
        assert_eq!(movie.poster, "p.jpg");
        assert_eq!(movie.website, "https://www.imdb.com/title/tt0120338");

        let request = requests.recv().unwrap();
        assert!(request.starts_with("GET /?"));
        assert!(request.contains("apikey=k3y"));
        assert!(request.contains("t=Titanic"));
    }

    #[test]
    fn test_timeout_yields_placeholder() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                thread::sleep(Duration::from_secs(3));
                drop(stream);
            }
        });
        let fetcher = OmdbFetcher::with_timeout(&config(url), Duration::from_millis(200)).unwrap();
        assert_eq!(fetcher.fetch("Slow Movie"), placeholder("Slow Movie"));
    }

    #[test]
    fn test_connection_refused_yields_placeholder() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);
        let fetcher = OmdbFetcher::new(&config(url)).unwrap();
        assert_eq!(fetcher.fetch("Offline"), placeholder("Offline"));
    }

    #[test]
    fn test_server_error_yields_placeholder() {
        let (url, _requests) = serve_once(http_response("500 Internal Server Error", "{}"));
        let fetcher = OmdbFetcher::new(&config(url)).unwrap();
        assert_eq!(fetcher.fetch("Broken"), placeholder("Broken"));
    }

    #[test]
    fn test_garbage_body_yields_placeholder() {
        let (url, _requests) = serve_once(http_response("200 OK", "<html>nope</html>"));
        let fetcher = OmdbFetcher::new(&config(url)).unwrap();
        assert_eq!(fetcher.fetch("Garbage"), placeholder("Garbage"));
    }
}

//! Web server for Agora.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{Config, WebConfig};
use crate::{AgoraError, Database};

use super::handlers::AppState;
use super::middleware::{JwtState, RateLimitState};
use super::router::create_app;

/// Web server for the API and pages.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// Web configuration.
    web_config: WebConfig,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: Database) -> Result<Self, AgoraError> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| {
                AgoraError::Config(format!(
                    "invalid server address {}:{}: {e}",
                    config.server.host, config.server.port
                ))
            })?;

        let app_state = AppState::new(db, &config.web.jwt_secret, config.web.jwt_expiry_secs)?
            .with_forum(config.forum.clone());
        let jwt_state = Arc::new(JwtState::new(&config.web.jwt_secret));

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state,
            web_config: config.web.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn bind(self) -> Result<(TcpListener, axum::Router), std::io::Error> {
        let rate_limits = Arc::new(
            RateLimitState::new(
                self.web_config.login_rate_limit,
                self.web_config.api_rate_limit,
            )
            .with_proxy_headers(self.web_config.trust_proxy_headers),
        );

        let router = create_app(
            self.app_state,
            self.jwt_state,
            rate_limits.clone(),
            &self.web_config,
        );

        let listener = TcpListener::bind(self.addr).await?;

        // Start rate limiter cleanup after a successful bind
        rate_limits.start_cleanup_task();

        tracing::info!("Web server listening on http://{}", listener.local_addr()?);
        Ok((listener, router))
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let (listener, router) = self.bind().await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr, std::io::Error> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0; // Use random port
        config.web.jwt_secret = "test-secret-key".to_string();
        config.web.serve_static = false;
        config
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let config = create_test_config();
        let db = Database::open_in_memory().await.unwrap();

        let server = WebServer::new(&config, db).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_invalid_host() {
        let mut config = create_test_config();
        config.server.host = "not a host".to_string();
        let db = Database::open_in_memory().await.unwrap();

        assert!(WebServer::new(&config, db).is_err());
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let config = create_test_config();
        let db = Database::open_in_memory().await.unwrap();

        let server = WebServer::new(&config, db).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        // Test health endpoint over a raw connection
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("OK"));
    }
}

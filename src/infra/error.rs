use thiserror::Error;

/// Infrastructure errors that can occur during application startup.
///
/// Display messages never include credentials. The `#[source]` chain may
/// carry URLs, so log these with `%e` rather than `?e`.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("HTTP client initialization failed")]
    HttpClient(#[source] reqwest::Error),

    #[error("TCP bind failed on {addr}")]
    TcpBind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error")]
    Server(#[source] std::io::Error),
}

impl From<reqwest::Error> for InfraError {
    fn from(e: reqwest::Error) -> Self {
        InfraError::HttpClient(e)
    }
}

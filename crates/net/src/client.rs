//! Blocking HTTP client with a fixed retry schedule

use pkgcheck_config::NetworkConfig;
use pkgcheck_errors::NetworkError;
use reqwest::blocking::{Client, Response};
use std::time::Duration;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Delay before each retry; one attempt more than there are delays
    pub retry_delays: Vec<Duration>,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self::from_config(&NetworkConfig::default())
    }
}

impl NetConfig {
    /// Client settings for a loaded `[network]` section
    #[must_use]
    pub fn from_config(config: &NetworkConfig) -> Self {
        let timeout = config.timeout();
        Self {
            timeout,
            connect_timeout: timeout.min(Duration::from_secs(10)),
            retry_delays: config.retry_delays(),
            user_agent: format!("pkgcheck/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Total number of attempts per request
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.retry_delays.len() + 1
    }
}

/// HTTP client wrapper with retry logic
#[derive(Debug, Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, NetworkError> {
        Self::new(NetConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Execute a GET request with retries
    ///
    /// Any response that is not a server error is returned as-is, including
    /// 4xx statuses, so callers decide what a missing resource means. A server
    /// error that persists through every attempt is returned as the final
    /// response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received after all retry attempts.
    pub fn get(&self, url: &str) -> Result<Response, NetworkError> {
        self.retry_request(url, || self.client.get(url).send())
    }

    /// Execute a GET request and return the body of a successful response
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::HttpError` for a non-success status, or a
    /// transport error if no response was received.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let response = ensure_success(self.get(url)?)?;
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| NetworkError::DownloadFailed(e.to_string()))
    }

    /// Execute a request with retries
    fn retry_request<F>(&self, url: &str, mut f: F) -> Result<Response, NetworkError>
    where
        F: FnMut() -> Result<Response, reqwest::Error>,
    {
        let attempts = self.config.attempts();
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                std::thread::sleep(self.config.retry_delays[attempt - 1]);
            }
            attempt += 1;
            let last = attempt == attempts;

            match f() {
                Ok(response) if response.status().is_server_error() && !last => {
                    tracing::warn!(
                        url,
                        status = response.status().as_u16(),
                        attempt,
                        "server error, retrying"
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if Self::should_retry(&e) && !last => {
                    tracing::warn!(url, attempt, error = %e, "request failed, retrying");
                }
                Err(e) => return Err(Self::map_error(url, &e)),
            }
        }
    }

    /// Only transport failures are retried; an HTTP status is an answer
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect()
    }

    fn map_error(url: &str, error: &reqwest::Error) -> NetworkError {
        if error.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            NetworkError::ConnectionRefused(error.to_string())
        } else {
            NetworkError::DownloadFailed(error.to_string())
        }
    }
}

/// Turn a non-success status into an error
///
/// # Errors
///
/// Returns `NetworkError::HttpError` carrying the status code.
pub fn ensure_success(response: Response) -> Result<Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(NetworkError::HttpError {
            status: status.as_u16(),
            message: status.to_string(),
        })
    }
}

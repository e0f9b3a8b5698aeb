use crate::config::model::HttpConfig;
use reqwest::{Client, Request, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{Jitter, RetryTransientMiddleware};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("Couldn't read response body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Retrieves the body of a page
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

pub struct HttpFetcher {
    client: ClientWithMiddleware,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
            .map_err(FetchError::Client)?;

        let retries = config.max_attempts.saturating_sub(1);
        let max_backoff = config
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(retries));
        let policy = ExponentialBackoff::builder()
            .retry_bounds(config.initial_backoff, max_backoff)
            .jitter(Jitter::None)
            .build_with_max_retries(retries);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(policy))
            .with(BusyServerWait {
                wait: config.initial_backoff.saturating_mul(2),
            })
            .build();

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        debug!("Got HTTP {}", status);

        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}

/// Holds back 429/503 responses before the retry loop resumes its own backoff
struct BusyServerWait {
    wait: Duration,
}

#[async_trait::async_trait]
impl Middleware for BusyServerWait {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let response = next.run(req, extensions).await?;

        if matches!(
            response.status(),
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        ) {
            warn!(
                "Server busy (HTTP {}), waiting {:?}...",
                response.status(),
                self.wait
            );
            tokio::time::sleep(self.wait).await;
        }

        Ok(response)
    }
}

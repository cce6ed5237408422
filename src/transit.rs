use async_trait::async_trait;
use url::Url;

pub const IRAIL_CONNECTIONS_URL: &str = "https://api.irail.be/connections/";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("{0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

/// A journey planner that can be asked for the connections between two stations
#[async_trait]
pub trait TransitApi: Send + Sync {
    // Returns the raw, undecoded response body
    async fn connections(&self, origin: &str, destination: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct IRailClient {
    endpoint: String,
    http: reqwest::Client,
}

impl IRailClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    pub fn connections_url(&self, origin: &str, destination: &str) -> Result<Url, FetchError> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[("from", origin), ("to", destination), ("format", "json")],
        )?;

        Ok(url)
    }
}

#[async_trait]
impl TransitApi for IRailClient {
    async fn connections(&self, origin: &str, destination: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.connections_url(origin, destination)?;
        tracing::debug!("querying: {}", url);

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;

        Ok(body.to_vec())
    }
}

pub mod record;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

pub use record::{CharacterId, CharacterRecord};
use record::Envelope;

pub const DEFAULT_API_URL: &str = "https://api.disneyapi.dev";
pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid catalog URL: {url}")]
    InvalidUrl { url: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("character {id} not found")]
    NotFound { id: CharacterId },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Read access to a character catalog. Every operation resolves to an owned
/// collection; the shape quirks of the upstream API stay behind this trait.
pub trait CharacterSource {
    fn fetch_page(
        &self,
        size: u32,
    ) -> impl Future<Output = Result<Vec<CharacterRecord>, SourceError>>;

    fn fetch_by_id(
        &self,
        id: CharacterId,
    ) -> impl Future<Output = Result<CharacterRecord, SourceError>>;

    fn search_by_name(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<CharacterRecord>, SourceError>>;
}

#[derive(Clone, Debug)]
pub struct HttpOptions {
    pub base_url: String,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: 10,
            proxy: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpSource {
    pub fn new(options: &HttpOptions) -> Result<Self, SourceError> {
        let base = parse_base_url(&options.base_url)?;
        let client = build_client(options.proxy.as_deref(), options.timeout_seconds)?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &reqwest::Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, SourceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl {
                url: self.base.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_envelope(&self, url: reqwest::Url) -> Result<Envelope, SourceError> {
        debug!(%url, "catalog request");
        let url_str = url.to_string();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Request {
                url: url_str.clone(),
                source: e,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(|e| SourceError::Request {
            url: url_str.clone(),
            source: e,
        })?;
        debug!(url = %url_str, bytes = body.len(), "catalog response");
        serde_json::from_str::<Envelope>(&body).map_err(|e| SourceError::Decode {
            url: url_str,
            source: e,
        })
    }
}

impl CharacterSource for HttpSource {
    async fn fetch_page(&self, size: u32) -> Result<Vec<CharacterRecord>, SourceError> {
        let mut url = self.endpoint(&["character"])?;
        url.query_pairs_mut()
            .append_pair("pageSize", &size.to_string());
        Ok(self.get_envelope(url).await?.into_records())
    }

    async fn fetch_by_id(&self, id: CharacterId) -> Result<CharacterRecord, SourceError> {
        let id_segment = id.to_string();
        let url = self.endpoint(&["character", id_segment.as_str()])?;
        let records = match self.get_envelope(url).await {
            Ok(envelope) => envelope.into_records(),
            Err(SourceError::Status { status: 404, .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        records
            .into_iter()
            .find(|record| record.id == id)
            .ok_or(SourceError::NotFound { id })
    }

    async fn search_by_name(&self, text: &str) -> Result<Vec<CharacterRecord>, SourceError> {
        let mut url = self.endpoint(&["character"])?;
        url.query_pairs_mut().append_pair("name", text);
        Ok(self.get_envelope(url).await?.into_records())
    }
}

fn parse_base_url(raw: &str) -> Result<reqwest::Url, SourceError> {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    };
    let url = reqwest::Url::parse(&with_scheme).map_err(|_| SourceError::InvalidUrl {
        url: raw.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(SourceError::InvalidUrl {
            url: raw.to_string(),
        });
    }
    Ok(url)
}

fn build_client(proxy: Option<&str>, timeout_seconds: usize) -> Result<reqwest::Client, SourceError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!(
            "disneycards/",
            env!("CARGO_PKG_VERSION")
        )),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let timeout = Duration::from_secs(timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| SourceError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| SourceError::HttpClientBuild { source: e })
}

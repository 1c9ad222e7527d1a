//! Cover lookup via pluggable providers (Google Books, Open Library).

pub mod google_books;
pub mod openlibrary;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::LookupError;

/// One external source of cover images.
///
/// `Ok(None)` means the provider answered but had no usable image; `Err` means
/// the request itself failed. The resolver treats both as "try the next one".
#[async_trait]
pub trait CoverProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn find_cover(&self, query: &CoverQuery) -> Result<Option<String>, LookupError>;
}

/// Text as the caller typed it (trimmed), not the normalized cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverQuery {
    pub title: String,
    pub author: String,
}

impl CoverQuery {
    pub fn new(title: &str, author: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            author: author.trim().to_string(),
        }
    }
}

/// Build the HTTP client shared by all providers.
pub fn http_client(user_agent: &str, timeout_secs: Option<u64>) -> Result<reqwest::Client, LookupError> {
    let mut builder = reqwest::Client::builder().user_agent(user_agent);
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(|e| LookupError::Client(e.to_string()))
}

/// Send a GET and decode the JSON body, mapping each failure mode onto
/// the matching `LookupError` variant.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, LookupError> {
    let response = request.send().await.map_err(|e| LookupError::Network {
        provider: provider.to_string(),
        message: e.to_string(),
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(LookupError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
        });
    }
    response.json::<T>().await.map_err(|e| LookupError::Decode {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}

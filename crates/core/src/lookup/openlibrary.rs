//! Open Library cover provider.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::LookupError;
use crate::lookup::{fetch_json, CoverProvider, CoverQuery};

pub const DEFAULT_SEARCH_URL: &str = "https://openlibrary.org/search.json";
pub const DEFAULT_COVERS_URL: &str = "https://covers.openlibrary.org";

pub struct OpenLibraryProvider {
    client: reqwest::Client,
    search_url: String,
    covers_url: String,
}

impl OpenLibraryProvider {
    pub fn new(client: reqwest::Client, search_url: impl Into<String>, covers_url: impl Into<String>) -> Self {
        Self {
            client,
            search_url: search_url.into(),
            covers_url: covers_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CoverProvider for OpenLibraryProvider {
    fn name(&self) -> &str {
        "openlibrary"
    }

    async fn find_cover(&self, query: &CoverQuery) -> Result<Option<String>, LookupError> {
        let q = format!("{} {}", query.title, query.author).trim().to_string();
        let request = self
            .client
            .get(&self.search_url)
            .query(&[("q", q.as_str()), ("limit", "1")]);
        let body: SearchResponse = fetch_json(self.name(), request).await?;
        Ok(body.docs.first().and_then(|doc| cover_url_for(&self.covers_url, doc)))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchDoc {
    cover_i: Option<i64>,
    #[serde(default)]
    isbn: Vec<String>,
}

/// Cover id wins over ISBN; ids <= 0 are Open Library's "no cover" marker.
fn cover_url_for(covers_url: &str, doc: &SearchDoc) -> Option<String> {
    if let Some(id) = doc.cover_i.filter(|id| *id > 0) {
        return Some(format!("{}/b/id/{}-L.jpg", covers_url, id));
    }
    doc.isbn
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(|isbn| format!("{}/b/isbn/{}-L.jpg", covers_url, isbn))
}

//! Google Books cover provider.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::LookupError;
use crate::lookup::{fetch_json, CoverProvider, CoverQuery};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";

pub struct GoogleBooksProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Phrase query: `intitle:"<title>" inauthor:"<author>"`, author clause
    /// left out when there is no author. Embedded quotes are dropped so they
    /// cannot close a phrase early.
    fn search_terms(query: &CoverQuery) -> String {
        let title = phrase(&query.title);
        let author = phrase(&query.author);
        if author.is_empty() {
            format!("intitle:\"{}\"", title)
        } else {
            format!("intitle:\"{}\" inauthor:\"{}\"", title, author)
        }
    }
}

#[async_trait]
impl CoverProvider for GoogleBooksProvider {
    fn name(&self) -> &str {
        "googlebooks"
    }

    async fn find_cover(&self, query: &CoverQuery) -> Result<Option<String>, LookupError> {
        let mut params = vec![
            ("q", Self::search_terms(query)),
            ("maxResults", "1".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        let request = self.client.get(&self.base_url).query(&params);
        let body: VolumesResponse = fetch_json(self.name(), request).await?;
        Ok(best_image(&body).map(secure_cover_url))
    }
}

#[derive(Debug, Default, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
    large: Option<String>,
    extra_large: Option<String>,
}

fn phrase(text: &str) -> String {
    text.replace('"', "").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn best_image(body: &VolumesResponse) -> Option<&str> {
    let links = body.items.first()?.volume_info.image_links.as_ref()?;
    [&links.thumbnail, &links.small_thumbnail, &links.large, &links.extra_large]
        .into_iter()
        .filter_map(|l| l.as_deref())
        .find(|l| !l.trim().is_empty())
}

/// Force https and drop the page-curl cropping hint Google adds to thumbnails.
pub fn secure_cover_url(raw: &str) -> String {
    let mut url = match raw.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => raw.to_string(),
    };
    url = url.replace("&edge=curl", "").replace("?edge=curl&", "?");
    if let Some(stripped) = url.strip_suffix("?edge=curl") {
        url = stripped.to_string();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, api_key: Option<&str>) -> GoogleBooksProvider {
        GoogleBooksProvider::new(
            reqwest::Client::new(),
            format!("{}/books/v1/volumes", server.uri()),
            api_key.map(String::from),
        )
    }

    #[test]
    fn secure_cover_url_upgrades_scheme_and_strips_curl() {
        assert_eq!(secure_cover_url("http://example.com/a.jpg&edge=curl"), "https://example.com/a.jpg");
        assert_eq!(
            secure_cover_url("http://books.google.com/content?id=X&printsec=frontcover&img=1&zoom=1&edge=curl&source=gbs_api"),
            "https://books.google.com/content?id=X&printsec=frontcover&img=1&zoom=1&source=gbs_api"
        );
        assert_eq!(secure_cover_url("https://x.org/c?edge=curl&zoom=1"), "https://x.org/c?zoom=1");
        assert_eq!(secure_cover_url("https://x.org/c?edge=curl"), "https://x.org/c");
        assert_eq!(secure_cover_url("https://x.org/c.jpg"), "https://x.org/c.jpg");
    }

    #[test]
    fn search_terms_omit_empty_author() {
        assert_eq!(
            GoogleBooksProvider::search_terms(&CoverQuery::new("The Hobbit", "J.R.R. Tolkien")),
            "intitle:\"The Hobbit\" inauthor:\"J.R.R. Tolkien\""
        );
        assert_eq!(GoogleBooksProvider::search_terms(&CoverQuery::new("Beowulf", " ")), "intitle:\"Beowulf\"");
    }

    #[test]
    fn search_terms_drop_embedded_quotes() {
        assert_eq!(
            GoogleBooksProvider::search_terms(&CoverQuery::new("The \"Best\" Of", "Ana \"Nana\" Pop")),
            "intitle:\"The Best Of\" inauthor:\"Ana Nana Pop\""
        );
        assert_eq!(GoogleBooksProvider::search_terms(&CoverQuery::new("Quoted", "\"")), "intitle:\"Quoted\"");
    }

    #[tokio::test]
    async fn thumbnail_is_preferred_and_secured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books/v1/volumes"))
            .and(query_param("q", "intitle:\"The Hobbit\" inauthor:\"J.R.R. Tolkien\""))
            .and(query_param("maxResults", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{ "volumeInfo": { "imageLinks": {
                    "smallThumbnail": "http://example.com/small.jpg",
                    "thumbnail": "http://example.com/a.jpg&edge=curl"
                }}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let found = provider(&server, None)
            .find_cover(&CoverQuery::new("The Hobbit", "J.R.R. Tolkien"))
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some("https://example.com/a.jpg"));
    }

    #[tokio::test]
    async fn falls_through_link_sizes_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{ "volumeInfo": { "imageLinks": {
                    "extraLarge": "https://example.com/xl.jpg",
                    "large": "https://example.com/l.jpg"
                }}}]
            })))
            .mount(&server)
            .await;

        let found = provider(&server, None).find_cover(&CoverQuery::new("X", "Y")).await.unwrap();
        assert_eq!(found.as_deref(), Some("https://example.com/l.jpg"));
    }

    #[tokio::test]
    async fn api_key_is_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "totalItems": 0 })))
            .expect(1)
            .mount(&server)
            .await;

        let found = provider(&server, Some("secret")).find_cover(&CoverQuery::new("X", "Y")).await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn item_without_image_links_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{ "volumeInfo": { "title": "X" } }]
            })))
            .mount(&server)
            .await;

        let found = provider(&server, None).find_cover(&CoverQuery::new("X", "Y")).await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = provider(&server, None).find_cover(&CoverQuery::new("X", "Y")).await.unwrap_err();
        assert!(matches!(err, LookupError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let err = provider(&server, None).find_cover(&CoverQuery::new("X", "Y")).await.unwrap_err();
        assert!(matches!(err, LookupError::Decode { .. }));
    }
}

//! Reading-list entries, as exported by the browser app.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BookListError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookType {
    #[default]
    Book,
    Audiobook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Collection {
    #[serde(rename = "Citite Bucuresti")]
    ReadBucharest,
    #[serde(rename = "Citite Slobozia")]
    ReadSlobozia,
    #[default]
    #[serde(rename = "Necitite")]
    ToRead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    #[serde(default)]
    pub nr: u32,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(rename = "type", default)]
    pub book_type: BookType,
    /// 0-5 stars.
    #[serde(default)]
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_finished: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub collection: Collection,
    /// Placeholder or previously generated cover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

/// Parse a JSON array of books.
pub fn parse_book_list(json: &str) -> Result<Vec<Book>, BookListError> {
    Ok(serde_json::from_str(json)?)
}

pub fn read_book_list(path: &Path) -> Result<Vec<Book>, BookListError> {
    let content = std::fs::read_to_string(path)?;
    parse_book_list(&content)
}

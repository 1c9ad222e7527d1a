//! Cover resolution for a personal reading list.
//!
//! [`cover::CoverResolver`] is the entry point: it normalizes a book's
//! title/author into a [`key::CoverKey`], memoizes resolved covers, coalesces
//! concurrent lookups for the same book, and walks the configured
//! [`lookup::CoverProvider`]s in order until one produces an image.

pub mod book;
pub mod config;
pub mod cover;
pub mod error;
pub mod key;
pub mod lookup;
pub mod progress;

pub mod prelude {
    pub use crate::book::*;
    pub use crate::cover::{BookCover, CoverLookup, CoverResolver, CoverStatsSnapshot, ResolverOptions};
    pub use crate::error::*;
    pub use crate::progress::{NoopProgress, ProgressEvent, ProgressHandler};
}

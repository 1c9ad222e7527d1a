//! Cover resolution: turn a book's title/author into a real cover image URL.
//!
//! The resolver keeps two maps keyed by [`CoverKey`]:
//!
//! - a permanent cache of resolved URLs (no eviction, lives as long as the
//!   resolver), and
//! - the lookups currently in flight, so that any number of concurrent callers
//!   asking for the same book share one outbound provider sequence.
//!
//! Both live behind a single mutex. Checking the cache, joining or registering
//! an in-flight lookup, and settling a lookup (cache write + in-flight removal)
//! each happen in one critical section, which is what keeps a cached key from
//! ever being looked up again. The lock is never held across an `.await`.
//!
//! Lookups run as spawned tokio tasks and finish even if every caller has
//! gone away, so `resolve` must be called from within a tokio runtime.
//! Provider failures are logged and skipped; `resolve` itself cannot fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::book::Book;
use crate::config::CoverConfig;
use crate::error::LookupError;
use crate::key::CoverKey;
use crate::lookup::google_books::GoogleBooksProvider;
use crate::lookup::openlibrary::OpenLibraryProvider;
use crate::lookup::{http_client, CoverProvider, CoverQuery};
use crate::progress::{self, ProgressHandler};

type PendingLookup = Shared<BoxFuture<'static, Option<String>>>;

/// What a caller should display right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLookup {
    /// Resolved cover, else the caller's fallback (which may be absent).
    pub cover_url: Option<String>,
    /// True only when `cover_url` came from a provider.
    pub is_real_cover: bool,
    pub is_searching: bool,
}

impl CoverLookup {
    fn real(url: String) -> Self {
        Self {
            cover_url: Some(url),
            is_real_cover: true,
            is_searching: false,
        }
    }

    fn fallback(fallback: Option<&str>) -> Self {
        Self {
            cover_url: fallback.map(String::from),
            is_real_cover: false,
            is_searching: false,
        }
    }

    fn searching(fallback: Option<&str>) -> Self {
        Self {
            is_searching: true,
            ..Self::fallback(fallback)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookCover {
    pub id: String,
    pub cover: CoverLookup,
}

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub placeholder_patterns: Vec<String>,
    /// Upper bound on concurrent lookups in [`CoverResolver::resolve_books`].
    pub prefetch_concurrency: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::from(&CoverConfig::default())
    }
}

impl From<&CoverConfig> for ResolverOptions {
    fn from(cfg: &CoverConfig) -> Self {
        Self {
            placeholder_patterns: cfg.placeholder_patterns.clone(),
            prefetch_concurrency: cfg.prefetch_concurrency,
        }
    }
}

/// Counters since the resolver was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverStatsSnapshot {
    pub cache_hits: u64,
    /// Callers that joined a lookup another caller had already started.
    pub coalesced: u64,
    pub lookups: u64,
    pub resolved: u64,
    pub not_found: u64,
    pub provider_requests: u64,
    pub provider_failures: u64,
    /// Blank titles and caller-owned covers; no lookup attempted.
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct CoverStats {
    cache_hits: AtomicU64,
    coalesced: AtomicU64,
    lookups: AtomicU64,
    resolved: AtomicU64,
    not_found: AtomicU64,
    provider_requests: AtomicU64,
    provider_failures: AtomicU64,
    skipped: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl CoverStats {
    fn snapshot(&self) -> CoverStatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CoverStatsSnapshot {
            cache_hits: get(&self.cache_hits),
            coalesced: get(&self.coalesced),
            lookups: get(&self.lookups),
            resolved: get(&self.resolved),
            not_found: get(&self.not_found),
            provider_requests: get(&self.provider_requests),
            provider_failures: get(&self.provider_failures),
            skipped: get(&self.skipped),
        }
    }
}

#[derive(Default)]
struct CoverState {
    cache: HashMap<CoverKey, String>,
    in_flight: HashMap<CoverKey, PendingLookup>,
}

struct Inner {
    providers: Vec<Arc<dyn CoverProvider>>,
    placeholder_patterns: Vec<String>,
    prefetch_concurrency: usize,
    state: Mutex<CoverState>,
    stats: CoverStats,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CoverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Try providers strictly in order; first hit wins.
    async fn run_providers(&self, query: &CoverQuery) -> Option<String> {
        for provider in &self.providers {
            bump(&self.stats.provider_requests);
            match provider.find_cover(query).await {
                Ok(Some(url)) => {
                    tracing::info!(provider = provider.name(), title = %query.title, %url, "Resolved cover");
                    return Some(url);
                }
                Ok(None) => {
                    tracing::debug!(provider = provider.name(), title = %query.title, "No cover from provider");
                }
                Err(e) => {
                    bump(&self.stats.provider_failures);
                    tracing::warn!(provider = provider.name(), title = %query.title, "Cover lookup failed: {}", e);
                }
            }
        }
        None
    }
}

/// Writes the outcome of one lookup back into the shared state. Runs on drop
/// so the in-flight entry is released even if the lookup task panics or is
/// torn down with the runtime.
struct Settle<'a> {
    inner: &'a Inner,
    key: &'a CoverKey,
    url: Option<String>,
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        if let Some(url) = self.url.take() {
            state.cache.insert(self.key.clone(), url);
        }
        state.in_flight.remove(self.key);
    }
}

/// Memoizing, request-coalescing cover lookup. Cheap to clone; clones share
/// the cache, the in-flight map and the stats.
#[derive(Clone)]
pub struct CoverResolver {
    inner: Arc<Inner>,
}

impl CoverResolver {
    pub fn new(providers: Vec<Arc<dyn CoverProvider>>, options: ResolverOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                providers,
                placeholder_patterns: options
                    .placeholder_patterns
                    .iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect(),
                prefetch_concurrency: options.prefetch_concurrency.max(1),
                state: Mutex::new(CoverState::default()),
                stats: CoverStats::default(),
            }),
        }
    }

    /// Google Books first, then Open Library, sharing one HTTP client.
    pub fn from_config(cfg: &CoverConfig) -> Result<Self, LookupError> {
        let client = http_client(&cfg.user_agent, cfg.request_timeout_secs)?;
        let providers: Vec<Arc<dyn CoverProvider>> = vec![
            Arc::new(GoogleBooksProvider::new(
                client.clone(),
                cfg.google_books_url.clone(),
                cfg.google_books_api_key.clone(),
            )),
            Arc::new(OpenLibraryProvider::new(
                client,
                cfg.open_library_url.clone(),
                cfg.open_library_covers_url.clone(),
            )),
        ];
        Ok(Self::new(providers, ResolverOptions::from(cfg)))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.inner.providers.iter().map(|p| p.name()).collect()
    }

    /// True if `url` points at a known stand-in image service.
    pub fn is_placeholder(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.inner.placeholder_patterns.iter().any(|p| url.contains(p.as_str()))
    }

    /// Resolve the cover for a book, waiting for a lookup if one is needed.
    ///
    /// Order of checks: blank title (fallback), cache (real), caller-owned
    /// cover, i.e. a fallback that is not a placeholder (returned untouched),
    /// in-flight lookup (joined), otherwise a new lookup. A failed lookup is
    /// not remembered, so the next call with a placeholder tries again.
    ///
    /// A book that already carries its own image is never searched, not even
    /// once; pass a placeholder (or nothing) to force a lookup.
    pub async fn resolve(&self, title: &str, author: &str, fallback: Option<&str>) -> CoverLookup {
        let fallback = fallback.map(str::trim).filter(|f| !f.is_empty());
        if CoverKey::is_blank_title(title) {
            bump(&self.inner.stats.skipped);
            return CoverLookup::fallback(fallback);
        }
        let key = CoverKey::new(title, author);

        let pending = {
            let mut state = self.inner.lock();
            if let Some(url) = state.cache.get(&key) {
                bump(&self.inner.stats.cache_hits);
                tracing::debug!(%key, "Cover cache hit");
                return CoverLookup::real(url.clone());
            }
            if let Some(owned) = fallback.filter(|f| !self.is_placeholder(f)) {
                bump(&self.inner.stats.skipped);
                tracing::debug!(%key, "Keeping caller-owned cover");
                return CoverLookup::fallback(Some(owned));
            }
            match state.in_flight.get(&key) {
                Some(pending) => {
                    bump(&self.inner.stats.coalesced);
                    tracing::debug!(%key, "Joining in-flight cover lookup");
                    pending.clone()
                }
                None => {
                    let pending = self.start_lookup(key.clone(), CoverQuery::new(title, author));
                    state.in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        match pending.await {
            Some(url) => CoverLookup::real(url),
            None => CoverLookup::fallback(fallback),
        }
    }

    /// Current state without starting a lookup.
    pub fn status(&self, title: &str, author: &str, fallback: Option<&str>) -> CoverLookup {
        let fallback = fallback.map(str::trim).filter(|f| !f.is_empty());
        if CoverKey::is_blank_title(title) {
            return CoverLookup::fallback(fallback);
        }
        let key = CoverKey::new(title, author);
        let state = self.inner.lock();
        if let Some(url) = state.cache.get(&key) {
            CoverLookup::real(url.clone())
        } else if state.in_flight.contains_key(&key) {
            CoverLookup::searching(fallback)
        } else {
            CoverLookup::fallback(fallback)
        }
    }

    pub fn cached(&self, title: &str, author: &str) -> Option<String> {
        if CoverKey::is_blank_title(title) {
            return None;
        }
        self.inner.lock().cache.get(&CoverKey::new(title, author)).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.inner.lock().cache.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    /// Resolve covers for a whole reading list, at most `prefetch_concurrency`
    /// at a time. Output order matches `books`. Books sharing a key share a
    /// lookup.
    pub async fn resolve_books(&self, books: &[Book], on_progress: Option<&dyn ProgressHandler>) -> Vec<BookCover> {
        let total = books.len() as u64;
        let settled = AtomicU64::new(0);
        let settled = &settled;
        stream::iter(books)
            .map(|book| async move {
                let cover = self
                    .resolve(&book.title, &book.author, book.cover_url.as_deref())
                    .await;
                let current = settled.fetch_add(1, Ordering::Relaxed) + 1;
                progress::emit_progress(on_progress, "covers", current, total, Some(book.title.as_str()));
                BookCover {
                    id: book.id.clone(),
                    cover,
                }
            })
            .buffered(self.inner.prefetch_concurrency)
            .collect::<Vec<_>>()
            .boxed()
            .await
    }

    pub fn stats(&self) -> CoverStatsSnapshot {
        self.inner.stats.snapshot()
    }

    fn start_lookup(&self, key: CoverKey, query: CoverQuery) -> PendingLookup {
        bump(&self.inner.stats.lookups);
        tracing::debug!(%key, "Starting cover lookup");
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let mut settle = Settle {
                inner: &inner,
                key: &key,
                url: None,
            };
            let found = inner.run_providers(&query).await;
            if found.is_some() {
                bump(&inner.stats.resolved);
            } else {
                bump(&inner.stats.not_found);
                tracing::info!(title = %query.title, author = %query.author, "No cover found");
            }
            settle.url = found.clone();
            found
        });
        async move {
            task.await.unwrap_or_else(|e| {
                tracing::warn!("Cover lookup task ended abnormally: {}", e);
                None
            })
        }
        .boxed()
        .shared()
    }
}

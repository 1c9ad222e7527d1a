/// Top-level error type. Public API functions that can fail return this or
/// one of the module errors below.
#[derive(Debug, thiserror::Error)]
pub enum ShelfError {
    #[error("Cover lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Book list error: {0}")]
    BookList(#[from] BookListError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single provider request. The resolver never lets these
/// reach its callers; they are logged and the next provider is tried.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Network error from {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("Provider {provider} returned HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("Provider {provider} sent an unreadable response: {message}")]
    Decode { provider: String, message: String },

    #[error("Could not build HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum BookListError {
    #[error("Malformed book list: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

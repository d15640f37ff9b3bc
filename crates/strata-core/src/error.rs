/// Errors that can occur across the Strata platform.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use strata_core::StrataError;
///
/// let err = StrataError::Layout("path does not start with 'src'".into());
/// assert!(err.to_string().contains("src"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Source code parsing failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// A path does not conform to the expected repository layout.
    #[error("layout error: {0}")]
    Layout(String),

    /// Malformed or entirely unusable input data.
    #[error("input error: {0}")]
    Input(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

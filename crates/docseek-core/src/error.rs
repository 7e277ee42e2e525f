//! Error types for the docseek-core library.

use thiserror::Error;

/// Main error type for the docseek library.
#[derive(Error, Debug)]
pub enum DocseekError {
    /// Field or engine configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Search tree construction error.
    #[error("search tree error: {0}")]
    Tree(#[from] TreeError),

    /// Field resolution error.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Positioned-text or table model error.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A positional expression carries a horizontal status other than -1, 0 or 1.
    #[error("field {field}, expression {index}: horizontal status {value} is out of range (expected -1, 0 or 1)")]
    HorizontalStatusOutOfRange {
        field: String,
        index: usize,
        value: i32,
    },

    /// A field has no expressions.
    #[error("field {0} has no expressions")]
    NoExpressions(String),

    /// A field uses the name reserved for the tree root.
    #[error("field name {0:?} is reserved")]
    ReservedName(String),

    /// Two fields share a name.
    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    /// Unknown value type tag.
    #[error("invalid value type: {0}")]
    InvalidValueType(String),

    /// Grid dimensions must be at least 1x1.
    #[error("invalid grid dimensions {rows}x{cols}")]
    InvalidGrid { rows: usize, cols: usize },

    /// Failed to read or write a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to (de)serialize a configuration file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while building or mutating the search tree.
#[derive(Error, Debug)]
pub enum TreeError {
    /// A required expression or node is missing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Terminal nodes never gain children.
    #[error("terminal node {0} cannot have children")]
    TerminalChild(usize),
}

/// Errors raised while resolving fields against a document.
#[derive(Error, Debug)]
pub enum SearchError {
    /// An expression pattern failed to compile.
    #[error("field {field}: malformed pattern {pattern:?}: {source}")]
    Pattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The tree lost a node the engine expected to find.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors related to the positioned-text and table models.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Line 0 marks an unknown position and cannot hold text.
    #[error("line 0 is reserved")]
    ReservedLine,

    /// Table rows have inconsistent shapes or cells overlap the bounds.
    #[error("invalid table: {0}")]
    InvalidTable(String),
}

/// Result type for the docseek library.
pub type Result<T> = std::result::Result<T, DocseekError>;

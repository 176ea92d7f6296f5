use thiserror::Error;

/// Unified result type for the termdeck crate.
pub type Result<T> = std::result::Result<T, DeckError>;

/// Errors surfaced by the dashboard core.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Invalid tree description; construction returns no partial tree.
    #[error("container configuration error: {0}")]
    Config(String),
    /// The terminal is too small for the requested borders.
    #[error("layout error: {0}")]
    Layout(String),
    /// The cell grid sink rejected a write.
    #[error("cell sink error: {0}")]
    Sink(String),
    /// A subscriber sink failed and was unsubscribed.
    #[error("subscriber error: {0}")]
    Subscriber(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

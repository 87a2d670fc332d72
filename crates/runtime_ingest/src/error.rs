use core_types::Source;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// A primary fetch answered with an HTTP error while `terminate_on_error`
    /// was set. All workers were joined before this was returned.
    #[error("batch aborted: {target} answered with HTTP {status}")]
    Aborted { target: Source, status: u16 },
}

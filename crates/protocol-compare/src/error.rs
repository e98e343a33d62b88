use protocol_common::error::CommonError;

/// Engine error type.
///
/// Three classes, deliberately no catch-all: callers must be able to tell
/// "nothing to compare" (`NotFound`) from a degraded-but-valid comparison
/// (`Common`, collaborator failures) and from unusable input
/// (`MalformedInput`). Field-level sloppiness inside an otherwise-resolved
/// record is never an error at all; the normalizer absorbs it.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("protocol not found: {0}")]
    NotFound(String),

    #[error("malformed protocol record: {0}")]
    MalformedInput(String),
}

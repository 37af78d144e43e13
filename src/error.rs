use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

/// Fatal compilation errors. All of these abort the current unit
/// immediately; no partial VM output is produced for it.
#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    #[error("expected {expected} at token {at}, found {found}")]
    StructuralMismatch {
        expected: String,
        found: String,
        at: usize,
    },

    #[error("unresolved symbol `{0}`")]
    UnresolvedSymbol(String),

    #[error("string constant has no saved literal to recover")]
    LiteralUnderrun,
}

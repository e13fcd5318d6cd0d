use thiserror::Error;

#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("invalid semantic pattern: {0}")]
    InvalidPattern(String),
}

pub type Result<T> = std::result::Result<T, SemanticError>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    #[error("malformed index: {0}")]
    MalformedIndex(String),
}

pub type Result<T> = std::result::Result<T, Error>;

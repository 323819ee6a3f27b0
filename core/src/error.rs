use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Token value out of range")]
    InvalidTokenValue,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Round already started")]
    AlreadyStarted,
    #[error("Round is not running, input rejected")]
    NotRunning,
}

pub type Result<T> = core::result::Result<T, GameError>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Profile is missing a selection needed before recommending.
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Malformed Gen-Ed data: {0}")]
    GenEdParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Error type for the hades umbrella crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] hades_core::Error),

    #[error("No engine factory: enable the `reference-engines` feature or call .factory()")]
    NoFactory,

    #[error("Failed to start maintenance thread: {0}")]
    Thread(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

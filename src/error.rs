use std::io;
use thiserror::Error;

use crate::file::FileError;

#[derive(Error, Debug)]
pub enum ShardError {
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("File reading error: {0}")]
    FileError(#[from] FileError),
    #[error("TSV error: {0}")]
    TsvError(#[from] csv::Error),
    #[error("Error while parsing: {0}")]
    ParseError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: configuration file not found", .0.display())]
    ConfigNotFound(PathBuf),
    #[error("{}: {source}", .path.display())]
    ConfigRead { path: PathBuf, source: io::Error },
    #[error("{}: {message}", .path.display())]
    Keymap { path: PathBuf, message: String },
    #[error("no CEC adapters found")]
    NoAdaptersFound,
    #[error("{context}: {source}")]
    External { context: String, source: io::Error },
}

impl Error {
    pub(crate) fn external(context: impl Into<String>) -> impl FnOnce(io::Error) -> Error {
        let context = context.into();

        move |source| Error::External { context, source }
    }
}

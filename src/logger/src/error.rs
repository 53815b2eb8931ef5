use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Failed to create log file '{}'", path.display())]
    CreateLogFile{path: PathBuf, #[source] err: std::io::Error},

    #[error("A global logger was already initialized")]
    AlreadyInitialized,
}

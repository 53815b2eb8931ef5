use std::path::PathBuf;

use thiserror::Error;
use crate::FileEntity;

#[derive(Error, Debug)]
pub enum ParserError{
    #[error("{0} {1} does not exist")]
    MissingFileEntity(FileEntity, String),

    #[error("{1} is not a {0}")]
    InvalidFileEntity(FileEntity, String),

    #[error("Invalid genetic distance '{0}': expected a non-negative number of centiMorgans")]
    ParseDistance(String),

    #[error("{0} already exists. Use --overwrite to force.")]
    CannotOverwrite(String),

    #[error("Failed to serialize command line arguments")]
    SerializeArgs(#[source] serde_yaml::Error),

    #[error("Unable to serialize arguments into '{}'", path.display())]
    WriteArgs{path: PathBuf, #[source] err: std::io::Error},

    #[error("Unable to deserialize arguments from '{}'", path.display())]
    DeserializeArgs{path: PathBuf, #[source] err: serde_yaml::Error},

    #[error("Failed to open '{}'", path.display())]
    OpenArgs{path: PathBuf, #[source] err: std::io::Error},
}

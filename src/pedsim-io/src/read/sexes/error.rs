use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SexesReaderError {
    #[error("Failed to open sexes file '{}'", path.display())]
    OpenFile{path: PathBuf, #[source] err: std::io::Error},

    #[error("Failed to read line {0} of the sexes file")]
    ReadLine(usize, #[source] std::io::Error),

    #[error("Line {line} of the sexes file should contain two fields: '<sample> <sex>'")]
    InvalidLine{line: usize},
}

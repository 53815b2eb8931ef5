use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PedigreeError {
    #[error("Failed to open pedigree definition file '{}'", path.display())]
    OpenDef{path: PathBuf, #[source] err: std::io::Error},

    #[error("Failed to read line {0} of the pedigree definition file")]
    ReadLine(usize, #[source] std::io::Error),

    #[error("The pedigree definition file does not contain any 'def' block")]
    NoDefinition,

    #[error("Line {line} of the pedigree definition file: {reason}")]
    MalformedDefLine{line: usize, reason: String},

    #[error("Invalid pedigree definition '{def}': {reason}")]
    InvalidPedigreeDefinition{def: String, reason: String},

    #[error("Sex constraints of pedigree definition '{def}' cannot be satisfied: {reason}")]
    SexConstraintViolation{def: String, reason: String},
}

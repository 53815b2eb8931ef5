use std::path::PathBuf;
use thiserror::Error;

use genome::ChrIdx;

#[derive(Error, Debug)]
pub enum CrossoverError {
    #[error("Both an interference file and a fixed crossover file were supplied. Please provide at most one of the two")]
    ConflictingCrossoverInputs,

    #[error("Failed to open crossover input file '{}'", path.display())]
    OpenFile{path: PathBuf, #[source] err: std::io::Error},

    #[error("Failed to read line {0} of a crossover input file")]
    ReadLine(usize, #[source] std::io::Error),

    #[error("Invalid interference parameters at line {line}: {reason}")]
    InvalidInterference{line: usize, reason: String},

    #[error("The interference file does not provide any parameter for chromosome {0}")]
    MissingInterference(ChrIdx),

    #[error("Invalid fixed crossover entry at line {line}: {reason}")]
    InvalidFixedCrossover{line: usize, reason: String},
}

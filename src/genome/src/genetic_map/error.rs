use std::path::PathBuf;
use thiserror::Error;

use crate::coordinate::ChrIdx;

/// Defects found while reading a genetic map, or while matching it against other inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapDefect {
    #[error("line {line}: expected 3 (chr pos cM) or 4 (chr pos female_cM male_cM) fields, found {found}")]
    FieldCount{line: usize, found: usize},

    #[error("line {line}: invalid {field} value '{value}'")]
    ParseField{line: usize, field: &'static str, value: String},

    #[error("line {line}: found {found} columns, while previous lines carried {expected}")]
    InconsistentTracks{line: usize, expected: usize, found: usize},

    #[error("line {line}: physical positions must be strictly increasing on chromosome {chr} ({pos} follows {previous})")]
    NonIncreasingPosition{line: usize, chr: ChrIdx, pos: u32, previous: u32},

    #[error("line {line}: genetic positions must not decrease on chromosome {chr} (at position {pos})")]
    DecreasingGeneticPosition{line: usize, chr: ChrIdx, pos: u32},

    #[error("chromosome {chr} needs at least two anchor points")]
    TooFewAnchors{chr: ChrIdx},

    #[error("chromosome {chr} is referenced by the {referenced_by}, but is missing from the genetic map")]
    MissingChromosome{chr: ChrIdx, referenced_by: String},
}

#[derive(Error, Debug)]
pub enum GeneticMapError {
    #[error("Malformed genetic map file: {0}")]
    MalformedMapFile(#[from] MapDefect),

    #[error("Failed to open genetic map '{}'", path.display())]
    OpenFile{path: PathBuf, #[source] err: std::io::Error},

    #[error("Failed to read line {0} of the genetic map")]
    ReadLine(usize, #[source] std::io::Error),

    #[error("The genetic map does not contain any chromosome")]
    EmptyMap,

    #[error("Chromosome {0} is absent from the genetic map")]
    UnknownChromosome(ChrIdx),
}

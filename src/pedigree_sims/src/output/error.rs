use thiserror::Error;

use crate::pedigree::PersonId;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Person {0} is absent from the simulated pedigrees")]
    UnknownPerson(PersonId),

    #[error("Chromosome index {0} does not match any simulated chromosome")]
    UnknownChromosome(usize),
}

use thiserror::Error;

use genome::Sex;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Parents of {child} ({first} and {second}) share the same sex")]
    SameSexParents{child: String, first: String, second: String},

    #[error("Failed to retrieve a parent of {child}: {parent} does not exist")]
    MissingParent{child: String, parent: String},

    #[error("Not enough {sex} samples to simulate genetic data: {needed} founders are required, but only {available} are available")]
    InsufficientRealSamples{sex: Sex, needed: usize, available: usize},

    #[error("Failed to build the simulation thread pool")]
    ThreadPool(#[source] rayon::ThreadPoolBuildError),
}

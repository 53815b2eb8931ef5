//! Pedigree transmission simulator.
//!
//! Founder haplotypes are dropped through every family replicate of a set of pedigree definitions, under
//! a configurable crossover model. The resulting mosaics are then scanned for segments shared identically
//! by descent between sampled individuals.

pub mod crossover;
pub use crossover::{CrossoverError, CrossoverModel};

pub mod pedigree;
pub use pedigree::{def_parser, PedigreeError, Pedigrees, SimDetails};

pub mod simulator;
pub use simulator::{Simulation, SimulationError, Simulator};

pub mod ibd;
pub use ibd::{IbdOptions, IbdReport, IbdType};

pub mod output;
pub use output::{OutputError, RowContext};

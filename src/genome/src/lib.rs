pub mod coordinate;
pub use coordinate::{ChrIdx, Position};

pub mod sex;
pub use sex::Sex;

mod genetic_map;
pub use genetic_map::{GeneticMap, ChromosomeMap, GeneticMapError, MapDefect, CENTIMORGANS_PER_MORGAN};

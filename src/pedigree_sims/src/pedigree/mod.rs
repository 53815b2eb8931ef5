mod error;
pub use error::PedigreeError;

mod sim_details;
pub use sim_details::{BranchDetails, BranchLayout, BranchParents, GenDetails, SimDetails};

mod sex_plan;
pub use sex_plan::SexPlan;

mod def_parser;
pub use def_parser::{def_parser, parse_defs};

mod person;
pub use person::{ChromosomePair, HapNum, Person, PersonId, Segment};

mod pedigrees;
pub use pedigrees::{Family, PedigreeRun, Pedigrees};

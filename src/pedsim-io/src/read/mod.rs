mod sexes;
pub use sexes::{SampleSexes, SexesReaderError};

pub mod chr_index;
pub use chr_index::ChrIdx;

pub mod position;
pub use position::Position;

use std::{fmt::{self, Display, Formatter}, str::FromStr};
mod error;
pub use error::ParsePositionError;

/// Physical position on a chromosome, in base pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position(pub u32);

impl Position {
    /// Round a fractional physical coordinate onto the nearest base, saturating on `u32` bounds.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pos = value.round().clamp(0.0, f64::from(u32::MAX)) as u32;
        Self(pos)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse::<u32>()?))
    }
}

impl From<u32> for Position {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Position> for u32 {
    fn from(value: Position) -> Self {
        value.0
    }
}

impl From<Position> for f64 {
    fn from(value: Position) -> Self {
        f64::from(value.0)
    }
}

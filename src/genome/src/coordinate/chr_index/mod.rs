use std::{str::FromStr, fmt::{Display, Formatter, self}, ops::Deref};

mod error;
pub use error::ChrIdxError;

use located_error::prelude::*;

/// Chromosome index. Numeric chromosomes map onto their number, while sex chromosomes map onto the
/// ASCII code of their label (`X` -> 88, `Y` -> 89), so that they sort after every autosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChrIdx(pub u8);

impl ChrIdx {
    pub const X: Self = Self(b'X');
    pub const Y: Self = Self(b'Y');

    #[must_use]
    pub fn into_inner(self) -> u8 {
        self.0
    }
}

impl FromStr for ChrIdx {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        let label = label.strip_prefix("chr").unwrap_or(label);
        match label {
            "X" | "x" => Ok(Self::X),
            "Y" | "y" => Ok(Self::Y),
            _ => {
                let inner = label.parse::<u8>().loc(ChrIdxError(s.to_owned()))?;
                Ok(Self(inner))
            }
        }
    }
}

impl Display for ChrIdx {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Self::X => "X".fmt(f),
            Self::Y => "Y".fmt(f),
            Self(idx) => idx.fmt(f),
        }
    }
}

impl From<u8> for ChrIdx {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<ChrIdx> for u8 {
    fn from(value: ChrIdx) -> Self {
        value.0
    }
}

impl Deref for ChrIdx {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let chr = 22;
        let want = format!("{chr:_^12}");
        let got  = format!("{:_^12}", ChrIdx(chr));
        assert_eq!(want, got);
        assert_eq!(ChrIdx::X.to_string(), "X");
    }

    #[test]
    fn from_str() {
        assert_eq!(ChrIdx::from_str("chr7").unwrap(), ChrIdx(7));
        assert_eq!(ChrIdx::from_str("13").unwrap(), ChrIdx(13));
        assert_eq!(ChrIdx::from_str("chrX").unwrap(), ChrIdx::X);
        assert_eq!(ChrIdx::from_str("X").unwrap(), ChrIdx(88));
        assert!(ChrIdx::from_str("chrUn").is_err());
        assert!(ChrIdx::from_str("300").is_err());
    }

    #[test]
    fn sex_chromosomes_sort_last() {
        let mut chrs = vec![ChrIdx::X, ChrIdx(22), ChrIdx(1)];
        chrs.sort();
        assert_eq!(chrs, vec![ChrIdx(1), ChrIdx(22), ChrIdx::X]);
    }
}

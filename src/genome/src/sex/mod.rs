use std::{fmt::{self, Formatter, Display}, str::FromStr, result::Result};

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
    Unknown
}

impl Sex {
    /// Draw a fair random sex.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        [Self::Female, Self::Male][usize::from(rng.gen_bool(0.5))]
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Opposite sex. `Unknown` stays `Unknown`.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Male    => Self::Female,
            Self::Female  => Self::Male,
            Self::Unknown => Self::Unknown,
        }
    }

    /// Index used by per-sex tallies: 0 = male, 1 = female.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Male    => Some(0),
            Self::Female  => Some(1),
            Self::Unknown => None,
        }
    }

    /// PLINK `.fam` sex code.
    #[must_use]
    pub fn fam_code(self) -> u8 {
        match self {
            Self::Male    => 1,
            Self::Female  => 2,
            Self::Unknown => 0,
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "male"   | "m" | "1" => Self::Male,
            "female" | "f" | "2" => Self::Female,
            _                    => Self::Unknown,
        })
    }
}

impl Display for Sex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            Self::Female  => "female",
            Self::Male    => "male",
            Self::Unknown => "unknown"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn display() {
        assert_eq!(format!("{}", Sex::Female), "female");
        assert_eq!(format!("{}", Sex::Male), "male");
        assert_eq!(format!("{}", Sex::Unknown), "unknown");
    }

    #[test]
    fn from_str() {
        assert_eq!(Sex::from_str("FEMALE"), Ok(Sex::Female));
        assert_eq!(Sex::from_str("2"), Ok(Sex::Female));
        assert_eq!(Sex::from_str("F"), Ok(Sex::Female));
        assert_eq!(Sex::from_str("MALE"), Ok(Sex::Male));
        assert_eq!(Sex::from_str("1"), Ok(Sex::Male));
        assert_eq!(Sex::from_str("m"), Ok(Sex::Male));
        assert_eq!(Sex::from_str(""), Ok(Sex::Unknown));
        assert_eq!(Sex::from_str("-9"), Ok(Sex::Unknown));
    }

    #[test]
    fn opposite_and_codes() {
        assert_eq!(Sex::Male.opposite(), Sex::Female);
        assert_eq!(Sex::Unknown.opposite(), Sex::Unknown);
        assert_eq!(Sex::Female.index(), Some(1));
        assert_eq!(Sex::Male.fam_code(), 1);
    }

    #[test]
    fn random_draws_both_sexes() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
        let draws: Vec<Sex> = (0..64).map(|_| Sex::random(&mut rng)).collect();
        assert!(draws.contains(&Sex::Male));
        assert!(draws.contains(&Sex::Female));
        assert!(!draws.contains(&Sex::Unknown));
    }
}

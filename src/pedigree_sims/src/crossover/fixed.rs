use std::io::BufRead;

use ahash::AHashMap;
use rand::Rng;
use log::debug;

use genome::{ChrIdx, GeneticMap, Sex};
use located_error::prelude::*;

use super::{data_lines, BreakpointGenerator, CrossoverError, Meiosis, MeiosisRequest};

/// Predetermined crossover positions, keyed by offspring, transmitting parent sex and chromosome.
///
/// Meioses absent from the table yield no crossover at all, and always transmit the first
/// parental copy (`first_copy = 0`).
#[derive(Debug, Clone, Default)]
pub struct FixedCrossovers {
    meioses: AHashMap<String, AHashMap<(Sex, ChrIdx), Vec<f64>>>,
}

impl FixedCrossovers {
    /// Parse a fixed crossover file.
    /// ### File characteristics:
    /// - whitespace-separated fields, `#` comments, optional header.
    /// - columns: `<child_id> <M|F> <chr> [cM ...]`, where `M|F` is the sex of the transmitting parent, and
    ///   positions are expressed in cM from the start of the chromosome, on that parent's map track.
    ///
    /// # Errors
    /// - `InvalidFixedCrossover` for malformed lines, or if the same meiosis is described twice.
    /// - `MalformedMapFile` if a chromosome of the file is absent from `map`.
    pub fn from_reader<R: BufRead>(reader: R, map: &GeneticMap) -> Result<Self> {
        let mut meioses: AHashMap<String, AHashMap<(Sex, ChrIdx), Vec<f64>>> = AHashMap::new();
        let mut total = 0;
        // A header line names neither a parent sex nor a chromosome.
        let is_header = |fields: &[String]| {
            fields.get(1).map_or(true, |sex| sex.parse::<Sex>().map_or(true, |sex| sex.is_unknown()))
                && fields.get(2).map_or(true, |chr| chr.parse::<ChrIdx>().is_err())
        };
        for entry in data_lines(reader, is_header) {
            let (line, mut fields) = entry.loc("While reading fixed crossover file")?;
            let invalid = |reason: String| CrossoverError::InvalidFixedCrossover{line, reason};
            if fields.len() < 3 {
                return Err(invalid(format!("expected at least 3 fields (child sex chr [cM...]), found {}", fields.len())))
                    .loc("While parsing fixed crossover file")
            }

            let sex = match fields[1].parse::<Sex>() {
                Ok(sex @ (Sex::Male | Sex::Female)) => sex,
                _ => return Err(invalid(format!("invalid parent sex '{}': expected 'M' or 'F'", fields[1])))
                    .loc("While parsing fixed crossover file"),
            };
            let chr: ChrIdx = fields[2].parse().map_err(|_| invalid(format!("invalid chromosome '{}'", fields[2])))?;
            map.require_chromosomes([chr], "fixed crossover file")
                .loc("While matching fixed crossovers against the genetic map")?;

            let mut breakpoints = Vec::with_capacity(fields.len() - 3);
            for field in &fields[3..] {
                let cm = field.parse::<f64>().map_err(|_| invalid(format!("invalid crossover position '{field}'")))?;
                if !(cm >= 0.0 && cm.is_finite()) {
                    return Err(invalid(format!("crossover positions must be non-negative, found {cm}")))
                        .loc("While parsing fixed crossover file")
                }
                breakpoints.push(cm);
            }

            let child = fields.swap_remove(0);
            let chromosomes = meioses.entry(child.clone()).or_default();
            if chromosomes.insert((sex, chr), breakpoints).is_some() {
                return Err(invalid(format!("meiosis {sex} -> {child} on chromosome {chr} is defined multiple times")))
                    .loc("While parsing fixed crossover file")
            }
            total += 1;
        }
        debug!("Read {total} fixed meioses across {} offspring", meioses.len());
        Ok(Self{meioses})
    }

    /// Crossover positions of a given meiosis, if it was specified.
    #[must_use]
    pub fn get(&self, child: &str, parent_sex: Sex, chr: ChrIdx) -> Option<&[f64]> {
        self.meioses.get(child)
            .and_then(|chromosomes| chromosomes.get(&(parent_sex, chr)))
            .map(Vec::as_slice)
    }
}

impl BreakpointGenerator for FixedCrossovers {
    fn generate<R: Rng + ?Sized>(&self, request: &MeiosisRequest, _rng: &mut R) -> Meiosis {
        let breakpoints = self.get(request.child, request.parent_sex, request.chr)
            .map(<[f64]>::to_vec)
            .unwrap_or_default();
        Meiosis::new(0, breakpoints, request.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const MAP: &str = "1 0 0.0\n1 100000000 100.0\n2 0 0.0\n2 100000000 50.0\n";

    fn map() -> GeneticMap {
        GeneticMap::from_reader(Cursor::new(MAP), ChrIdx::X).unwrap()
    }

    fn parse(contents: &str) -> Result<FixedCrossovers> {
        FixedCrossovers::from_reader(Cursor::new(contents), &map())
    }

    #[test]
    fn parse_and_generate() -> Result<()> {
        let fixed = parse("child sex chr positions\nped1_g2-b1-i1 F 1 60.0 20.0\nped1_g2-b1-i1 M 2\n")?;
        assert_eq!(fixed.get("ped1_g2-b1-i1", Sex::Female, ChrIdx(1)), Some(&[60.0, 20.0][..]));
        assert_eq!(fixed.get("ped1_g2-b1-i1", Sex::Male, ChrIdx(2)), Some(&[][..]));
        assert_eq!(fixed.get("ped1_g2-b1-i1", Sex::Male, ChrIdx(1)), None);

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let request = MeiosisRequest{child: "ped1_g2-b1-i1", chr: ChrIdx(1), parent_sex: Sex::Female, length: 50.0};
        let meiosis = fixed.generate(&request, &mut rng);
        assert_eq!(meiosis, Meiosis{first_copy: 0, breakpoints: vec![20.0]});
        Ok(())
    }

    #[test]
    fn first_line_with_long_form_sex_is_data() -> Result<()> {
        let fixed = parse("ped1_g2-b1-i1 male 1 10.0\nped1_g2-b1-i1 female 1 30.0\n")?;
        assert_eq!(fixed.get("ped1_g2-b1-i1", Sex::Male, ChrIdx(1)), Some(&[10.0][..]));
        assert_eq!(fixed.get("ped1_g2-b1-i1", Sex::Female, ChrIdx(1)), Some(&[30.0][..]));

        let fixed = parse("ped1_g2-b1-i1 m 2\n")?;
        assert_eq!(fixed.get("ped1_g2-b1-i1", Sex::Male, ChrIdx(2)), Some(&[][..]));
        Ok(())
    }

    #[test]
    fn unspecified_meiosis_has_no_crossover() -> Result<()> {
        let fixed = parse("")?;
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let request = MeiosisRequest{child: "anyone", chr: ChrIdx(2), parent_sex: Sex::Male, length: 50.0};
        assert_eq!(fixed.generate(&request, &mut rng), Meiosis{first_copy: 0, breakpoints: vec![]});
        Ok(())
    }

    #[test]
    fn invalid_entries() {
        for contents in ["a M\n", "a M 1 1.0\nb U 1 10.0\n", "a M 1 -3.0\n", "a M 1 x\n", "a M 1 1.0\na M 1 2.0\n"] {
            let err = parse(contents).unwrap_err();
            assert!(err.chain().any(|e| matches!(e.downcast_ref::<CrossoverError>(), Some(CrossoverError::InvalidFixedCrossover{..}))), "{contents}: {err:?}");
        }
    }

    #[test]
    fn unknown_chromosome() {
        let err = parse("a M 3 1.0\n").unwrap_err();
        assert!(err.chain().any(|e| matches!(e.downcast_ref::<genome::GeneticMapError>(), Some(genome::GeneticMapError::MalformedMapFile(_)))));
    }
}

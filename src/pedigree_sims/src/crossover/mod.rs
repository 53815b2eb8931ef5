use std::{path::Path, fs::File, io::{BufRead, BufReader}};

use rand::Rng;
use log::{info, trace};

use genome::{ChrIdx, GeneticMap, Sex};
use located_error::prelude::*;

mod error;
pub use error::CrossoverError;

mod poisson;
pub use poisson::PoissonModel;

mod interference;
pub use interference::{InterferenceModel, InterferenceParams};

mod fixed;
pub use fixed::FixedCrossovers;

/// Everything a crossover model needs to know about a single meiosis, on a single chromosome.
/// # Fields
/// - `child`     : sample id of the offspring receiving the gamete.
/// - `chr`       : chromosome being transmitted.
/// - `parent_sex`: sex of the transmitting parent. Selects the genetic map track.
/// - `length`    : genetic length (cM) of `chr` on the track of `parent_sex`.
#[derive(Debug, Clone, Copy)]
pub struct MeiosisRequest<'a> {
    pub child     : &'a str,
    pub chr       : ChrIdx,
    pub parent_sex: Sex,
    pub length    : f64,
}

/// Outcome of a single meiosis on one chromosome.
/// # Fields
/// - `first_copy` : parental copy (0: paternal, 1: maternal) transmitted at the start of the chromosome.
/// - `breakpoints`: crossover positions (cM from the chromosome start), sorted, unique, within ]0, length[
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Meiosis {
    pub first_copy : u8,
    pub breakpoints: Vec<f64>,
}

impl Meiosis {
    /// Sort, deduplicate and clip raw crossover positions to [0, length[
    ///
    /// A crossover located exactly at the start of the chromosome is folded into `first_copy`: the
    /// other parental copy is then transmitted from the very first position.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn new(mut first_copy: u8, mut breakpoints: Vec<f64>, length: f64) -> Self {
        breakpoints.retain(|bp| (0.0..length).contains(bp));
        breakpoints.sort_by(f64::total_cmp);
        breakpoints.dedup();
        if breakpoints.first() == Some(&0.0) {
            breakpoints.remove(0);
            first_copy ^= 1;
        }
        Self{first_copy, breakpoints}
    }
}

/// Produce the crossovers of a meiosis.
pub trait BreakpointGenerator {
    fn generate<R: Rng + ?Sized>(&self, request: &MeiosisRequest, rng: &mut R) -> Meiosis;
}

/// Crossover model, selected once at load time.
#[derive(Debug, Clone)]
pub enum CrossoverModel {
    Poisson(PoissonModel),
    Interference(InterferenceModel),
    Fixed(FixedCrossovers),
}

impl CrossoverModel {
    /// Select and load the crossover model according to the provided input files.
    /// Without any file, crossovers follow a Poisson process.
    ///
    /// # Errors
    /// - `ConflictingCrossoverInputs` if both `interference` and `fixed` are provided.
    /// - any parsing error of the selected input file, or mismatch against `map`.
    pub fn from_files(interference: Option<&Path>, fixed: Option<&Path>, map: &GeneticMap) -> Result<Self> {
        match (interference, fixed) {
            (Some(_), Some(_)) => Err(CrossoverError::ConflictingCrossoverInputs).loc("While selecting a crossover model"),
            (Some(path), None) => {
                info!("Using crossover interference parameters from {}", path.display());
                let reader = open(path)?;
                let model = InterferenceModel::from_reader(reader, map)
                    .with_loc(|| format!("While parsing interference file '{}'", path.display()))?;
                Ok(Self::Interference(model))
            },
            (None, Some(path)) => {
                info!("Using fixed crossovers from {}", path.display());
                let reader = open(path)?;
                let model = FixedCrossovers::from_reader(reader, map)
                    .with_loc(|| format!("While parsing fixed crossover file '{}'", path.display()))?;
                Ok(Self::Fixed(model))
            },
            (None, None) => {
                info!("No interference file: crossovers follow a Poisson model");
                Ok(Self::Poisson(PoissonModel))
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Poisson(_)      => "Poisson",
            Self::Interference(_) => "gamma interference",
            Self::Fixed(_)        => "fixed",
        }
    }
}

impl BreakpointGenerator for CrossoverModel {
    fn generate<R: Rng + ?Sized>(&self, request: &MeiosisRequest, rng: &mut R) -> Meiosis {
        let meiosis = match self {
            Self::Poisson(model)      => model.generate(request, rng),
            Self::Interference(model) => model.generate(request, rng),
            Self::Fixed(model)        => model.generate(request, rng),
        };
        trace!("{} <- {} parent, chr {}: copy {} first, crossovers at {:?}",
            request.child, request.parent_sex, request.chr, meiosis.first_copy, meiosis.breakpoints
        );
        meiosis
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| CrossoverError::OpenFile{path: path.to_path_buf(), err})
        .loc("While opening crossover input file")
}

/// Iterate over the non-empty, non-comment lines of a crossover input file, with their 1-based line number.
/// The first of these lines is skipped as a header if `is_header` holds for its fields.
fn data_lines<R, H>(reader: R, is_header: H) -> impl Iterator<Item = Result<(usize, Vec<String>), CrossoverError>>
where   R: BufRead,
        H: Fn(&[String]) -> bool,
{
    let mut seen_data = false;
    reader.lines().enumerate().filter_map(move |(i, line)| {
        let line = match line {
            Ok(line) => line,
            Err(err) => return Some(Err(CrossoverError::ReadLine(i + 1, err))),
        };
        let content = line.split('#').next().unwrap_or_default();
        let fields: Vec<String> = content.split_whitespace().map(str::to_string).collect();
        if fields.is_empty() {
            return None
        }
        let header = !seen_data && is_header(&fields);
        seen_data = true;
        if header { None } else { Some(Ok((i + 1, fields))) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn meiosis_is_sorted_deduplicated_and_clipped() {
        let meiosis = Meiosis::new(1, vec![70.0, -1.0, 10.0, 100.0, 10.0, 150.0], 100.0);
        assert_eq!(meiosis.breakpoints, vec![10.0, 70.0]);
        assert_eq!(meiosis.first_copy, 1);
    }

    #[test]
    fn crossover_at_chromosome_start_switches_first_copy() {
        for first_copy in [0, 1] {
            let meiosis = Meiosis::new(first_copy, vec![40.0, 0.0, 0.0], 100.0);
            assert_eq!(meiosis, Meiosis{first_copy: first_copy ^ 1, breakpoints: vec![40.0]});
        }
    }

    #[test]
    fn conflicting_inputs() {
        let map = GeneticMap::from_reader(Cursor::new("1 0 0.0\n1 1000 1.0\n"), ChrIdx::X).unwrap();
        let path = Path::new("unused");
        let err = CrossoverModel::from_files(Some(path), Some(path), &map).unwrap_err();
        assert!(matches!(err.downcast_ref::<CrossoverError>(), Some(CrossoverError::ConflictingCrossoverInputs)));
    }

    #[test]
    fn default_model_is_poisson() {
        let map = GeneticMap::from_reader(Cursor::new("1 0 0.0\n1 1000 1.0\n"), ChrIdx::X).unwrap();
        let model = CrossoverModel::from_files(None, None, &map).unwrap();
        assert_eq!(model.name(), "Poisson");
    }

    #[test]
    fn data_lines_skip_comments_and_header() {
        let contents = "chr nu p\n# comment\n\n1 2.5 0.1 # trailing\n";
        let is_header = |fields: &[String]| fields[1].parse::<f64>().is_err();
        let lines: Vec<_> = data_lines(Cursor::new(contents), is_header).collect::<Result<_, _>>().unwrap();
        assert_eq!(lines, vec![(4, vec!["1".to_string(), "2.5".to_string(), "0.1".to_string()])]);

        // Only the first line may be a header.
        let lines: Vec<_> = data_lines(Cursor::new("1 2.5\nchr nu\n"), is_header).collect::<Result<_, _>>().unwrap();
        assert_eq!(lines.len(), 2);
    }
}

use std::{fs::File, io::{BufRead, BufReader}, path::Path, str::FromStr};

use ahash::AHashSet;
use log::{debug, warn};

use genome::Sex;
use located_error::prelude::*;

mod error;
pub use error::SexesReaderError;

/// Sexes of the real genotype samples that simulated founders are matched against.
/// ### File characteristics:
/// - whitespace-separated fields, `#` comments.
/// - columns: `<sample-id> <sex>`, sex being one of `M|F|male|female|1|2`.
///   Other values are kept as `Unknown`, and do not count towards either sex.
#[derive(Debug, Clone, Default)]
pub struct SampleSexes {
    samples: Vec<(String, Sex)>,
    counts : [usize; 2],
}

impl SampleSexes {
    /// Read a sexes file.
    ///
    /// # Errors
    /// - if `path` cannot be opened.
    /// - if any non-comment line does not carry exactly two fields.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| SexesReaderError::OpenFile{path: path.to_path_buf(), err})
            .loc("While reading sexes file")?;
        Self::from_reader(BufReader::new(file))
            .with_loc(|| format!("While parsing sexes file '{}'", path.display()))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, SexesReaderError> {
        let mut out  = Self::default();
        let mut seen = AHashSet::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|err| SexesReaderError::ReadLine(i + 1, err))?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.first() {
                None                              => continue,
                Some(field) if field.starts_with('#') => continue,
                Some(_) if fields.len() != 2      => return Err(SexesReaderError::InvalidLine{line: i + 1}),
                Some(_)                           => (),
            }

            if !seen.insert(fields[0].to_string()) {
                warn!("Sample {} is listed multiple times in the sexes file. Keeping its first entry.", fields[0]);
                continue
            }

            let sex = Sex::from_str(fields[1]).unwrap_or(Sex::Unknown);
            if let Some(idx) = sex.index() {
                out.counts[idx] += 1;
            }
            out.samples.push((fields[0].to_string(), sex));
        }
        debug!("Sexes file lists {} males and {} females", out.num_males(), out.num_females());
        Ok(out)
    }

    #[must_use]
    pub fn num_males(&self) -> usize {
        self.counts[0]
    }

    #[must_use]
    pub fn num_females(&self) -> usize {
        self.counts[1]
    }

    /// Per-sex sample counts, indexed as `Sex::index()` (0 = male, 1 = female).
    #[must_use]
    pub fn counts(&self) -> [usize; 2] {
        self.counts
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Sex)> {
        self.samples.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

use std::{collections::BTreeMap, path::Path, io::{BufReader, BufRead}, fs::File};

use itertools::Itertools;
use rust_lapper::{Interval, Lapper};
use log::debug;

use located_error::prelude::*;

mod error;
pub use error::{GeneticMapError, MapDefect};

mod map_range;
use map_range::{Anchor, MapRange, Track};

use crate::{coordinate::{ChrIdx, Position}, Sex};

pub const CENTIMORGANS_PER_MORGAN: f64 = 100.0;

/// Genetic map of a single chromosome, stored as a BITS tree of linear pieces.
///
/// See: <https://doi.org/10.1093/bioinformatics/bts652>
#[derive(Debug, Clone)]
pub struct ChromosomeMap {
    chr         : ChrIdx,
    anchors     : Vec<Anchor>,
    ranges      : Lapper<u32, MapRange>,
    single_track: bool,
}

impl ChromosomeMap {
    fn new(chr: ChrIdx, anchors: Vec<Anchor>) -> Result<Self, MapDefect> {
        if anchors.len() < 2 {
            return Err(MapDefect::TooFewAnchors{chr})
        }
        let intervals = anchors.iter().tuple_windows()
            .map(|(start, end)| Interval{start: start.pos, stop: end.pos, val: MapRange::new(*start, *end)})
            .collect();
        #[allow(clippy::float_cmp)]
        let single_track = anchors.iter().all(|anchor| anchor.cm[0] == anchor.cm[1]);
        Ok(Self{chr, anchors, ranges: Lapper::new(intervals), single_track})
    }

    #[must_use]
    pub fn chr(&self) -> ChrIdx {
        self.chr
    }

    fn track(sex: Sex) -> Track {
        match sex {
            Sex::Female  => Track::Female,
            Sex::Male    => Track::Male,
            Sex::Unknown => Track::Reference,
        }
    }

    fn first(&self) -> &Anchor {
        &self.anchors[0]
    }

    fn last(&self) -> &Anchor {
        &self.anchors[self.anchors.len() - 1]
    }

    /// Genetic coordinates (cM) of the first and last anchors of this chromosome, on the track of `sex`.
    /// `Sex::Unknown` selects the sex-averaged reference track.
    #[must_use]
    pub fn span(&self, sex: Sex) -> (f64, f64) {
        let track = Self::track(sex);
        (self.first().cm(track), self.last().cm(track))
    }

    /// Physical coordinates of the first and last anchors of this chromosome.
    #[must_use]
    pub fn physical_span(&self) -> (Position, Position) {
        (Position(self.first().pos), Position(self.last().pos))
    }

    /// Total genetic length of this chromosome (cM) on the track of `sex`.
    #[must_use]
    pub fn genetic_length(&self, sex: Sex) -> f64 {
        let (start, end) = self.span(sex);
        end - start
    }

    /// Convert a physical position into a genetic position (cM), by linear interpolation between the
    /// surrounding anchors. Positions outside of the map are extrapolated using the rate of the
    /// closest piece, and clamped at 0 cM.
    #[must_use]
    pub fn genomic_to_genetic(&self, pos: Position, sex: Sex) -> f64 {
        self.bp_to_cm(f64::from(pos), Self::track(sex))
    }

    /// Convert a genetic position (cM) back into a physical position.
    #[must_use]
    pub fn genetic_to_genomic(&self, cm: f64, sex: Sex) -> Position {
        Position::from_f64(self.cm_to_bp(cm, Self::track(sex)))
    }

    /// Express a genetic position measured on the track of `sex` in reference-track coordinates,
    /// going through the physical axis. This is the identity for `Sex::Unknown`, and on chromosomes
    /// whose female and male tracks are identical.
    #[must_use]
    pub fn to_reference(&self, cm: f64, sex: Sex) -> f64 {
        match Self::track(sex) {
            Track::Reference => cm,
            _ if self.single_track => cm,
            track => self.bp_to_cm(self.cm_to_bp(cm, track), Track::Reference),
        }
    }

    fn bp_to_cm(&self, bp: f64, track: Track) -> f64 {
        let intervals = &self.ranges.intervals;
        let piece = if bp <= f64::from(self.first().pos) {
            intervals.first()
        } else if bp >= f64::from(self.last().pos) {
            intervals.last()
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pos = bp.floor() as u32;
            self.ranges.find(pos, pos + 1).next()
        };
        piece.map_or(0.0, |interval| interval.val.interpolate(bp, track)).max(0.0)
    }

    fn cm_to_bp(&self, cm: f64, track: Track) -> f64 {
        // Index of the first anchor lying strictly after `cm`.
        let after = self.anchors.partition_point(|anchor| anchor.cm(track) <= cm);
        let idx = after.saturating_sub(1).min(self.anchors.len() - 2);
        MapRange::new(self.anchors[idx], self.anchors[idx + 1])
            .locate(cm, track)
            .max(0.0)
    }
}

/// Whole-genome genetic map, ordered by chromosome index.
///
/// Input files are whitespace-separated, with either three (`chr pos cM`) or four
/// (`chr pos female_cM male_cM`) columns. The latter defines sex-specific maps.
#[derive(Debug, Clone)]
pub struct GeneticMap {
    chromosomes : BTreeMap<ChrIdx, ChromosomeMap>,
    sex_specific: bool,
    chr_x       : ChrIdx,
}

impl GeneticMap {
    /// Read a genetic map from a file.
    ///
    /// # Arguments
    /// - `path`: path leading to the genetic map.
    /// - `chr_x`: label of the X chromosome within this map.
    ///
    /// # Errors
    /// - `OpenFile` if `path` cannot be read.
    /// - `MalformedMapFile` if any line is invalid or breaks the monotonicity of a chromosome.
    /// - `EmptyMap` if no chromosome could be read.
    pub fn from_file(path: impl AsRef<Path>, chr_x: ChrIdx) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| GeneticMapError::OpenFile{path: path.to_path_buf(), err})
            .loc("While reading genetic map")?;
        let map = Self::from_reader(BufReader::new(file), chr_x)
            .with_loc(|| format!("While parsing genetic map '{}'", path.display()))?;
        debug!("Read a {}genetic map spanning {} chromosome(s)",
            if map.sex_specific {"sex-specific "} else {""},
            map.chromosomes.len()
        );
        Ok(map)
    }

    /// Parse a genetic map from any buffered source.
    pub fn from_reader<R: BufRead>(reader: R, chr_x: ChrIdx) -> Result<Self, GeneticMapError> {
        use MapDefect::{FieldCount, ParseField, InconsistentTracks, NonIncreasingPosition, DecreasingGeneticPosition};
        let mut anchors: BTreeMap<ChrIdx, Vec<Anchor>> = BTreeMap::new();
        let mut num_columns: Option<usize> = None;
        let mut seen_line = false;

        for (i, line) in reader.lines().enumerate() {
            let lineno = i + 1;
            let line = line.map_err(|err| GeneticMapError::ReadLine(lineno, err))?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() || fields[0].starts_with('#') {
                continue
            }

            // ---- Header line: a first line without any numeric field.
            let first_line = !seen_line;
            seen_line = true;
            if first_line && fields.iter().all(|field| field.parse::<f64>().is_err()) {
                continue
            }

            let expected = *num_columns.get_or_insert(fields.len());
            match fields.len() {
                3 | 4 if fields.len() == expected => (),
                3 | 4 => return Err(InconsistentTracks{line: lineno, expected, found: fields.len()}.into()),
                found => return Err(FieldCount{line: lineno, found}.into()),
            }

            let parse_error = |field: &'static str, value: &str| ParseField{line: lineno, field, value: value.to_string()};
            let chr: ChrIdx = fields[0].parse().map_err(|_| parse_error("chromosome", fields[0]))?;
            let pos: u32    = fields[1].parse().map_err(|_| parse_error("position", fields[1]))?;
            let mut cm = [0.0; 2];
            for (track, value) in fields[2..].iter().enumerate() {
                cm[track] = value.parse::<f64>()
                    .ok()
                    .filter(|cm| cm.is_finite())
                    .ok_or_else(|| parse_error("genetic position", value))?;
            }
            if fields.len() == 3 {
                cm[1] = cm[0];
            }

            let chr_anchors = anchors.entry(chr).or_default();
            if let Some(previous) = chr_anchors.last() {
                if pos <= previous.pos {
                    return Err(NonIncreasingPosition{line: lineno, chr, pos, previous: previous.pos}.into())
                }
                if cm[0] < previous.cm[0] || cm[1] < previous.cm[1] {
                    return Err(DecreasingGeneticPosition{line: lineno, chr, pos}.into())
                }
            }
            chr_anchors.push(Anchor::new(pos, cm[0], cm[1]));
        }

        if anchors.is_empty() {
            return Err(GeneticMapError::EmptyMap)
        }

        let chromosomes = anchors.into_iter()
            .map(|(chr, anchors)| Ok((chr, ChromosomeMap::new(chr, anchors)?)))
            .collect::<Result<BTreeMap<_, _>, MapDefect>>()?;

        Ok(Self{chromosomes, sex_specific: num_columns == Some(4), chr_x})
    }

    /// Retrieve the map of a given chromosome.
    pub fn chromosome(&self, chr: ChrIdx) -> Result<&ChromosomeMap, GeneticMapError> {
        self.chromosomes.get(&chr).ok_or(GeneticMapError::UnknownChromosome(chr))
    }

    /// Iterate over every chromosome, in ascending chromosome index order.
    pub fn chromosomes(&self) -> impl Iterator<Item = &ChromosomeMap> + '_ {
        self.chromosomes.values()
    }

    #[must_use]
    pub fn num_chromosomes(&self) -> usize {
        self.chromosomes.len()
    }

    /// Physical to genetic position conversion. See [`ChromosomeMap::genomic_to_genetic`]
    pub fn genomic_to_genetic(&self, chr: ChrIdx, pos: Position, sex: Sex) -> Result<f64, GeneticMapError> {
        Ok(self.chromosome(chr)?.genomic_to_genetic(pos, sex))
    }

    /// Genetic to physical position conversion. See [`ChromosomeMap::genetic_to_genomic`]
    pub fn genetic_to_genomic(&self, chr: ChrIdx, cm: f64, sex: Sex) -> Result<Position, GeneticMapError> {
        Ok(self.chromosome(chr)?.genetic_to_genomic(cm, sex))
    }

    /// Total genetic length of a chromosome, in cM.
    pub fn genetic_length(&self, chr: ChrIdx, sex: Sex) -> Result<f64, GeneticMapError> {
        Ok(self.chromosome(chr)?.genetic_length(sex))
    }

    /// Whether the map carries distinct male and female tracks.
    #[must_use]
    pub fn is_sex_specific(&self) -> bool {
        self.sex_specific
    }

    #[must_use]
    pub fn chr_x(&self) -> ChrIdx {
        self.chr_x
    }

    #[must_use]
    pub fn is_x(&self, chr: ChrIdx) -> bool {
        chr == self.chr_x
    }

    #[must_use]
    pub fn have_x_map(&self) -> bool {
        self.chromosomes.contains_key(&self.chr_x)
    }

    /// Ensure every chromosome of `chrs` is part of this map.
    ///
    /// # Errors
    /// `MalformedMapFile(MissingChromosome)` on the first absent chromosome.
    pub fn require_chromosomes<I>(&self, chrs: I, referenced_by: &str) -> Result<(), GeneticMapError>
    where I: IntoIterator<Item = ChrIdx>
    {
        match chrs.into_iter().find(|chr| !self.chromosomes.contains_key(chr)) {
            Some(chr) => Err(MapDefect::MissingChromosome{chr, referenced_by: referenced_by.to_string()}.into()),
            None      => Ok(()),
        }
    }
}

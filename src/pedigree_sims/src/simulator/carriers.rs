use crate::pedigree::{HapNum, Person, PersonId};

use genome::Sex;

use super::SimulationError;

/// A piece of founder haplotype, carried by a given copy of a person. Coordinates are reference-track cM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InheritRecord {
    pub person: PersonId,
    pub copy  : u8,
    pub start : f64,
    pub end   : f64,
}

/// Every carrier of every founder haplotype, indexed by `[hap][chr_k]`.
#[derive(Debug, Clone, Default)]
pub struct HapCarriers {
    records        : Vec<Vec<Vec<InheritRecord>>>,
    num_chromosomes: usize,
}

impl HapCarriers {
    #[must_use]
    pub fn new(num_haps: usize, num_chromosomes: usize) -> Self {
        Self{records: vec![vec![Vec::new(); num_chromosomes]; num_haps], num_chromosomes}
    }

    #[must_use]
    pub fn num_haps(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn num_chromosomes(&self) -> usize {
        self.num_chromosomes
    }

    /// Carriers of haplotype `hap` on the `chr_k`-th chromosome, in insertion order.
    #[must_use]
    pub fn get(&self, hap: HapNum, chr_k: usize) -> &[InheritRecord] {
        self.records.get(hap).and_then(|chromosomes| chromosomes.get(chr_k)).map_or(&[][..], Vec::as_slice)
    }

    /// Iterate over every `(hap, chr_k, records)` bucket.
    pub fn iter(&self) -> impl Iterator<Item = (HapNum, usize, &[InheritRecord])> {
        self.records.iter().enumerate().flat_map(|(hap, chromosomes)| {
            chromosomes.iter().enumerate().map(move |(chr_k, records)| (hap, chr_k, records.as_slice()))
        })
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.iter().flatten().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register every segment of `person`. `offset` is the first haplotype number owned by this buffer.
    pub(crate) fn record(&mut self, person: &Person, offset: HapNum) {
        for (chr_k, pair) in person.chromosomes.iter().enumerate() {
            for (copy, segments) in (0u8..).zip(pair.iter()) {
                for seg in segments {
                    self.records[seg.hap - offset][chr_k].push(InheritRecord{person: person.id, copy, start: seg.start, end: seg.end});
                }
            }
        }
    }

    /// Concatenate the haplotype range of `other` after ours.
    pub(crate) fn append(&mut self, mut other: Self) {
        self.num_chromosomes = self.num_chromosomes.max(other.num_chromosomes);
        self.records.append(&mut other.records);
    }
}

/// Founder haplotype demand of a simulation.
/// # Fields
/// - `total` : number of founder haplotypes (`2 × founders`).
/// - `by_sex`: first haplotype number of every founder, per sex (0: male, 1: female).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FounderHaplotypes {
    pub total : usize,
    pub by_sex: [Vec<HapNum>; 2],
}

impl FounderHaplotypes {
    pub(crate) fn push(&mut self, sex: Sex, hap: HapNum) {
        if let Some(idx) = sex.index() {
            self.by_sex[idx].push(hap);
        }
        self.total += 2;
    }

    #[must_use]
    pub fn num_founders(&self) -> usize {
        self.total / 2
    }

    /// Number of founders of a given sex.
    #[must_use]
    pub fn needed(&self, sex: Sex) -> usize {
        sex.index().map_or(0, |idx| self.by_sex[idx].len())
    }

    /// Ensure that real genotype samples can supply every founder.
    /// `available` holds the number of real samples, per sex (0: male, 1: female).
    ///
    /// # Errors
    /// `InsufficientRealSamples` if fewer females or males are available than founders of that sex.
    pub fn validate_against(&self, available: [usize; 2]) -> Result<(), SimulationError> {
        for sex in [Sex::Female, Sex::Male] {
            let needed = self.needed(sex);
            let available = sex.index().map_or(0, |idx| available[idx]);
            if needed > available {
                return Err(SimulationError::InsufficientRealSamples{sex, needed, available})
            }
        }
        Ok(())
    }
}

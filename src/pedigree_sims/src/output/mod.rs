use std::fmt::{self, Display, Formatter};

use genome::{ChrIdx, ChromosomeMap, GeneticMap, Position, Sex};
use located_error::prelude::*;

use crate::{
    ibd::{IbdReport, IbdType},
    pedigree::{HapNum, Person, PersonId},
    simulator::Simulation,
};

mod error;
pub use error::OutputError;

/// Resolves arena indices into sample ids and reference-track positions into physical ones.
pub struct RowContext<'a> {
    simulation : &'a Simulation,
    chromosomes: Vec<&'a ChromosomeMap>,
}

impl<'a> RowContext<'a> {
    /// # Errors
    /// If a simulated chromosome is absent from `map`.
    pub fn new(simulation: &'a Simulation, map: &'a GeneticMap) -> Result<Self> {
        let chromosomes = simulation.chromosomes.iter()
            .map(|chr| map.chromosome(*chr))
            .collect::<Result<Vec<_>, _>>()
            .loc("While matching simulated chromosomes against the genetic map")?;
        Ok(Self{simulation, chromosomes})
    }

    fn person(&self, id: &PersonId) -> Result<&'a Person, OutputError> {
        self.simulation.pedigrees.get(id).ok_or(OutputError::UnknownPerson(*id))
    }

    fn chromosome(&self, chr_k: usize) -> Result<&'a ChromosomeMap, OutputError> {
        self.chromosomes.get(chr_k).copied().ok_or(OutputError::UnknownChromosome(chr_k))
    }

    /// `.seg` rows of every IBD segment of `report`.
    ///
    /// # Errors
    /// If `report` refers to a person or chromosome absent from the simulation.
    pub fn seg_rows(&self, report: &IbdReport) -> Result<Vec<SegRow<'a>>> {
        report.segments().map(|segment| {
            let chr_map = self.chromosome(segment.chr_k)?;
            Ok(SegRow{
                id1     : &self.person(&segment.id1)?.name,
                id2     : &self.person(&segment.id2)?.name,
                chr     : chr_map.chr(),
                start_bp: chr_map.genetic_to_genomic(segment.start, Sex::Unknown),
                end_bp  : chr_map.genetic_to_genomic(segment.end, Sex::Unknown),
                kind    : segment.kind,
                start_cm: segment.start,
                end_cm  : segment.end,
            })
        }).collect::<Result<Vec<_>, OutputError>>()
            .loc("While formatting IBD segments")
    }

    /// `.mrca` rows of every MRCA annotation of `report`.
    ///
    /// # Errors
    /// If `report` refers to a person or chromosome absent from the simulation.
    pub fn mrca_rows(&self, report: &IbdReport) -> Result<Vec<MrcaRow<'a>>> {
        report.mrca().iter().map(|record| {
            let chr_map = self.chromosome(record.chr_k)?;
            let mrca = self.person(&record.mrca)?;
            Ok(MrcaRow{
                id1       : &self.person(&record.id1)?.name,
                id2       : &self.person(&record.id2)?.name,
                chr       : chr_map.chr(),
                start_bp  : chr_map.genetic_to_genomic(record.start, Sex::Unknown),
                end_bp    : chr_map.genetic_to_genomic(record.end, Sex::Unknown),
                hap       : record.hap,
                mrca      : &mrca.name,
                generation: mrca.id.gen + 1,
                meioses   : record.meioses,
            })
        }).collect::<Result<Vec<_>, OutputError>>()
            .loc("While formatting MRCA annotations")
    }

    /// `.bp` rows of every sampled person: one row per haplotype copy.
    #[must_use]
    pub fn bp_rows(&self) -> Vec<BpRow<'a>> {
        self.simulation.pedigrees.sampled()
            .flat_map(|person| (0..2).map(move |copy| (person, copy)))
            .map(|(person, copy)| {
                let chromosomes = self.chromosomes.iter().enumerate().filter_map(|(chr_k, chr_map)| {
                    let segments = person.copy(chr_k, copy);
                    let first = segments.first()?;
                    let ends = segments.iter()
                        .map(|seg| (seg.hap, chr_map.genetic_to_genomic(seg.end, Sex::Unknown)))
                        .collect();
                    Some(BpChromosome{chr: chr_map.chr(), start_bp: chr_map.genetic_to_genomic(first.start, Sex::Unknown), ends})
                }).collect();
                BpRow{name: &person.name, sex: person.sex, copy, chromosomes}
            })
            .collect()
    }

    /// `.fam` rows of every simulated person, sampled or not.
    ///
    /// # Errors
    /// If a parent of some person is absent from the simulation.
    pub fn fam_rows(&self) -> Result<Vec<FamRow<'a>>> {
        self.simulation.pedigrees.families().flat_map(|family| {
            family.persons().map(move |person| {
                let parent = |id: Option<PersonId>| id.map(|id| self.person(&id).map(|p| p.name.as_str())).transpose();
                Ok(FamRow{
                    fid   : &family.id,
                    iid   : &person.name,
                    father: parent(person.father())?,
                    mother: parent(person.mother())?,
                    sex   : person.sex,
                })
            })
        }).collect::<Result<Vec<_>, OutputError>>()
            .loc("While formatting pedigree members")
    }
}

/// A row of the `.seg` file.
#[derive(Debug, Clone, PartialEq)]
pub struct SegRow<'a> {
    pub id1     : &'a str,
    pub id2     : &'a str,
    pub chr     : ChrIdx,
    pub start_bp: Position,
    pub end_bp  : Position,
    pub kind    : IbdType,
    pub start_cm: f64,
    pub end_cm  : f64,
}

impl Display for SegRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{: <20} - {: <20} - {: <2} - {: >10} - {: >10} - {: <4} - {: >11.6} - {: >11.6} - {:.6}",
            self.id1, self.id2, self.chr, self.start_bp, self.end_bp, self.kind,
            self.start_cm, self.end_cm, self.end_cm - self.start_cm
        )
    }
}

/// A row of the `.mrca` file.
#[derive(Debug, Clone, PartialEq)]
pub struct MrcaRow<'a> {
    pub id1       : &'a str,
    pub id2       : &'a str,
    pub chr       : ChrIdx,
    pub start_bp  : Position,
    pub end_bp    : Position,
    pub hap       : HapNum,
    pub mrca      : &'a str,
    pub generation: usize,
    pub meioses   : usize,
}

impl Display for MrcaRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{: <20} - {: <20} - {: <2} - {: >10} - {: >10} - {: >6} - {: <20} - {: >3} - {}",
            self.id1, self.id2, self.chr, self.start_bp, self.end_bp, self.hap, self.mrca, self.generation, self.meioses
        )
    }
}

/// Physical layout of one haplotype copy on one chromosome.
#[derive(Debug, Clone, PartialEq)]
pub struct BpChromosome {
    pub chr     : ChrIdx,
    pub start_bp: Position,
    pub ends    : Vec<(HapNum, Position)>,
}

impl Display for BpChromosome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.chr, self.start_bp)?;
        for (hap, end) in &self.ends {
            write!(f, " {hap}:{end}")?;
        }
        Ok(())
    }
}

/// A row of the `.bp` file: `<id> s<sex> h<copy> <chr>|<start> <hap>:<end> ...`, with `s0` for males.
#[derive(Debug, Clone, PartialEq)]
pub struct BpRow<'a> {
    pub name       : &'a str,
    pub sex        : Sex,
    pub copy       : u8,
    pub chromosomes: Vec<BpChromosome>,
}

impl Display for BpRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} s{} h{}", self.name, self.sex.index().unwrap_or(0), self.copy)?;
        for chromosome in &self.chromosomes {
            write!(f, " {chromosome}")?;
        }
        Ok(())
    }
}

/// A row of the PLINK `.fam` file. Founders carry `0` as parents.
#[derive(Debug, Clone, PartialEq)]
pub struct FamRow<'a> {
    pub fid   : &'a str,
    pub iid   : &'a str,
    pub father: Option<&'a str>,
    pub mother: Option<&'a str>,
    pub sex   : Sex,
}

impl Display for FamRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{: <16} - {: <24} - {: <24} - {: <24} - {} - -9",
            self.fid, self.iid, self.father.unwrap_or("0"), self.mother.unwrap_or("0"), self.sex.fam_code()
        )
    }
}

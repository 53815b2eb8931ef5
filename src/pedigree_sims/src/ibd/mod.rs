use std::{collections::BTreeMap, fmt::{self, Display, Formatter}};

use ahash::AHashMap;
use log::{debug, info};

use crate::{pedigree::PersonId, simulator::Simulation};

pub mod intervals;
use intervals::{intersect, merge_gaps, subtract, union, Interval};

mod sweep;
pub use sweep::{shared_pieces, SharedPiece};

mod mrca;
pub use mrca::{find_mrca, lineage, MrcaRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IbdType {
    Ibd1,
    Ibd2,
    Hbd,
}

impl Display for IbdType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ibd1 => "IBD1",
            Self::Ibd2 => "IBD2",
            Self::Hbd  => "HBD",
        };
        label.fmt(f)
    }
}

/// A merged IBD segment, in reference-track cM. For `Hbd` segments, `id1 == id2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IbdSegment {
    pub id1  : PersonId,
    pub id2  : PersonId,
    pub chr_k: usize,
    pub kind : IbdType,
    pub start: f64,
    pub end  : f64,
}

impl IbdSegment {
    #[must_use]
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// IBD detection settings.
/// - `merge_gap`: segments separated by at most this distance (cM) are merged.
/// - `mrca`     : whether MRCA annotations should be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IbdOptions {
    pub merge_gap: f64,
    pub mrca     : bool,
}

impl Default for IbdOptions {
    fn default() -> Self {
        Self{merge_gap: 0.0, mrca: false}
    }
}

/// Coverage of a pair on a chromosome, per copy pair: `[copy of id1][copy of id2]`.
type CopyCoverage = [[Vec<Interval>; 2]; 2];

/// Pairwise IBD sharing between every sampled individual.
#[derive(Debug, Clone, Default)]
pub struct IbdReport {
    pairs: BTreeMap<(PersonId, PersonId), Vec<IbdSegment>>,
    mrca : Vec<MrcaRecord>,
}

impl IbdReport {
    /// Locate IBD1, IBD2 and HBD segments among sampled individuals of `simulation`.
    #[must_use]
    pub fn locate(simulation: &Simulation, options: &IbdOptions) -> Self {
        let pedigrees = &simulation.pedigrees;
        let retained = |id: &PersonId| pedigrees.get(id).map_or(false, |person| person.sampled);

        // ---- Sweep the carriers of every founder haplotype.
        let mut pieces = Vec::new();
        for (hap, chr_k, records) in simulation.carriers.iter() {
            shared_pieces(records, hap, chr_k, retained, &mut pieces);
        }
        debug!("Found {} shared haplotype pieces", pieces.len());

        let mut coverage: AHashMap<(PersonId, PersonId, usize), CopyCoverage> = AHashMap::new();
        let mut hbd: AHashMap<(PersonId, usize), Vec<Interval>> = AHashMap::new();
        for piece in &pieces {
            if piece.is_hbd() {
                hbd.entry((piece.a, piece.chr_k)).or_default().push((piece.start, piece.end));
            } else {
                let copies = coverage.entry((piece.a, piece.b, piece.chr_k)).or_default();
                copies[usize::from(piece.copy_a)][usize::from(piece.copy_b)].push((piece.start, piece.end));
            }
        }

        let mut pairs: BTreeMap<(PersonId, PersonId), Vec<IbdSegment>> = BTreeMap::new();
        for ((id1, id2, chr_k), copies) in coverage {
            let [[s00, s01], [s10, s11]] = copies.map(|row| row.map(union));
            let ibd2 = union([intersect(&s00, &s11), intersect(&s01, &s10)].concat());
            let region = union([s00, s01, s10, s11].concat());

            let ibd2 = merge_gaps(ibd2, options.merge_gap);
            let ibd1 = subtract(&merge_gaps(region, options.merge_gap), &ibd2);

            let segments = pairs.entry((id1, id2)).or_default();
            for (kind, set) in [(IbdType::Ibd1, ibd1), (IbdType::Ibd2, ibd2)] {
                segments.extend(set.into_iter().map(|(start, end)| IbdSegment{id1, id2, chr_k, kind, start, end}));
            }
        }
        for ((id, chr_k), intervals) in hbd {
            let segments = pairs.entry((id, id)).or_default();
            for (start, end) in merge_gaps(intervals, options.merge_gap) {
                segments.push(IbdSegment{id1: id, id2: id, chr_k, kind: IbdType::Hbd, start, end});
            }
        }
        for segments in pairs.values_mut() {
            segments.sort_by(|a, b| (a.chr_k, a.kind).cmp(&(b.chr_k, b.kind)).then(a.start.total_cmp(&b.start)));
        }

        let mut mrca: Vec<MrcaRecord> = if options.mrca {
            pieces.iter().filter(|piece| !piece.is_hbd()).filter_map(|piece| find_mrca(pedigrees, piece)).collect()
        } else {
            Vec::new()
        };
        mrca.sort_by(|a, b| (a.id1, a.id2, a.chr_k).cmp(&(b.id1, b.id2, b.chr_k)).then(a.start.total_cmp(&b.start)));

        let report = Self{pairs, mrca};
        info!("Located {} IBD segments across {} pairs", report.len(), report.num_pairs());
        report
    }

    /// Segments shared by `a` and `b`, regardless of their order. `between(a, a)` yields the HBD segments of `a`.
    #[must_use]
    pub fn between(&self, a: &PersonId, b: &PersonId) -> &[IbdSegment] {
        let key = if a <= b { (*a, *b) } else { (*b, *a) };
        self.pairs.get(&key).map_or(&[][..], Vec::as_slice)
    }

    /// Every segment, ordered by pair, chromosome, type and position.
    pub fn segments(&self) -> impl Iterator<Item = &IbdSegment> {
        self.pairs.values().flatten()
    }

    #[must_use]
    pub fn mrca(&self) -> &[MrcaRecord] {
        &self.mrca
    }

    /// Number of pairs (or individuals, for HBD) sharing at least one segment.
    #[must_use]
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

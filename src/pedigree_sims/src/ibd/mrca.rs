use crate::pedigree::{HapNum, Pedigrees, Person, PersonId};

use super::SharedPiece;

/// Most recent common ancestor explaining a shared piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MrcaRecord {
    pub id1    : PersonId,
    pub id2    : PersonId,
    pub chr_k  : usize,
    pub hap    : HapNum,
    pub start  : f64,
    pub end    : f64,
    pub mrca   : PersonId,
    pub meioses: usize,
}

/// Ancestors through which `person` inherited haplotype `hap` at position `pos`, starting with `person`
/// itself, and ending with the founder of `hap`.
#[must_use]
pub fn lineage(pedigrees: &Pedigrees, person: &Person, copy: u8, chr_k: usize, hap: HapNum, pos: f64) -> Vec<PersonId> {
    let mut path = vec![person.id];
    let (mut current, mut copy) = (person, copy);
    while let Some(parents) = current.parents {
        let Some(parent) = pedigrees.get(&parents[usize::from(copy & 1)]) else { break };
        let Some(parent_copy) = parent.carrying_copy(chr_k, hap, pos) else { break };
        path.push(parent.id);
        (current, copy) = (parent, parent_copy);
    }
    path
}

/// Locate the MRCA of a shared piece: the first ancestor of `piece.a` found within the lineage of `piece.b`,
/// at the midpoint of the piece. The number of meioses is the sum of both lineage depths.
#[must_use]
pub fn find_mrca(pedigrees: &Pedigrees, piece: &SharedPiece) -> Option<MrcaRecord> {
    let pos = piece.midpoint();
    let a = pedigrees.get(&piece.a)?;
    let b = pedigrees.get(&piece.b)?;
    let path_a = lineage(pedigrees, a, piece.copy_a, piece.chr_k, piece.hap, pos);
    let path_b = lineage(pedigrees, b, piece.copy_b, piece.chr_k, piece.hap, pos);

    path_a.iter().enumerate().find_map(|(depth_a, ancestor)| {
        path_b.iter().position(|other| other == ancestor).map(|depth_b| MrcaRecord{
            id1    : piece.a,
            id2    : piece.b,
            chr_k  : piece.chr_k,
            hap    : piece.hap,
            start  : piece.start,
            end    : piece.end,
            mrca   : *ancestor,
            meioses: depth_a + depth_b,
        })
    })
}

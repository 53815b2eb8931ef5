use std::fmt::{self, Display, Formatter};

use genome::Sex;

/// Founder haplotype number.
pub type HapNum = usize;

/// A piece of haplotype copy, inherited from a single founder haplotype.
/// `start` and `end` are reference-track genetic positions (cM), `end` being exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub hap  : HapNum,
    pub start: f64,
    pub end  : f64,
}

impl Segment {
    #[must_use]
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[must_use]
    pub fn contains(&self, pos: f64) -> bool {
        self.start <= pos && pos < self.end
    }
}

/// Address of a person within the `Pedigrees` arena. Every index is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersonId {
    pub ped   : usize,
    pub fam   : usize,
    pub gen   : usize,
    pub branch: usize,
    pub ind   : usize,
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[ped {} fam {} g{}-b{}-#{}]", self.ped, self.fam + 1, self.gen + 1, self.branch + 1, self.ind + 1)
    }
}

/// Both haplotype copies of a single chromosome: `[paternal, maternal]`.
pub type ChromosomePair = [Vec<Segment>; 2];

/// A simulated individual.
/// # Fields
/// - `name`       : sample id (e.g. `first-cousins3_g2-b1-i1`).
/// - `parents`    : `[father, mother]`, or `None` for founders.
/// - `sampled`    : whether this individual is printed in the outputs.
/// - `chromosomes`: haplotype copies of every chromosome, in genetic map order.
#[derive(Debug, Clone)]
pub struct Person {
    pub id         : PersonId,
    pub name       : String,
    pub sex        : Sex,
    pub parents    : Option<[PersonId; 2]>,
    pub sampled    : bool,
    pub chromosomes: Vec<ChromosomePair>,
}

impl Person {
    #[must_use]
    pub fn is_founder(&self) -> bool {
        self.parents.is_none()
    }

    #[must_use]
    pub fn father(&self) -> Option<PersonId> {
        self.parents.map(|[father, _]| father)
    }

    #[must_use]
    pub fn mother(&self) -> Option<PersonId> {
        self.parents.map(|[_, mother]| mother)
    }

    /// Segments of a given haplotype copy (0: paternal, 1: maternal) of the `chr_k`-th chromosome.
    #[must_use]
    pub fn copy(&self, chr_k: usize, copy: u8) -> &[Segment] {
        self.chromosomes.get(chr_k).map_or(&[][..], |pair| pair[usize::from(copy)].as_slice())
    }

    /// Founder haplotype carried at genetic position `pos` on a given copy.
    #[must_use]
    pub fn hap_at(&self, chr_k: usize, copy: u8, pos: f64) -> Option<HapNum> {
        let segments = self.copy(chr_k, copy);
        let idx = segments.partition_point(|seg| seg.end <= pos);
        segments.get(idx).filter(|seg| seg.contains(pos)).map(|seg| seg.hap)
    }

    /// Which copy carries founder haplotype `hap` at position `pos`, if any.
    #[must_use]
    pub fn carrying_copy(&self, chr_k: usize, hap: HapNum, pos: f64) -> Option<u8> {
        (0..2).find(|&copy| self.hap_at(chr_k, copy, pos) == Some(hap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Person {
        let id = PersonId{ped: 0, fam: 0, gen: 1, branch: 0, ind: 0};
        let chromosomes = vec![[
            vec![Segment{hap: 0, start: 0.0, end: 40.0}, Segment{hap: 1, start: 40.0, end: 100.0}],
            vec![Segment{hap: 2, start: 0.0, end: 100.0}],
        ]];
        Person{id, name: "test1_g2-b1-i1".to_string(), sex: Sex::Female, parents: None, sampled: true, chromosomes}
    }

    #[test]
    fn haplotype_lookup() {
        let person = person();
        assert_eq!(person.hap_at(0, 0, 0.0), Some(0));
        assert_eq!(person.hap_at(0, 0, 39.9), Some(0));
        assert_eq!(person.hap_at(0, 0, 40.0), Some(1));
        assert_eq!(person.hap_at(0, 0, 100.0), None);
        assert_eq!(person.hap_at(1, 0, 10.0), None);
        assert_eq!(person.carrying_copy(0, 2, 55.0), Some(1));
        assert_eq!(person.carrying_copy(0, 0, 55.0), None);
    }

    #[test]
    fn person_id_ordering() {
        let a = PersonId{ped: 0, fam: 1, gen: 0, branch: 3, ind: 0};
        let b = PersonId{ped: 0, fam: 1, gen: 1, branch: 0, ind: 0};
        assert!(a < b);
        assert_eq!(b.to_string(), "[ped 0 fam 2 g2-b1-#1]");
    }
}

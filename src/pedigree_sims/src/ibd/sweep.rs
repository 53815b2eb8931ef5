use crate::{pedigree::{HapNum, PersonId}, simulator::InheritRecord};

/// Overlap of two carriers of the same founder haplotype.
/// `(a, copy_a)` is always lower than or equal to `(b, copy_b)`. When `a == b`, both copies of a single
/// individual carry the haplotype (homozygosity by descent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedPiece {
    pub a     : PersonId,
    pub copy_a: u8,
    pub b     : PersonId,
    pub copy_b: u8,
    pub hap   : HapNum,
    pub chr_k : usize,
    pub start : f64,
    pub end   : f64,
}

impl SharedPiece {
    #[must_use]
    pub fn is_hbd(&self) -> bool {
        self.a == self.b
    }

    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Emit every pairwise overlap between carriers of haplotype `hap` on the `chr_k`-th chromosome.
/// Only records for which `retained` returns `true` are considered.
///
/// Records are swept by increasing start position while maintaining the set of records still open;
/// each record is compared with open records only.
pub fn shared_pieces<F>(records: &[InheritRecord], hap: HapNum, chr_k: usize, retained: F, out: &mut Vec<SharedPiece>)
where F: Fn(&PersonId) -> bool
{
    let mut sorted: Vec<&InheritRecord> = records.iter().filter(|record| retained(&record.person)).collect();
    sorted.sort_by(|x, y| {
        x.start.total_cmp(&y.start).then_with(|| (x.person, x.copy).cmp(&(y.person, y.copy)))
    });

    let mut active: Vec<&InheritRecord> = Vec::new();
    for record in sorted {
        active.retain(|open| open.end > record.start);
        for open in &active {
            let end = open.end.min(record.end);
            if end <= record.start {
                continue
            }
            let (first, second) = if (open.person, open.copy) <= (record.person, record.copy) { (*open, record) } else { (record, *open) };
            out.push(SharedPiece{
                a: first.person, copy_a: first.copy,
                b: second.person, copy_b: second.copy,
                hap, chr_k, start: record.start, end,
            });
        }
        active.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(ind: usize) -> PersonId {
        PersonId{ped: 0, fam: 0, gen: 1, branch: 0, ind}
    }

    fn record(ind: usize, copy: u8, start: f64, end: f64) -> InheritRecord {
        InheritRecord{person: id(ind), copy, start, end}
    }

    #[test]
    fn overlaps_are_found_once() {
        let records = vec![
            record(2, 0, 30.0, 80.0),
            record(0, 1, 0.0, 50.0),
            record(1, 0, 40.0, 100.0),
            record(0, 1, 90.0, 100.0),
        ];
        let mut pieces = Vec::new();
        shared_pieces(&records, 3, 0, |_| true, &mut pieces);

        let summary: Vec<_> = pieces.iter().map(|p| (p.a.ind, p.b.ind, p.start, p.end)).collect();
        assert_eq!(summary, vec![(0, 2, 30.0, 50.0), (0, 1, 40.0, 50.0), (1, 2, 40.0, 80.0), (0, 1, 90.0, 100.0)]);
        assert!(pieces.iter().all(|p| p.hap == 3 && !p.is_hbd()));
    }

    #[test]
    fn touching_records_do_not_overlap() {
        let records = vec![record(0, 0, 0.0, 50.0), record(1, 0, 50.0, 100.0)];
        let mut pieces = Vec::new();
        shared_pieces(&records, 0, 0, |_| true, &mut pieces);
        assert!(pieces.is_empty());
    }

    #[test]
    fn homozygosity_and_filtering() {
        let records = vec![record(0, 0, 0.0, 60.0), record(0, 1, 20.0, 100.0), record(1, 1, 0.0, 100.0)];
        let mut pieces = Vec::new();
        shared_pieces(&records, 0, 0, |person| person.ind == 0, &mut pieces);
        assert_eq!(pieces.len(), 1);
        assert!(pieces[0].is_hbd());
        assert_eq!((pieces[0].copy_a, pieces[0].copy_b, pieces[0].start, pieces[0].end), (0, 1, 20.0, 60.0));
    }
}

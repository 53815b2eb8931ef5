use std::iter::once;

use crate::pedigree::Segment;

/// Build a gamete by switching between the two parental copies at every breakpoint.
///
/// # Arguments
/// - `copies`     : both parental copies, each partitioning `span`.
/// - `first_copy` : index of the copy transmitted from `span.0` up to the first breakpoint.
/// - `breakpoints`: sorted crossover positions, strictly within `span`.
/// - `span`       : genetic span of the chromosome.
///
/// Adjacent pieces of the same founder haplotype are merged.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn recombine(copies: [&[Segment]; 2], first_copy: u8, breakpoints: &[f64], span: (f64, f64)) -> Vec<Segment> {
    let (start, end) = span;
    let bounds: Vec<f64> = once(start).chain(breakpoints.iter().copied()).chain(once(end)).collect();

    let mut gamete: Vec<Segment> = Vec::with_capacity(breakpoints.len() + 1);
    for (i, window) in bounds.windows(2).enumerate() {
        let (lo, hi) = (window[0], window[1]);
        let source = copies[usize::from(first_copy & 1) ^ (i % 2)];
        let from = source.partition_point(|seg| seg.end <= lo);
        for seg in source[from..].iter().take_while(|seg| seg.start < hi) {
            let piece = Segment{hap: seg.hap, start: seg.start.max(lo), end: seg.end.min(hi)};
            if piece.is_empty() {
                continue
            }
            match gamete.last_mut() {
                Some(last) if last.hap == piece.hap && last.end == piece.start => last.end = piece.end,
                _ => gamete.push(piece),
            }
        }
    }
    gamete
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SPAN: (f64, f64) = (0.0, 100.0);

    fn seg(hap: usize, start: f64, end: f64) -> Segment {
        Segment{hap, start, end}
    }

    #[test]
    fn no_breakpoint() {
        let (paternal, maternal) = (vec![seg(0, 0.0, 100.0)], vec![seg(1, 0.0, 100.0)]);
        assert_eq!(recombine([&paternal, &maternal], 1, &[], SPAN), maternal);
        assert_eq!(recombine([&paternal, &maternal], 0, &[], SPAN), paternal);
    }

    #[test]
    fn switch_at_each_breakpoint() {
        let (paternal, maternal) = (vec![seg(0, 0.0, 100.0)], vec![seg(1, 0.0, 100.0)]);
        let gamete = recombine([&paternal, &maternal], 0, &[25.0, 60.0], SPAN);
        assert_eq!(gamete, vec![seg(0, 0.0, 25.0), seg(1, 25.0, 60.0), seg(0, 60.0, 100.0)]);
    }

    #[test]
    fn mosaic_parents_are_clipped_and_merged() {
        let paternal = vec![seg(0, 0.0, 30.0), seg(1, 30.0, 100.0)];
        let maternal = vec![seg(2, 0.0, 50.0), seg(1, 50.0, 100.0)];
        // maternal [0, 10[, paternal [10, 70[, maternal [70, 100[
        let gamete = recombine([&paternal, &maternal], 1, &[10.0, 70.0], SPAN);
        assert_eq!(gamete, vec![seg(2, 0.0, 10.0), seg(0, 10.0, 30.0), seg(1, 30.0, 100.0)]);
    }

    #[test]
    fn gamete_partitions_the_span() {
        let paternal = vec![seg(0, 0.0, 12.5), seg(3, 12.5, 80.0), seg(0, 80.0, 100.0)];
        let maternal = vec![seg(1, 0.0, 45.0), seg(2, 45.0, 100.0)];
        let gamete = recombine([&paternal, &maternal], 0, &[5.0, 12.5, 47.0, 81.0, 99.0], SPAN);
        assert_eq!(gamete.first().map(|s| s.start), Some(0.0));
        assert_eq!(gamete.last().map(|s| s.end), Some(100.0));
        assert!(gamete.windows(2).all(|w| w[0].end == w[1].start && w[0].hap != w[1].hap));
    }
}

//! Operations over sets of half-open genetic intervals `[start, end[`.
//!
//! A set is *normalized* when its intervals are sorted, non-empty and disjoint, with a strictly positive
//! gap between consecutive intervals. Every operation below expects and returns normalized sets.

pub type Interval = (f64, f64);

/// Sort raw intervals and fuse every pair separated by a gap of at most `gap` cM.
/// Touching or overlapping intervals are always fused.
#[must_use]
pub fn merge_gaps(mut intervals: Vec<Interval>, gap: f64) -> Vec<Interval> {
    intervals.retain(|(start, end)| end > start);
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start - last.1 <= gap => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Normalize a raw set of intervals.
#[must_use]
pub fn union(intervals: Vec<Interval>) -> Vec<Interval> {
    merge_gaps(intervals, 0.0)
}

/// Intersection of two normalized sets.
#[must_use]
pub fn intersect(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let start = a[i].0.max(b[j].0);
        let end   = a[i].1.min(b[j].1);
        if end > start {
            out.push((start, end));
        }
        if a[i].1 < b[j].1 { i += 1 } else { j += 1 }
    }
    out
}

/// Difference `a - b` of two normalized sets.
#[must_use]
pub fn subtract(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut out = Vec::new();
    let mut j = 0;
    for &(start, end) in a {
        let mut cursor = start;
        while j < b.len() && b[j].1 <= cursor {
            j += 1;
        }
        let mut k = j;
        while k < b.len() && b[k].0 < end {
            if b[k].0 > cursor {
                out.push((cursor, b[k].0));
            }
            cursor = cursor.max(b[k].1);
            k += 1;
        }
        if cursor < end {
            out.push((cursor, end));
        }
    }
    out
}

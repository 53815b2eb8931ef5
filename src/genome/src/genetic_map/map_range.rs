use std::ops::Range;

/// Genetic map track. Sex-specific maps carry a female (default) and a male track. The reference
/// track is their average and is the coordinate system in which simulated haplotypes are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Female,
    Male,
    Reference,
}

/// A genetic map anchor point: physical position and its genetic position on each track.
/// Single-track maps duplicate their genetic position on both tracks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub pos: u32,
    pub cm : [f64; 2],
}

impl Anchor {
    pub fn new(pos: u32, female_cm: f64, male_cm: f64) -> Self {
        Self{pos, cm: [female_cm, male_cm]}
    }

    /// Genetic position of this anchor on the requested track.
    #[inline]
    pub fn cm(&self, track: Track) -> f64 {
        match track {
            Track::Female    => self.cm[0],
            Track::Male      => self.cm[1],
            Track::Reference => (self.cm[0] + self.cm[1]) / 2.0,
        }
    }
}

/// Linear piece of a genetic map, spanning two consecutive anchors.
/// # Fields
/// - `range`: 0-based [start, end[ physical coordinates of the piece.
/// - `start`: anchor opening the piece.
/// - `end`  : anchor closing the piece.
#[derive(Debug, Clone)]
pub struct MapRange {
    range: Range<u32>,
    start: Anchor,
    end  : Anchor,
}

impl MapRange {
    pub fn new(start: Anchor, end: Anchor) -> Self {
        Self{range: start.pos..end.pos, start, end}
    }

    /// Recombination rate of this piece, in cM per base pair.
    pub fn rate(&self, track: Track) -> f64 {
        let span = f64::from(self.range.end - self.range.start);
        (self.end.cm(track) - self.start.cm(track)) / span
    }

    /// Linear interpolation of the genetic position at physical position `pos`. Positions outside of
    /// the piece are extrapolated using the same rate.
    pub fn interpolate(&self, pos: f64, track: Track) -> f64 {
        self.start.cm(track) + (pos - f64::from(self.range.start)) * self.rate(track)
    }

    /// Inverse of [`MapRange::interpolate`]. Flat pieces return their closest boundary.
    pub fn locate(&self, cm: f64, track: Track) -> f64 {
        let (start_cm, end_cm) = (self.start.cm(track), self.end.cm(track));
        if end_cm <= start_cm {
            return f64::from(if cm >= end_cm { self.range.end } else { self.range.start })
        }
        let span = f64::from(self.range.end - self.range.start);
        f64::from(self.range.start) + (cm - start_cm) * span / (end_cm - start_cm)
    }
}

// Pieces are identified by their physical range. Required by `Lapper`.
impl PartialEq<MapRange> for MapRange {
    fn eq(&self, other: &Self) -> bool {
        self.range == other.range
    }
}

impl Eq for MapRange {}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    const ULPS: i64 = 2;

    fn range(start: u32, end: u32, cm: (f64, f64), male: (f64, f64)) -> MapRange {
        MapRange::new(Anchor::new(start, cm.0, male.0), Anchor::new(end, cm.1, male.1))
    }

    #[test]
    fn rate_per_track() {
        let piece = range(0, 1_000_000, (0.0, 2.0), (0.0, 1.0));
        assert!(approx_eq!(f64, piece.rate(Track::Female), 2e-6, ulps = ULPS));
        assert!(approx_eq!(f64, piece.rate(Track::Male), 1e-6, ulps = ULPS));
        assert!(approx_eq!(f64, piece.rate(Track::Reference), 1.5e-6, ulps = ULPS));
    }

    #[test]
    fn interpolate_and_extrapolate() {
        let piece = range(1000, 2000, (10.0, 20.0), (10.0, 20.0));
        assert!(approx_eq!(f64, piece.interpolate(1500.0, Track::Female), 15.0, ulps = ULPS));
        assert!(approx_eq!(f64, piece.interpolate(2500.0, Track::Female), 25.0, ulps = ULPS));
        assert!(approx_eq!(f64, piece.interpolate(500.0, Track::Male), 5.0, ulps = ULPS));
    }

    #[test]
    fn locate_inverts_interpolate() {
        let piece = range(1000, 3000, (1.0, 5.0), (2.0, 3.0));
        for track in [Track::Female, Track::Male, Track::Reference] {
            for pos in (1000..=3000).step_by(250) {
                let cm = piece.interpolate(f64::from(pos), track);
                assert!(approx_eq!(f64, piece.locate(cm, track), f64::from(pos), epsilon = 1e-6));
            }
        }
    }

    #[test]
    fn locate_flat_piece() {
        let piece = range(100, 200, (3.0, 3.0), (3.0, 3.0));
        assert!(approx_eq!(f64, piece.locate(3.0, Track::Female), 200.0, ulps = ULPS));
        assert!(approx_eq!(f64, piece.locate(2.0, Track::Female), 100.0, ulps = ULPS));
    }
}

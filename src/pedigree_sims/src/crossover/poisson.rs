use rand::Rng;
use rand_distr::{Distribution, Poisson};

use genome::CENTIMORGANS_PER_MORGAN;

use super::{BreakpointGenerator, Meiosis, MeiosisRequest};

/// Crossover-interference free model: crossovers form a homogeneous Poisson process of rate 1 per Morgan.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoissonModel;

impl PoissonModel {
    /// Draw the number of crossovers expected over `length` cM.
    pub(super) fn count<R: Rng + ?Sized>(length: f64, rng: &mut R) -> usize {
        match Poisson::new(length / CENTIMORGANS_PER_MORGAN) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Ok(dist) => dist.sample(rng) as usize,
            Err(_)   => 0,  // zero (or invalid) length.
        }
    }

    /// Draw `count` positions uniformly over [0, length[
    pub(super) fn uniform<R: Rng + ?Sized>(count: usize, length: f64, rng: &mut R) -> impl Iterator<Item = f64> + '_ {
        (0..count).map(move |_| rng.gen::<f64>() * length)
    }
}

impl BreakpointGenerator for PoissonModel {
    fn generate<R: Rng + ?Sized>(&self, request: &MeiosisRequest, rng: &mut R) -> Meiosis {
        let first_copy = u8::from(rng.gen_bool(0.5));
        let count = Self::count(request.length, rng);
        let breakpoints = Self::uniform(count, request.length, rng).collect();
        Meiosis::new(first_copy, breakpoints, request.length)
    }
}

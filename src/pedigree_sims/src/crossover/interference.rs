use std::{collections::BTreeMap, io::BufRead};

use rand::Rng;
use rand_distr::{Distribution, Gamma};
use log::{debug, warn};

use genome::{ChrIdx, GeneticMap, Sex, CENTIMORGANS_PER_MORGAN};
use located_error::prelude::*;

use super::{data_lines, BreakpointGenerator, CrossoverError, Meiosis, MeiosisRequest, PoissonModel};

/// Parameters of the gamma model with escape (Housworth & Stahl, 2003).
/// # Fields
/// - `nu`: shape of the gamma distribution between chiasmata. `nu = 1` means no interference.
/// - `p` : fraction of crossovers escaping interference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterferenceParams {
    pub nu: f64,
    pub p : f64,
}

/// Sampling distributions of the interfering pathway, in Morgans.
#[derive(Debug, Clone)]
struct Chiasmata {
    gap  : Gamma<f64>,
    first: Gamma<f64>,
}

#[derive(Debug, Clone)]
struct SexModel {
    params   : InterferenceParams,
    chiasmata: Option<Chiasmata>,
}

impl SexModel {
    fn new(params: InterferenceParams, line: usize) -> Result<Self, CrossoverError> {
        let chiasmata = if params.p < 1.0 {
            // Chiasmata density: 2(1-p) per Morgan. Half of them resolve into crossovers.
            let scale = 1.0 / (2.0 * params.nu * (1.0 - params.p));
            let invalid = |err: rand_distr::GammaError| CrossoverError::InvalidInterference{line, reason: err.to_string()};
            Some(Chiasmata{
                gap  : Gamma::new(params.nu, scale).map_err(invalid)?,
                first: Gamma::new(params.nu + 1.0, scale).map_err(invalid)?,
            })
        } else {
            None
        };
        Ok(Self{params, chiasmata})
    }

    fn crossovers<R: Rng + ?Sized>(&self, length: f64, rng: &mut R) -> Vec<f64> {
        let morgans = length / CENTIMORGANS_PER_MORGAN;
        let mut crossovers = Vec::new();

        // ---- Interfering pathway: stationary gamma renewal process. The first chiasma is drawn from
        //      the forward recurrence time distribution, i.e. uniformly within a length-biased gap.
        if let Some(chiasmata) = &self.chiasmata {
            let mut pos = rng.gen::<f64>() * chiasmata.first.sample(rng);
            while pos < morgans {
                if rng.gen_bool(0.5) {
                    crossovers.push(pos * CENTIMORGANS_PER_MORGAN);
                }
                pos += chiasmata.gap.sample(rng);
            }
        }

        // ---- Escape pathway: Poisson process of rate p per Morgan.
        if self.params.p > 0.0 {
            let count = PoissonModel::count(self.params.p * length, rng);
            crossovers.extend(PoissonModel::uniform(count, length, rng));
        }
        crossovers
    }
}

/// Crossover interference model, parameterized per chromosome and per sex.
#[derive(Debug, Clone)]
pub struct InterferenceModel {
    // Indexed through `Sex::index()`: 0 = male, 1 = female.
    chromosomes: BTreeMap<ChrIdx, [SexModel; 2]>,
}

impl InterferenceModel {
    /// Parse an interference file.
    /// ### File characteristics:
    /// - whitespace-separated fields, `#` comments, optional header.
    /// - columns: `<chr> <nu_male> <p_male> <nu_female> <p_female>`
    ///
    /// # Errors
    /// - `InvalidInterference` for malformed lines, duplicated chromosomes, `nu <= 0` or `p` outside of [0, 1]
    /// - `MalformedMapFile` if a chromosome of the file is absent from `map`.
    /// - `MissingInterference` if an autosome of `map` has no parameters.
    pub fn from_reader<R: BufRead>(reader: R, map: &GeneticMap) -> Result<Self> {
        let mut chromosomes = BTreeMap::new();
        let is_header = |fields: &[String]| fields[1..].iter().all(|field| field.parse::<f64>().is_err());
        for entry in data_lines(reader, is_header) {
            let (line, fields) = entry.loc("While reading interference file")?;
            let invalid = |reason: String| CrossoverError::InvalidInterference{line, reason};
            if fields.len() != 5 {
                return Err(invalid(format!("expected 5 fields (chr nu_male p_male nu_female p_female), found {}", fields.len())))
                    .loc("While parsing interference file")
            }

            let chr: ChrIdx = fields[0].parse().map_err(|_| invalid(format!("invalid chromosome '{}'", fields[0])))?;
            let mut params = [InterferenceParams{nu: 1.0, p: 0.0}; 2];
            for (sex_params, values) in params.iter_mut().zip(fields[1..].chunks(2)) {
                let nu = values[0].parse::<f64>().map_err(|_| invalid(format!("invalid nu '{}'", values[0])))?;
                let p  = values[1].parse::<f64>().map_err(|_| invalid(format!("invalid p '{}'", values[1])))?;
                if !(nu > 0.0 && nu.is_finite()) {
                    return Err(invalid(format!("nu must be a positive number, found {nu}"))).loc("While parsing interference file")
                }
                if !(0.0..=1.0).contains(&p) {
                    return Err(invalid(format!("p must lie within [0, 1], found {p}"))).loc("While parsing interference file")
                }
                *sex_params = InterferenceParams{nu, p};
            }

            let models = [SexModel::new(params[0], line)?, SexModel::new(params[1], line)?];
            if chromosomes.insert(chr, models).is_some() {
                return Err(invalid(format!("chromosome {chr} is defined multiple times"))).loc("While parsing interference file")
            }
        }

        map.require_chromosomes(chromosomes.keys().copied(), "interference file")
            .loc("While matching interference parameters against the genetic map")?;

        for chr in map.chromosomes().map(genome::ChromosomeMap::chr) {
            if chromosomes.contains_key(&chr) {
                continue
            }
            if map.is_x(chr) {
                warn!("No interference parameters for chromosome {chr}: its crossovers will follow a Poisson model.");
            } else {
                return Err(CrossoverError::MissingInterference(chr)).loc("While matching interference parameters against the genetic map")
            }
        }
        debug!("Read interference parameters for {} chromosome(s)", chromosomes.len());
        Ok(Self{chromosomes})
    }

    /// Interference parameters of a given chromosome and sex, if any.
    #[must_use]
    pub fn params(&self, chr: ChrIdx, sex: Sex) -> Option<InterferenceParams> {
        let idx = sex.index()?;
        self.chromosomes.get(&chr).map(|models| models[idx].params)
    }
}

impl BreakpointGenerator for InterferenceModel {
    fn generate<R: Rng + ?Sized>(&self, request: &MeiosisRequest, rng: &mut R) -> Meiosis {
        let model = self.chromosomes.get(&request.chr)
            .map(|models| &models[request.parent_sex.index().unwrap_or(1)]);
        match model {
            Some(model) => {
                let first_copy = u8::from(rng.gen_bool(0.5));
                let crossovers = model.crossovers(request.length, rng);
                Meiosis::new(first_copy, crossovers, request.length)
            },
            None => PoissonModel.generate(request, rng),
        }
    }
}

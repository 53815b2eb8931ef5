use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use genome::{ChrIdx, ChromosomeMap, GeneticMap, Sex};
use located_error::prelude::*;
use logger::Logger;

use crate::{
    crossover::{BreakpointGenerator, CrossoverModel, MeiosisRequest},
    pedigree::{BranchParents, ChromosomePair, Family, HapNum, PedigreeRun, Pedigrees, Person, PersonId, Segment, SexPlan, SimDetails},
};

mod error;
pub use error::SimulationError;

mod carriers;
pub use carriers::{FounderHaplotypes, HapCarriers, InheritRecord};

mod transmit;
pub use transmit::recombine;

/// Outcome of a transmission simulation.
/// # Fields
/// - `pedigrees`  : every simulated person.
/// - `carriers`   : every carrier of every founder haplotype, indexed by `[hap][chr_k]`.
/// - `founders`   : founder haplotype demand.
/// - `chromosomes`: simulated chromosomes. `chr_k` indices refer to this list.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub pedigrees  : Pedigrees,
    pub carriers   : HapCarriers,
    pub founders   : FounderHaplotypes,
    pub chromosomes: Vec<ChrIdx>,
}

/// A chromosome, as seen by the simulator.
struct ChromosomeInfo<'a> {
    map : &'a ChromosomeMap,
    is_x: bool,
    span: (f64, f64),
}

/// A family replicate to simulate.
#[derive(Debug, Clone, Copy)]
struct FamilyJob {
    ped      : usize,
    fam      : usize,
    stream   : u64,
    first_hap: HapNum,
}

struct FamilyOutcome {
    family  : Family,
    carriers: HapCarriers,
    founders: Vec<(Sex, HapNum)>,
}

/// Transmission simulator: drops founder haplotypes down every family replicate of every pedigree definition.
pub struct Simulator<'a> {
    chromosomes: Vec<ChromosomeInfo<'a>>,
    model      : &'a CrossoverModel,
    seed       : u64,
}

impl<'a> Simulator<'a> {
    #[must_use]
    pub fn new(map: &'a GeneticMap, model: &'a CrossoverModel, seed: u64) -> Self {
        let chromosomes = map.chromosomes().map(|chr_map| ChromosomeInfo{
            map : chr_map,
            is_x: map.is_x(chr_map.chr()),
            span: chr_map.span(Sex::Unknown),
        }).collect();
        Self{chromosomes, model, seed}
    }

    /// Simulate every family replicate of every definition, using `threads` worker threads.
    /// Output does not depend on `threads`.
    ///
    /// # Errors
    /// - `InvalidPedigreeDefinition` or `SexConstraintViolation` if a definition is invalid. Every
    ///   definition is validated before any random number is drawn.
    /// - `ThreadPool` if the thread pool cannot be built.
    /// - `SameSexParents` or `MissingParent` on internal inconsistencies.
    pub fn simulate(&self, definitions: &[SimDetails], threads: usize) -> Result<Simulation> {
        let plans = definitions.iter()
            .map(SimDetails::validate)
            .collect::<Result<Vec<SexPlan>, _>>()
            .loc("While validating pedigree definitions")?;

        // ---- Each family owns a contiguous range of founder haplotypes.
        let mut jobs = Vec::new();
        let mut first_hap = 0;
        for (ped, details) in definitions.iter().enumerate() {
            let founders = details.founders_per_family();
            debug!("Pedigree '{}': {} founder(s), {} sampled individual(s) per family", details.name, founders, details.sampled_per_family());
            for fam in 0..details.num_fams {
                jobs.push(FamilyJob{ped, fam, stream: jobs.len() as u64, first_hap});
                first_hap += 2 * founders;
            }
        }
        info!("Simulating {} families across {} pedigree definition(s), using seed {}", jobs.len(), definitions.len(), self.seed);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(SimulationError::ThreadPool)
            .loc("While building the simulation thread pool")?;

        let progress = Self::progress_bar(jobs.len() as u64);
        let outcomes = pool.install(|| {
            jobs.par_iter().map(|job| {
                let outcome = self.simulate_family(&definitions[job.ped], &plans[job.ped], job);
                progress.inc(1);
                outcome
            }).collect::<Result<Vec<FamilyOutcome>, SimulationError>>()
        }).loc("While simulating transmissions")?;
        progress.finish_and_clear();

        // ---- Gather families in definition order.
        let mut runs: Vec<PedigreeRun> = definitions.iter()
            .map(|details| PedigreeRun{name: details.name.clone(), families: Vec::with_capacity(details.num_fams)})
            .collect();
        let mut carriers = HapCarriers::new(0, self.chromosomes.len());
        let mut founders = FounderHaplotypes::default();
        for (job, outcome) in jobs.iter().zip(outcomes) {
            runs[job.ped].families.push(outcome.family);
            carriers.append(outcome.carriers);
            for (sex, hap) in outcome.founders {
                founders.push(sex, hap);
            }
        }
        info!("Simulation done: {} founder haplotypes, {} inherited segments", founders.total, carriers.len());

        Ok(Simulation{
            pedigrees  : Pedigrees{runs},
            carriers,
            founders,
            chromosomes: self.chromosomes.iter().map(|chr| chr.map.chr()).collect(),
        })
    }

    fn progress_bar(len: u64) -> ProgressBar {
        let progress = match Logger::multi() {
            Some(multi) => multi.add(ProgressBar::new(len)),
            None        => ProgressBar::hidden(),
        };
        if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} families") {
            progress.set_style(style);
        }
        progress
    }

    fn simulate_family(&self, details: &SimDetails, plan: &SexPlan, job: &FamilyJob) -> Result<FamilyOutcome, SimulationError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(job.stream);

        let primary_sexes = plan.draw(&mut rng);
        let family_id = Family::family_id(&details.name, job.fam);
        let mut carriers = HapCarriers::new(2 * details.founders_per_family(), self.chromosomes.len());
        let mut founders = Vec::new();
        let mut next_hap = job.first_hap;

        let mut generations: Vec<Vec<Vec<Person>>> = Vec::with_capacity(details.num_gens());
        for (gen, gen_details) in details.generations.iter().enumerate() {
            let mut branches = Vec::with_capacity(gen_details.branches.len());
            for (branch, branch_details) in gen_details.branches.iter().enumerate() {
                let layout = details.layout(gen, branch);
                let primary_sex = primary_sexes[gen][branch];
                let mut members = Vec::with_capacity(layout.len());
                for ind in 0..layout.len() {
                    let spouse = layout.is_spouse(ind);
                    let sex = match ind {
                        0 => primary_sex,
                        _ if spouse || layout.founder => primary_sex.opposite(),
                        _ => Sex::random(&mut rng),
                    };
                    let id = PersonId{ped: job.ped, fam: job.fam, gen, branch, ind};
                    let name = Family::sample_id(&family_id, gen, branch, ind, spouse);
                    let sampled = layout.is_sampled(ind);

                    let person = if layout.founder || spouse {
                        let hap = next_hap;
                        next_hap += 2;
                        founders.push((sex, hap));
                        Person{id, name, sex, parents: None, sampled, chromosomes: self.founder_chromosomes(sex, hap)}
                    } else {
                        let [father, mother] = Self::parents(&generations, branch_details.parents, details, gen, &name)?;
                        let chromosomes = self.child_chromosomes(&name, sex, [father, mother], &mut rng);
                        Person{id, name, sex, parents: Some([father.id, mother.id]), sampled, chromosomes}
                    };
                    carriers.record(&person, job.first_hap);
                    members.push(person);
                }
                branches.push(members);
            }
            generations.push(branches);
        }
        Ok(FamilyOutcome{family: Family{id: family_id, generations}, carriers, founders})
    }

    /// Trivial full-span copies, tagged with `hap` (paternal) and `hap + 1` (maternal).
    /// Males carry no paternal X copy.
    fn founder_chromosomes(&self, sex: Sex, hap: HapNum) -> Vec<ChromosomePair> {
        self.chromosomes.iter().map(|chr| {
            let (start, end) = chr.span;
            let paternal = if chr.is_x && sex == Sex::Male { Vec::new() } else { vec![Segment{hap, start, end}] };
            [paternal, vec![Segment{hap: hap + 1, start, end}]]
        }).collect()
    }

    /// Retrieve `[father, mother]` of a child belonging to the given branch.
    fn parents<'p>(generations: &'p [Vec<Vec<Person>>], parents: BranchParents, details: &SimDetails, gen: usize, child: &str) -> Result<[&'p Person; 2], SimulationError> {
        let previous = gen.checked_sub(1).and_then(|prev| generations.get(prev));
        let member = |branch: usize, ind: usize| {
            previous.and_then(|prev| prev.get(branch)).and_then(|members| members.get(ind))
                .ok_or_else(|| SimulationError::MissingParent{child: child.to_string(), parent: format!("g{gen}-b{}-#{}", branch + 1, ind + 1)})
        };
        let (first, second) = match parents {
            BranchParents::Single(p)   => (member(p, 0)?, member(p, details.layout(gen - 1, p).siblings)?),
            BranchParents::Union(p, q) => (member(p, 0)?, member(q, 0)?),
            BranchParents::Founder     => return Err(SimulationError::MissingParent{child: child.to_string(), parent: "none (founder branch)".to_string()}),
        };
        match (first.sex, second.sex) {
            (Sex::Male, Sex::Female) => Ok([first, second]),
            (Sex::Female, Sex::Male) => Ok([second, first]),
            _ => Err(SimulationError::SameSexParents{child: child.to_string(), first: first.name.clone(), second: second.name.clone()}),
        }
    }

    /// Perform one meiosis per parent and per chromosome: every paternal gamete first, then every maternal one.
    fn child_chromosomes<R: Rng + ?Sized>(&self, child: &str, sex: Sex, parents: [&Person; 2], rng: &mut R) -> Vec<ChromosomePair> {
        let [paternal, maternal] = parents.map(|parent| {
            self.chromosomes.iter().enumerate()
                .map(|(chr_k, chr)| self.gamete(child, sex, parent, chr_k, chr, rng))
                .collect::<Vec<_>>()
        });
        paternal.into_iter().zip(maternal).map(|(p, m)| [p, m]).collect()
    }

    fn gamete<R: Rng + ?Sized>(&self, child: &str, child_sex: Sex, parent: &Person, chr_k: usize, chr: &ChromosomeInfo, rng: &mut R) -> Vec<Segment> {
        // Fathers transmit their single X unchanged to daughters, and no tracked X to sons.
        if chr.is_x && parent.sex == Sex::Male {
            return match child_sex {
                Sex::Female => parent.copy(chr_k, 1).to_vec(),
                _           => Vec::new(),
            }
        }

        let request = MeiosisRequest{child, chr: chr.map.chr(), parent_sex: parent.sex, length: chr.map.genetic_length(parent.sex)};
        let meiosis = self.model.generate(&request, rng);

        // ---- Breakpoints are relative to the chromosome start, on the parent's track.
        let (track_start, _) = chr.map.span(parent.sex);
        let (start, end) = chr.span;
        let mut breakpoints: Vec<f64> = meiosis.breakpoints.iter()
            .map(|bp| chr.map.to_reference(track_start + bp, parent.sex))
            .filter(|&cm| cm > start && cm < end)
            .collect();
        breakpoints.dedup();

        recombine([parent.copy(chr_k, 0), parent.copy(chr_k, 1)], meiosis.first_copy, &breakpoints, chr.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::{crossover::{FixedCrossovers, PoissonModel}, pedigree::parse_defs};

    const MAP: &str = "1 0 0.0\n1 100000000 100.0\n2 0 0.0\n2 50000000 50.0\nX 0 0.0\nX 10000000 20.0\n";
    const DEFS: &str = "def three-gens 2 3\n1 2\n2 2\n3 1\n\ndef cousins 1 3\n1 0\n2 0 2\n3 1\n";

    fn map() -> GeneticMap {
        GeneticMap::from_reader(Cursor::new(MAP), ChrIdx::X).unwrap()
    }

    fn simulate(model: &CrossoverModel, seed: u64, threads: usize) -> Simulation {
        let map = map();
        let defs = parse_defs(Cursor::new(DEFS)).unwrap();
        Simulator::new(&map, model, seed).simulate(&defs, threads).unwrap()
    }

    #[test]
    fn founder_haplotypes_are_numbered_in_arena_order() {
        let simulation = simulate(&CrossoverModel::Poisson(PoissonModel), 1, 1);
        // three-gens: couple + spouse of g2-b1-i1, x2 families. cousins: couple + 2 spouses.
        assert_eq!(simulation.founders.num_founders(), 3 * 2 + 4);
        assert_eq!(simulation.founders.total, 20);
        assert_eq!(simulation.carriers.num_haps(), 20);

        let mut expected = 0;
        for founder in simulation.pedigrees.founders() {
            assert_eq!(founder.copy(0, 0)[0].hap, expected);
            assert_eq!(founder.copy(0, 1)[0].hap, expected + 1);
            expected += 2;
        }
    }

    #[test]
    fn children_partition_every_chromosome() {
        let simulation = simulate(&CrossoverModel::Poisson(PoissonModel), 42, 1);
        let total = simulation.founders.total;
        for person in simulation.pedigrees.persons() {
            for (chr_k, chr) in simulation.chromosomes.iter().enumerate() {
                for copy in 0..2 {
                    let segments = person.copy(chr_k, copy);
                    if *chr == ChrIdx::X && person.sex == Sex::Male && copy == 0 {
                        assert!(segments.is_empty(), "{}", person.name);
                        continue
                    }
                    let (start, end) = map().chromosome(*chr).unwrap().span(Sex::Unknown);
                    assert_eq!(segments.first().map(|s| s.start), Some(start));
                    assert_eq!(segments.last().map(|s| s.end), Some(end));
                    assert!(segments.windows(2).all(|w| w[0].end == w[1].start && w[0].hap != w[1].hap));
                    assert!(segments.iter().all(|s| s.hap < total && !s.is_empty()));
                }
            }
        }
    }

    #[test]
    fn sampled_individuals() {
        let simulation = simulate(&CrossoverModel::Poisson(PoissonModel), 3, 1);
        let names: Vec<&str> = simulation.pedigrees.sampled()
            .filter(|p| p.id.ped == 0 && p.id.fam == 0)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec![
            "three-gens1_g1-b1-i1", "three-gens1_g1-b1-s1",
            "three-gens1_g2-b1-i1", "three-gens1_g2-b1-i2",
            "three-gens1_g3-b1-i1",
        ]);
        assert!(simulation.pedigrees.find("three-gens1_g2-b1-s1").is_some_and(|p| !p.sampled && p.is_founder()));
    }

    #[test]
    fn deterministic_across_thread_counts() {
        let model = CrossoverModel::Poisson(PoissonModel);
        let (single, multi) = (simulate(&model, 7, 1), simulate(&model, 7, 4));
        let chromosomes = |sim: &Simulation| sim.pedigrees.persons().map(|p| p.chromosomes.clone()).collect::<Vec<_>>();
        assert_eq!(chromosomes(&single), chromosomes(&multi));
        assert_eq!(single.carriers.len(), multi.carriers.len());

        let other = simulate(&model, 8, 1);
        assert_ne!(chromosomes(&single), chromosomes(&other));
    }

    #[test]
    fn x_chromosome_transmission() {
        let simulation = simulate(&CrossoverModel::Fixed(FixedCrossovers::default()), 5, 1);
        let x = simulation.chromosomes.iter().position(|chr| *chr == ChrIdx::X).unwrap();
        for person in simulation.pedigrees.persons().filter(|p| !p.is_founder()) {
            let father = simulation.pedigrees.get(&person.father().unwrap()).unwrap();
            match person.sex {
                Sex::Male   => assert!(person.copy(x, 0).is_empty()),
                _           => assert_eq!(person.copy(x, 0), father.copy(x, 1)),
            }
        }
    }

    #[test]
    fn fixed_crossover_at_chromosome_start() {
        let map = map();
        let defs = parse_defs(Cursor::new("def trio 1 2\n1 2\n2 1\n")).unwrap();
        let fixed = FixedCrossovers::from_reader(Cursor::new("trio1_g2-b1-i1 F 1 0.0\n"), &map).unwrap();
        let model = CrossoverModel::Fixed(fixed);
        let simulation = Simulator::new(&map, &model, 11).simulate(&defs, 1).unwrap();

        let child = simulation.pedigrees.find("trio1_g2-b1-i1").unwrap();
        let [father, mother] = child.parents.unwrap().map(|id| simulation.pedigrees.get(&id).unwrap());
        // Maternal chromosome 1 switches to the second copy right away. Chromosome 2 is left untouched.
        assert_eq!(child.copy(0, 1), mother.copy(0, 1));
        assert_eq!(child.copy(1, 1), mother.copy(1, 0));
        assert_eq!(child.copy(0, 0), father.copy(0, 0));
    }

    #[test]
    fn parents_have_opposite_sexes() {
        let simulation = simulate(&CrossoverModel::Poisson(PoissonModel), 9, 2);
        for person in simulation.pedigrees.persons() {
            if let Some([father, mother]) = person.parents {
                assert_eq!(simulation.pedigrees.get(&father).map(|p| p.sex), Some(Sex::Male));
                assert_eq!(simulation.pedigrees.get(&mother).map(|p| p.sex), Some(Sex::Female));
            }
        }
    }
}

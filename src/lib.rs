use std::{path::{Path, PathBuf}, str::FromStr};

use log::{info, warn};

use genome::{ChrIdx, GeneticMap, Sex};
use located_error::prelude::*;
use parser::{Cli, Commands, Common, PedigreeSims};
use pedigree_sims::{
    def_parser, CrossoverError, CrossoverModel, IbdOptions, IbdReport, RowContext, Simulation, Simulator,
};
use pedsim_io::{read::SampleSexes, write::GenericWriter};

pub fn cite() {
    // If this ever becomes bloated, consider using the 'indoc' crate.
    const CITATIONS: &str = r###"
    A. If you plan to use pedsim-rs in your work, please cite the original
       publication of Ped-sim:

        1. Caballero M, Seidman DN, Qiao Y, Sannerud J, Dyer TD, Lehman DM,
           Curran JE, Duggirala R, Blangero J, Carmi S, Williams AL. Crossover
           interference and sex-specific genetic maps shape identical by
           descent sharing in close relatives. PLoS Genet. 2019; 15(12).
           https://doi.org/10.1371/journal.pgen.1007979


    B. If you plan to use the sex-specific genetic maps of Bhérer et al., please
       cite:

       1. Bhérer C, Campbell CL, Auton A. Refined genetic maps reveal sexual
          dimorphism in human meiotic recombination at multiple scales.
          Nat Commun. 2017; 8: 14994.
          https://doi.org/10.1038/ncomms14994


    C. If you plan to use the crossover interference model, please cite:

       1. Housworth EA, Stahl FW. Crossover interference in humans.
          Am J Hum Genet. 2003; 73(1): 188-197.
          https://doi.org/10.1086/376610

    "###;
    println!("{CITATIONS}");
}

/// Dispatch the requested subcommand.
///
/// # Errors
/// Any error raised along the simulation pipeline. See [`simulate`].
pub fn run(cli: Cli) -> Result<()> {
    match &cli.commands {
        Commands::Simulate{common, sim} => {
            simulate(common, sim)?;
            // ---- Only successful runs leave a replayable argument file behind.
            if let Some(path) = cli.serialize()? {
                info!("Command line arguments serialized into {}", path.display());
            }
        },
        Commands::FromYaml{..} => self::run(cli.resolve()?)?,
        Commands::Cite => cite(),
    };
    Ok(())
}

/// Run the full pipeline: parse inputs, simulate transmissions, locate IBD segments and write outputs.
///
/// # Errors
/// - `ConflictingCrossoverInputs` if both `--intf` and `--fixed-co` are provided.
/// - if any input file is invalid, or any output file cannot be written.
/// - `InsufficientRealSamples` if `--sexes` lists too few samples of either sex.
///
/// Nothing is written unless every output could be generated.
pub fn simulate(common: &Common, sim: &PedigreeSims) -> Result<()> {
    if sim.intf.is_some() && sim.fixed_co.is_some() {
        return Err(CrossoverError::ConflictingCrossoverInputs).loc("While parsing command line arguments")
    }

    // ----------------------------- Check outputs before doing any work.
    let outputs = OutputFiles::new(common, sim);
    for path in outputs.iter() {
        common.can_write_file(path)?;
    }

    // ----------------------------- Parse inputs.
    let chr_x = ChrIdx::from_str(&sim.chr_x).loc("While parsing --chr-x")?;
    info!("Parsing pedigree definitions in {}", sim.def.display());
    let definitions = def_parser(&sim.def)?;

    info!("Parsing genetic map in {}", sim.map.display());
    let map = GeneticMap::from_file(&sim.map, chr_x)?;
    info!("Genetic map: {} chromosome(s){}", map.num_chromosomes(), if map.is_sex_specific() { ", sex-specific" } else { "" });

    let model = CrossoverModel::from_files(sim.intf.as_deref(), sim.fixed_co.as_deref(), &map)?;

    let sexes = sim.sexes.as_ref().map(|path| SampleSexes::from_file(path)).transpose()?;
    if sexes.is_none() && map.have_x_map() {
        warn!("X chromosome map provided without a sexes file: the number of founders of each sex will not be checked");
    }

    // ----------------------------- Simulate.
    let simulation = Simulator::new(&map, &model, sim.seed).simulate(&definitions, sim.threads)?;
    if let Some(sexes) = &sexes {
        simulation.founders.validate_against(sexes.counts())
            .loc("While matching founders against the sexes file")?;
    }

    // ----------------------------- Locate IBD segments, and prepare every requested output.
    let options = IbdOptions{merge_gap: sim.ibd_merge_gap, mrca: sim.mrca};
    let report = IbdReport::locate(&simulation, &options);

    let context  = RowContext::new(&simulation, &map)?;
    let seg_rows = context.seg_rows(&report)?;
    let bp_rows  = outputs.bp.is_some().then(|| context.bp_rows());
    let mrca_rows = outputs.mrca.as_ref().map(|_| context.mrca_rows(&report)).transpose()?;
    let fam_rows  = outputs.fam.as_ref().map(|_| context.fam_rows()).transpose()?;

    // ----------------------------- Write outputs.
    write_rows(&outputs.seg, seg_rows, "IBD segments")?;
    if let (Some(path), Some(rows)) = (&outputs.bp, bp_rows) {
        write_rows(path, rows, "breakpoints")?;
    }
    if let (Some(path), Some(rows)) = (&outputs.mrca, mrca_rows) {
        write_rows(path, rows, "MRCA annotations")?;
    }
    if let (Some(path), Some(rows)) = (&outputs.fam, fam_rows) {
        write_rows(path, rows, "pedigree members")?;
    }

    report_founders(&simulation);
    Ok(())
}

/// Every output file requested by the user.
struct OutputFiles {
    seg : PathBuf,
    bp  : Option<PathBuf>,
    mrca: Option<PathBuf>,
    fam : Option<PathBuf>,
}

impl OutputFiles {
    fn new(common: &Common, sim: &PedigreeSims) -> Self {
        let optional = |requested: bool, suffix: &str| requested.then(|| common.output_file(suffix));
        Self{
            seg : common.output_file(".seg"),
            bp  : optional(sim.bp, ".bp"),
            mrca: optional(sim.mrca, ".mrca"),
            fam : optional(sim.fam, "-everyone.fam"),
        }
    }

    fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.seg).chain(self.bp.iter()).chain(self.mrca.iter()).chain(self.fam.iter())
    }
}

fn write_rows<I, T>(path: &Path, rows: I, what: &str) -> Result<()>
where   I: IntoIterator<Item = T>,
        T: std::fmt::Display,
{
    let mut writer = GenericWriter::new(Some(path))?;
    let written = writer.write_iter(rows)
        .with_loc(|| format!("While writing {what} into {}", path.display()))?;
    info!("Wrote {written} {what} into {}", path.display());
    Ok(())
}

fn report_founders(simulation: &Simulation) {
    let founders = &simulation.founders;
    info!("To simulate genetic data for all pedigrees, {} founder(s) are needed: {} male(s), {} female(s)",
        founders.num_founders(),
        founders.needed(Sex::Male),
        founders.needed(Sex::Female),
    );
}

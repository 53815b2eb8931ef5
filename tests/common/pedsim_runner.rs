use std::{fs, path::PathBuf};

use anyhow::Result;
use clap::Parser;

use super::Fixture;

/// Build a `pedsim-rs simulate` command line over copies of the `tests/test-data` fixtures.
#[derive(Default)]
pub struct PedsimRunnerBuilder {
    def     : Option<String>,
    map     : Option<String>,
    intf    : Option<String>,
    fixed_co: Option<String>,
    sexes   : Option<String>,
    seed    : Option<u64>,
    threads : Option<usize>,
    flags   : Vec<&'static str>,
}

impl PedsimRunnerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_def(mut self, def: &str) -> Self {
        self.def = Some(def.to_string());
        self
    }

    pub fn set_map(mut self, map: &str) -> Self {
        self.map = Some(map.to_string());
        self
    }

    pub fn set_intf(mut self, intf: &str) -> Self {
        self.intf = Some(intf.to_string());
        self
    }

    pub fn set_fixed_co(mut self, fixed_co: &str) -> Self {
        self.fixed_co = Some(fixed_co.to_string());
        self
    }

    pub fn set_sexes(mut self, sexes: &str) -> Self {
        self.sexes = Some(sexes.to_string());
        self
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn set_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn print_bp(mut self) -> Self {
        self.flags.push("--bp");
        self
    }

    pub fn print_mrca(mut self) -> Self {
        self.flags.push("--mrca");
        self
    }

    pub fn print_fam(mut self) -> Self {
        self.flags.push("--fam");
        self
    }

    pub fn build(self) -> PedsimRunner {
        let copy = |name: &Option<String>| name.as_deref().map(Fixture::copy);
        let def        = copy(&self.def).expect("Missing pedigree definition file");
        let map        = copy(&self.map).expect("Missing genetic map");
        let intf       = copy(&self.intf);
        let fixed_co   = copy(&self.fixed_co);
        let sexes      = copy(&self.sexes);
        let output_dir = Fixture::output_dir("pedsim-test-output");

        let mut args = format!("pedsim-rs simulate --def {def} --map {map} --output-dir {output_dir} --overwrite");
        for (flag, fixture) in [("--intf", &intf), ("--fixed-co", &fixed_co), ("--sexes", &sexes)] {
            if let Some(fixture) = fixture {
                args.push_str(&format!(" {flag} {fixture}"));
            }
        }
        args.push_str(&format!(" --seed {}", self.seed.unwrap_or(42)));
        args.push_str(&format!(" --threads {}", self.threads.unwrap_or(1)));
        for flag in &self.flags {
            args.push_str(&format!(" {flag}"));
        }

        PedsimRunner{args, output_dir, _inputs: [Some(def), Some(map), intf, fixed_co, sexes]}
    }
}

pub struct PedsimRunner {
    args      : String,
    output_dir: Fixture,
    _inputs   : [Option<Fixture>; 5],
}

impl PedsimRunner {
    pub fn try_run(&self) -> Result<()> {
        let cli = parser::Cli::parse_from(self.args.split_whitespace());
        pedsim_rs::run(cli)
    }

    pub fn run(&self) {
        self.try_run().unwrap_or_else(|err| panic!("{err:?}"));
    }

    pub fn output(&self, suffix: &str) -> PathBuf {
        self.output_dir.file(&format!("pedsim{suffix}"))
    }

    /// Sorted names of every file found in the output directory.
    pub fn written_files(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&*self.output_dir) else {
            return Vec::new()
        };
        let mut files: Vec<String> = entries
            .map(|entry| entry.expect("Failed to read output directory entry").file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        files
    }
}

use std::{
    fs::File,
    path::{Path, PathBuf},
    fmt::{self, Display, Formatter},
    ffi::OsStr,
};

use located_error::prelude::*;

use clap::{Parser, Subcommand, Args};
use serde::{Serialize, Deserialize};
use log::debug;

mod error;
pub use error::ParserError;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="pedsim-rs", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// pedsim-rs: simulate haplotype transmissions through pedigrees, and locate the resulting IBD segments.
pub struct Cli {
    ///Set the verbosity level (-v -vv -vvv)
    ///
    /// Set the verbosity level of this program. Multiple levels allowed {n}
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Note that the program will still output warnings by default, even when this flag is off.
    /// Use The --quiet/-q to disable them
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings.
    ///
    /// By default, warnings are emmited and redirected to the console, even when verbose mode is off.
    /// Use this argument to disable this. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli{
    /// Serialize command line arguments within a `.yaml` file.
    ///
    /// # Behavior
    /// - File naming follows the convention '{current time}-pedsim.yaml'. current time follows the format
    ///   `YYYY`-`MM`-`DD`T`hhmmss`
    /// - File is written at the root of the user-provided `--output-dir` folder.
    /// - Nothing is written for `from-yaml` and `cite`.
    ///
    /// # Errors
    /// - if `serde_yaml` fails to parse `Self` to a string.
    /// - if the output file cannot be written.
    pub fn serialize(&self) -> Result<Option<PathBuf>> {
        let Commands::Simulate{common, ..} = &self.commands else {
            return Ok(None)
        };

        // Parse arguments to yaml and print to console.
        let serialized = serde_yaml::to_string(&self)
            .map_err(ParserError::SerializeArgs)
            .loc("While serializing command line arguments")?;
        debug!("\n---- Command line args ----\n{}\n---", serialized);

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S").to_string();
        let path = common.output_dir.join(format!("{current_time}-pedsim.yaml"));
        std::fs::write(&path, serialized)
            .map_err(|err| ParserError::WriteArgs{path: path.clone(), err})
            .loc("While serializing command line arguments")?;
        Ok(Some(path))
    }

    /// Deserialize a `.yaml` file into Command line arguments.
    ///
    /// # Errors
    /// - if the provided `.yaml` cannot be opened.
    /// - if `serde_yaml` fails to parse the provided file to `Self`.
    pub fn deserialize(yaml: &Path) -> Result<Self> {
        let file = File::open(yaml)
            .map_err(|err| ParserError::OpenArgs{path: yaml.to_path_buf(), err})
            .loc("While deserializing command line arguments")?;
        serde_yaml::from_reader(file)
            .map_err(|err| ParserError::DeserializeArgs{path: yaml.to_path_buf(), err})
            .loc("While deserializing command line arguments")
    }

    /// Replace a `from-yaml` invocation with the command line it replays. Other commands are returned as is.
    ///
    /// # Errors
    /// - if the `.yaml` file of a `from-yaml` invocation cannot be deserialized.
    pub fn resolve(self) -> Result<Self> {
        match &self.commands {
            Commands::FromYaml{yaml} => Self::deserialize(yaml),
            _ => Ok(self),
        }
    }

    /// Log file mirroring a simulation run: `<output_dir>/<prefix>.log`. `None` for other commands.
    #[must_use]
    pub fn log_file(&self) -> Option<PathBuf> {
        match &self.commands {
            Commands::Simulate{common, ..} => Some(common.output_file(".log")),
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Simulate transmissions through a set of pedigree definitions, and locate IBD segments.
    Simulate {
        #[clap(flatten)]
        common: Common,
        #[clap(flatten)]
        sim: Box<PedigreeSims> // Box<T> to mitigate the large size difference between variants.
    },

    /// Run pedsim-rs using a previously generated .yaml configuration file.
    ///
    /// This allows users to easily re-apply a pedsim-rs command using the exact same parameters
    /// and arguments.
    FromYaml {
        yaml: PathBuf,
    },

    /// Print all citations tied to this project
    Cite
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Common {
    /// Output directory where results will be written.
    #[clap(short, long, default_value("pedsim-output"), parse(try_from_os_str=valid_output_dir))]
    pub output_dir: PathBuf,

    /// Filename prefix of every output file.
    ///
    /// Outputs are written as '<output-dir>/<prefix>.<ext>', e.g. 'pedsim-output/pedsim.seg'
    #[clap(short='O', long, default_value("pedsim"))]
    pub prefix: String,

    /// Overwrite existing output files.
    #[clap(short='w', long)]
    pub overwrite: bool,
}

impl Common {
    /// Path of the output file ending with `suffix`: `<output_dir>/<prefix><suffix>`
    #[must_use]
    pub fn output_file(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{}{suffix}", self.prefix))
    }

    /// Check if a given file already exists ; raise an error if such is the case, and the user did not explicitly
    /// allow file overwriting.
    ///
    /// # Errors
    /// - If the provided `pathbuf` already exists and the user did not specifically allow for file
    ///   overwrite using the `--overwrite` argument
    pub fn can_write_file(&self, pathbuf: &Path) -> Result<bool> {
        if ! self.overwrite && pathbuf.exists() {   // Check if this file already exists and/or if overwrite is allowed.
            return Err(ParserError::CannotOverwrite(pathbuf.display().to_string()))
                .loc( "While parsing command line arguments" )
        }
        Ok(true)
    }
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug, Serialize, Deserialize)]
pub struct PedigreeSims {
    /// Pedigree definition file.
    ///
    /// Lists one or more 'def <name> <families> <generations>' blocks, each followed by
    /// '<generation> <samples> [<branches>] [<branch specs> ...]' lines.
    #[clap(short='d', long, parse(try_from_os_str=valid_input_file))]
    pub def: PathBuf,

    /// Genetic map file.
    ///
    /// Whitespace-separated columns: 'chr pos cM' or, for sex-specific maps, 'chr pos female_cM male_cM'.
    #[clap(short='m', long, parse(try_from_os_str=valid_input_file))]
    pub map: PathBuf,

    /// Crossover interference parameters.
    ///
    /// Whitespace-separated columns: 'chr nu_male p_male nu_female p_female'. When neither this argument
    /// nor --fixed-co are provided, crossovers follow a Poisson model.
    #[clap(short='i', long, parse(try_from_os_str=valid_input_file))]
    pub intf: Option<PathBuf>,

    /// Fixed crossover positions.
    ///
    /// Lines: '<child id> <M|F> <chr> [<cM> ...]'. Meioses that are not listed undergo no crossover.
    /// Cannot be used alongside --intf
    #[clap(long, parse(try_from_os_str=valid_input_file))]
    pub fixed_co: Option<PathBuf>,

    /// Sexes of the real samples that founders will be drawn from.
    ///
    /// Lines: '<sample> <M|F>'. Used to check that enough samples of each sex are available.
    #[clap(short='s', long, parse(try_from_os_str=valid_input_file))]
    pub sexes: Option<PathBuf>,

    /// Label of the X chromosome within the genetic map.
    #[clap(long, default_value("X"))]
    pub chr_x: String,

    /// Provide the random number generator with a set seed.
    #[clap(long, required(false), default_value_t=fastrand::u64(u64::MIN..=u64::MAX))]
    pub seed: u64,

    /// Number of worker threads used to simulate families.
    ///
    /// Output does not depend on this value.
    #[clap(short='@', long, default_value("1"))]
    pub threads: usize,

    /// Merge IBD segments separated by at most this genetic distance (cM).
    #[clap(long, default_value("0.0"), parse(try_from_str=parse_distance))]
    pub ibd_merge_gap: f64,

    /// Print the crossover breakpoints of every sampled individual ('<prefix>.bp').
    #[clap(long)]
    pub bp: bool,

    /// Print a PLINK fam file of every simulated individual ('<prefix>-everyone.fam').
    #[clap(long)]
    pub fam: bool,

    /// Print the most recent common ancestor of every shared segment ('<prefix>.mrca').
    #[clap(long)]
    pub mrca: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum FileEntity {File, Directory}

impl Display for FileEntity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::File      => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
        }
    }
}

impl FileEntity {
    fn validate(&self, path: &Path) -> Result<(), ParserError> {
        use ParserError::InvalidFileEntity;
        let valid = match self {
            Self::File      => path.is_file(),
            Self::Directory => path.is_dir()
        };

        if valid {
            Ok(())
        } else {
            Err(InvalidFileEntity(*self, path.display().to_string()))
        }
    }
}

fn assert_filesystem_entity_is_valid(s: &OsStr, entity: &FileEntity) -> Result<()> {
    use ParserError::MissingFileEntity;
    let path = Path::new(s);
    if ! path.exists() {
        return Err(MissingFileEntity(*entity, path.display().to_string()))
            .loc("While parsing arguments.")
    }

    entity.validate(path).loc("While parsing arguments.")
}

fn valid_input_file(s: &OsStr) -> Result<PathBuf> {
    assert_filesystem_entity_is_valid(s, &FileEntity::File)
        .loc("While checking for file validity")?;
    Ok(PathBuf::from(s))
}

fn valid_output_dir(s: &OsStr) -> Result<PathBuf> {
    if ! Path::new(s).exists() {
        std::fs::create_dir_all(s)?;
    }
    assert_filesystem_entity_is_valid(s, &FileEntity::Directory)
        .loc("While checking for directory validity")?;
    Ok(PathBuf::from(s))
}

fn parse_distance(s: &str) -> Result<f64> {
    match s.parse::<f64>() {
        Ok(cm) if cm.is_finite() && cm >= 0.0 => Ok(cm),
        _ => Err(ParserError::ParseDistance(s.to_string())).loc("While parsing --ibd-merge-gap"),
    }
}

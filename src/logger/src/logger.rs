use std::{fs::File, io::{BufWriter, Write}, path::Path, sync::Mutex};

use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{Level, LevelFilter, Log, Metadata, Record};
use env_logger::{Builder, Env, fmt::Color};
use once_cell::sync::OnceCell;

use located_error::prelude::*;

mod error;
pub use error::LoggerError;

/// Environment variable used to override the verbosity level.
pub const LOG_ENV_VAR: &str = "PEDSIM_LOG";

static INSTANCE: OnceCell<Logger> = OnceCell::new();

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug)]
pub struct Logger {
    multi_pg: MultiProgress,
}

/// Console logger which also mirrors every accepted record into a plain-text log file.
struct TeeLogger {
    console: env_logger::Logger,
    file   : Option<Mutex<BufWriter<File>>>,
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.console.matches(record) {
            return
        }
        self.console.log(record);
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                // Nowhere left to report a failing log write.
                let _ = writeln!(file, "[{} {: <5} {}] {}",
                    chrono::Local::now().format(TIME_FORMAT),
                    record.level(),
                    record.target(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(Ok(mut file)) = self.file.as_ref().map(Mutex::lock) {
            let _ = file.flush();
        }
    }
}

impl Logger {
    /// Initialize the global logger.
    ///
    /// # Arguments
    /// - `verbosity`: 0 (errors only) up to 4 (trace). See [`Logger::u8_to_loglevel`]
    /// - `log_file` : optional path of a file in which every emitted record is copied (without colors).
    ///
    /// # Errors
    /// - if `log_file` cannot be created.
    /// - if a global logger has already been set.
    pub fn init(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
        let log_level = Self::u8_to_loglevel(verbosity);
        let env = Env::default().filter(LOG_ENV_VAR);

        let console = Builder::new().filter_level(log_level)
            .format(|buf, record| {
                let (traceback, set_intensity) = match record.level() {
                    Level::Error => (
                        format!("(@ {}:{}) ", record.file().unwrap_or("unknown"), record.line().unwrap_or(0)),
                        true
                    ),
                    _ => (String::new(), false)
                };

                let mut arg_style = buf.style();
                arg_style.set_intense(set_intensity);

                let mut level_style = buf.style();
                let color = match record.level() {
                    Level::Error => Color::Red,
                    Level::Warn  => Color::Yellow,
                    Level::Info  => Color::Green,
                    Level::Debug => Color::Blue,
                    Level::Trace => Color::Cyan
                };
                level_style.set_color(color).set_bold(true);

                writeln!(
                    buf,
                    "[{} {: <5} {}] {traceback}{}",
                    chrono::Local::now().format(TIME_FORMAT),
                    level_style.value(record.level()),
                    record.target(),
                    arg_style.value(record.args())
                )
            })
            .parse_env(env)
            .build();

        let file = match log_file {
            Some(path) => {
                let handle = File::create(path)
                    .map_err(|err| LoggerError::CreateLogFile{path: path.to_path_buf(), err})
                    .loc("While initializing logger")?;
                Some(Mutex::new(BufWriter::new(handle)))
            },
            None => None,
        };

        let max_level = console.filter();

        // Progress bar support.
        let multi_pg = MultiProgress::new();
        LogWrapper::new(multi_pg.clone(), TeeLogger{console, file})
            .try_init()
            .map_err(|_| LoggerError::AlreadyInitialized)
            .loc("While initializing logger")?;
        log::set_max_level(max_level);

        INSTANCE.set(Self{multi_pg})
            .map_err(|_| LoggerError::AlreadyInitialized)
            .loc("While initializing logger")
    }

    fn u8_to_loglevel(verbosity: u8) -> LevelFilter {
        match verbosity {
            0            => LevelFilter::Error,
            1            => LevelFilter::Warn,
            2            => LevelFilter::Info,
            3            => LevelFilter::Debug,
            4..= u8::MAX => LevelFilter::Trace
        }
    }

    pub fn set_level(verbosity: u8) {
        log::set_max_level(Self::u8_to_loglevel(verbosity));
    }

    /// Shared progress-bar container. Returns `None` when the logger was never initialized
    /// (e.g. when running the library from tests).
    pub fn multi() -> Option<&'static MultiProgress> {
        INSTANCE.get().map(|logger| &logger.multi_pg)
    }

    /// Flush the underlying log file, if any.
    pub fn flush() {
        log::logger().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A single test: the global logger can only be set once per process.
    #[test]
    fn init_levels_and_log_file() {
        let tmpdir = tempfile::tempdir().unwrap();
        let log_file = tmpdir.path().join("pedsim.log");
        Logger::init(2, Some(&log_file)).unwrap();
        assert!(Logger::multi().is_some());

        log::info!("Simulating haplotype transmissions...");
        log::debug!("filtered out at info level");
        Logger::flush();

        let contents = std::fs::read_to_string(&log_file).unwrap();
        assert!(contents.contains("Simulating haplotype transmissions..."));
        assert!(!contents.contains("filtered out"));

        assert!(Logger::init(2, None).is_err());

        for level in 0..u8::MAX {
            Logger::set_level(level);

            let expected_level = match level {
                0           => LevelFilter::Error,
                1           => LevelFilter::Warn,
                2           => LevelFilter::Info,
                3           => LevelFilter::Debug,
                4..=u8::MAX => LevelFilter::Trace
            };

            assert_eq!(log::max_level(), expected_level);
        }
    }
}

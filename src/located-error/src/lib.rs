use std::{fmt::Display, panic::Location};

use anyhow::{Context, Result};

pub mod prelude {
    extern crate anyhow;
    pub use anyhow::{anyhow, bail, ensure, Context, Result};

    extern crate thiserror;
    pub use thiserror::Error;

    pub use super::{LocatedError, LocatedOption};
}

/// Format a caller location as `[file:line:column]`
fn stamp(caller: &Location<'_>) -> String {
    format!("[{}:{}:{}]", caller.file(), caller.line(), caller.column())
}

/// Prepend the caller location to a context message.
fn located<C: Display>(caller: &Location<'_>, context: C) -> String {
    format!("{} {context}", stamp(caller))
}

/// Attach a context message and the call-site location to a failing `Result`.
pub trait LocatedError<T, E> {
    /// Wrap the error value with additional context + the location at which it was called.
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static;

    /// Wrap the error value with lazily evaluated context + the location at which it was called.
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> LocatedError<T, E> for Result<T, E>
where
    E: Display + Send + Sync + 'static,
    Result<T, E>: Context<T, E>,
{
    #[track_caller]
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static
    {
        let caller = Location::caller();
        self.with_context(|| located(caller, context))
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C
    {
        let caller = Location::caller();
        self.with_context(|| located(caller, f()))
    }
}

/// Same as [`LocatedError`], for `Option` values: `None` becomes an error carrying the context.
pub trait LocatedOption<T> {
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static;

    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> LocatedOption<T> for Option<T> {
    #[track_caller]
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static
    {
        let caller = Location::caller();
        self.with_context(|| located(caller, context))
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C
    {
        let caller = Location::caller();
        self.with_context(|| located(caller, f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;
    use std::fs::File;

    #[derive(Error, Debug)]
    pub enum MapLoadError {
        #[error(transparent)]
        Io(#[from] anyhow::Error),

        #[error("Genetic map is empty")]
        Empty,
    }

    fn open_map(file: &str) -> Result<(), MapLoadError> {
        let _ = File::open(file).loc(format!("failed to open genetic map: '{file}'"))?;
        Ok(())
    }

    fn load_0() -> Result<()> {
        open_map("missing/map.txt").with_loc(|| "While reading the genetic map")
    }

    fn load_1() -> Result<()> {
        load_0().with_loc(|| MapLoadError::Empty)
    }

    fn load_2() -> Result<()> {
        load_1().with_loc(|| "While loading simulation inputs")
    }

    #[test]
    fn chain_carries_every_location() {
        let err = load_2().expect_err("Opening a missing file should fail");
        let mut chain = err.chain();
        for result in [load_2(), load_1(), load_0()] {
            assert_eq!(
                format!("{}", chain.next().unwrap()),
                format!("{}", result.err().unwrap())
            );
        }
        eprintln!("ERROR: {err:?}");
    }

    #[test]
    fn location_points_to_caller() {
        let line = line!() + 1;
        let err = None::<u8>.loc("missing chromosome").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with(&format!("[{}:{line}:", file!())), "{msg}");
        assert!(msg.ends_with("missing chromosome"));
    }

    #[test]
    fn ok_values_pass_through() {
        let value: Result<u32, std::num::ParseIntError> = "42".parse();
        assert_eq!(value.loc("unreachable").unwrap(), 42);
        assert_eq!(Some(7).with_loc(|| "unreachable").unwrap(), 7);
    }
}

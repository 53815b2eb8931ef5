use std::{env, fs, path::{Path, PathBuf}, ops::Deref, fmt::{self, Formatter, Display}};
use tempfile::{self, TempDir};

pub const TEST_DATA_DIR: &str = "./tests/test-data";

/// A test input or output location, living in its own temporary directory.
pub struct Fixture {
    path    : PathBuf,
    _tempdir: TempDir,
}

impl Fixture {
    fn in_tempdir(name: &str) -> Self {
        let tempdir = tempfile::tempdir().expect("Failed to generate temp directory");
        let filename = Path::new(name).file_name().expect("Invalid fixture name");
        let path = tempdir.path().join(filename);
        Fixture{path, _tempdir: tempdir}
    }

    /// Copy `tests/test-data/<fixture_filename>` into a fresh temporary directory.
    pub fn copy(fixture_filename: &str) -> Self {
        let root_dir = env::var("CARGO_MANIFEST_DIR").expect("$CARGO_MANIFEST_DIR");
        let source = PathBuf::from(root_dir).join(TEST_DATA_DIR).join(fixture_filename);
        let fixture = Self::in_tempdir(fixture_filename);
        fs::copy(&source, &fixture.path)
            .unwrap_or_else(|err| panic!("Failed to copy fixture {}: {err}", source.display()));
        fixture
    }

    /// An empty output directory. Nothing is created on disk.
    pub fn output_dir(name: &str) -> Self {
        Self::in_tempdir(name)
    }

    /// Path of a file living within this fixture, when it is a directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Deref for Fixture {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

impl Display for Fixture {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.to_str().expect("Invalid path (non UTF8 characters ?)"))
    }
}

use std::{fs::File, io::{Write, BufWriter}, path::Path};
use anyhow::Result;
use regex::Regex;
use lazy_static::lazy_static;

use located_error::LocatedError;

pub mod error;
pub use error::WriterError;

/// Field separator of every file written by `GenericWriter`.
pub const WRITER_SEPARATOR: &str = "\t";

lazy_static! {
    /// Pretty-print separator of `Display` rows: a dash surrounded by padding.
    static ref PRETTY_SEPARATOR: Regex = Regex::new(r"[ ]+-[ ]+").expect("Failed to parse regex.");
}

/// A generic, line-oriented output writer.
/// - source: Boxed `BufWriter` (either a file, or stdout).
pub struct GenericWriter<'a> {
    source: BufWriter<Box<dyn Write + 'a>>,
    lines : usize,
}

impl<'a> GenericWriter<'a> {
    /// Instantiate a new `GenericWriter`, linked to a file, or to stdout if `path` is `None`.
    ///
    /// # Errors
    /// if `path` is either an invalid file, or the user does not have the proper
    /// UNIX permissions to write at this location.
    pub fn new(path: Option<impl AsRef<Path>>) -> Result<GenericWriter<'a>> {
        let source: Box<dyn Write + 'a> = match path {
            Some(path) => {
                let path = path.as_ref();
                let file = File::create(path)
                    .map_err(|err| WriterError::CreateFile{path: path.to_path_buf(), err})
                    .loc("While creating output file")?;
                Box::new(file)
            },
            None => Box::new(std::io::stdout()),
        };
        Ok(Self::from_writer(source))
    }

    /// Wrap any writer.
    pub fn from_writer(inner: impl Write + 'a) -> GenericWriter<'a> {
        let inner: Box<dyn Write + 'a> = Box::new(inner);
        GenericWriter{source: BufWriter::new(inner), lines: 0}
    }

    /// Write the contents of a generic iterator, one item per line, then flush.
    ///
    /// # Behavior
    /// Each item is formatted through its `Display` implementation. Matches of `[ ]+-[ ]+`
    /// (pretty-print separators) are then replaced with [`WRITER_SEPARATOR`].
    ///
    /// # Errors
    /// - If any of the items within `iter` fails to get written.
    pub fn write_iter<T, I>(&mut self, iter: T) -> Result<usize>
    where   T: IntoIterator<Item = I>,
            I: std::fmt::Display,
    {
        let mut written = 0;
        for obj in iter {
            let line = format!("{obj}\n");
            self.source.write_all(PRETTY_SEPARATOR.replace_all(&line, WRITER_SEPARATOR).as_bytes())
                .map_err(WriterError::IOError)
                .loc("While writing contents into file")?;
            written += 1;
        }
        self.lines += written;
        self.source.flush().loc("While flushing buffer contents of Writer")?;
        Ok(written)
    }

    /// Total number of lines written so far.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::{self, Display, Formatter};

    struct Row(&'static str, &'static str, i32);

    impl Display for Row {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "{: <12} - {: <12} - {}", self.0, self.1, self.2)
        }
    }

    #[test]
    fn write_file() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path   = tmpdir.path().join("rows.txt");
        let mut writer = GenericWriter::new(Some(&path))?;

        let rows = vec![Row("ped1_g2-b1-i1", "ped1_g1-b1-s1", -9), Row("a", "b", 3)];
        assert_eq!(writer.write_iter(&rows)?, 2);
        assert_eq!(writer.lines(), 2);

        let got = std::fs::read_to_string(&path)?;
        assert_eq!(got, "ped1_g2-b1-i1\tped1_g1-b1-s1\t-9\na\tb\t3\n");
        Ok(())
    }

    #[test]
    fn write_into_buffer() -> anyhow::Result<()> {
        let mut buffer = Vec::new();
        {
            let mut writer = GenericWriter::from_writer(&mut buffer);
            writer.write_iter(["x - y", "z"])?;
        }
        assert_eq!(String::from_utf8(buffer)?, "x\ty\nz\n");
        Ok(())
    }

    #[test]
    fn invalid_path() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("missing-dir").join("rows.txt");
        assert!(GenericWriter::new(Some(&path)).is_err());
    }
}

#[cfg(test)]
mod fixture;
pub use fixture::Fixture;

#[cfg(test)]
mod pedsim_runner;
pub use pedsim_runner::{PedsimRunner, PedsimRunnerBuilder};

/// Read a tab-separated output file, as a list of rows.
#[macro_export]
macro_rules! read_rows {
    ($obtained_file:expr) => {
        std::fs::read_to_string($obtained_file)
            .unwrap_or_else(|_| panic!("Failed to open {:?}", $obtained_file))
            .lines()
            .map(|line| line.split('\t').map(str::to_string).collect::<Vec<String>>())
            .collect::<Vec<Vec<String>>>()
    };
}

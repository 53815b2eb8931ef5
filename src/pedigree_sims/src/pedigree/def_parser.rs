use std::{
    path::Path,
    io::{BufRead, BufReader},
    fs::File,
    ops::RangeInclusive,
};

use log::debug;
use itertools::Itertools;
use genome::Sex;
use located_error::prelude::*;

use super::{BranchDetails, BranchParents, GenDetails, PedigreeError, SimDetails};

/// A generation line, as found within a `def` block.
struct GenLine {
    line        : usize,
    num_samples : usize,
    num_branches: Option<usize>,
    specs       : Vec<String>,
}

/// Accumulates the lines of a single `def` block.
struct DefBlock {
    name    : String,
    num_fams: usize,
    gens    : Vec<Option<GenLine>>,
}

impl DefBlock {
    fn invalid(&self, reason: String) -> PedigreeError {
        PedigreeError::InvalidPedigreeDefinition{def: self.name.clone(), reason}
    }

    fn add_generation(&mut self, line: usize, fields: &[&str]) -> Result<(), PedigreeError> {
        let malformed = |reason: String| PedigreeError::MalformedDefLine{line, reason};
        if fields.len() < 2 {
            return Err(malformed("generation lines must at least specify <generation> <num_samples>".to_string()))
        }
        let gen = parse_count(fields[0], "generation", line)?;
        let num_samples = parse_count(fields[1], "number of samples", line)?;

        let mut specs = &fields[2..];
        let num_branches = match specs.first().map(|field| field.parse::<usize>()) {
            Some(Ok(num_branches)) => {
                specs = &specs[1..];
                Some(num_branches)
            },
            _ => None,
        };

        let num_gens = self.gens.len();
        let idx = gen.checked_sub(1).filter(|&idx| idx < num_gens)
            .ok_or_else(|| self.invalid(format!("line {line}: generation {gen} lies outside of 1..={num_gens}")))?;
        if self.gens[idx].is_some() {
            return Err(self.invalid(format!("line {line}: generation {gen} is listed more than once")))
        }
        self.gens[idx] = Some(GenLine{line, num_samples, num_branches, specs: specs.iter().map(|s| (*s).to_string()).collect()});
        Ok(())
    }

    fn finish(self) -> Result<SimDetails, PedigreeError> {
        let mut generations: Vec<GenDetails> = Vec::with_capacity(self.gens.len());
        for (gen, entry) in self.gens.iter().enumerate() {
            let prev_branches = generations.last().map_or(0, |prev| prev.branches.len());
            let default_branches = if gen == 0 { 1 } else { prev_branches };
            let (num_samples, num_branches) = entry.as_ref()
                .map_or((0, default_branches), |entry| (entry.num_samples, entry.num_branches.unwrap_or(default_branches)));

            // ---- Default parentage: split the previous generation's branches evenly.
            let mut branches: Vec<BranchDetails> = (0..num_branches).map(|branch| {
                let parents = if gen == 0 { BranchParents::Founder } else { BranchParents::Single(branch * prev_branches / num_branches) };
                BranchDetails{parents, sex: None}
            }).collect();

            if let Some(entry) = entry {
                let mut has_parents = vec![false; num_branches];
                let mut has_sex     = vec![false; num_branches];
                for spec in &entry.specs {
                    self.apply_spec(spec, entry.line, &mut branches, &mut has_parents, &mut has_sex)?;
                }
            }
            generations.push(GenDetails{num_samples, branches});
        }
        Ok(SimDetails{name: self.name, num_fams: self.num_fams, generations})
    }

    /// Apply a branch specification: `<branches>:<parents>` or `<branches>s<F|M>`.
    fn apply_spec(&self, spec: &str, line: usize, branches: &mut [BranchDetails], has_parents: &mut [bool], has_sex: &mut [bool]) -> Result<(), PedigreeError> {
        let malformed = |reason: String| PedigreeError::MalformedDefLine{line, reason};
        let (targets, assigned) = if let Some((targets, parents)) = spec.split_once(':') {
            let parents = match parents {
                "" | "0" => BranchParents::Founder,
                parents  => match parents.split_once('_') {
                    Some((p, q)) => BranchParents::Union(parse_branch(p, line)?, parse_branch(q, line)?),
                    None         => BranchParents::Single(parse_branch(parents, line)?),
                }
            };
            let targets = self.branch_range(targets, branches.len(), line)?;
            for branch in targets.clone() {
                branches[branch].parents = parents;
            }
            (targets, has_parents)
        } else if let Some((targets, sex)) = spec.split_once('s') {
            let sex = match sex {
                "F" | "f" => Sex::Female,
                "M" | "m" => Sex::Male,
                other     => return Err(malformed(format!("invalid sex '{other}' in '{spec}': expected 'F' or 'M'"))),
            };
            let targets = self.branch_range(targets, branches.len(), line)?;
            for branch in targets.clone() {
                branches[branch].sex = Some(sex);
            }
            (targets, has_sex)
        } else {
            return Err(malformed(format!("invalid branch specification '{spec}'")))
        };

        for branch in targets {
            if std::mem::replace(&mut assigned[branch], true) {
                return Err(self.invalid(format!("line {line}: branch {} is specified more than once by '{spec}'", branch + 1)))
            }
        }
        Ok(())
    }

    /// Parse `B` or `B1-B2` (1-based) into a range of 0-based branch indices.
    fn branch_range(&self, targets: &str, num_branches: usize, line: usize) -> Result<RangeInclusive<usize>, PedigreeError> {
        let (first, last) = match targets.split_once('-') {
            Some((first, last)) => (parse_branch(first, line)?, parse_branch(last, line)?),
            None                => { let branch = parse_branch(targets, line)?; (branch, branch) },
        };
        if first > last || last >= num_branches {
            return Err(self.invalid(format!("line {line}: branches '{targets}' lie outside of 1..={num_branches}")))
        }
        Ok(first..=last)
    }
}

fn parse_count(field: &str, what: &str, line: usize) -> Result<usize, PedigreeError> {
    field.parse().map_err(|_| PedigreeError::MalformedDefLine{line, reason: format!("invalid {what} '{field}'")})
}

/// Parse a 1-based branch number into a 0-based index.
fn parse_branch(field: &str, line: usize) -> Result<usize, PedigreeError> {
    match parse_count(field, "branch", line)? {
        0      => Err(PedigreeError::MalformedDefLine{line, reason: format!("branch numbers start at 1, found '{field}'")}),
        branch => Ok(branch - 1),
    }
}

/// Parse every `def` block of a pedigree definition file.
/// ### File characteristics:
/// ```text
/// # comment
/// def <name> <num_families> <num_generations>
/// <generation> <num_samples> [<num_branches>] [<branch_spec> ...]
/// ```
/// # Errors
/// - `MalformedDefLine` on syntax errors.
/// - `InvalidPedigreeDefinition` on out-of-range generations or branches, duplicated specifications, or
///   duplicated definition names.
/// - `NoDefinition` if no `def` block is found.
pub fn parse_defs<R: BufRead>(reader: R) -> Result<Vec<SimDetails>, PedigreeError> {
    let mut definitions: Vec<SimDetails> = Vec::new();
    let mut current: Option<DefBlock> = None;

    for (i, line) in reader.lines().enumerate() {
        let lineno = i + 1;
        let line = line.map_err(|err| PedigreeError::ReadLine(lineno, err))?;
        let content = line.split('#').next().unwrap_or_default();
        let fields: Vec<&str> = content.split_whitespace().collect();
        match fields.first() {
            None        => continue,
            Some(&"def") => {
                if fields.len() != 4 {
                    return Err(PedigreeError::MalformedDefLine{line: lineno, reason: "expected 'def <name> <num_families> <num_generations>'".to_string()})
                }
                if let Some(block) = current.take() {
                    definitions.push(block.finish()?);
                }
                let name = fields[1].to_string();
                if definitions.iter().any(|def| def.name == name) {
                    return Err(PedigreeError::InvalidPedigreeDefinition{def: name, reason: format!("line {lineno}: definition name is used more than once")})
                }
                let num_fams = parse_count(fields[2], "number of families", lineno)?;
                let num_gens = parse_count(fields[3], "number of generations", lineno)?;
                current = Some(DefBlock{name, num_fams, gens: (0..num_gens).map(|_| None).collect()});
            },
            Some(_) => {
                let block = current.as_mut().ok_or_else(|| PedigreeError::MalformedDefLine{line: lineno, reason: "generation line found outside of any 'def' block".to_string()})?;
                block.add_generation(lineno, &fields)?;
            }
        }
    }
    if let Some(block) = current.take() {
        definitions.push(block.finish()?);
    }
    if definitions.is_empty() {
        return Err(PedigreeError::NoDefinition)
    }
    Ok(definitions)
}

/// Parse a pedigree definition file.
///
/// # Errors
/// Any error of [`parse_defs`], or if `path` cannot be opened.
pub fn def_parser(path: &Path) -> Result<Vec<SimDetails>> {
    let loc_msg = || format!("While attempting to parse {}", path.display());
    let file = File::open(path)
        .map_err(|err| PedigreeError::OpenDef{path: path.to_path_buf(), err})
        .with_loc(loc_msg)?;
    let definitions = parse_defs(BufReader::new(file)).with_loc(loc_msg)?;
    for def in &definitions {
        debug!("Pedigree definition '{}': {} families, {} generations", def.name, def.num_fams, def.num_gens());
        for (gen, details) in def.generations.iter().enumerate() {
            let branches = details.branches.iter().join(", ");
            debug!("  - generation {}: {} sample(s) per branch [{branches}]", gen + 1, details.num_samples);
        }
    }
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use pretty_assertions::assert_eq;
    use BranchParents::{Founder, Single, Union};

    fn parse(contents: &str) -> Result<Vec<SimDetails>, PedigreeError> {
        parse_defs(Cursor::new(contents))
    }

    fn branch(parents: BranchParents) -> BranchDetails {
        BranchDetails{parents, sex: None}
    }

    #[test]
    fn default_parentage() -> std::result::Result<(), PedigreeError> {
        let defs = parse("# comment\ndef first-cousins 10 4\n1 2\n2 0 2\n4 1\n")?;
        assert_eq!(defs.len(), 1);
        let def = &defs[0];
        assert_eq!((def.name.as_str(), def.num_fams, def.num_gens()), ("first-cousins", 10, 4));
        assert_eq!(def.generations[0], GenDetails{num_samples: 2, branches: vec![branch(Founder)]});
        assert_eq!(def.generations[1], GenDetails{num_samples: 0, branches: vec![branch(Single(0)), branch(Single(0))]});
        // Unlisted generations print nothing and keep the previous branch count.
        assert_eq!(def.generations[2], GenDetails{num_samples: 0, branches: vec![branch(Single(0)), branch(Single(1))]});
        assert_eq!(def.generations[3], GenDetails{num_samples: 1, branches: vec![branch(Single(0)), branch(Single(1))]});
        Ok(())
    }

    #[test]
    fn branch_specifications() -> std::result::Result<(), PedigreeError> {
        let defs = parse("def half-sibs 1 3\n1 1 3 1sM 2-3sF\n2 1 2 1:1_2 2:3\n3 1 3 1-2:1 3:\n")?;
        let def = &defs[0];
        assert_eq!(def.generations[0].branches.iter().map(|b| b.sex).collect::<Vec<_>>(), vec![Some(Sex::Male), Some(Sex::Female), Some(Sex::Female)]);
        assert_eq!(def.generations[1].branches, vec![branch(Union(0, 1)), branch(Single(2))]);
        assert_eq!(def.generations[2].branches, vec![branch(Single(0)), branch(Single(0)), branch(Founder)]);
        Ok(())
    }

    #[test]
    fn multiple_definitions() -> std::result::Result<(), PedigreeError> {
        let defs = parse("def a 1 1\n1 1\n\ndef b 2 2\n2 1\n")?;
        assert_eq!(defs.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(defs[1].generations[0].num_samples, 0);
        Ok(())
    }

    #[test]
    fn malformed_lines() {
        for contents in ["1 1\n", "def a 1\n", "def a x 2\n", "def a 1 1\n1\n", "def a 1 2\n2 1 1:x\n", "def a 1 1\n1 1 1q\n", "def a 1 1\n1 1 1sX\n"] {
            assert!(matches!(parse(contents), Err(PedigreeError::MalformedDefLine{..})), "{contents}");
        }
        assert!(matches!(parse("# nothing\n"), Err(PedigreeError::NoDefinition)));
    }

    #[test]
    fn invalid_definitions() {
        for contents in ["def a 1 2\n3 1\n", "def a 1 2\n1 1\n1 1\n", "def a 1 1\n1 1 2 3:0\n", "def a 1 2\n2 1 2 1-2:1 2:1\n", "def a 1 1\n1 1\ndef a 1 1\n"] {
            assert!(matches!(parse(contents), Err(PedigreeError::InvalidPedigreeDefinition{..})), "{contents}");
        }
    }

    #[test]
    fn open_missing_file() {
        assert!(def_parser(Path::new("/definitely/not/here.def")).is_err());
    }
}

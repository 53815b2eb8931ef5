use std::fmt::{self, Display, Formatter};

use genome::Sex;

use super::{PedigreeError, SexPlan};

/// Parentage of a branch, expressed with 0-based branch indices of the previous generation.
/// - `Founder`     : members of this branch are founders.
/// - `Single(p)`   : children of `i1` in branch `p`, and of its founder spouse.
/// - `Union(p, q)` : children of the `i1` individuals of branches `p` and `q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchParents {
    Founder,
    Single(usize),
    Union(usize, usize),
}

impl BranchParents {
    #[must_use]
    pub fn is_founder(&self) -> bool {
        matches!(self, Self::Founder)
    }
}

impl Display for BranchParents {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Founder      => write!(f, "founders"),
            Self::Single(p)    => write!(f, "b{}-i1 + spouse", p + 1),
            Self::Union(p, q)  => write!(f, "b{}-i1 + b{}-i1", p + 1, q + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchDetails {
    pub parents: BranchParents,
    pub sex    : Option<Sex>,
}

impl Display for BranchDetails {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.sex {
            Some(sex) => write!(f, "{} ({sex})", self.parents),
            None      => self.parents.fmt(f),
        }
    }
}

/// One generation of a pedigree definition.
/// - `num_samples`: number of sampled (printed) individuals, per branch.
#[derive(Debug, Clone, PartialEq)]
pub struct GenDetails {
    pub num_samples: usize,
    pub branches   : Vec<BranchDetails>,
}

/// Members of a single branch, within a family replicate. Individuals `i1..iN` come first
/// (`N = siblings`), followed by the founder spouse `s1`, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchLayout {
    pub founder : bool,
    pub siblings: usize,
    pub spouse  : bool,
    pub sampled : usize,
}

impl BranchLayout {
    /// Total number of members, spouse included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.siblings + usize::from(self.spouse)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_spouse(&self, ind: usize) -> bool {
        self.spouse && ind == self.siblings
    }

    #[must_use]
    pub fn is_sampled(&self, ind: usize) -> bool {
        ind < self.sampled
    }

    /// Number of founders within this branch.
    #[must_use]
    pub fn founders(&self) -> usize {
        if self.founder { self.len() } else { usize::from(self.spouse) }
    }
}

/// A parsed pedigree definition (`def` block).
#[derive(Debug, Clone, PartialEq)]
pub struct SimDetails {
    pub name       : String,
    pub num_fams   : usize,
    pub generations: Vec<GenDetails>,
}

impl SimDetails {
    #[must_use]
    pub fn num_gens(&self) -> usize {
        self.generations.len()
    }

    /// Whether `i1` of branch `branch` in generation `gen` (0-based) is given a founder spouse,
    /// i.e. whether some branch of the next generation names it as a `Single` parent.
    #[must_use]
    pub fn needs_spouse(&self, gen: usize, branch: usize) -> bool {
        self.generations.get(gen + 1).map_or(false, |next| {
            next.branches.iter().any(|b| b.parents == BranchParents::Single(branch))
        })
    }

    /// Members of a given branch (0-based generation and branch indices).
    #[must_use]
    pub fn layout(&self, gen: usize, branch: usize) -> BranchLayout {
        let num_samples = self.generations[gen].num_samples;
        let founder = self.generations[gen].branches[branch].parents.is_founder();
        let needs_spouse = self.needs_spouse(gen, branch);
        if founder {
            let spouse = num_samples >= 2 || needs_spouse;
            BranchLayout{founder, siblings: 1, spouse, sampled: num_samples.min(1 + usize::from(spouse))}
        } else {
            let siblings = num_samples.max(1);
            BranchLayout{founder, siblings, spouse: needs_spouse, sampled: num_samples}
        }
    }

    /// Iterate over the layouts of every branch, in generation then branch order.
    pub fn layouts(&self) -> impl Iterator<Item = (usize, usize, BranchLayout)> + '_ {
        self.generations.iter().enumerate().flat_map(move |(gen, details)| {
            (0..details.branches.len()).map(move |branch| (gen, branch, self.layout(gen, branch)))
        })
    }

    /// Number of founders within a single family replicate.
    #[must_use]
    pub fn founders_per_family(&self) -> usize {
        self.layouts().map(|(_, _, layout)| layout.founders()).sum()
    }

    /// Number of sampled individuals within a single family replicate.
    #[must_use]
    pub fn sampled_per_family(&self) -> usize {
        self.layouts().map(|(_, _, layout)| layout.sampled).sum()
    }

    /// Check the structural consistency of this definition and derive its sex plan.
    /// This never consumes randomness.
    ///
    /// # Errors
    /// - `InvalidPedigreeDefinition` if the structure cannot be simulated.
    /// - `SexConstraintViolation` if union partners cannot be given opposite sexes.
    pub fn validate(&self) -> Result<SexPlan, PedigreeError> {
        let invalid = |reason: String| PedigreeError::InvalidPedigreeDefinition{def: self.name.clone(), reason};
        if self.num_fams == 0 {
            return Err(invalid("the number of families must be greater than 0".to_string()))
        }
        if self.generations.is_empty() {
            return Err(invalid("the number of generations must be greater than 0".to_string()))
        }

        for (gen, details) in self.generations.iter().enumerate() {
            if details.branches.is_empty() {
                return Err(invalid(format!("generation {} does not contain any branch", gen + 1)))
            }
            let prev_branches = if gen == 0 { 0 } else { self.generations[gen - 1].branches.len() };
            for (branch, branch_details) in details.branches.iter().enumerate() {
                let label = format!("branch {} of generation {}", branch + 1, gen + 1);
                match branch_details.parents {
                    BranchParents::Founder => {
                        if details.num_samples > 2 {
                            return Err(invalid(format!("{label} is made of founders, which can supply at most 2 sampled individuals ({} requested)", details.num_samples)))
                        }
                    },
                    _ if gen == 0 => {
                        return Err(invalid(format!("{label} cannot have parents")))
                    },
                    BranchParents::Single(p) => {
                        if p >= prev_branches {
                            return Err(invalid(format!("{label} descends from branch {}, which is absent from generation {gen}", p + 1)))
                        }
                    },
                    BranchParents::Union(p, q) => {
                        if p == q {
                            return Err(invalid(format!("{label} names branch {} twice as a parent", p + 1)))
                        }
                        if let Some(missing) = [p, q].into_iter().find(|&b| b >= prev_branches) {
                            return Err(invalid(format!("{label} descends from branch {}, which is absent from generation {gen}", missing + 1)))
                        }
                    },
                }
            }
        }
        SexPlan::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(parents: BranchParents) -> BranchDetails {
        BranchDetails{parents, sex: None}
    }

    /// Three generations, a single founder couple, two sampled siblings, one of which has a child.
    fn nuclear() -> SimDetails {
        SimDetails{
            name: String::from("nuclear"),
            num_fams: 1,
            generations: vec![
                GenDetails{num_samples: 2, branches: vec![branch(BranchParents::Founder)]},
                GenDetails{num_samples: 2, branches: vec![branch(BranchParents::Single(0))]},
                GenDetails{num_samples: 1, branches: vec![branch(BranchParents::Single(0))]},
            ]
        }
    }

    #[test]
    fn layouts() {
        let details = nuclear();
        assert_eq!(details.layout(0, 0), BranchLayout{founder: true, siblings: 1, spouse: true, sampled: 2});
        assert_eq!(details.layout(1, 0), BranchLayout{founder: false, siblings: 2, spouse: true, sampled: 2});
        assert_eq!(details.layout(2, 0), BranchLayout{founder: false, siblings: 1, spouse: false, sampled: 1});
        assert_eq!(details.founders_per_family(), 3);
        assert_eq!(details.sampled_per_family(), 5);
    }

    #[test]
    fn unsampled_branches_still_carry_one_individual() {
        let mut details = nuclear();
        details.generations[1].num_samples = 0;
        let layout = details.layout(1, 0);
        assert_eq!((layout.siblings, layout.sampled), (1, 0));
        assert!(layout.is_spouse(1));
        assert!(!layout.is_sampled(0));
    }

    #[test]
    fn validate_ok() {
        assert!(nuclear().validate().is_ok());
    }

    #[test]
    fn too_many_sampled_founders() {
        let mut details = nuclear();
        details.generations[0].num_samples = 3;
        assert!(matches!(details.validate(), Err(PedigreeError::InvalidPedigreeDefinition{..})));
    }

    #[test]
    fn structural_errors() {
        let mutations: Vec<fn(&mut SimDetails)> = vec![
            |d: &mut SimDetails| d.num_fams = 0,
            |d: &mut SimDetails| d.generations.clear(),
            |d: &mut SimDetails| d.generations[1].branches.clear(),
            |d: &mut SimDetails| d.generations[0].branches[0].parents = BranchParents::Single(0),
            |d: &mut SimDetails| d.generations[1].branches[0].parents = BranchParents::Single(1),
            |d: &mut SimDetails| d.generations[1].branches[0].parents = BranchParents::Union(0, 0),
        ];
        for mutate in mutations {
            let mut details = nuclear();
            mutate(&mut details);
            assert!(matches!(details.validate(), Err(PedigreeError::InvalidPedigreeDefinition{..})), "{details:?}");
        }
    }
}

use super::{Person, PersonId};

/// A single family replicate. Persons are stored as `generations[gen][branch][ind]`.
#[derive(Debug, Clone)]
pub struct Family {
    pub id         : String,
    pub generations: Vec<Vec<Vec<Person>>>,
}

impl Family {
    /// Family id of the `fam`-th (0-based) replicate of pedigree `name`.
    #[must_use]
    pub fn family_id(name: &str, fam: usize) -> String {
        format!("{name}{}", fam + 1)
    }

    /// Sample id of a branch member. Spouses are labeled `s1`, other members `i<n>`.
    #[must_use]
    pub fn sample_id(family_id: &str, gen: usize, branch: usize, ind: usize, spouse: bool) -> String {
        let member = if spouse { "s1".to_string() } else { format!("i{}", ind + 1) };
        format!("{family_id}_g{}-b{}-{member}", gen + 1, branch + 1)
    }

    #[must_use]
    pub fn get(&self, id: &PersonId) -> Option<&Person> {
        self.generations.get(id.gen)?.get(id.branch)?.get(id.ind)
    }

    /// Every member of this family, in generation, branch then individual order.
    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.generations.iter().flatten().flatten()
    }
}

/// All family replicates of a single pedigree definition.
#[derive(Debug, Clone)]
pub struct PedigreeRun {
    pub name    : String,
    pub families: Vec<Family>,
}

/// Arena of every simulated person, indexed by `PersonId`.
#[derive(Debug, Clone, Default)]
pub struct Pedigrees {
    pub runs: Vec<PedigreeRun>,
}

impl Pedigrees {
    #[must_use]
    pub fn get(&self, id: &PersonId) -> Option<&Person> {
        self.runs.get(id.ped)?.families.get(id.fam)?.get(id)
    }

    pub fn families(&self) -> impl Iterator<Item = &Family> {
        self.runs.iter().flat_map(|run| run.families.iter())
    }

    /// Every simulated person, in arena order.
    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.families().flat_map(Family::persons)
    }

    /// Every sampled person, in arena order.
    pub fn sampled(&self) -> impl Iterator<Item = &Person> {
        self.persons().filter(|person| person.sampled)
    }

    pub fn founders(&self) -> impl Iterator<Item = &Person> {
        self.persons().filter(|person| person.is_founder())
    }

    /// Find a person through its sample id.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Person> {
        self.persons().find(|person| person.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.persons().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persons().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genome::Sex;

    #[test]
    fn sample_ids() {
        let fid = Family::family_id("cousins", 2);
        assert_eq!(fid, "cousins3");
        assert_eq!(Family::sample_id(&fid, 1, 0, 1, false), "cousins3_g2-b1-i2");
        assert_eq!(Family::sample_id(&fid, 0, 2, 1, true), "cousins3_g1-b3-s1");
    }

    #[test]
    fn arena_lookup() {
        let id = PersonId{ped: 0, fam: 0, gen: 0, branch: 0, ind: 0};
        let person = Person{id, name: "a1_g1-b1-i1".to_string(), sex: Sex::Male, parents: None, sampled: true, chromosomes: vec![]};
        let family = Family{id: "a1".to_string(), generations: vec![vec![vec![person]]]};
        let pedigrees = Pedigrees{runs: vec![PedigreeRun{name: "a".to_string(), families: vec![family]}]};

        assert_eq!(pedigrees.get(&id).map(|p| p.name.as_str()), Some("a1_g1-b1-i1"));
        assert!(pedigrees.get(&PersonId{ind: 1, ..id}).is_none());
        assert_eq!(pedigrees.find("a1_g1-b1-i1").map(|p| p.id), Some(id));
        assert_eq!((pedigrees.len(), pedigrees.sampled().count(), pedigrees.founders().count()), (1, 1, 1));
    }
}

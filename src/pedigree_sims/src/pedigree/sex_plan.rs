use rand::Rng;

use genome::Sex;

use super::{BranchParents, PedigreeError, SimDetails};

/// Union-find over branch `i1` individuals, where each node also records whether its sex is opposite
/// to its parent's.
#[derive(Debug)]
struct ParityUnionFind {
    parent: Vec<usize>,
    parity: Vec<bool>,
}

impl ParityUnionFind {
    fn new(len: usize) -> Self {
        Self{parent: (0..len).collect(), parity: vec![false; len]}
    }

    /// Root of `node`, along with the parity of `node` relative to that root.
    fn find(&mut self, node: usize) -> (usize, bool) {
        let parent = self.parent[node];
        if parent == node {
            return (node, false)
        }
        let (root, parity) = self.find(parent);
        self.parent[node] = root;
        self.parity[node] ^= parity;
        (root, self.parity[node])
    }

    /// Constrain `a` and `b` to share the same sex (`opposite == false`) or opposite sexes.
    /// Returns `false` if this contradicts previous constraints.
    fn union(&mut self, a: usize, b: usize, opposite: bool) -> bool {
        let (root_a, parity_a) = self.find(a);
        let (root_b, parity_b) = self.find(b);
        if root_a == root_b {
            return (parity_a ^ parity_b) == opposite
        }
        // Lowest index stays the root: components are then drawn in node order.
        let (child, root) = if root_a < root_b { (root_b, root_a) } else { (root_a, root_b) };
        self.parent[child] = root;
        self.parity[child] = parity_a ^ parity_b ^ opposite;
        true
    }
}

/// Sex assignment of every branch's primary individual (`i1`) within a pedigree definition.
///
/// Partners of a `Union` must be of opposite sexes, which links `i1` individuals into components.
/// Each component is either anchored by a fixed sex specification, or drawn at random once per family.
#[derive(Debug, Clone, PartialEq)]
pub struct SexPlan {
    offsets: Vec<usize>,
    links  : Vec<(usize, bool)>,
    anchors: Vec<Option<Sex>>,
}

impl SexPlan {
    pub(crate) fn new(details: &SimDetails) -> Result<Self, PedigreeError> {
        let mut offsets = Vec::with_capacity(details.num_gens());
        let mut total = 0;
        for gen in &details.generations {
            offsets.push(total);
            total += gen.branches.len();
        }
        let node_label = |node: usize| {
            let gen = offsets.partition_point(|&offset| offset <= node) - 1;
            format!("b{}-i1 of generation {}", node - offsets[gen] + 1, gen + 1)
        };
        let violation = |reason: String| PedigreeError::SexConstraintViolation{def: details.name.clone(), reason};

        // ---- Union partners must have opposite sexes.
        let mut components = ParityUnionFind::new(total);
        for (gen, details) in details.generations.iter().enumerate().skip(1) {
            for branch in &details.branches {
                if let BranchParents::Union(p, q) = branch.parents {
                    let (a, b) = (offsets[gen - 1] + p, offsets[gen - 1] + q);
                    if !components.union(a, b, true) {
                        return Err(violation(format!("{} and {} must have opposite sexes, which creates an odd cycle of unions", node_label(a), node_label(b))))
                    }
                }
            }
        }

        // ---- Fixed sexes anchor their whole component.
        let mut anchors: Vec<Option<Sex>> = vec![None; total];
        let mut anchored_by = vec![0; total];
        for (gen, details) in details.generations.iter().enumerate() {
            for (branch, details) in details.branches.iter().enumerate() {
                let Some(sex) = details.sex else { continue };
                let node = offsets[gen] + branch;
                let (root, parity) = components.find(node);
                let implied = if parity { sex.opposite() } else { sex };
                match anchors[root] {
                    Some(anchor) if anchor != implied => {
                        return Err(violation(format!("{} is specified as {sex}, which conflicts with the sex specified for {}", node_label(node), node_label(anchored_by[root]))))
                    },
                    Some(_) => (),
                    None    => {
                        anchors[root] = Some(implied);
                        anchored_by[root] = node;
                    }
                }
            }
        }

        let links = (0..total).map(|node| components.find(node)).collect();
        Ok(Self{offsets, links, anchors})
    }

    /// Sex of `i1` in the given branch, if it does not depend on randomness.
    #[must_use]
    pub fn fixed(&self, gen: usize, branch: usize) -> Option<Sex> {
        let (root, opposite) = self.links[self.offsets[gen] + branch];
        self.anchors[root].map(|sex| if opposite { sex.opposite() } else { sex })
    }

    /// Draw the sex of every `i1` for a new family replicate. Output is indexed by `[generation][branch]`.
    /// One fair coin flip is consumed per unanchored component, in node order.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Vec<Sex>> {
        let mut roots: Vec<Option<Sex>> = vec![None; self.links.len()];
        let mut sexes = Vec::with_capacity(self.links.len());
        for &(root, opposite) in &self.links {
            let sex = match roots[root] {
                Some(sex) => sex,
                None => {
                    let sex = self.anchors[root].unwrap_or_else(|| Sex::random(rng));
                    roots[root] = Some(sex);
                    sex
                }
            };
            sexes.push(if opposite { sex.opposite() } else { sex });
        }

        let mut bounds = self.offsets.clone();
        bounds.push(sexes.len());
        bounds.windows(2).map(|w| sexes[w[0]..w[1]].to_vec()).collect()
    }
}

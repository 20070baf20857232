//! Splitting a compiled model into independent sub-problems.
//!
//! Two variables belong to the same component when some row mentions both.
//! Rows never cross components and the objective is linear, so each
//! component can be optimized on its own and the optima summed.

use super::compile::{Compiled, Row};

/// One independent part of a compiled model, over local variable indices.
#[derive(Debug, Clone)]
pub(crate) struct SubProblem {
    /// Global index of each local variable, ascending.
    pub vars: Vec<usize>,
    pub rows: Vec<Row>,
    /// Minimization-form objective terms on this component's variables.
    pub objective: Vec<(i64, usize)>,
    pub has_objective: bool,
}

impl SubProblem {
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }
}

/// Disjoint-set forest with path halving and union by size.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

/// Splits `compiled` into sub-problems.
///
/// With `decompose == false` a single sub-problem holding every variable is
/// returned. Components are ordered by their smallest global variable.
pub(crate) fn split(compiled: &Compiled, decompose: bool) -> Vec<SubProblem> {
    let n = compiled.num_vars;
    let mut uf = UnionFind::new(n);
    if decompose {
        for row in &compiled.rows {
            if let Some(&(_, first)) = row.terms.first() {
                for &(_, v) in &row.terms[1..] {
                    uf.union(first, v);
                }
            }
        }
    } else {
        for v in 1..n {
            uf.union(0, v);
        }
    }

    // component id per root, numbered by first appearance
    let mut component_of_root = vec![usize::MAX; n];
    let mut component = vec![0usize; n];
    let mut local = vec![0usize; n];
    let mut subs: Vec<SubProblem> = Vec::new();
    for v in 0..n {
        let root = uf.find(v);
        if component_of_root[root] == usize::MAX {
            component_of_root[root] = subs.len();
            subs.push(SubProblem {
                vars: Vec::new(),
                rows: Vec::new(),
                objective: Vec::new(),
                has_objective: compiled.objective.is_some(),
            });
        }
        let c = component_of_root[root];
        component[v] = c;
        local[v] = subs[c].vars.len();
        subs[c].vars.push(v);
    }

    for row in &compiled.rows {
        if let Some(&(_, first)) = row.terms.first() {
            subs[component[first]].rows.push(Row {
                terms: row.terms.iter().map(|&(c, v)| (c, local[v])).collect(),
                rhs: row.rhs,
            });
        }
    }

    if let Some(objective) = &compiled.objective {
        for &(w, v) in objective {
            subs[component[v]].objective.push((w, local[v]));
        }
    }

    subs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(num_vars: usize, rows: Vec<Row>, objective: Option<Vec<(i64, usize)>>) -> Compiled {
        Compiled {
            num_vars,
            rows,
            objective,
            trivially_infeasible: false,
        }
    }

    #[test]
    fn test_independent_rows_split() {
        let c = compiled(
            4,
            vec![
                Row { terms: vec![(1, 0), (1, 2)], rhs: 1 },
                Row { terms: vec![(1, 1), (1, 3)], rhs: 1 },
            ],
            Some(vec![(5, 3), (7, 0)]),
        );
        let subs = split(&c, true);

        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].vars, vec![0, 2]);
        assert_eq!(subs[1].vars, vec![1, 3]);
        assert_eq!(subs[0].rows[0].terms, vec![(1, 0), (1, 1)]);
        assert_eq!(subs[1].objective, vec![(5, 1)]);
        assert_eq!(subs[0].objective, vec![(7, 0)]);
    }

    #[test]
    fn test_shared_variable_joins_components() {
        let c = compiled(
            3,
            vec![
                Row { terms: vec![(1, 0), (1, 1)], rhs: 1 },
                Row { terms: vec![(1, 1), (1, 2)], rhs: 1 },
            ],
            None,
        );
        let subs = split(&c, true);

        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].rows.len(), 2);
        assert!(!subs[0].has_objective);
    }

    #[test]
    fn test_unconstrained_variables_are_singletons() {
        let subs = split(&compiled(3, Vec::new(), Some(vec![(1, 1)])), true);
        assert_eq!(subs.len(), 3);
        assert!(subs.iter().all(|s| s.num_vars() == 1));
        assert!(subs[0].objective.is_empty());
    }

    #[test]
    fn test_decompose_disabled() {
        let subs = split(&compiled(3, Vec::new(), None), false);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].vars, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_model() {
        assert!(split(&compiled(0, Vec::new(), None), true).is_empty());
        assert!(split(&compiled(0, Vec::new(), None), false).is_empty());
    }
}

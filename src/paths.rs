//! Lazy enumeration of the cubes of a function.
//!
//! Every path from the root to the TRUE terminal is a product term; variables
//! that are skipped along the path stay don't-care. The cubes of one function
//! are pairwise disjoint and their union is the function.
//!
//! ```
//! use approx_sop::bdd::Bdd;
//!
//! let bdd = Bdd::default();
//! let f = bdd.apply_or(bdd.mk_var(1), bdd.mk_var(2));
//!
//! let cubes: Vec<String> = bdd.cubes(f, 3).map(|c| c.to_string()).collect();
//! assert_eq!(cubes, vec!["1--", "01-"]);
//! ```

use crate::bdd::Bdd;
use crate::cube::{Cube, Literal};
use crate::reference::Ref;

impl Bdd {
    /// Iterator over the path cubes of `f`, each `width` positions wide.
    ///
    /// The iterator is finite and cannot be restarted. High branches are
    /// explored before low branches.
    pub fn cubes(&self, f: Ref, width: usize) -> Cubes<'_> {
        Cubes::new(self, f, width)
    }
}

#[derive(Debug, Clone, Copy)]
enum Branch {
    High,
    Low,
}

#[derive(Debug)]
struct Frame {
    node: Ref,
    /// Position assigned on the edge leading into this frame.
    assigned: Option<usize>,
    next_branch: Option<Branch>,
}

pub struct Cubes<'a> {
    bdd: &'a Bdd,
    stack: Vec<Frame>,
    current: Vec<Literal>,
}

impl<'a> Cubes<'a> {
    fn new(bdd: &'a Bdd, f: Ref, width: usize) -> Self {
        Cubes {
            bdd,
            stack: vec![Frame {
                node: f,
                assigned: None,
                next_branch: Some(Branch::High),
            }],
            current: vec![Literal::DontCare; width],
        }
    }

    fn backtrack(&mut self) {
        if let Some(Frame {
            assigned: Some(position),
            ..
        }) = self.stack.pop()
        {
            self.current[position] = Literal::DontCare;
        }
    }

    fn descend(&mut self, child: Ref, position: usize, literal: Literal) {
        self.current[position] = literal;
        self.stack.push(Frame {
            node: child,
            assigned: Some(position),
            next_branch: Some(Branch::High),
        });
    }
}

impl Iterator for Cubes<'_> {
    type Item = Cube;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let node = frame.node;

            if self.bdd.is_one(node) {
                let cube = Cube::new(self.current.clone());
                self.backtrack();
                return Some(cube);
            }
            if self.bdd.is_zero(node) {
                self.backtrack();
                continue;
            }

            let variable = self.bdd.variable(node.index()) as usize;
            assert!(
                variable <= self.current.len(),
                "variable x{} does not fit in a cube of width {}",
                variable,
                self.current.len()
            );
            let position = variable - 1;

            let next_branch = frame.next_branch;
            match next_branch {
                Some(Branch::High) => {
                    frame.next_branch = Some(Branch::Low);
                    let child = self.bdd.high_node(node);
                    self.descend(child, position, Literal::One);
                }
                Some(Branch::Low) => {
                    frame.next_branch = None;
                    let child = self.bdd.low_node(node);
                    self.descend(child, position, Literal::Zero);
                }
                None => self.backtrack(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn cube_strings(bdd: &Bdd, f: Ref, width: usize) -> Vec<String> {
        bdd.cubes(f, width).map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_cubes_single_cube() {
        let bdd = Bdd::default();
        let f = bdd.mk_cube([1, -2, 3]);
        assert_eq!(cube_strings(&bdd, f, 3), vec!["101"]);
        assert_eq!(cube_strings(&bdd, f, 4), vec!["101-"]);
    }

    #[test]
    fn test_cubes_constants() {
        let bdd = Bdd::default();
        assert_eq!(cube_strings(&bdd, bdd.one(), 2), vec!["--"]);
        assert!(cube_strings(&bdd, bdd.zero(), 2).is_empty());
    }

    #[test]
    fn test_cubes_xor() {
        let bdd = Bdd::default();
        let f = bdd.apply_xor(bdd.mk_var(1), bdd.mk_var(2));
        assert_eq!(cube_strings(&bdd, f, 2), vec!["10", "01"]);
    }

    #[test]
    fn test_cubes_negated_function() {
        let bdd = Bdd::default();
        let f = bdd.mk_cube([-1, -2, -3]);
        // ~f = x1 | x2 | x3 has three disjoint paths.
        assert_eq!(cube_strings(&bdd, -f, 3), vec!["1--", "01-", "001"]);
    }

    #[test]
    fn test_cubes_partition_the_function() {
        let bdd = Bdd::default();
        let f = bdd.apply_or(
            bdd.mk_cube([1, 3]),
            bdd.apply_xor(bdd.mk_var(2), bdd.mk_var(4)),
        );
        let cubes: Vec<Cube> = bdd.cubes(f, 4).collect();
        let union = bdd.apply_or_many(cubes.iter().map(|c| bdd.cube_function(c)));
        assert_eq!(union, f);
        for (i, a) in cubes.iter().enumerate() {
            for b in &cubes[i + 1..] {
                let both = bdd.apply_and(bdd.cube_function(a), bdd.cube_function(b));
                assert!(bdd.is_zero(both), "{} and {} overlap", a, b);
            }
        }
    }
}

//! Ternary product terms.
//!
//! A [`Cube`] is a fixed-width vector over {0, 1, don't-care}: position `i`
//! constrains input `i` (engine variable `i + 1`) to be low, high, or leaves it
//! free. Cubes are immutable and compared by content.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::bdd::Bdd;
use crate::reference::Ref;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Literal {
    Zero,
    One,
    DontCare,
}

impl Literal {
    pub fn is_defined(self) -> bool {
        self != Literal::DontCare
    }

    /// Parse an input-field character. `~` and `4` are accepted as
    /// don't-care aliases.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Literal::Zero),
            '1' => Some(Literal::One),
            '-' | '~' | '4' => Some(Literal::DontCare),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Literal::Zero => '0',
            Literal::One => '1',
            Literal::DontCare => '-',
        }
    }
}

/// How one cube relates to another under [`covers`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Relation {
    /// Some defined position of the first cube disagrees with the second.
    NoRelation,
    /// The first cube contains the second and is strictly larger.
    StrictlyCovers,
    /// Both cubes have identical content.
    Equal,
}

impl Relation {
    /// `StrictlyCovers` or `Equal`.
    pub fn is_covering(self) -> bool {
        self != Relation::NoRelation
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Cube(Box<[Literal]>);

impl Cube {
    pub fn new(literals: impl Into<Box<[Literal]>>) -> Self {
        Self(literals.into())
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn literals(&self) -> &[Literal] {
        &self.0
    }

    pub fn get(&self, i: usize) -> Literal {
        self.0[i]
    }

    /// Number of defined (non don't-care) positions.
    pub fn literal_count(&self) -> usize {
        self.0.iter().filter(|l| l.is_defined()).count()
    }

    /// Positions that are defined, in increasing order.
    pub fn defined_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_defined())
            .map(|(i, _)| i)
    }

    /// Copy of this cube with position `i` freed.
    pub fn relax(&self, i: usize) -> Cube {
        let mut literals = self.0.clone();
        literals[i] = Literal::DontCare;
        Cube(literals)
    }

    /// DIMACS-style literals of the defined positions (position `i` is variable `i + 1`).
    pub fn to_dimacs(&self) -> Vec<i32> {
        self.defined_positions()
            .map(|i| {
                let v = (i + 1) as i32;
                if self.0[i] == Literal::One {
                    v
                } else {
                    -v
                }
            })
            .collect()
    }
}

/// Relation of cube `a` to cube `b`.
///
/// Any defined position of `a` that differs from `b` yields
/// [`Relation::NoRelation`], regardless of the other positions. Otherwise a
/// don't-care in `a` over a defined position of `b` yields
/// [`Relation::StrictlyCovers`], and identical cubes are [`Relation::Equal`].
pub fn covers(a: &Cube, b: &Cube) -> Relation {
    debug_assert_eq!(a.width(), b.width());
    let mut relation = Relation::Equal;
    for (&x, &y) in a.0.iter().zip(b.0.iter()) {
        if x == Literal::DontCare {
            if y != Literal::DontCare {
                relation = Relation::StrictlyCovers;
            }
        } else if x != y {
            return Relation::NoRelation;
        }
    }
    relation
}

impl Display for Cube {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for l in self.0.iter() {
            write!(f, "{}", l.to_char())?;
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ParseCubeError {
    pub position: usize,
    pub found: char,
}

impl Display for ParseCubeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid cube literal {:?} at position {}",
            self.found, self.position
        )
    }
}

impl std::error::Error for ParseCubeError {}

impl FromStr for Cube {
    type Err = ParseCubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .enumerate()
            .map(|(position, c)| Literal::from_char(c).ok_or(ParseCubeError { position, found: c }))
            .collect::<Result<Vec<_>, _>>()
            .map(Cube::new)
    }
}

impl Bdd {
    /// The product term denoted by `cube`.
    pub fn cube_function(&self, cube: &Cube) -> Ref {
        self.mk_cube(cube.to_dimacs())
    }
}

//! Two-level covers in the Berkeley PLA text format.
//!
//! ```text
//! # full adder carry
//! .i 3
//! .o 1
//! 11- 1
//! 1-1 1
//! -11 1
//! .e
//! ```
//!
//! Each record is an input field followed by an output field. A field may be
//! split over several whitespace-separated tokens (or lines): characters are
//! accumulated until the width declared by `.i` / `.o` is reached. A single
//! `inputs|outputs` token is also accepted.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::debug;
use thiserror::Error;

use crate::bdd::Bdd;
use crate::cube::{Cube, Literal};
use crate::reference::Ref;
use crate::term::TermList;

#[derive(Error, Debug)]
pub enum PlaError {
    #[error("line {line}: {message}")]
    InvalidHeader { line: usize, message: String },

    #[error("line {line}: record before the .i and .o directives")]
    MissingHeader { line: usize },

    #[error("line {line}: invalid input literal {found:?}")]
    InvalidInput { line: usize, found: char },

    #[error("line {line}: invalid output literal {found:?}")]
    InvalidOutput { line: usize, found: char },

    #[error("line {line}: record is not complete at end of input")]
    Truncated { line: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OutputValue {
    Zero,
    One,
    DontCare,
}

impl OutputValue {
    /// `1`/`4` are on, `0`/`~` are off, `-`/`2` are don't-care.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '1' | '4' => Some(OutputValue::One),
            '0' | '~' => Some(OutputValue::Zero),
            '-' | '2' => Some(OutputValue::DontCare),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            OutputValue::Zero => '0',
            OutputValue::One => '1',
            OutputValue::DontCare => '-',
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PlaRow {
    pub inputs: Cube,
    pub outputs: Vec<OutputValue>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Pla {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub rows: Vec<PlaRow>,
}

impl Pla {
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            rows: Vec::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, PlaError> {
        Parser::default().parse(text)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, PlaError> {
        let text = fs::read_to_string(path.as_ref())?;
        let pla = Self::parse(&text)?;
        debug!(
            "read {}: {} inputs, {} outputs, {} rows",
            path.as_ref().display(),
            pla.num_inputs,
            pla.num_outputs,
            pla.rows.len()
        );
        Ok(pla)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        fs::write(path, self.to_string())
    }

    /// Set `output` of the row with input cube `inputs`, adding the row if it
    /// is not there yet.
    fn set(&mut self, index: &mut HashMap<Cube, usize>, inputs: &Cube, output: usize, value: OutputValue) {
        let i = *index.entry(inputs.clone()).or_insert_with(|| {
            self.rows.push(PlaRow {
                inputs: inputs.clone(),
                outputs: vec![OutputValue::Zero; self.num_outputs],
            });
            self.rows.len() - 1
        });
        self.rows[i].outputs[output] = value;
    }

    /// Merge per-output term lists into one cover. Terms with equal cubes
    /// share a row; rows appear in first-seen order.
    pub fn from_term_lists(num_inputs: usize, terms: &[TermList]) -> Self {
        let mut pla = Pla::new(num_inputs, terms.len());
        let mut index = HashMap::new();
        for (o, list) in terms.iter().enumerate() {
            for cube in list.cubes() {
                pla.set(&mut index, cube, o, OutputValue::One);
            }
        }
        pla
    }

    /// Cover listing the path cubes of every on-set as `1` and of every
    /// dc-set as `-`. A cube found in both ends up as `-`.
    pub fn from_functions(bdd: &Bdd, num_inputs: usize, on: &[Ref], dc: &[Ref]) -> Self {
        debug_assert_eq!(on.len(), dc.len());
        let mut pla = Pla::new(num_inputs, on.len());
        let mut index = HashMap::new();
        for o in 0..on.len() {
            for cube in bdd.cubes(on[o], num_inputs) {
                pla.set(&mut index, &cube, o, OutputValue::One);
            }
            for cube in bdd.cubes(dc[o], num_inputs) {
                pla.set(&mut index, &cube, o, OutputValue::DontCare);
            }
        }
        pla
    }

    fn view(&self, map: impl Fn(OutputValue) -> OutputValue) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| PlaRow {
                inputs: row.inputs.clone(),
                outputs: row.outputs.iter().map(|&v| map(v)).collect(),
            })
            .filter(|row| row.outputs.contains(&OutputValue::One))
            .collect();
        Self {
            num_inputs: self.num_inputs,
            num_outputs: self.num_outputs,
            rows,
        }
    }

    /// Characteristic function of the dc-set: don't-care outputs become `1`,
    /// everything else `0`.
    pub fn dc_set_view(&self) -> Self {
        self.view(|v| match v {
            OutputValue::DontCare => OutputValue::One,
            _ => OutputValue::Zero,
        })
    }

    /// Only the `1` outputs, everything else `0`.
    pub fn on_set_view(&self) -> Self {
        self.view(|v| match v {
            OutputValue::One => OutputValue::One,
            _ => OutputValue::Zero,
        })
    }

    /// Single-output covers, one per output, holding the rows that are on
    /// for that output.
    pub fn split_outputs(&self) -> Vec<Pla> {
        (0..self.num_outputs)
            .map(|o| Pla {
                num_inputs: self.num_inputs,
                num_outputs: 1,
                rows: self
                    .rows
                    .iter()
                    .filter(|row| row.outputs[o] == OutputValue::One)
                    .map(|row| PlaRow {
                        inputs: row.inputs.clone(),
                        outputs: vec![OutputValue::One],
                    })
                    .collect(),
            })
            .collect()
    }

    /// Per-output lists of the cubes whose output is `1`, origins numbered
    /// in row order.
    pub fn term_lists(&self) -> Vec<TermList> {
        (0..self.num_outputs)
            .map(|o| {
                TermList::from_cubes(
                    self.rows
                        .iter()
                        .filter(|row| row.outputs[o] == OutputValue::One)
                        .map(|row| row.inputs.clone()),
                )
            })
            .collect()
    }
}

impl Display for Pla {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, ".i {}", self.num_inputs)?;
        writeln!(f, ".o {}", self.num_outputs)?;
        writeln!(f, ".p {}", self.rows.len())?;
        for row in &self.rows {
            write!(f, "{} ", row.inputs)?;
            for v in &row.outputs {
                write!(f, "{}", v.to_char())?;
            }
            writeln!(f)?;
        }
        writeln!(f, ".e")
    }
}

impl FromStr for Pla {
    type Err = PlaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pla::parse(s)
    }
}

/// Per-output on-set and dc-set functions of a cover.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Functions {
    pub on: Vec<Ref>,
    pub dc: Vec<Ref>,
}

impl Functions {
    pub fn from_pla(bdd: &Bdd, pla: &Pla) -> Self {
        let mut on = vec![bdd.zero(); pla.num_outputs];
        let mut dc = vec![bdd.zero(); pla.num_outputs];
        for row in &pla.rows {
            let product = bdd.cube_function(&row.inputs);
            for (o, value) in row.outputs.iter().enumerate() {
                match value {
                    OutputValue::One => on[o] = bdd.apply_or(on[o], product),
                    OutputValue::DontCare => dc[o] = bdd.apply_or(dc[o], product),
                    OutputValue::Zero => {}
                }
            }
        }
        Self { on, dc }
    }

    pub fn num_outputs(&self) -> usize {
        self.on.len()
    }
}

#[derive(Default)]
struct Parser {
    num_inputs: Option<usize>,
    num_outputs: Option<usize>,
    rows: Vec<PlaRow>,
    inputs: Vec<Literal>,
    outputs: Vec<OutputValue>,
    /// Line where the record being read started.
    record_line: usize,
}

impl Parser {
    fn parse(mut self, text: &str) -> Result<Pla, PlaError> {
        for (n, line) in text.lines().enumerate() {
            let line_number = n + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(directive) = line.strip_prefix('.') {
                if self.directive(directive, line_number)? {
                    break;
                }
                continue;
            }
            for token in line.split_whitespace() {
                self.token(token, line_number)?;
            }
        }

        if !self.inputs.is_empty() || !self.outputs.is_empty() {
            return Err(PlaError::Truncated {
                line: self.record_line,
            });
        }
        match (self.num_inputs, self.num_outputs) {
            (Some(num_inputs), Some(num_outputs)) => Ok(Pla {
                num_inputs,
                num_outputs,
                rows: self.rows,
            }),
            _ => Err(PlaError::InvalidHeader {
                line: 0,
                message: "missing .i or .o directive".to_string(),
            }),
        }
    }

    /// Returns `true` on an end-of-cover directive.
    fn directive(&mut self, directive: &str, line: usize) -> Result<bool, PlaError> {
        let mut parts = directive.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let count = |parts: &mut std::str::SplitWhitespace<'_>| -> Result<usize, PlaError> {
            let value = parts.next().unwrap_or_default();
            match value.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(PlaError::InvalidHeader {
                    line,
                    message: format!(".{} expects a positive count, found {:?}", name, value),
                }),
            }
        };
        match name {
            "i" => self.num_inputs = Some(count(&mut parts)?),
            "o" => self.num_outputs = Some(count(&mut parts)?),
            "e" | "end" => return Ok(true),
            _ => {}
        }
        Ok(false)
    }

    fn token(&mut self, token: &str, line: usize) -> Result<(), PlaError> {
        let (Some(num_inputs), Some(num_outputs)) = (self.num_inputs, self.num_outputs) else {
            return Err(PlaError::MissingHeader { line });
        };

        for c in token.chars().filter(|&c| c != '|') {
            if self.inputs.is_empty() && self.outputs.is_empty() {
                self.record_line = line;
            }
            if self.inputs.len() < num_inputs {
                let literal = Literal::from_char(c).ok_or(PlaError::InvalidInput { line, found: c })?;
                self.inputs.push(literal);
            } else {
                let value = OutputValue::from_char(c).ok_or(PlaError::InvalidOutput { line, found: c })?;
                self.outputs.push(value);
                if self.outputs.len() == num_outputs {
                    self.rows.push(PlaRow {
                        inputs: Cube::new(std::mem::take(&mut self.inputs)),
                        outputs: std::mem::take(&mut self.outputs),
                    });
                }
            }
        }
        Ok(())
    }
}

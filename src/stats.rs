//! Size figures of a cover and the gain between two covers.

use std::fmt::{self, Display, Formatter};

use crate::pla::{OutputValue, Pla};

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PlaStats {
    /// Defined input literals, summed over rows.
    pub products_in: usize,
    /// `1` output entries.
    pub products_out: usize,
    /// AND-plane literals: each `1` output entry costs its row's literal count.
    pub and_literals: usize,
    /// OR-plane inputs: one per `1` output entry.
    pub or_ports: usize,
}

impl PlaStats {
    pub fn of(pla: &Pla) -> Self {
        let mut stats = Self::default();
        for row in &pla.rows {
            let literals = row.inputs.literal_count();
            let ones = row.outputs.iter().filter(|&&v| v == OutputValue::One).count();
            stats.products_in += literals;
            stats.products_out += ones;
            stats.and_literals += ones * literals;
            stats.or_ports += ones;
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.and_literals + self.or_ports
    }
}

impl Display for PlaStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IN: {}, OUT: {}, TOT: {}, AND LITERALS: {}, OR PORTS: {}",
            self.products_in,
            self.products_out,
            self.products_in + self.products_out,
            self.and_literals,
            self.or_ports
        )
    }
}

/// Which of the two approximate covers was kept.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Choice {
    Heuristic,
    Reminimized,
}

/// Prefer fewer OR ports, then fewer AND literals. A full tie goes to the
/// re-minimized cover.
pub fn choose_best(heuristic: &PlaStats, reminimized: &PlaStats) -> Choice {
    let key = |s: &PlaStats| (s.or_ports, s.and_literals);
    if key(reminimized) <= key(heuristic) {
        Choice::Reminimized
    } else {
        Choice::Heuristic
    }
}

/// Reduction from an original cover to an approximate one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Gain {
    pub or_ports: i64,
    pub and_literals: i64,
    pub or_percent: f64,
    pub and_percent: f64,
    pub total_percent: f64,
}

impl Gain {
    pub fn between(original: &PlaStats, approximate: &PlaStats) -> Self {
        let percent = |diff: i64, base: usize| {
            if base > 0 {
                diff as f64 / base as f64 * 100.0
            } else {
                0.0
            }
        };
        let or_ports = original.or_ports as i64 - approximate.or_ports as i64;
        let and_literals = original.and_literals as i64 - approximate.and_literals as i64;
        Self {
            or_ports,
            and_literals,
            or_percent: percent(or_ports, original.or_ports),
            and_percent: percent(and_literals, original.and_literals),
            total_percent: percent(or_ports + and_literals, original.total()),
        }
    }

    pub fn total(&self) -> i64 {
        self.or_ports + self.and_literals
    }
}

impl Display for Gain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OR: {}, AND: {}, TOT: {} ({:.2}%, {:.2}%, {:.2}%)",
            self.or_ports,
            self.and_literals,
            self.total(),
            self.or_percent,
            self.and_percent,
            self.total_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_stats_of() {
        let pla = Pla::parse(".i 3\n.o 2\n11- 11\n-01 10\n000 0-\n").unwrap();
        let stats = PlaStats::of(&pla);
        assert_eq!(stats.products_in, 2 + 2 + 3);
        assert_eq!(stats.products_out, 3);
        assert_eq!(stats.and_literals, 2 * 2 + 2);
        assert_eq!(stats.or_ports, 3);
        assert_eq!(stats.total(), 9);
    }

    #[test]
    fn test_choose_best() {
        let a = PlaStats {
            and_literals: 10,
            or_ports: 4,
            ..Default::default()
        };
        let fewer_ports = PlaStats {
            and_literals: 12,
            or_ports: 3,
            ..Default::default()
        };
        let fewer_literals = PlaStats {
            and_literals: 8,
            or_ports: 4,
            ..Default::default()
        };
        assert_eq!(choose_best(&a, &fewer_ports), Choice::Reminimized);
        assert_eq!(choose_best(&fewer_ports, &a), Choice::Heuristic);
        assert_eq!(choose_best(&a, &fewer_literals), Choice::Reminimized);
        assert_eq!(choose_best(&fewer_literals, &a), Choice::Heuristic);
        assert_eq!(choose_best(&a, &a), Choice::Reminimized);
    }

    #[test]
    fn test_gain() {
        let original = PlaStats {
            and_literals: 20,
            or_ports: 5,
            ..Default::default()
        };
        let approximate = PlaStats {
            and_literals: 15,
            or_ports: 4,
            ..Default::default()
        };
        let gain = Gain::between(&original, &approximate);
        assert_eq!(gain.or_ports, 1);
        assert_eq!(gain.and_literals, 5);
        assert_eq!(gain.total(), 6);
        assert_eq!(gain.or_percent, 20.0);
        assert_eq!(gain.and_percent, 25.0);
        assert_eq!(gain.total_percent, 24.0);

        let empty = Gain::between(&PlaStats::default(), &PlaStats::default());
        assert_eq!(empty.total_percent, 0.0);
    }
}

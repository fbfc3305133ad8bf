//! Library units
//!
//! Values inside the data model are kept in SI (seconds, farads, watts).
//! A [`Unit`] records the library's display unit so reports can print values
//! the way the library author wrote them.

use crate::error::{LibertyError, Result};
use serde::{Deserialize, Serialize};

/// Physical quantity a unit measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantity {
    Time,
    Capacitance,
    Power,
}

impl Quantity {
    fn base_suffix(self) -> &'static str {
        match self {
            Quantity::Time => "s",
            Quantity::Capacitance => "F",
            Quantity::Power => "W",
        }
    }
}

/// A display unit: SI value of one unit plus its printed suffix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub quantity: Quantity,
    /// SI value of one unit (1e-9 for "1ns")
    pub scale: f64,
    /// Printed suffix ("ns", "pF", "mW")
    pub suffix: String,
}

impl Unit {
    pub fn new(quantity: Quantity, scale: f64, suffix: &str) -> Self {
        Self {
            quantity,
            scale,
            suffix: suffix.to_string(),
        }
    }

    /// Parse a Liberty unit string such as `1ns`, `10ps`, `1nW` or `1,pf`
    pub fn from_liberty(quantity: Quantity, unit: &str) -> Result<Self> {
        let cleaned: String = unit
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '"' && *c != '(' && *c != ')')
            .collect();

        let num_end = cleaned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(cleaned.len());
        let multiplier: f64 = if num_end == 0 {
            1.0
        } else {
            cleaned[..num_end]
                .parse()
                .map_err(|_| LibertyError::InvalidUnit(unit.to_string()))?
        };
        let suffix = cleaned[num_end..].trim_start_matches(',');

        // Only the base letter is case-insensitive; `M` is not `m`
        let base = quantity.base_suffix();
        let split = suffix
            .len()
            .checked_sub(base.len())
            .filter(|&split| suffix.is_char_boundary(split))
            .ok_or_else(|| LibertyError::InvalidUnit(unit.to_string()))?;
        let (prefix, base_text) = suffix.split_at(split);
        if !base_text.eq_ignore_ascii_case(base) {
            return Err(LibertyError::InvalidUnit(unit.to_string()));
        }

        let prefix_scale = match prefix {
            "" => 1.0,
            "k" => 1e3,
            "m" => 1e-3,
            "u" => 1e-6,
            "n" => 1e-9,
            "p" => 1e-12,
            "f" => 1e-15,
            _ => return Err(LibertyError::InvalidUnit(unit.to_string())),
        };

        let display = if multiplier == 1.0 {
            format!("{}{}", prefix, base)
        } else {
            format!("{}{}{}", multiplier, prefix, base)
        };

        Ok(Self::new(quantity, multiplier * prefix_scale, &display))
    }

    /// Convert an SI value into this unit
    pub fn from_si(&self, value: f64) -> f64 {
        value / self.scale
    }

    /// Convert a value in this unit into SI
    pub fn to_si(&self, value: f64) -> f64 {
        value * self.scale
    }

    /// Format an SI value with a fixed number of decimals, without suffix
    pub fn as_string(&self, value: f64, digits: usize) -> String {
        format!("{:.*}", digits, self.from_si(value))
    }

    /// Format an SI value with a fixed number of decimals and the suffix
    pub fn as_string_with_suffix(&self, value: f64, digits: usize) -> String {
        format!("{}{}", self.as_string(value, digits), self.suffix)
    }
}

/// The units a library declares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Units {
    pub time: Unit,
    pub capacitance: Unit,
    pub power: Unit,
}

impl Default for Units {
    fn default() -> Self {
        Self {
            time: Unit::new(Quantity::Time, 1e-9, "ns"),
            capacitance: Unit::new(Quantity::Capacitance, 1e-12, "pF"),
            power: Unit::new(Quantity::Power, 1e-3, "mW"),
        }
    }
}

impl Units {
    pub fn time_unit(&self) -> &Unit {
        &self.time
    }

    pub fn capacitance_unit(&self) -> &Unit {
        &self.capacitance
    }

    pub fn power_unit(&self) -> &Unit {
        &self.power
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_units() {
        let ns = Unit::from_liberty(Quantity::Time, "1ns").unwrap();
        assert!((ns.scale - 1e-9).abs() < 1e-20);
        assert_eq!(ns.suffix, "ns");

        let ps = Unit::from_liberty(Quantity::Time, "\"10ps\"").unwrap();
        assert!((ps.scale - 1e-11).abs() < 1e-22);
        assert_eq!(ps.suffix, "10ps");
    }

    #[test]
    fn test_capacitive_load_unit() {
        let pf = Unit::from_liberty(Quantity::Capacitance, "(1,pf)").unwrap();
        assert!((pf.scale - 1e-12).abs() < 1e-23);
        assert_eq!(pf.suffix, "pF");

        let ff = Unit::from_liberty(Quantity::Capacitance, "1,ff").unwrap();
        assert!((ff.scale - 1e-15).abs() < 1e-26);
    }

    #[test]
    fn test_power_units() {
        let nw = Unit::from_liberty(Quantity::Power, "1nW").unwrap();
        assert!((nw.scale - 1e-9).abs() < 1e-20);
        assert_eq!(nw.suffix, "nW");

        let mw = Unit::from_liberty(Quantity::Power, "1mW").unwrap();
        assert_eq!(mw.as_string_with_suffix(2.5e-3, 3), "2.500mW");

        let lower = Unit::from_liberty(Quantity::Power, "1mw").unwrap();
        assert!((lower.scale - 1e-3).abs() < 1e-14);
        assert_eq!(lower.suffix, "mW");
    }

    #[test]
    fn test_invalid_units() {
        assert!(Unit::from_liberty(Quantity::Time, "1nW").is_err());
        assert!(Unit::from_liberty(Quantity::Power, "1xW").is_err());
        assert!(Unit::from_liberty(Quantity::Time, "abc").is_err());
        assert!(Unit::from_liberty(Quantity::Power, "1MW").is_err());
        assert!(Unit::from_liberty(Quantity::Time, "1NS").is_err());
        assert!(Unit::from_liberty(Quantity::Time, "").is_err());
    }

    #[test]
    fn test_si_conversion() {
        let units = Units::default();
        assert!((units.time_unit().to_si(0.5) - 0.5e-9).abs() < 1e-20);
        assert_eq!(units.capacitance_unit().as_string(3.2e-12, 2), "3.20");
    }
}

//! Characterization Tables
//!
//! Lookup tables produced by cell characterization. A table has zero to
//! three independent axes; each axis declares which physical quantity it is
//! indexed by. Values between grid points are interpolated, values outside
//! the grid are linearly extrapolated from the nearest pair of points.
//!
//! # Key Concepts
//!
//! - **Axis variable**: the quantity an axis represents (input transition,
//!   output load, related pin transition, ...).
//! - **Template**: a named set of axis declarations (`lu_table_template`,
//!   `power_lut_template`) shared by many tables.
//! - **Axis values**: the resolved operating point handed to the engine,
//!   one scalar per table axis.

use crate::error::{LibertyError, Result};
use crate::library::Pvt;
use crate::units::{Unit, Units};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// Maximum number of independent axes a table may declare
pub const MAX_TABLE_ORDER: usize = 3;

/// Quantity represented by a table axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableAxisVariable {
    TotalOutputNetCapacitance,
    EqualOrOppositeOutputNetCapacitance,
    InputNetTransition,
    InputTransitionTime,
    RelatedPinTransition,
    ConstrainedPinTransition,
    OutputPinTransition,
    ConnectDelay,
    RelatedOutTotalOutputNetCapacitance,
    Time,
    IvOutputVoltage,
    InputNoiseWidth,
    InputNoiseHeight,
    InputVoltage,
    OutputVoltage,
    PathDepth,
    PathDistance,
    NormalizedVoltage,
}

impl TableAxisVariable {
    const NAMES: [(TableAxisVariable, &'static str); 18] = [
        (
            TableAxisVariable::TotalOutputNetCapacitance,
            "total_output_net_capacitance",
        ),
        (
            TableAxisVariable::EqualOrOppositeOutputNetCapacitance,
            "equal_or_opposite_output_net_capacitance",
        ),
        (TableAxisVariable::InputNetTransition, "input_net_transition"),
        (TableAxisVariable::InputTransitionTime, "input_transition_time"),
        (TableAxisVariable::RelatedPinTransition, "related_pin_transition"),
        (
            TableAxisVariable::ConstrainedPinTransition,
            "constrained_pin_transition",
        ),
        (TableAxisVariable::OutputPinTransition, "output_pin_transition"),
        (TableAxisVariable::ConnectDelay, "connect_delay"),
        (
            TableAxisVariable::RelatedOutTotalOutputNetCapacitance,
            "related_out_total_output_net_capacitance",
        ),
        (TableAxisVariable::Time, "time"),
        (TableAxisVariable::IvOutputVoltage, "iv_output_voltage"),
        (TableAxisVariable::InputNoiseWidth, "input_noise_width"),
        (TableAxisVariable::InputNoiseHeight, "input_noise_height"),
        (TableAxisVariable::InputVoltage, "input_voltage"),
        (TableAxisVariable::OutputVoltage, "output_voltage"),
        (TableAxisVariable::PathDepth, "path_depth"),
        (TableAxisVariable::PathDistance, "path_distance"),
        (TableAxisVariable::NormalizedVoltage, "normalized_voltage"),
    ];

    /// Look up a variable by its Liberty keyword
    pub fn from_liberty_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(_, keyword)| *keyword == name)
            .map(|(variable, _)| *variable)
    }

    pub fn as_liberty_name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(variable, _)| *variable == self)
            .map(|(_, keyword)| *keyword)
            .unwrap_or("unknown")
    }

    /// Display unit for values along this axis, if it has one
    pub fn unit(self, units: &Units) -> Option<&Unit> {
        match self {
            TableAxisVariable::InputNetTransition
            | TableAxisVariable::InputTransitionTime
            | TableAxisVariable::RelatedPinTransition
            | TableAxisVariable::ConstrainedPinTransition
            | TableAxisVariable::OutputPinTransition
            | TableAxisVariable::ConnectDelay
            | TableAxisVariable::Time
            | TableAxisVariable::InputNoiseWidth => Some(units.time_unit()),
            TableAxisVariable::TotalOutputNetCapacitance
            | TableAxisVariable::EqualOrOppositeOutputNetCapacitance
            | TableAxisVariable::RelatedOutTotalOutputNetCapacitance => {
                Some(units.capacitance_unit())
            }
            _ => None,
        }
    }
}

impl fmt::Display for TableAxisVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_liberty_name())
    }
}

/// One table axis: its variable and index points (SI units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAxis {
    pub variable: TableAxisVariable,
    pub values: Vec<f64>,
}

impl TableAxis {
    pub fn new(variable: TableAxisVariable, values: Vec<f64>) -> Self {
        Self { variable, values }
    }

    pub fn variable(&self) -> TableAxisVariable {
        self.variable
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Lower grid index and fractional position of `value` along this axis.
    ///
    /// The fraction is not clamped, so points outside the grid extrapolate
    /// from the first or last interval.
    fn find_interp_index(&self, value: f64) -> (usize, f64) {
        let axis = &self.values;
        if axis.len() <= 1 {
            return (0, 0.0);
        }

        let last = axis.len() - 2;
        let idx = axis
            .windows(2)
            .position(|pair| value < pair[1])
            .unwrap_or(last)
            .min(last);

        let span = axis[idx + 1] - axis[idx];
        if span == 0.0 {
            (idx, 0.0)
        } else {
            (idx, (value - axis[idx]) / span)
        }
    }
}

/// Resolved operating point, one value per table axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisValues {
    Constant,
    One(f64),
    Two(f64, f64),
    Three(f64, f64, f64),
}

impl AxisValues {
    pub fn order(&self) -> usize {
        match self {
            AxisValues::Constant => 0,
            AxisValues::One(..) => 1,
            AxisValues::Two(..) => 2,
            AxisValues::Three(..) => 3,
        }
    }

    /// Positional triple with unused slots set to 0.0
    pub fn as_triple(&self) -> (f64, f64, f64) {
        match *self {
            AxisValues::Constant => (0.0, 0.0, 0.0),
            AxisValues::One(v1) => (v1, 0.0, 0.0),
            AxisValues::Two(v1, v2) => (v1, v2, 0.0),
            AxisValues::Three(v1, v2, v3) => (v1, v2, v3),
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        let (v1, v2, v3) = self.as_triple();
        let mut values = vec![v1, v2, v3];
        values.truncate(self.order());
        values
    }
}

/// Table engine seen by the power model
///
/// Implementations must be read-only after construction so a frozen
/// library can be queried from several threads.
pub trait PowerTable: fmt::Debug + Send + Sync {
    /// Declared axes, outermost first
    fn axes(&self) -> &[TableAxis];

    /// Value at the operating point, interpolated or extrapolated
    fn find_value(&self, pvt: Option<&Pvt>, values: AxisValues) -> f64;

    fn order(&self) -> usize {
        self.axes().len()
    }

    fn axis1(&self) -> Option<&TableAxis> {
        self.axes().first()
    }

    fn axis2(&self) -> Option<&TableAxis> {
        self.axes().get(1)
    }

    fn axis3(&self) -> Option<&TableAxis> {
        self.axes().get(2)
    }

    /// Human readable lookup trace ending in `label = value`
    fn report_value(
        &self,
        label: &str,
        pvt: Option<&Pvt>,
        values: AxisValues,
        units: &Units,
        result_unit: &Unit,
        digits: usize,
    ) -> String {
        let mut report = String::new();
        for (axis, value) in self.axes().iter().zip(values.to_vec()) {
            let formatted = match axis.variable.unit(units) {
                Some(unit) => unit.as_string_with_suffix(value, digits),
                None => format!("{:.*}", digits, value),
            };
            let _ = writeln!(report, "  {} = {}", axis.variable, formatted);
        }
        let result = self.find_value(pvt, values);
        let _ = writeln!(
            report,
            "{} = {}",
            label,
            result_unit.as_string_with_suffix(result, digits)
        );
        report
    }
}

/// Dense lookup table with up to three axes
///
/// Values are stored row-major with the first axis outermost.
#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    axes: Vec<TableAxis>,
    values: Vec<f64>,
}

impl TableModel {
    /// Create a table, checking order and grid size
    pub fn new(axes: Vec<TableAxis>, values: Vec<f64>) -> Result<Self> {
        if axes.len() > MAX_TABLE_ORDER {
            return Err(LibertyError::UnsupportedTableOrder { order: axes.len() });
        }
        if let Some(axis) = axes.iter().find(|axis| axis.is_empty()) {
            return Err(LibertyError::EmptyAxis(axis.variable));
        }

        let expected: usize = axes.iter().map(TableAxis::len).product();
        if values.len() != expected {
            return Err(LibertyError::TableSizeMismatch {
                expected,
                actual: values.len(),
            });
        }

        Ok(Self { axes, values })
    }

    /// Create a scalar table
    pub fn constant(value: f64) -> Self {
        Self {
            axes: Vec::new(),
            values: vec![value],
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.axes.len()];
        for dim in (0..self.axes.len().saturating_sub(1)).rev() {
            strides[dim] = strides[dim + 1] * self.axes[dim + 1].len();
        }
        strides
    }

    /// Multilinear interpolation over the table grid
    fn lookup(&self, point: &[f64]) -> f64 {
        let brackets: Vec<(usize, f64)> = self
            .axes
            .iter()
            .zip(point)
            .map(|(axis, value)| axis.find_interp_index(*value))
            .collect();
        let strides = self.strides();

        let mut total = 0.0;
        'corner: for corner in 0..(1usize << self.axes.len()) {
            let mut weight = 1.0;
            let mut offset = 0;
            for (dim, axis) in self.axes.iter().enumerate() {
                let (lower, frac) = brackets[dim];
                let upper = (corner >> dim) & 1 == 1;
                if upper && axis.len() == 1 {
                    continue 'corner;
                }
                weight *= if upper { frac } else { 1.0 - frac };
                offset += (lower + upper as usize) * strides[dim];
            }
            total += weight * self.values[offset];
        }
        total
    }
}

impl PowerTable for TableModel {
    fn axes(&self) -> &[TableAxis] {
        &self.axes
    }

    fn find_value(&self, _pvt: Option<&Pvt>, values: AxisValues) -> f64 {
        let (v1, v2, v3) = values.as_triple();
        let point = [v1, v2, v3];
        self.lookup(&point[..self.axes.len()])
    }
}

/// Named axis declarations shared by tables (`power_lut_template`)
#[derive(Debug, Clone, PartialEq)]
pub struct TableTemplate {
    pub name: String,
    pub axes: Vec<TableAxis>,
}

impl TableTemplate {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            axes: Vec::new(),
        }
    }

    /// A template with no axes describes scalar tables
    pub fn scalar() -> Self {
        Self::new("scalar")
    }
}

//! Internal Power
//!
//! Internal power is the energy a cell dissipates on its own internal nodes
//! when an output or input switches. Liberty describes it per
//! (pin, related pin) with an optional `when` condition and one table per
//! switching edge.
//!
//! # Lifecycle
//!
//! ```text
//! InternalPowerAttrs (mutable, filled by the reader)
//!     │ take_parts()
//!     ▼
//! InternalPower (immutable, registered in its cell)
//!     │ power(rf, ..)
//!     ▼
//! InternalPowerModel → PowerTable
//! ```
//!
//! Taking the parts empties the builder, so clearing it afterwards never
//! releases anything a record still uses. Edge models are shared through
//! `Arc`; a `power` group that is edge independent stores the same model in
//! both slots and it is released once, when the last holder goes away.

use crate::error::{LibertyError, Result};
use crate::func_expr::FuncExpr;
use crate::library::{LibertyCell, LibertyLibrary, PortId, Pvt};
use crate::rise_fall::{RiseFall, RiseFallPair};
use crate::table::{AxisValues, PowerTable, TableAxis, TableAxisVariable};
use crate::units::Units;
use std::sync::Arc;

/// Power characterization for one switching edge
#[derive(Debug, Default)]
pub struct InternalPowerModel {
    table: Option<Box<dyn PowerTable>>,
}

impl InternalPowerModel {
    pub fn new(table: impl PowerTable + 'static) -> Self {
        Self {
            table: Some(Box::new(table)),
        }
    }

    /// A model with no table; it reports zero power
    pub fn empty() -> Self {
        Self { table: None }
    }

    pub fn table(&self) -> Option<&dyn PowerTable> {
        self.table.as_deref()
    }

    /// Power at the given input slew (s) and output load (F)
    pub fn power(&self, pvt: Option<&Pvt>, in_slew: f64, load_cap: f64) -> Result<f64> {
        match self.table.as_deref() {
            Some(table) => {
                let values = Self::find_axis_values(table, in_slew, load_cap)?;
                Ok(table.find_value(pvt, values))
            }
            None => Ok(0.0),
        }
    }

    /// Lookup trace for debugging characterization data
    pub fn report_power(
        &self,
        units: &Units,
        pvt: Option<&Pvt>,
        in_slew: f64,
        load_cap: f64,
        digits: usize,
    ) -> Result<String> {
        match self.table.as_deref() {
            Some(table) => {
                let values = Self::find_axis_values(table, in_slew, load_cap)?;
                Ok(table.report_value("Power", pvt, values, units, units.power_unit(), digits))
            }
            None => Ok(String::new()),
        }
    }

    /// Resolve the operating point for every axis of `table`.
    ///
    /// Tables with more than three axes are rejected before the engine is
    /// consulted.
    pub fn find_axis_values(
        table: &dyn PowerTable,
        in_slew: f64,
        load_cap: f64,
    ) -> Result<AxisValues> {
        let value = |axis: &TableAxis| Self::axis_value(axis, in_slew, load_cap);
        match table.axes() {
            [] => Ok(AxisValues::Constant),
            [axis1] => Ok(AxisValues::One(value(axis1)?)),
            [axis1, axis2] => Ok(AxisValues::Two(value(axis1)?, value(axis2)?)),
            [axis1, axis2, axis3] => Ok(AxisValues::Three(
                value(axis1)?,
                value(axis2)?,
                value(axis3)?,
            )),
            axes => Err(LibertyError::UnsupportedTableOrder { order: axes.len() }),
        }
    }

    /// Map one axis to the slew or load it is indexed by
    pub fn axis_value(axis: &TableAxis, in_slew: f64, load_cap: f64) -> Result<f64> {
        match axis.variable() {
            TableAxisVariable::InputTransitionTime => Ok(in_slew),
            TableAxisVariable::TotalOutputNetCapacitance => Ok(load_cap),
            variable => Err(LibertyError::UnsupportedTableAxis { variable }),
        }
    }

    /// True when every axis of `table` can be resolved by [`Self::axis_value`]
    pub fn resolves_axes(table: &dyn PowerTable) -> bool {
        Self::find_axis_values(table, 0.0, 0.0).is_ok()
    }

    /// Validate a related-pin power table: the first two axes (when present)
    /// must be pin transitions or the related output load, and there must be
    /// no third axis.
    pub fn check_axes(table: &dyn PowerTable) -> bool {
        let axis1_ok = table.axis1().map_or(true, Self::check_axis);
        let axis2_ok = table.axis2().map_or(true, Self::check_axis);
        axis1_ok && axis2_ok && table.axis3().is_none()
    }

    fn check_axis(axis: &TableAxis) -> bool {
        matches!(
            axis.variable(),
            TableAxisVariable::ConstrainedPinTransition
                | TableAxisVariable::RelatedPinTransition
                | TableAxisVariable::RelatedOutTotalOutputNetCapacitance
        )
    }
}

/// Fields handed from a builder to its records
#[derive(Debug, Clone, Default)]
pub struct InternalPowerParts {
    pub when: Option<Arc<FuncExpr>>,
    pub models: RiseFallPair<Option<Arc<InternalPowerModel>>>,
    pub related_pg_pin: Option<String>,
}

/// Accumulates one `internal_power` group while it is being read
#[derive(Debug, Default)]
pub struct InternalPowerAttrs {
    when: Option<Arc<FuncExpr>>,
    models: RiseFallPair<Option<Arc<InternalPowerModel>>>,
    related_pg_pin: Option<String>,
}

impl InternalPowerAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_when(&mut self, when: FuncExpr) {
        self.when = Some(Arc::new(when));
    }

    pub fn set_model(&mut self, rf: RiseFall, model: Arc<InternalPowerModel>) {
        self.models[rf] = Some(model);
    }

    pub fn set_related_pg_pin(&mut self, related_pg_pin: &str) {
        self.related_pg_pin = Some(related_pg_pin.to_string());
    }

    pub fn when(&self) -> Option<&FuncExpr> {
        self.when.as_deref()
    }

    pub fn model(&self, rf: RiseFall) -> Option<&Arc<InternalPowerModel>> {
        self.models[rf].as_ref()
    }

    pub fn related_pg_pin(&self) -> Option<&str> {
        self.related_pg_pin.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.when.is_none()
            && self.related_pg_pin.is_none()
            && RiseFall::range().all(|rf| self.models[rf].is_none())
    }

    /// Move every field out, leaving the builder empty
    pub fn take_parts(&mut self) -> InternalPowerParts {
        let mut models = RiseFallPair::default();
        for rf in RiseFall::range() {
            models[rf] = self.models[rf].take();
        }
        InternalPowerParts {
            when: self.when.take(),
            models,
            related_pg_pin: self.related_pg_pin.take(),
        }
    }

    /// Release whatever the builder still holds.
    ///
    /// A no-op once the parts have been taken.
    pub fn clear(&mut self) {
        drop(self.take_parts());
    }
}

/// Internal power characterization of one (port, related port) pair
#[derive(Debug)]
pub struct InternalPower {
    port: PortId,
    related_port: Option<PortId>,
    when: Option<Arc<FuncExpr>>,
    models: RiseFallPair<Option<Arc<InternalPowerModel>>>,
    related_pg_pin: Option<String>,
}

impl InternalPower {
    /// Build a record from `attrs` and register it with `cell`.
    ///
    /// The builder is left empty.
    pub fn new<'c>(
        cell: &'c mut LibertyCell,
        port: PortId,
        related_port: Option<PortId>,
        attrs: &mut InternalPowerAttrs,
    ) -> &'c InternalPower {
        let power = Self::from_parts(port, related_port, attrs.take_parts());
        cell.add_internal_power(power)
    }

    /// Build an unregistered record from already extracted parts
    pub fn from_parts(
        port: PortId,
        related_port: Option<PortId>,
        parts: InternalPowerParts,
    ) -> Self {
        Self {
            port,
            related_port,
            when: parts.when,
            models: parts.models,
            related_pg_pin: parts.related_pg_pin,
        }
    }

    pub fn port(&self) -> PortId {
        self.port
    }

    pub fn related_port(&self) -> Option<PortId> {
        self.related_port
    }

    pub fn when(&self) -> Option<&FuncExpr> {
        self.when.as_deref()
    }

    pub fn related_pg_pin(&self) -> Option<&str> {
        self.related_pg_pin.as_deref()
    }

    pub fn model(&self, rf: RiseFall) -> Option<&InternalPowerModel> {
        self.models[rf].as_deref()
    }

    /// Owning cell, found through the port
    pub fn liberty_cell<'l>(&self, library: &'l LibertyLibrary) -> Option<&'l LibertyCell> {
        library.cell(self.port.cell())
    }

    /// Power for one switching edge; zero when that edge is not characterized
    pub fn power(
        &self,
        rf: RiseFall,
        pvt: Option<&Pvt>,
        in_slew: f64,
        load_cap: f64,
    ) -> Result<f64> {
        match self.model(rf) {
            Some(model) => model.power(pvt, in_slew, load_cap),
            None => Ok(0.0),
        }
    }

    /// Lookup trace for one edge using the library's units
    pub fn report_power(
        &self,
        library: &LibertyLibrary,
        rf: RiseFall,
        pvt: Option<&Pvt>,
        in_slew: f64,
        load_cap: f64,
        digits: usize,
    ) -> Result<String> {
        match self.model(rf) {
            Some(model) => model.report_power(library.units(), pvt, in_slew, load_cap, digits),
            None => Ok(String::new()),
        }
    }
}

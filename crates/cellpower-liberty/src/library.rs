//! Liberty library, cell and port data model
//!
//! Cells live in their library and ports live in their cell. Other objects
//! refer to them by id ([`CellId`], [`PortId`]) rather than by pointer; a
//! [`PortId`] carries the id of its owning cell so any holder of a port can
//! get back to the cell.

use crate::internal_power::InternalPower;
use crate::table::TableTemplate;
use crate::units::Units;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Process/voltage/temperature operating point
///
/// Passed through to the table engine untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pvt {
    pub process: f64,
    pub voltage: f64,
    pub temperature: f64,
}

impl Default for Pvt {
    fn default() -> Self {
        Self {
            process: 1.0,
            voltage: 1.0,
            temperature: 25.0,
        }
    }
}

impl Pvt {
    pub fn new(process: f64, voltage: f64, temperature: f64) -> Self {
        Self {
            process,
            voltage,
            temperature,
        }
    }
}

/// Index of a cell in its library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(pub usize);

/// A port, addressed through its owning cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId {
    pub cell: CellId,
    pub index: usize,
}

impl PortId {
    /// Owning cell
    pub fn cell(&self) -> CellId {
        self.cell
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
    Internal,
}

impl PortDirection {
    pub fn from_liberty(value: &str) -> Self {
        match value {
            "input" => PortDirection::Input,
            "output" => PortDirection::Output,
            "inout" => PortDirection::Inout,
            _ => PortDirection::Internal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LibertyPort {
    id: PortId,
    pub name: String,
    pub direction: PortDirection,
    /// Input capacitance (F)
    pub capacitance: Option<f64>,
}

impl LibertyPort {
    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn liberty_cell(&self) -> CellId {
        self.id.cell
    }
}

#[derive(Debug)]
pub struct LibertyCell {
    id: CellId,
    pub name: String,
    pub area: f64,
    ports: IndexMap<String, LibertyPort>,
    internal_powers: Vec<InternalPower>,
}

impl LibertyCell {
    fn new(id: CellId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            area: 0.0,
            ports: IndexMap::new(),
            internal_powers: Vec::new(),
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    /// Add a port, or return the existing one with the same name
    pub fn add_port(&mut self, name: &str, direction: PortDirection) -> PortId {
        if let Some(index) = self.ports.get_index_of(name) {
            return PortId {
                cell: self.id,
                index,
            };
        }

        let id = PortId {
            cell: self.id,
            index: self.ports.len(),
        };
        self.ports.insert(
            name.to_string(),
            LibertyPort {
                id,
                name: name.to_string(),
                direction,
                capacitance: None,
            },
        );
        id
    }

    pub fn port(&self, id: PortId) -> Option<&LibertyPort> {
        if id.cell != self.id {
            return None;
        }
        self.ports.get_index(id.index).map(|(_, port)| port)
    }

    pub fn port_mut(&mut self, id: PortId) -> Option<&mut LibertyPort> {
        if id.cell != self.id {
            return None;
        }
        self.ports.get_index_mut(id.index).map(|(_, port)| port)
    }

    pub fn find_port(&self, name: &str) -> Option<&LibertyPort> {
        self.ports.get(name)
    }

    pub fn ports(&self) -> impl Iterator<Item = &LibertyPort> {
        self.ports.values()
    }

    /// Register an internal power record; records keep insertion order
    pub fn add_internal_power(&mut self, power: InternalPower) -> &InternalPower {
        debug!(
            cell = %self.name,
            port = power.port().index,
            related_port = ?power.related_port().map(|p| p.index),
            "registered internal power"
        );
        let index = self.internal_powers.len();
        self.internal_powers.push(power);
        &self.internal_powers[index]
    }

    pub fn internal_powers(&self) -> &[InternalPower] {
        &self.internal_powers
    }

    /// Internal power records characterized for `port`
    pub fn internal_powers_for(&self, port: PortId) -> impl Iterator<Item = &InternalPower> {
        self.internal_powers
            .iter()
            .filter(move |power| power.port() == port)
    }
}

#[derive(Debug)]
pub struct LibertyLibrary {
    pub name: String,
    pub units: Units,
    /// Nominal operating conditions
    pub nominal: Pvt,
    templates: IndexMap<String, TableTemplate>,
    cells: IndexMap<String, LibertyCell>,
}

impl Default for LibertyLibrary {
    fn default() -> Self {
        Self::new("default")
    }
}

impl LibertyLibrary {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            units: Units::default(),
            nominal: Pvt::default(),
            templates: IndexMap::new(),
            cells: IndexMap::new(),
        }
    }

    pub fn units(&self) -> &Units {
        &self.units
    }

    /// Add a cell, replacing any previous cell body with the same name
    pub fn add_cell(&mut self, name: &str) -> &mut LibertyCell {
        let index = match self.cells.get_index_of(name) {
            Some(index) => {
                self.cells[index] = LibertyCell::new(CellId(index), name);
                index
            }
            None => {
                let index = self.cells.len();
                self.cells
                    .insert(name.to_string(), LibertyCell::new(CellId(index), name));
                index
            }
        };
        &mut self.cells[index]
    }

    pub fn cell(&self, id: CellId) -> Option<&LibertyCell> {
        self.cells.get_index(id.0).map(|(_, cell)| cell)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut LibertyCell> {
        self.cells.get_index_mut(id.0).map(|(_, cell)| cell)
    }

    pub fn find_cell(&self, name: &str) -> Option<&LibertyCell> {
        self.cells.get(name)
    }

    pub fn cells(&self) -> impl Iterator<Item = &LibertyCell> {
        self.cells.values()
    }

    pub fn cell_names(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(|s| s.as_str())
    }

    pub fn add_template(&mut self, template: TableTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn template(&self, name: &str) -> Option<&TableTemplate> {
        self.templates.get(name)
    }

    /// Port lookup through its owning cell
    pub fn port(&self, id: PortId) -> Option<&LibertyPort> {
        self.cell(id.cell).and_then(|cell| cell.port(id))
    }
}

//! Liberty reader
//!
//! Builds a [`LibertyLibrary`] from the parsed group tree. Only the parts
//! needed for internal power are interpreted: units, nominal operating
//! conditions, table templates, cells, pins and `internal_power` groups.
//! Everything else is skipped.
//!
//! Each `internal_power` group is accumulated in an [`InternalPowerAttrs`]
//! and turned into one record per related pin. A table that cannot be used
//! is logged and dropped; the affected edge then reports zero power.

use crate::error::{LibertyError, Result};
use crate::func_expr::FuncExpr;
use crate::internal_power::{InternalPower, InternalPowerAttrs, InternalPowerModel};
use crate::library::{CellId, LibertyCell, LibertyLibrary, PortDirection, PortId};
use crate::parser::{self, LibertyGroup};
use crate::rise_fall::RiseFall;
use crate::table::{TableAxis, TableAxisVariable, TableModel, TableTemplate, MAX_TABLE_ORDER};
use crate::units::{Quantity, Unit};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

const TEMPLATE_KINDS: [&str; 2] = ["power_lut_template", "lu_table_template"];

/// Read a Liberty file from disk
pub fn read_liberty_file(path: impl AsRef<Path>) -> Result<LibertyLibrary> {
    let content = std::fs::read_to_string(path.as_ref())
        .map_err(|e| LibertyError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
    read_liberty(&content)
}

/// Read a Liberty library from source text
pub fn read_liberty(content: &str) -> Result<LibertyLibrary> {
    let root = parser::parse(content)?;
    if root.kind != "library" {
        return Err(LibertyError::Parse {
            message: format!("Expected 'library' group, found '{}'", root.kind),
            line: root.line,
        });
    }

    let mut reader = LibertyReader::new(root.name().unwrap_or("unknown"));
    reader.read_library(&root)?;
    Ok(reader.library)
}

impl LibertyLibrary {
    /// Parse a Liberty library from a string
    pub fn parse(content: &str) -> Result<Self> {
        read_liberty(content)
    }
}

struct LibertyReader {
    library: LibertyLibrary,
}

impl LibertyReader {
    fn new(name: &str) -> Self {
        Self {
            library: LibertyLibrary::new(name),
        }
    }

    fn read_library(&mut self, group: &LibertyGroup) -> Result<()> {
        self.read_units(group)?;

        let nominal = &mut self.library.nominal;
        if let Some(value) = group.simple("nom_process") {
            nominal.process = parse_number(value, group.line)?;
        }
        if let Some(value) = group.simple("nom_voltage") {
            nominal.voltage = parse_number(value, group.line)?;
        }
        if let Some(value) = group.simple("nom_temperature") {
            nominal.temperature = parse_number(value, group.line)?;
        }

        for sub in &group.groups {
            if TEMPLATE_KINDS.contains(&sub.kind.as_str()) {
                self.read_template(sub)?;
            }
        }

        for cell in group.groups_of("cell") {
            self.read_cell(cell)?;
        }

        Ok(())
    }

    fn read_units(&mut self, group: &LibertyGroup) -> Result<()> {
        let units = &mut self.library.units;
        if let Some(value) = group.simple("time_unit") {
            units.time = Unit::from_liberty(Quantity::Time, value)?;
        }
        if let Some(args) = group.complex("capacitive_load_unit") {
            units.capacitance = Unit::from_liberty(Quantity::Capacitance, &args.join(","))?;
        }
        if let Some(value) = group.simple("leakage_power_unit") {
            units.power = Unit::from_liberty(Quantity::Power, value)?;
        }
        Ok(())
    }

    fn read_template(&mut self, group: &LibertyGroup) -> Result<()> {
        let name = match group.name() {
            Some(name) => name,
            None => {
                warn!(line = group.line, "table template without a name ignored");
                return Ok(());
            }
        };

        let mut template = TableTemplate::new(name);
        for n in 1.. {
            let variable = match group.simple(&format!("variable_{}", n)) {
                Some(variable) => variable,
                None => break,
            };
            let variable = match TableAxisVariable::from_liberty_name(variable) {
                Some(variable) => variable,
                None => {
                    warn!(
                        template = name,
                        variable, "unknown table axis variable, template ignored"
                    );
                    return Ok(());
                }
            };
            let values = match group.complex(&format!("index_{}", n)) {
                Some(args) => self.axis_values(variable, args, group.line)?,
                None => Vec::new(),
            };
            template.axes.push(TableAxis::new(variable, values));
        }

        debug!(template = name, order = template.axes.len(), "read table template");
        self.library.add_template(template);
        Ok(())
    }

    fn read_cell(&mut self, group: &LibertyGroup) -> Result<()> {
        let name = group.name().unwrap_or_default();
        let cell = self.library.add_cell(name);
        let cell_id = cell.id();
        if let Some(area) = group.simple("area") {
            cell.area = parse_number(area, group.line)?;
        }

        // Declare every pin first so related_pin can name pins defined later
        let cap_unit = self.library.units.capacitance.clone();
        for pin in group.groups_of("pin") {
            let direction = pin
                .simple("direction")
                .map(PortDirection::from_liberty)
                .unwrap_or(PortDirection::Input);
            let capacitance = match pin.simple("capacitance") {
                Some(value) => Some(cap_unit.to_si(parse_number(value, pin.line)?)),
                None => None,
            };
            for pin_name in &pin.args {
                let cell = self.cell_mut(cell_id)?;
                let port = cell.add_port(pin_name, direction);
                if let Some(port) = cell.port_mut(port) {
                    port.capacitance = capacitance;
                }
            }
        }

        for pin in group.groups_of("pin") {
            for pin_name in &pin.args {
                let port = self.find_port(cell_id, pin_name)?;
                for power in pin.groups_of("internal_power") {
                    self.read_internal_power(cell_id, port, power)?;
                }
            }
        }

        Ok(())
    }

    fn read_internal_power(
        &mut self,
        cell_id: CellId,
        port: PortId,
        group: &LibertyGroup,
    ) -> Result<()> {
        let mut attrs = InternalPowerAttrs::new();

        if let Some(when) = group.simple("when") {
            match FuncExpr::parse(when) {
                Ok(expr) => attrs.set_when(expr),
                Err(e) => warn!(line = group.line, error = %e, "ignoring when condition"),
            }
        }
        if let Some(pg_pin) = group.simple("related_pg_pin") {
            attrs.set_related_pg_pin(pg_pin);
        }

        for table_group in &group.groups {
            let edges: &[RiseFall] = match table_group.kind.as_str() {
                "rise_power" => &[RiseFall::Rise],
                "fall_power" => &[RiseFall::Fall],
                // Edge independent: one model shared by both slots
                "power" => &RiseFall::ALL,
                _ => continue,
            };
            if let Some(model) = self.read_power_table(table_group)? {
                let model = Arc::new(model);
                for rf in edges {
                    attrs.set_model(*rf, Arc::clone(&model));
                }
            }
        }

        let related_ports = self.related_ports(cell_id, group)?;
        let cell = self.cell_mut(cell_id)?;
        match related_ports.as_slice() {
            [] => attrs.clear(),
            [related] => {
                InternalPower::new(cell, port, *related, &mut attrs);
            }
            many => {
                let parts = attrs.take_parts();
                for related in many {
                    cell.add_internal_power(InternalPower::from_parts(
                        port,
                        *related,
                        parts.clone(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Ports named by `related_pin`; a group without one relates to no port
    fn related_ports(&self, cell_id: CellId, group: &LibertyGroup) -> Result<Vec<Option<PortId>>> {
        let names = match group.simple("related_pin") {
            Some(names) => names,
            None => return Ok(vec![None]),
        };

        let cell = self
            .library
            .cell(cell_id)
            .ok_or_else(|| missing_cell(cell_id))?;
        let mut ports = Vec::new();
        for name in names.split(|c: char| c.is_whitespace() || c == ',') {
            if name.is_empty() {
                continue;
            }
            match cell.find_port(name) {
                Some(port) => ports.push(Some(port.id())),
                None => warn!(
                    cell = %cell.name,
                    related_pin = name,
                    line = group.line,
                    "internal_power related_pin not found"
                ),
            }
        }
        Ok(ports)
    }

    /// Build the model for one `rise_power`/`fall_power`/`power` group.
    ///
    /// Returns `None` when the table is malformed or its axes cannot be used.
    fn read_power_table(&self, group: &LibertyGroup) -> Result<Option<InternalPowerModel>> {
        let template_name = group.name().unwrap_or("scalar");
        let template = if template_name == "scalar" {
            TableTemplate::scalar()
        } else {
            match self.library.template(template_name) {
                Some(template) => template.clone(),
                None => {
                    warn!(
                        template = template_name,
                        line = group.line,
                        "power table references unknown template"
                    );
                    return Ok(None);
                }
            }
        };

        let mut axes = template.axes;
        for (n, axis) in axes.iter_mut().enumerate() {
            if let Some(args) = group.complex(&format!("index_{}", n + 1)) {
                axis.values = self.axis_values(axis.variable, args, group.line)?;
            }
        }

        let power_unit = &self.library.units.power;
        let mut values = Vec::new();
        for row in group.complex("values").unwrap_or_default() {
            for value in parse_number_list(row, group.line)? {
                values.push(power_unit.to_si(value));
            }
        }

        let order = axes.len();
        let table = match TableModel::new(axes, values) {
            Ok(table) => table,
            Err(e) => {
                warn!(
                    line = group.line,
                    code = ?e.code(),
                    max_order = MAX_TABLE_ORDER,
                    error = %e,
                    "power table dropped"
                );
                return Ok(None);
            }
        };

        if InternalPowerModel::resolves_axes(&table) {
            Ok(Some(InternalPowerModel::new(table)))
        } else if InternalPowerModel::check_axes(&table) {
            debug!(
                line = group.line,
                order, "accepted related pin power table"
            );
            Ok(Some(InternalPowerModel::new(table)))
        } else {
            warn!(line = group.line, "unsupported internal power table axes");
            Ok(None)
        }
    }

    fn axis_values(
        &self,
        variable: TableAxisVariable,
        args: &[String],
        line: usize,
    ) -> Result<Vec<f64>> {
        let mut values = Vec::new();
        for arg in args {
            values.extend(parse_number_list(arg, line)?);
        }
        if let Some(unit) = variable.unit(&self.library.units) {
            for value in &mut values {
                *value = unit.to_si(*value);
            }
        }
        Ok(values)
    }

    fn find_port(&self, cell_id: CellId, name: &str) -> Result<PortId> {
        self.library
            .cell(cell_id)
            .and_then(|cell| cell.find_port(name))
            .map(|port| port.id())
            .ok_or_else(|| missing_cell(cell_id))
    }

    fn cell_mut(&mut self, cell_id: CellId) -> Result<&mut LibertyCell> {
        self.library
            .cell_mut(cell_id)
            .ok_or_else(|| missing_cell(cell_id))
    }
}

fn missing_cell(cell_id: CellId) -> LibertyError {
    LibertyError::Parse {
        message: format!("cell {} disappeared while reading", cell_id.0),
        line: 0,
    }
}

fn parse_number(value: &str, line: usize) -> Result<f64> {
    value.trim().trim_matches('"').parse().map_err(|_| LibertyError::Parse {
        message: format!("Expected number, found '{}'", value),
        line,
    })
}

fn parse_number_list(content: &str, line: usize) -> Result<Vec<f64>> {
    content
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_number(s, line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INV_LIB: &str = r#"
        library(test_lib) {
            time_unit : "1ns";
            capacitive_load_unit (1, pf);
            leakage_power_unit : "1mW";
            nom_voltage : 1.1;

            power_lut_template (power_2d) {
                variable_1 : input_transition_time;
                variable_2 : total_output_net_capacitance;
                index_1 ("0.1, 0.5");
                index_2 ("0.01, 0.05");
            }

            cell (INV_X1) {
                area : 1.0;
                pin (A) {
                    direction : input;
                    capacitance : 0.002;
                }
                pin (Y) {
                    direction : output;
                    internal_power () {
                        related_pin : "A";
                        related_pg_pin : VDD;
                        rise_power (power_2d) {
                            values ("1.0, 2.0", "3.0, 4.0");
                        }
                        fall_power (power_2d) {
                            index_1 ("0.2, 0.6");
                            values ("5.0, 6.0", "7.0, 8.0");
                        }
                    }
                }
            }
        }
    "#;

    #[test]
    fn test_read_units_and_nominal() {
        let lib = read_liberty(INV_LIB).unwrap();
        assert_eq!(lib.name, "test_lib");
        assert_eq!(lib.units.time.suffix, "ns");
        assert_eq!(lib.units.capacitance.suffix, "pF");
        assert_eq!(lib.units.power.suffix, "mW");
        assert_eq!(lib.nominal.voltage, 1.1);
    }

    #[test]
    fn test_read_template_scaled() {
        let lib = read_liberty(INV_LIB).unwrap();
        let template = lib.template("power_2d").unwrap();
        assert_eq!(template.axes.len(), 2);
        assert_eq!(template.axes[0].variable, TableAxisVariable::InputTransitionTime);
        assert!((template.axes[0].values[1] - 0.5e-9).abs() < 1e-20);
        assert!((template.axes[1].values[0] - 0.01e-12).abs() < 1e-24);
    }

    #[test]
    fn test_read_pins() {
        let lib = read_liberty(INV_LIB).unwrap();
        let cell = lib.find_cell("INV_X1").unwrap();
        assert_eq!(cell.area, 1.0);
        let a = cell.find_port("A").unwrap();
        assert_eq!(a.direction, PortDirection::Input);
        assert!((a.capacitance.unwrap() - 0.002e-12).abs() < 1e-24);
        assert_eq!(cell.find_port("Y").unwrap().direction, PortDirection::Output);
    }

    #[test]
    fn test_read_internal_power() {
        let lib = read_liberty(INV_LIB).unwrap();
        let cell = lib.find_cell("INV_X1").unwrap();
        let y = cell.find_port("Y").unwrap().id();
        let a = cell.find_port("A").unwrap().id();

        assert_eq!(cell.internal_powers().len(), 1);
        let power = &cell.internal_powers()[0];
        assert_eq!(power.port(), y);
        assert_eq!(power.related_port(), Some(a));
        assert_eq!(power.related_pg_pin(), Some("VDD"));
        assert!(power.when().is_none());

        // grid corner: slew 0.1ns, load 0.01pF
        let rise = power.power(RiseFall::Rise, None, 0.1e-9, 0.01e-12).unwrap();
        assert!((rise - 1.0e-3).abs() < 1e-12);
        // fall table overrides index_1
        let fall = power.power(RiseFall::Fall, None, 0.6e-9, 0.05e-12).unwrap();
        assert!((fall - 8.0e-3).abs() < 1e-12);
    }

    #[test]
    fn test_shared_power_group_and_related_pins() {
        let content = r#"
            library(l) {
                cell (NAND2) {
                    pin (Y) {
                        direction : output;
                        internal_power () {
                            related_pin : "A B";
                            when : "!C";
                            power (scalar) { values ("0.5"); }
                        }
                    }
                    pin (A) { direction : input; }
                    pin (B) { direction : input; }
                    pin (C) { direction : input; }
                }
            }
        "#;
        let lib = read_liberty(content).unwrap();
        let cell = lib.find_cell("NAND2").unwrap();
        let powers = cell.internal_powers();
        assert_eq!(powers.len(), 2);
        assert_eq!(powers[0].related_port(), Some(cell.find_port("A").unwrap().id()));
        assert_eq!(powers[1].related_port(), Some(cell.find_port("B").unwrap().id()));

        for power in powers {
            assert_eq!(power.when().unwrap().to_string(), "!C");
            let rise = power.model(RiseFall::Rise).unwrap();
            let fall = power.model(RiseFall::Fall).unwrap();
            assert!(std::ptr::eq(rise, fall));
            assert!((power.power(RiseFall::Fall, None, 1.0, 1.0).unwrap() - 0.5e-3).abs() < 1e-12);
        }
    }

    #[test]
    fn test_internal_power_without_related_pin() {
        let content = r#"
            library(l) {
                cell (DFF) {
                    pin (CK) {
                        direction : input;
                        internal_power () {
                            rise_power (scalar) { values ("1.0"); }
                        }
                    }
                }
            }
        "#;
        let lib = read_liberty(content).unwrap();
        let cell = lib.find_cell("DFF").unwrap();
        assert_eq!(cell.internal_powers().len(), 1);
        assert_eq!(cell.internal_powers()[0].related_port(), None);
    }

    #[test]
    fn test_unknown_related_pin_discards_group() {
        let content = r#"
            library(l) {
                cell (INV) {
                    pin (Y) {
                        direction : output;
                        internal_power () {
                            related_pin : "Z";
                            rise_power (scalar) { values ("1.0"); }
                        }
                    }
                }
            }
        "#;
        let lib = read_liberty(content).unwrap();
        assert!(lib.find_cell("INV").unwrap().internal_powers().is_empty());
    }

    #[test]
    fn test_table_admission() {
        let content = r#"
            library(l) {
                lu_table_template (related) {
                    variable_1 : related_pin_transition;
                    index_1 ("0.1, 0.2");
                }
                lu_table_template (noise) {
                    variable_1 : input_noise_width;
                    index_1 ("0.1, 0.2");
                }
                cell (INV) {
                    pin (A) { direction : input; }
                    pin (Y) {
                        direction : output;
                        internal_power () {
                            related_pin : "A";
                            rise_power (related) { values ("1.0, 2.0"); }
                            fall_power (noise) { values ("1.0, 2.0"); }
                        }
                    }
                }
            }
        "#;
        let lib = read_liberty(content).unwrap();
        let power = &lib.find_cell("INV").unwrap().internal_powers()[0];

        // related pin family is kept but cannot be resolved against slew/load
        let rise = power.power(RiseFall::Rise, None, 0.1e-9, 0.0).unwrap_err();
        assert_eq!(rise.code(), Some(226));
        // anything else is dropped at load time
        assert!(power.model(RiseFall::Fall).is_none());
        assert_eq!(power.power(RiseFall::Fall, None, 0.1e-9, 0.0), Ok(0.0));
    }

    #[test]
    fn test_malformed_table_dropped() {
        let content = r#"
            library(l) {
                power_lut_template (t1) {
                    variable_1 : input_transition_time;
                    index_1 ("0.1, 0.2, 0.3");
                }
                cell (BUF) {
                    pin (Y) {
                        direction : output;
                        internal_power () {
                            rise_power (t1) { values ("1.0, 2.0"); }
                            fall_power (missing) { values ("1.0"); }
                        }
                    }
                }
            }
        "#;
        let lib = read_liberty(content).unwrap();
        let power = &lib.find_cell("BUF").unwrap().internal_powers()[0];
        assert!(power.model(RiseFall::Rise).is_none());
        assert!(power.model(RiseFall::Fall).is_none());
    }

    #[test]
    fn test_bad_when_is_ignored() {
        let content = r#"
            library(l) {
                cell (INV) {
                    pin (Y) {
                        direction : output;
                        internal_power () {
                            when : "A &";
                            rise_power (scalar) { values ("1.0"); }
                        }
                    }
                }
            }
        "#;
        let lib = read_liberty(content).unwrap();
        let power = &lib.find_cell("INV").unwrap().internal_powers()[0];
        assert!(power.when().is_none());
        assert!(power.model(RiseFall::Rise).is_some());
    }

    #[test]
    fn test_read_errors() {
        assert!(matches!(
            read_liberty("cell(X) { }"),
            Err(LibertyError::Parse { .. })
        ));
        assert!(matches!(
            read_liberty("library(l) { time_unit : \"1xx\"; }"),
            Err(LibertyError::InvalidUnit(_))
        ));
        assert!(matches!(
            read_liberty("library(l) { cell(C) { area : big; } }"),
            Err(LibertyError::Parse { .. })
        ));
        assert!(matches!(
            read_liberty_file("/nonexistent/lib.lib"),
            Err(LibertyError::Io(_))
        ));
    }

    #[test]
    fn test_read_large_library() {
        let cells = 4000;
        let mut content = String::from("library(big) {\n  leakage_power_unit : \"1nW\";\n");
        for n in 0..cells {
            content.push_str(&format!(
                "  cell (BUF_{n}) {{\n    pin (A) {{ direction : input; }}\n    pin (Y) {{\n      direction : output;\n      internal_power () {{\n        related_pin : \"A\";\n        rise_power (scalar) {{ values (\"{n}.0\"); }}\n      }}\n    }}\n  }}\n"
            ));
        }
        content.push_str("}\n");

        let lib = read_liberty(&content).unwrap();
        assert_eq!(lib.cells().count(), cells);

        let last = lib.find_cell(&format!("BUF_{}", cells - 1)).unwrap();
        let power = &last.internal_powers()[0];
        let value = power.power(RiseFall::Rise, None, 0.0, 0.0).unwrap();
        assert!((value - (cells - 1) as f64 * 1e-9).abs() < 1e-15);

        let tree = parser::parse(&content).unwrap();
        assert_eq!(tree.groups.last().unwrap().line, 3 + 10 * (cells - 1));
    }
}

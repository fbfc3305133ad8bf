//! Report and check commands over a loaded library

use anyhow::{anyhow, bail, Result};
use cellpower_liberty::{
    InternalPower, InternalPowerModel, LibertyCell, LibertyLibrary, PortId, PowerTable, Pvt, RiseFall,
};
use std::fmt::Write;
use tracing::{debug, warn};

/// Operating point for `report`, in library units
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub cell: String,
    pub pin: Option<String>,
    pub slew: f64,
    pub load: f64,
    pub digits: usize,
    pub corner: Option<Pvt>,
}

/// Lookup trace for every internal power record of a cell, both edges
pub fn report(library: &LibertyLibrary, options: &ReportOptions) -> Result<String> {
    let cell = library
        .find_cell(&options.cell)
        .ok_or_else(|| anyhow!("Cell '{}' not found in library '{}'", options.cell, library.name))?;

    let powers: Vec<&InternalPower> = match &options.pin {
        Some(pin) => match cell.find_port(pin) {
            Some(port) => cell.internal_powers_for(port.id()).collect(),
            None => bail!("Pin '{}' not found on cell '{}'", pin, cell.name),
        },
        None => cell.internal_powers().iter().collect(),
    };

    let units = library.units();
    let in_slew = units.time_unit().to_si(options.slew);
    let load_cap = units.capacitance_unit().to_si(options.load);
    let pvt = options.corner.as_ref().unwrap_or(&library.nominal);
    debug!(cell = %cell.name, in_slew, load_cap, "Reporting internal power");

    let mut out = String::new();
    for power in &powers {
        writeln!(out, "{}", describe(cell, power))?;

        for rf in RiseFall::ALL {
            if power.model(rf).is_none() {
                continue;
            }
            writeln!(out, " {}:", rf)?;
            match power.report_power(library, rf, Some(pvt), in_slew, load_cap, options.digits) {
                Ok(trace) => out.push_str(&trace),
                Err(e) => {
                    warn!(cell = %cell.name, edge = %rf, code = ?e.code(), "{}", e);
                    match e.code() {
                        Some(code) => writeln!(out, "  error {}: {}", code, e)?,
                        None => writeln!(out, "  error: {}", e)?,
                    }
                }
            }
        }
    }

    if powers.is_empty() {
        writeln!(out, "No internal power for {}", cell.name)?;
    }
    Ok(out)
}

/// Table status of every characterized edge in the library
pub fn check(library: &LibertyLibrary) -> Result<String> {
    let mut out = String::new();
    for cell in library.cells() {
        for power in cell.internal_powers() {
            for rf in RiseFall::ALL {
                let Some(model) = power.model(rf) else {
                    continue;
                };
                writeln!(
                    out,
                    "{} {}: {}",
                    describe(cell, power),
                    rf,
                    table_status(model)
                )?;
            }
        }
    }
    Ok(out)
}

fn table_status(model: &InternalPowerModel) -> String {
    let Some(table) = model.table() else {
        return "no table".to_string();
    };
    let axes = table
        .axes()
        .iter()
        .map(|axis| axis.variable().to_string())
        .collect::<Vec<_>>();
    let shape = if axes.is_empty() {
        "scalar".to_string()
    } else {
        axes.join(" x ")
    };

    let status = if InternalPowerModel::resolves_axes(table) {
        "ok"
    } else if InternalPowerModel::check_axes(table) {
        "related-pin axes"
    } else {
        "unsupported"
    };
    format!("{} ({})", shape, status)
}

fn describe(cell: &LibertyCell, power: &InternalPower) -> String {
    let pin = port_name(cell, power.port());
    let mut text = format!("{} {}", cell.name, pin);
    if let Some(related) = power.related_port() {
        let _ = write!(text, " <- {}", port_name(cell, related));
    }
    if let Some(when) = power.when() {
        let _ = write!(text, " when {}", when);
    }
    if let Some(pg_pin) = power.related_pg_pin() {
        let _ = write!(text, " [{}]", pg_pin);
    }
    text
}

fn port_name(cell: &LibertyCell, id: PortId) -> &str {
    cell.port(id).map_or("?", |port| port.name.as_str())
}

//! cellpower Liberty
//!
//! Internal power characterization for standard-cell libraries.
//!
//! This crate handles:
//! - Liberty parsing into cells, pins and `internal_power` records
//! - Characterization tables with up to three axes
//! - Resolving input slew and output load onto table axes
//! - Per-edge internal power lookup and lookup reports
//!
//! # Example
//!
//! ```ignore
//! use cellpower_liberty::{LibertyLibrary, RiseFall};
//!
//! let library = LibertyLibrary::parse(&source)?;
//! let cell = library.find_cell("INV_X1").unwrap();
//! for power in cell.internal_powers() {
//!     let energy = power.power(RiseFall::Rise, Some(&library.nominal), 0.1e-9, 5e-15)?;
//! }
//! ```

pub mod error;
pub mod func_expr;
pub mod internal_power;
pub mod library;
pub mod parser;
pub mod reader;
pub mod rise_fall;
pub mod table;
pub mod units;

pub use error::{LibertyError, Result};
pub use func_expr::FuncExpr;
pub use internal_power::{InternalPower, InternalPowerAttrs, InternalPowerModel, InternalPowerParts};
pub use library::{CellId, LibertyCell, LibertyLibrary, LibertyPort, PortDirection, PortId, Pvt};
pub use reader::{read_liberty, read_liberty_file};
pub use rise_fall::{RiseFall, RiseFallPair};
pub use table::{AxisValues, PowerTable, TableAxis, TableAxisVariable, TableModel, TableTemplate};
pub use units::{Quantity, Unit, Units};

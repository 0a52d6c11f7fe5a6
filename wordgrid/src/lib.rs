pub mod config;
pub mod dictionary;
pub mod formatter;
pub mod generator;

pub use wordgrid_core::board::Grid;
pub use wordgrid_core::error::{WordgridError, WordgridErrorKind};
pub use wordgrid_core::search::{Heuristic, Reporter};
pub use wordgrid_core::WordgridResult;

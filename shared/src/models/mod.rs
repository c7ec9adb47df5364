//! Domain models for the Packing-Plant Stock Ledger

mod area;
mod forecast;
mod stock;

pub use area::*;
pub use forecast::*;
pub use stock::*;

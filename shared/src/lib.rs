//! Shared types and engines for the Packing-Plant Stock Ledger
//!
//! This crate contains the domain models and the pure derivation engines
//! (daily balance reconciliation, consumption forecasting) shared between
//! the backend and its tests. Nothing in here performs I/O.

pub mod forecast;
pub mod models;
pub mod reconcile;
pub mod tabular;
pub mod types;
pub mod validation;

pub use forecast::*;
pub use models::*;
pub use reconcile::*;
pub use tabular::*;
pub use types::*;
pub use validation::*;

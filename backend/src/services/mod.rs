//! Business logic services for the Packing Plant Stock Ledger

pub mod area;
pub mod chart;
pub mod import_export;
pub mod ledger;
pub mod notification;
pub mod scheduler;
pub mod workbook;

pub use area::AreaService;
pub use import_export::ImportExportService;
pub use ledger::LedgerService;
pub use notification::NotificationService;
pub use scheduler::SaveScheduler;

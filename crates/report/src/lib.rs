//! `regrecon-report`: registration reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded order and form tables, returns the
//! merged, deduplicated registration report. No CLI or file IO.

pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod schema;
pub mod window;

pub use config::ReportConfig;
pub use engine::run;
pub use error::ReportError;
pub use model::{Field, RawCell, RawTable, Registration, ReportResult, REPORT_COLUMNS};
pub use window::DateWindow;

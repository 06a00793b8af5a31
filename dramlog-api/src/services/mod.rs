//! Multi-table write paths that run as a single transaction

pub mod price_ingest;
pub mod tasting_recorder;

pub use price_ingest::{PriceIngest, PriceInput};
pub use tasting_recorder::{RecordedTasting, TastingInput, TastingRecorder};

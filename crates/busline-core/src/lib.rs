pub mod error;
pub mod models;

pub use error::TrackerError;
pub use models::{
    format_captured_at, DriverId, PositionRecord, Session, TIMESTAMP_FORMAT,
};

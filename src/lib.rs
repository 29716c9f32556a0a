pub mod api;
pub mod cli;
pub mod error;
pub mod eventlog;
pub mod sync;
pub mod utils;

pub use error::{Result, SyncError};

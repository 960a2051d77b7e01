//! Domain logic for profile ingestion
//!
//! - `profile` - Profiling entry extraction, scanning, polling and expiry

pub mod profile;

pub use profile::{CleanupSweeper, DatabaseScanner, EntryProcessor, PollLoop};

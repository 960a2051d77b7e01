//! Profile ingestion engine
//!
//! Reads `system.profile` from every application database, turns each entry
//! into a [`QueryFact`](crate::data::types::QueryFact) plus one exported
//! series, and evicts series once they outlive the metric TTL.
//!
//! - `extract` - Field extraction and serialization helpers
//! - `operation` - Operation-specific payload selection
//! - `processor` - Dedup, ignore-list filtering and emission of one entry
//! - `scanner` - Per-database scan with failure isolation
//! - `poller` - Fixed-interval loop over all non-system databases
//! - `sweeper` - TTL-based eviction of exported series

mod extract;
mod operation;
mod poller;
mod processor;
mod scanner;
mod sweeper;

pub use poller::PollLoop;
pub use processor::EntryProcessor;
pub use scanner::DatabaseScanner;
pub use sweeper::CleanupSweeper;

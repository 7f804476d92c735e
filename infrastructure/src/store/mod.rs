//! Record store adapters
//!
//! - [`MemoryRecordStore`]: process-local tables, used when no store path is configured
//! - [`JsonlRecordStore`]: one append-only `<table>.jsonl` file per table

mod jsonl;
mod memory;

pub use jsonl::JsonlRecordStore;
pub use memory::MemoryRecordStore;

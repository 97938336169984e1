//! Adapters binding the aggregator's ports to workbooks, memory, and logs.

pub mod destination;
pub mod excel_read;
pub mod excel_write;
pub mod grid;
pub mod memory;
pub mod notify;

//! Playing-table allocation.
//!
//! Tables are numbered from 1. An event with no tables runs without table
//! management: matches are activated without a table and auto-assignment
//! does nothing.

pub mod allocator;
pub mod errors;

pub use allocator::{Assignment, TableAllocator};
pub use errors::{AllocationRejection, AllocationResult};

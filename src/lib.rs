//! Directory size snapshots and growth reports.
//!
//! A [`Snapshot`] records the aggregated size of every file and directory below a root.
//! Two snapshots of the same root can be compared to find out which entries grew by at
//! least a given number of bytes, and a snapshot can be persisted to disk in between.

pub mod ext;
pub mod report;
pub mod snapshot;
pub mod worker;

pub use snapshot::{Change, FileSystemItem, Snapshot};

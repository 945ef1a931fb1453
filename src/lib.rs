//! Point-in-time process table snapshots via native OS enumeration.
//!
//! One enumeration pass opens a transient OS snapshot handle, walks it
//! entry by entry, and releases it before any result reaches the caller.
//! The resulting [`Process`] handles answer attribute queries (name,
//! command line, memory) lazily, each query failing on its own when the
//! process has since exited or is inaccessible.
//!
//! ```
//! let procs = procsnap::processes().unwrap();
//! let me = std::process::id();
//! assert!(procs.iter().any(|p| p.pid() == me));
//! ```
//!
//! The view is best-effort: the OS snapshot is not transactionally
//! consistent, and a pid returned by one pass may be gone by the time its
//! attributes are queried.

pub mod entry;
pub mod error;
pub mod process;
pub mod snapshot;
mod sys;

pub use entry::{RawProcessEntry, MAX_PATH};
pub use error::SnapshotError;
pub use process::{build_processes, MemoryInfo, MemoryRegion, Process, RESERVED_PIDS};
pub use snapshot::{enumerate, Snapshot, SnapshotSource, Step};

/// OS-assigned process identifier. Unique at a point in time only; the OS
/// may recycle identifiers after process exit.
pub type Pid = u32;

/// List the identifiers of all running processes.
///
/// Enumeration failures are surfaced rather than degraded to an empty
/// list; callers that prefer best-effort behavior can write
/// `pids().unwrap_or_default()`.
pub fn pids() -> Result<Vec<Pid>, SnapshotError> {
    let entries = snapshot::enumerate(&sys::system_source())?;
    Ok(entries.into_iter().map(|e| e.pid).collect())
}

/// Take one enumeration pass and return a handle per running process, in
/// the order the OS produced them.
pub fn processes() -> Result<Vec<Process>, SnapshotError> {
    let entries = snapshot::enumerate(&sys::system_source())?;
    Ok(process::build_processes(entries))
}

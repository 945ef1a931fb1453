// Process handles with lazy, independently failing attribute queries.

use serde::{Deserialize, Serialize};

use crate::entry::RawProcessEntry;
use crate::error::SnapshotError;
use crate::sys;
use crate::Pid;

/// Identifiers of system pseudo-processes whose command line is never
/// queried: access restrictions make the query unreliable, so it is forced
/// to an empty string instead.
pub const RESERVED_PIDS: [Pid; 2] = [0, 4];

/// Memory usage of one process, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Resident set size.
    pub rss: u64,
    /// Virtual memory size.
    pub vms: u64,
}

/// One mapped memory region of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub start: u64,
    pub end: u64,
    /// Permission string as reported by the OS, e.g. `r-xp`.
    pub perms: String,
    /// Backing path; empty for anonymous mappings.
    pub path: String,
}

/// A handle on a single process.
///
/// Construction never fails and holds no OS resource. Every accessor issues
/// its own query at call time, so a process exiting after the handle was
/// built surfaces as [`SnapshotError::NotAvailable`] on the accessor that
/// noticed, without affecting the others.
#[derive(Debug, Clone)]
pub struct Process {
    pid: Pid,
    ppid: Pid,
}

impl Process {
    /// Open a handle by identifier. Always succeeds; whether the process
    /// actually exists is discovered by the individual accessors.
    pub fn new(pid: Pid) -> Self {
        Self { pid, ppid: 0 }
    }

    pub(crate) fn from_entry(entry: &RawProcessEntry) -> Self {
        Self {
            pid: entry.pid,
            ppid: entry.ppid,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Parent identifier captured at snapshot time, not a live query.
    /// Zero when the handle was opened by pid rather than produced by an
    /// enumeration pass.
    pub fn parent_id(&self) -> Pid {
        self.ppid
    }

    /// Executable base name.
    pub fn name(&self) -> Result<String, SnapshotError> {
        sys::process_name(self.pid)
    }

    /// Full command line. Reserved system identifiers always yield an empty
    /// string without touching the OS.
    pub fn cmdline(&self) -> Result<String, SnapshotError> {
        if RESERVED_PIDS.contains(&self.pid) {
            return Ok(String::new());
        }
        sys::process_cmdline(self.pid)
    }

    /// Current memory usage.
    pub fn memory_info(&self) -> Result<MemoryInfo, SnapshotError> {
        sys::process_memory(self.pid)
    }

    /// Per-region memory layout. Platforms that do not enumerate regions
    /// return an empty list successfully, keeping the contract uniform for
    /// callers that do not need per-region detail.
    pub fn memory_maps(&self) -> Result<Vec<MemoryRegion>, SnapshotError> {
        sys::process_memory_maps(self.pid)
    }
}

/// Build caller-facing handles from the raw entries of one enumeration
/// pass, preserving the order the OS produced.
pub fn build_processes(entries: Vec<RawProcessEntry>) -> Vec<Process> {
    entries.iter().map(Process::from_entry).collect()
}

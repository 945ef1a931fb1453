use crate::entry::RawProcessEntry;
use crate::Pid;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The OS declined to create an enumeration handle. No handle was
    /// acquired, so there is nothing to release.
    #[error("cannot acquire process snapshot (os error {code})")]
    Acquisition { code: i32 },

    /// The first entry could not be read for a reason other than an empty
    /// table.
    #[error("cannot read first snapshot entry (os error {code})")]
    FirstEntry { code: i32 },

    /// Iteration failed partway through. Carries the entries accumulated
    /// before the failure.
    #[error("snapshot iteration failed after {} entries (os error {code})", .collected.len())]
    Interrupted {
        code: i32,
        collected: Vec<RawProcessEntry>,
    },

    /// One attribute query on one process failed (process exited, access
    /// denied, or the platform does not implement the attribute). Local to
    /// that accessor; never affects enumeration or other accessors.
    #[error("{attr} unavailable for pid {pid}: {reason}")]
    NotAvailable {
        pid: Pid,
        attr: &'static str,
        reason: String,
    },
}

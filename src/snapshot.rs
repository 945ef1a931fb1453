// The snapshot iteration protocol and the enumeration walk.
//
// The native primitive exposes open / first / next / close. On Windows the
// "next" call reports both benign exhaustion and real failure through the
// same false return, disambiguated only by the thread's last error code;
// backends split that into distinct `Step` arms before the walk sees it, so
// the walk itself never inspects raw codes.

use crate::entry::RawProcessEntry;
use crate::error::SnapshotError;

/// Outcome of one step of the iteration protocol.
#[derive(Debug)]
pub enum Step {
    /// A process record was produced.
    Entry(RawProcessEntry),
    /// No more entries. Normal termination, not an error.
    Exhausted,
    /// The step failed with the given raw OS error code.
    Failed(i32),
}

/// An open enumeration handle over the process table.
///
/// The handle is a scarce OS resource. Implementations release it in `Drop`,
/// which is what guarantees release on every exit path of [`enumerate`],
/// including early return on an empty table and on error.
pub trait Snapshot {
    /// Request the first entry of the snapshot.
    fn first(&mut self) -> Step;

    /// Request the entry after the previously returned one.
    fn next(&mut self) -> Step;
}

/// Something that can open a snapshot scoped to all processes in the system.
///
/// Handles must not be shared between concurrent enumeration passes; each
/// call to [`enumerate`] opens its own.
pub trait SnapshotSource {
    type Snap: Snapshot;

    /// Open an enumeration handle, or fail with the raw OS error code.
    fn open(&self) -> Result<Self::Snap, i32>;
}

/// Run one full enumeration pass over `source`.
///
/// An immediately exhausted table yields `Ok(vec![])`. A failing first read
/// yields [`SnapshotError::FirstEntry`]; a failure later in the walk yields
/// [`SnapshotError::Interrupted`] carrying everything collected up to that
/// point. Entries are returned in the order the OS produced them.
///
/// A process that exits mid-pass simply does not appear, or appears with the
/// fields the OS captured at snapshot time; the walk does not compensate.
pub fn enumerate<S: SnapshotSource>(source: &S) -> Result<Vec<RawProcessEntry>, SnapshotError> {
    let mut snap = source
        .open()
        .map_err(|code| SnapshotError::Acquisition { code })?;

    let mut entries = Vec::new();
    match snap.first() {
        Step::Entry(entry) => entries.push(entry),
        Step::Exhausted => return Ok(entries),
        Step::Failed(code) => return Err(SnapshotError::FirstEntry { code }),
    }

    loop {
        match snap.next() {
            Step::Entry(entry) => entries.push(entry),
            Step::Exhausted => return Ok(entries),
            Step::Failed(code) => {
                return Err(SnapshotError::Interrupted {
                    code,
                    collected: entries,
                })
            }
        }
    }
}

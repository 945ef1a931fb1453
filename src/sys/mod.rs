// Platform backends implementing the shared enumeration contract.
//
// Each backend exports:
//   - system_source() -> impl SnapshotSource
//   - process_name / process_cmdline / process_memory / process_memory_maps

#[cfg(target_os = "linux")]
pub(crate) mod linux;
#[cfg(target_os = "linux")]
pub use linux::*;

#[cfg(target_os = "windows")]
pub(crate) mod windows;
#[cfg(target_os = "windows")]
pub use windows::*;

// Windows process table — Toolhelp32 snapshot enumeration.
//
// CreateToolhelp32Snapshot produces the handle, Process32FirstW /
// Process32NextW walk it, CloseHandle releases it. Both exhaustion and real
// failure surface as a FALSE return from the walk calls; the thread's last
// error distinguishes them (ERROR_NO_MORE_FILES is the benign sentinel).

use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, ERROR_NO_MORE_FILES, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};
use windows_sys::Win32::System::ProcessStatus::{
    GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS,
};
use windows_sys::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

use crate::entry::{decode_utf16_name, RawProcessEntry};
use crate::error::SnapshotError;
use crate::process::{MemoryInfo, MemoryRegion};
use crate::snapshot::{Snapshot, SnapshotSource, Step};
use crate::Pid;

pub struct SystemSource;

pub fn system_source() -> SystemSource {
    SystemSource
}

/// An open Toolhelp snapshot handle. Closed exactly once, in `Drop`.
pub struct ToolhelpSnapshot {
    handle: HANDLE,
}

impl Drop for ToolhelpSnapshot {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.handle) };
    }
}

impl SnapshotSource for SystemSource {
    type Snap = ToolhelpSnapshot;

    fn open(&self) -> Result<ToolhelpSnapshot, i32> {
        let handle = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        if handle == INVALID_HANDLE_VALUE {
            return Err(last_error());
        }
        Ok(ToolhelpSnapshot { handle })
    }
}

impl Snapshot for ToolhelpSnapshot {
    fn first(&mut self) -> Step {
        let mut entry = blank_entry();
        let ok = unsafe { Process32FirstW(self.handle, &mut entry) };
        step_from(ok, &entry)
    }

    fn next(&mut self) -> Step {
        let mut entry = blank_entry();
        let ok = unsafe { Process32NextW(self.handle, &mut entry) };
        step_from(ok, &entry)
    }
}

fn last_error() -> i32 {
    unsafe { GetLastError() as i32 }
}

fn blank_entry() -> PROCESSENTRY32W {
    // dwSize must be set before the first walk call or the API rejects the
    // record.
    let mut entry: PROCESSENTRY32W = unsafe { std::mem::zeroed() };
    entry.dwSize = std::mem::size_of::<PROCESSENTRY32W>() as u32;
    entry
}

fn step_from(ok: i32, entry: &PROCESSENTRY32W) -> Step {
    if ok == 0 {
        let code = last_error();
        if code == ERROR_NO_MORE_FILES as i32 {
            Step::Exhausted
        } else {
            Step::Failed(code)
        }
    } else {
        Step::Entry(convert(entry))
    }
}

fn convert(entry: &PROCESSENTRY32W) -> RawProcessEntry {
    RawProcessEntry {
        pid: entry.th32ProcessID,
        ppid: entry.th32ParentProcessID,
        threads: entry.cntThreads,
        priority: entry.pcPriClassBase,
        exe: decode_utf16_name(&entry.szExeFile),
    }
}

/// Resolve the executable name by scanning a fresh snapshot for `pid`; there
/// is no cheaper per-pid name query at this access level.
pub fn process_name(pid: Pid) -> Result<String, SnapshotError> {
    let entries = crate::snapshot::enumerate(&SystemSource).map_err(|e| {
        SnapshotError::NotAvailable {
            pid,
            attr: "name",
            reason: e.to_string(),
        }
    })?;
    entries
        .into_iter()
        .find(|e| e.pid == pid)
        .map(|e| e.exe)
        .ok_or_else(|| SnapshotError::NotAvailable {
            pid,
            attr: "name",
            reason: "no such process".to_string(),
        })
}

/// Reading another process's command line requires walking its PEB, which
/// this crate does not do.
pub fn process_cmdline(pid: Pid) -> Result<String, SnapshotError> {
    Err(SnapshotError::NotAvailable {
        pid,
        attr: "cmdline",
        reason: "not implemented on this platform".to_string(),
    })
}

pub fn process_memory(pid: Pid) -> Result<MemoryInfo, SnapshotError> {
    let handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid) };
    if handle.is_null() {
        return Err(SnapshotError::NotAvailable {
            pid,
            attr: "memory",
            reason: format!("OpenProcess failed (os error {})", last_error()),
        });
    }

    let mut counters: PROCESS_MEMORY_COUNTERS = unsafe { std::mem::zeroed() };
    counters.cb = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;
    let ok = unsafe { GetProcessMemoryInfo(handle, &mut counters, counters.cb) };
    // Capture the error before CloseHandle can overwrite it.
    let code = if ok == 0 { last_error() } else { 0 };
    unsafe { CloseHandle(handle) };

    if ok == 0 {
        return Err(SnapshotError::NotAvailable {
            pid,
            attr: "memory",
            reason: format!("GetProcessMemoryInfo failed (os error {code})"),
        });
    }

    Ok(MemoryInfo {
        rss: counters.WorkingSetSize as u64,
        vms: counters.PagefileUsage as u64,
    })
}

/// Per-region layout is not enumerated on Windows; callers get the uniform
/// empty result.
pub fn process_memory_maps(_pid: Pid) -> Result<Vec<MemoryRegion>, SnapshotError> {
    Ok(Vec::new())
}

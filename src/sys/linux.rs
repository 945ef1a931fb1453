// Linux process table — reads /proc.
//
// The enumeration handle is the open /proc directory stream; numeric
// directory names are pids and /proc/<pid>/stat supplies the rest of the
// raw record. Attribute queries each read their own /proc file at call
// time.

use std::fs;

use crate::entry::RawProcessEntry;
use crate::error::SnapshotError;
use crate::process::{MemoryInfo, MemoryRegion};
use crate::snapshot::{Snapshot, SnapshotSource, Step};
use crate::Pid;

pub struct SystemSource;

pub fn system_source() -> SystemSource {
    SystemSource
}

/// An open /proc directory stream. The directory handle is released when
/// the stream is dropped.
pub struct ProcSnapshot {
    dir: fs::ReadDir,
}

impl SnapshotSource for SystemSource {
    type Snap = ProcSnapshot;

    fn open(&self) -> Result<ProcSnapshot, i32> {
        match fs::read_dir("/proc") {
            Ok(dir) => Ok(ProcSnapshot { dir }),
            Err(e) => Err(e.raw_os_error().unwrap_or(0)),
        }
    }
}

impl Snapshot for ProcSnapshot {
    // /proc has no first/next distinction; both steps advance the stream.
    fn first(&mut self) -> Step {
        self.advance()
    }

    fn next(&mut self) -> Step {
        self.advance()
    }
}

impl ProcSnapshot {
    fn advance(&mut self) -> Step {
        loop {
            let dirent = match self.dir.next() {
                Some(Ok(d)) => d,
                Some(Err(e)) => return Step::Failed(e.raw_os_error().unwrap_or(0)),
                None => return Step::Exhausted,
            };

            let name = dirent.file_name();
            let pid: Pid = match name.to_string_lossy().parse() {
                Ok(v) => v,
                Err(_) => continue, // not a pid directory
            };

            match read_entry(pid) {
                Some(entry) => return Step::Entry(entry),
                None => {
                    // Exited between readdir and the stat read. Best-effort
                    // view: skip it and keep walking.
                    log::debug!("pid {pid} vanished during enumeration");
                    continue;
                }
            }
        }
    }
}

fn read_entry(pid: Pid) -> Option<RawProcessEntry> {
    let stat = fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    parse_stat(pid, &stat)
}

/// Parse one /proc/<pid>/stat line.
///
/// The comm field is parenthesized and may itself contain spaces or
/// parentheses, so field scanning starts after the *last* `)`.
fn parse_stat(pid: Pid, stat: &str) -> Option<RawProcessEntry> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    let exe = stat.get(open + 1..close)?.to_string();

    // Fields after comm: state ppid pgrp session tty_nr tpgid flags minflt
    // cminflt majflt cmajflt utime stime cutime cstime priority nice
    // num_threads ...
    let rest: Vec<&str> = stat.get(close + 1..)?.split_whitespace().collect();
    let ppid = rest.get(1)?.parse().ok()?;
    let priority = rest.get(15)?.parse().ok()?;
    let threads = rest.get(17)?.parse().ok()?;

    Some(RawProcessEntry {
        pid,
        ppid,
        threads,
        priority,
        exe,
    })
}

fn not_available(pid: Pid, attr: &'static str, e: std::io::Error) -> SnapshotError {
    SnapshotError::NotAvailable {
        pid,
        attr,
        reason: e.to_string(),
    }
}

pub fn process_name(pid: Pid) -> Result<String, SnapshotError> {
    match fs::read_to_string(format!("/proc/{pid}/comm")) {
        Ok(s) => Ok(s.trim_end().to_string()),
        Err(e) => Err(not_available(pid, "name", e)),
    }
}

pub fn process_cmdline(pid: Pid) -> Result<String, SnapshotError> {
    match fs::read(format!("/proc/{pid}/cmdline")) {
        Ok(raw) => Ok(parse_cmdline(&raw)),
        Err(e) => Err(not_available(pid, "cmdline", e)),
    }
}

/// /proc/<pid>/cmdline is NUL-separated with a trailing NUL; arguments are
/// joined with single spaces. Kernel threads have an empty file.
fn parse_cmdline(raw: &[u8]) -> String {
    raw.split(|&b| b == 0)
        .filter(|arg| !arg.is_empty())
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn process_memory(pid: Pid) -> Result<MemoryInfo, SnapshotError> {
    let statm = fs::read_to_string(format!("/proc/{pid}/statm"))
        .map_err(|e| not_available(pid, "memory", e))?;
    let (vms_pages, rss_pages) = parse_statm(&statm).ok_or_else(|| SnapshotError::NotAvailable {
        pid,
        attr: "memory",
        reason: "malformed statm".to_string(),
    })?;

    let page = page_size();
    Ok(MemoryInfo {
        rss: rss_pages * page,
        vms: vms_pages * page,
    })
}

/// First two /proc/<pid>/statm fields: total program size and resident set
/// size, both in pages.
fn parse_statm(statm: &str) -> Option<(u64, u64)> {
    let mut fields = statm.split_whitespace();
    let size = fields.next()?.parse().ok()?;
    let resident = fields.next()?.parse().ok()?;
    Some((size, resident))
}

fn page_size() -> u64 {
    let ret = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if ret > 0 {
        ret as u64
    } else {
        4096
    }
}

pub fn process_memory_maps(pid: Pid) -> Result<Vec<MemoryRegion>, SnapshotError> {
    let maps = fs::read_to_string(format!("/proc/{pid}/maps"))
        .map_err(|e| not_available(pid, "memory maps", e))?;
    Ok(maps.lines().filter_map(parse_maps_line).collect())
}

/// Parse one /proc/<pid>/maps line:
/// `start-end perms offset dev inode [path]`
fn parse_maps_line(line: &str) -> Option<MemoryRegion> {
    let mut fields = line.split_whitespace();
    let range = fields.next()?;
    let perms = fields.next()?.to_string();
    let _offset = fields.next()?;
    let _dev = fields.next()?;
    let _inode = fields.next()?;

    let (start, end) = range.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;

    let path = fields.collect::<Vec<_>>().join(" ");

    Some(MemoryRegion {
        start,
        end,
        perms,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stat_basic() {
        let line = "1234 (bash) S 1 1234 1234 34816 5678 4194304 1000 2000 0 0 5 3 1 1 20 0 1 0 12345 8192000 512 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0";
        let entry = parse_stat(1234, line).unwrap();
        assert_eq!(entry.pid, 1234);
        assert_eq!(entry.ppid, 1);
        assert_eq!(entry.exe, "bash");
        assert_eq!(entry.priority, 20);
        assert_eq!(entry.threads, 1);
    }

    #[test]
    fn parse_stat_comm_with_spaces_and_parens() {
        // comm may contain anything, including ") S 1" lookalikes
        let line = "77 (tmux: server (1)) S 1 77 77 0 -1 4194560 1 0 0 0 0 0 0 0 20 0 4 0 99 0 0 0";
        let entry = parse_stat(77, line).unwrap();
        assert_eq!(entry.exe, "tmux: server (1)");
        assert_eq!(entry.ppid, 1);
        assert_eq!(entry.threads, 4);
    }

    #[test]
    fn parse_stat_truncated_is_none() {
        assert!(parse_stat(1, "1 (x) S 1").is_none());
        assert!(parse_stat(1, "garbage with no parens").is_none());
    }

    #[test]
    fn parse_cmdline_joins_nul_separated_args() {
        assert_eq!(
            parse_cmdline(b"curl\0-s\0https://example.com\0"),
            "curl -s https://example.com"
        );
    }

    #[test]
    fn parse_cmdline_empty_for_kernel_thread() {
        assert_eq!(parse_cmdline(b""), "");
        assert_eq!(parse_cmdline(b"\0"), "");
    }

    #[test]
    fn parse_statm_first_two_fields() {
        assert_eq!(parse_statm("2001 512 300 100 0 600 0\n"), Some((2001, 512)));
        assert_eq!(parse_statm(""), None);
        assert_eq!(parse_statm("abc def"), None);
    }

    #[test]
    fn parse_maps_line_with_path() {
        let region =
            parse_maps_line("55d0a0c00000-55d0a0c21000 r-xp 00000000 08:01 393224 /usr/bin/cat")
                .unwrap();
        assert_eq!(region.start, 0x55d0a0c00000);
        assert_eq!(region.end, 0x55d0a0c21000);
        assert_eq!(region.perms, "r-xp");
        assert_eq!(region.path, "/usr/bin/cat");
    }

    #[test]
    fn parse_maps_line_anonymous() {
        let region = parse_maps_line("7f2b1c000000-7f2b1c021000 rw-p 00000000 00:00 0").unwrap();
        assert_eq!(region.path, "");
        assert_eq!(region.perms, "rw-p");
    }

    #[test]
    fn parse_maps_line_malformed_is_none() {
        assert!(parse_maps_line("").is_none());
        assert!(parse_maps_line("not-a-range rw-p 0 0 0").is_none());
    }
}

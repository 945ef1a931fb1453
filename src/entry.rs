// Raw snapshot records and defensive decoding of native name buffers.

use crate::Pid;

/// Capacity of the fixed-size executable name buffer in the native Windows
/// snapshot record (MAX_PATH).
pub const MAX_PATH: usize = 260;

/// One raw record produced by a single enumeration step, already lifted out
/// of its native representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProcessEntry {
    pub pid: Pid,
    /// Parent pid as recorded at snapshot time.
    pub ppid: Pid,
    pub threads: u32,
    /// Base scheduling priority of the process.
    pub priority: i32,
    /// Executable base name. Decoded from a bounded buffer; may be empty if
    /// the OS withheld it.
    pub exe: String,
}

/// Decode a fixed-capacity UTF-16 name buffer.
///
/// The buffer is not guaranteed to be NUL-terminated: decoding stops at the
/// first NUL or the declared capacity, whichever comes first, and invalid
/// units are replaced rather than rejected.
pub fn decode_utf16_name(buf: &[u16]) -> String {
    let len = buf.iter().position(|&u| u == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn decode_terminated_buffer() {
        let mut buf = wide("svchost.exe");
        buf.resize(MAX_PATH, 0);
        assert_eq!(decode_utf16_name(&buf), "svchost.exe");
    }

    #[test]
    fn decode_stops_at_first_nul() {
        let mut buf = wide("a.exe");
        buf.push(0);
        buf.extend(wide("stale-garbage"));
        assert_eq!(decode_utf16_name(&buf), "a.exe");
    }

    #[test]
    fn decode_unterminated_buffer_uses_full_capacity() {
        // A name exactly filling the buffer has no NUL terminator.
        let buf = vec![b'x' as u16; MAX_PATH];
        let decoded = decode_utf16_name(&buf);
        assert_eq!(decoded.len(), MAX_PATH);
        assert!(decoded.chars().all(|c| c == 'x'));
    }

    #[test]
    fn decode_empty_buffer() {
        assert_eq!(decode_utf16_name(&[]), "");
        assert_eq!(decode_utf16_name(&[0; 8]), "");
    }

    #[test]
    fn decode_invalid_units_are_lossy() {
        // Lone surrogate followed by a terminator.
        let buf = [0xD800u16, 0];
        assert_eq!(decode_utf16_name(&buf), "\u{FFFD}");
    }
}

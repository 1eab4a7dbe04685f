//! Socket table parsing for `/proc/net/{tcp,tcp6,udp,udp6}`

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

/// One row of a kernel socket table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketEntry {
    pub protocol: String,
    pub local: String,
    pub local_port: u16,
    /// `None` for unconnected sockets
    pub remote: Option<String>,
    pub status: String,
}

impl SocketEntry {
    pub fn is_listening(&self) -> bool {
        self.status == "LISTEN"
    }
}

const TABLES: [(&str, &str); 4] = [
    ("tcp", "/proc/net/tcp"),
    ("tcp6", "/proc/net/tcp6"),
    ("udp", "/proc/net/udp"),
    ("udp6", "/proc/net/udp6"),
];

/// Whether this host exposes `/proc/net` socket tables
pub fn supported() -> bool {
    cfg!(target_os = "linux")
}

/// Read every socket table available on this host; empty off Linux
pub fn read_all() -> Vec<SocketEntry> {
    if !supported() {
        tracing::debug!(
            platform = std::env::consts::OS,
            "Socket tables are not supported on this platform"
        );
        return Vec::new();
    }
    TABLES
        .iter()
        .filter_map(|(protocol, path)| {
            std::fs::read_to_string(path)
                .ok()
                .map(|contents| parse_table(&contents, protocol))
        })
        .flatten()
        .collect()
}

/// Parse the contents of one `/proc/net` socket table
pub fn parse_table(contents: &str, protocol: &str) -> Vec<SocketEntry> {
    contents
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let (local_ip, local_port) = parse_endpoint(fields[1])?;
            let (remote_ip, remote_port) = parse_endpoint(fields[2])?;
            let remote = (!remote_ip.is_unspecified() || remote_port != 0)
                .then(|| format_endpoint(remote_ip, remote_port));

            Some(SocketEntry {
                protocol: protocol.to_string(),
                local: format_endpoint(local_ip, local_port),
                local_port,
                remote,
                status: state_name(fields[3], protocol).to_string(),
            })
        })
        .collect()
}

/// Sorted, de-duplicated ports in LISTEN state
pub fn listening_ports(entries: &[SocketEntry]) -> Vec<u16> {
    let mut ports: Vec<u16> = entries
        .iter()
        .filter(|e| e.is_listening())
        .map(|e| e.local_port)
        .collect();
    ports.sort_unstable();
    ports.dedup();
    ports
}

fn format_endpoint(ip: IpAddr, port: u16) -> String {
    match ip {
        IpAddr::V4(v4) => format!("{}:{}", v4, port),
        IpAddr::V6(v6) => format!("[{}]:{}", v6, port),
    }
}

/// `0100007F:0016` -> 127.0.0.1:22
fn parse_endpoint(field: &str) -> Option<(IpAddr, u16)> {
    let (addr, port) = field.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;

    let ip = match addr.len() {
        8 => {
            // Kernel prints the network-order word as a native integer
            let raw = u32::from_str_radix(addr, 16).ok()?;
            IpAddr::V4(Ipv4Addr::from(raw.to_ne_bytes()))
        }
        32 => {
            let mut bytes = [0u8; 16];
            for (word_index, chunk) in addr.as_bytes().chunks(8).enumerate() {
                let word = u32::from_str_radix(std::str::from_utf8(chunk).ok()?, 16).ok()?;
                bytes[word_index * 4..word_index * 4 + 4].copy_from_slice(&word.to_ne_bytes());
            }
            IpAddr::V6(Ipv6Addr::from(bytes))
        }
        _ => return None,
    };
    Some((ip, port))
}

fn state_name(hex: &str, protocol: &str) -> &'static str {
    match (u8::from_str_radix(hex, 16).unwrap_or(0), protocol.starts_with("udp")) {
        (0x07, true) => "NONE",
        (0x01, _) => "ESTABLISHED",
        (0x02, _) => "SYN_SENT",
        (0x03, _) => "SYN_RECV",
        (0x04, _) => "FIN_WAIT1",
        (0x05, _) => "FIN_WAIT2",
        (0x06, _) => "TIME_WAIT",
        (0x07, false) => "CLOSE",
        (0x08, _) => "CLOSE_WAIT",
        (0x09, _) => "LAST_ACK",
        (0x0A, _) => "LISTEN",
        (0x0B, _) => "CLOSING",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000:0016 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 1 1
   1: 0100007F:1538 00000000:0000 0A 00000000:00000000 00:00000000 00000000   106        0 2 1
   2: 0F02000A:0016 0202000A:C5D2 01 00000000:00000000 02:0008CC3C 00000000     0        0 3 1
";

    const TCP6: &str = "\
  sl  local_address                         remote_address                        st tx_queue rx_queue
   0: 00000000000000000000000000000000:0050 00000000000000000000000000000000:0000 0A 00000000:00000000
   1: 00000000000000000000000001000000:0016 00000000000000000000000000000000:0000 0A 00000000:00000000
";

    #[test]
    #[cfg(target_endian = "little")]
    fn test_parse_ipv4_table() {
        let entries = parse_table(TCP, "tcp");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].local, "0.0.0.0:22");
        assert!(entries[0].is_listening());
        assert_eq!(entries[1].local, "127.0.0.1:5432");
        assert_eq!(entries[2].local, "10.0.2.15:22");
        assert_eq!(entries[2].remote.as_deref(), Some("10.0.2.2:50642"));
        assert_eq!(entries[2].status, "ESTABLISHED");
    }

    #[test]
    #[cfg(target_endian = "little")]
    fn test_parse_ipv6_table() {
        let entries = parse_table(TCP6, "tcp6");
        assert_eq!(entries[0].local, "[::]:80");
        assert_eq!(entries[1].local, "[::1]:22");
        assert!(entries[1].remote.is_none());
    }

    #[test]
    #[cfg(target_endian = "little")]
    fn test_listening_ports_dedup() {
        let mut entries = parse_table(TCP, "tcp");
        entries.extend(parse_table(TCP6, "tcp6"));
        assert_eq!(listening_ports(&entries), vec![22, 80, 5432]);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let entries = parse_table("header\n 0: nonsense\n 1: ZZ:1 00:00 0A\n", "tcp");
        assert!(entries.is_empty());
    }
}

//! Captive DNS responder.
//!
//! Answers every matching query with the portal address so any hostname a
//! client tries leads to the configuration page. Only the question section
//! is parsed; the answer is built in place with a name pointer back to the
//! question. One datagram is handled per poll.

use std::net::{Ipv4Addr, UdpSocket};

use log::{debug, warn};

use super::{PortalDns, PortalError};

/// Largest DNS datagram the responder will handle.
const MAX_PACKET_LEN: usize = 512;

/// UDP-socket DNS adapter.
pub struct UdpDnsResponder {
    ttl: u32,
    socket: Option<UdpSocket>,
    match_pattern: String,
    resolve_to: Ipv4Addr,
}

impl UdpDnsResponder {
    /// Create a responder with no listener and a zero TTL.
    pub fn new() -> Self {
        Self {
            ttl: 0,
            socket: None,
            match_pattern: "*".to_string(),
            resolve_to: Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl Default for UdpDnsResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl PortalDns for UdpDnsResponder {
    fn configure(&mut self, ttl: u32) {
        self.ttl = ttl;
    }

    fn start(
        &mut self,
        port: u16,
        match_pattern: &str,
        resolve_to: Ipv4Addr,
    ) -> Result<(), PortalError> {
        let socket =
            UdpSocket::bind(("0.0.0.0", port)).map_err(PortalError::DnsBind)?;
        socket.set_nonblocking(true).map_err(PortalError::DnsBind)?;
        self.socket = Some(socket);
        self.match_pattern = match_pattern.to_string();
        self.resolve_to = resolve_to;
        Ok(())
    }

    fn poll_once(&mut self) -> Result<(), PortalError> {
        let Some(socket) = self.socket.as_ref() else {
            return Ok(());
        };

        let mut query = [0u8; MAX_PACKET_LEN];
        let (len, origin) = match socket.recv_from(&mut query) {
            Ok(received) => received,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) => return Err(PortalError::Dns(e)),
        };
        let query = &query[..len];

        let Some(question) = parse_question(query) else {
            debug!("ignoring malformed dns query from {}", origin);
            return Ok(());
        };
        if !name_matches(&question.name, &self.match_pattern) {
            debug!("ignoring dns query for non-matching name {}", question.name);
            return Ok(());
        }

        let mut response = [0u8; MAX_PACKET_LEN];
        let Some(response_len) =
            build_response(query, &mut response, &question, self.resolve_to, self.ttl)
        else {
            debug!("dns query too large to answer, dropping");
            return Ok(());
        };

        // Send failures are not fatal; the client may have moved on.
        if let Err(e) = socket.send_to(&response[..response_len], origin) {
            warn!("failed to send dns response: {}", e);
        }
        Ok(())
    }
}

struct Question {
    /// Length of the question section (name + type + class).
    wire_len: usize,
    name: String,
    #[allow(dead_code)]
    qtype: u16,
    #[allow(dead_code)]
    qclass: u16,
}

/// Parse the first question of a DNS query.
///
/// Queries never use name compression in the question, so only plain labels
/// are handled.
fn parse_question(packet: &[u8]) -> Option<Question> {
    if packet.len() < 12 {
        return None;
    }

    let mut idx = 12;
    let mut name = String::new();

    loop {
        let label_len = *packet.get(idx)? as usize;
        idx += 1;
        if label_len == 0 {
            break;
        }
        if label_len > 63 || idx + label_len > packet.len() {
            return None;
        }
        let label = std::str::from_utf8(&packet[idx..idx + label_len]).ok()?;
        if !name.is_empty() {
            name.push('.');
        }
        name.push_str(label);
        idx += label_len;
    }

    if idx + 4 > packet.len() {
        return None;
    }
    let qtype = u16::from_be_bytes([packet[idx], packet[idx + 1]]);
    let qclass = u16::from_be_bytes([packet[idx + 2], packet[idx + 3]]);
    idx += 4;

    Some(Question {
        wire_len: idx - 12,
        name,
        qtype,
        qclass,
    })
}

/// Build a response answering the question with one A record.
///
/// The header transaction ID and question section are copied from the query;
/// the single answer points back at the question name.
fn build_response(
    query: &[u8],
    response: &mut [u8],
    question: &Question,
    answer_ip: Ipv4Addr,
    ttl: u32,
) -> Option<usize> {
    let question_end = 12 + question.wire_len;
    if query.len() < question_end || response.len() < question_end + 16 {
        return None;
    }

    response[..question_end].fill(0);
    response[0..2].copy_from_slice(&query[0..2]); // transaction ID
    response[2] = 0x81; // response + recursion desired
    response[3] = 0x80; // recursion available, NOERROR
    response[4..6].copy_from_slice(&1u16.to_be_bytes()); // QDCOUNT
    response[6..8].copy_from_slice(&1u16.to_be_bytes()); // ANCOUNT
                                                         // NSCOUNT and ARCOUNT stay zero
    response[12..question_end].copy_from_slice(&query[12..question_end]);

    let mut offset = question_end;
    response[offset] = 0xC0;
    response[offset + 1] = 0x0C; // pointer to the question name
    response[offset + 2..offset + 4].copy_from_slice(&1u16.to_be_bytes()); // TYPE A
    response[offset + 4..offset + 6].copy_from_slice(&1u16.to_be_bytes()); // CLASS IN
    response[offset + 6..offset + 10].copy_from_slice(&ttl.to_be_bytes());
    response[offset + 10..offset + 12].copy_from_slice(&4u16.to_be_bytes()); // RDLENGTH
    response[offset + 12..offset + 16].copy_from_slice(&answer_ip.octets());
    offset += 16;

    Some(offset)
}

/// Match a query name against the configured pattern.
///
/// `"*"` matches everything; `"*.suffix"` matches the suffix and any name
/// under it; anything else must match exactly (case-insensitive, per DNS).
fn name_matches(name: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(suffix) = pattern.strip_prefix("*.") {
        return name.eq_ignore_ascii_case(suffix)
            || name
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", suffix.to_ascii_lowercase()));
    }
    name.eq_ignore_ascii_case(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-built query for `example.com`, type A, class IN.
    fn example_query(id: u16) -> Vec<u8> {
        let mut packet = Vec::new();
        packet.extend_from_slice(&id.to_be_bytes());
        packet.extend_from_slice(&[0x01, 0x00]); // standard query, RD
        packet.extend_from_slice(&1u16.to_be_bytes()); // QDCOUNT
        packet.extend_from_slice(&[0, 0, 0, 0, 0, 0]); // AN/NS/AR
        packet.push(7);
        packet.extend_from_slice(b"example");
        packet.push(3);
        packet.extend_from_slice(b"com");
        packet.push(0);
        packet.extend_from_slice(&1u16.to_be_bytes()); // TYPE A
        packet.extend_from_slice(&1u16.to_be_bytes()); // CLASS IN
        packet
    }

    #[test]
    fn test_parse_question_name_and_types() {
        let query = example_query(0x1234);
        let question = parse_question(&query).unwrap();
        assert_eq!(question.name, "example.com");
        assert_eq!(question.qtype, 1);
        assert_eq!(question.qclass, 1);
        assert_eq!(question.wire_len, query.len() - 12);
    }

    #[test]
    fn test_parse_rejects_truncated_packets() {
        assert!(parse_question(&[0u8; 5]).is_none());

        let mut query = example_query(1);
        query.truncate(query.len() - 3); // cut into the class field
        assert!(parse_question(&query).is_none());
    }

    #[test]
    fn test_parse_rejects_label_overrun() {
        let mut query = example_query(1);
        query[12] = 200; // label length way past the packet end
        assert!(parse_question(&query).is_none());
    }

    #[test]
    fn test_response_echoes_id_and_answers() {
        let query = example_query(0xABCD);
        let question = parse_question(&query).unwrap();
        let mut response = [0u8; MAX_PACKET_LEN];
        let len = build_response(
            &query,
            &mut response,
            &question,
            Ipv4Addr::new(192, 168, 4, 1),
            0,
        )
        .unwrap();
        let response = &response[..len];

        assert_eq!(&response[0..2], &[0xAB, 0xCD]);
        assert_eq!(response[2] & 0x80, 0x80); // QR = response
        assert_eq!(&response[4..6], &[0, 1]); // one question
        assert_eq!(&response[6..8], &[0, 1]); // one answer
        assert_eq!(&response[len - 4..], &[192, 168, 4, 1]);
        // TTL zero so clients do not cache across rescans.
        assert_eq!(&response[len - 10..len - 6], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_response_carries_configured_ttl() {
        let query = example_query(1);
        let question = parse_question(&query).unwrap();
        let mut response = [0u8; MAX_PACKET_LEN];
        let len = build_response(
            &query,
            &mut response,
            &question,
            Ipv4Addr::new(10, 0, 0, 1),
            300,
        )
        .unwrap();
        assert_eq!(&response[len - 10..len - 6], &300u32.to_be_bytes());
    }

    #[test]
    fn test_name_matching() {
        assert!(name_matches("anything.example", "*"));
        assert!(name_matches("EXAMPLE.com", "example.com"));
        assert!(name_matches("a.example.com", "*.example.com"));
        assert!(name_matches("example.com", "*.example.com"));
        assert!(!name_matches("example.org", "example.com"));
        assert!(!name_matches("notexample.com", "*.example.com"));
    }

    #[test]
    fn test_poll_before_start_is_noop() {
        let mut responder = UdpDnsResponder::new();
        assert!(responder.poll_once().is_ok());
    }

    #[test]
    fn test_round_trip_over_loopback() {
        let mut responder = UdpDnsResponder::new();
        responder.configure(0);
        // Port 0 lets the OS pick a free port; fish it back out of the socket.
        responder
            .start(0, "*", Ipv4Addr::new(192, 168, 4, 1))
            .unwrap();
        let server_addr = responder
            .socket
            .as_ref()
            .unwrap()
            .local_addr()
            .unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .send_to(&example_query(0x42), ("127.0.0.1", server_addr.port()))
            .unwrap();

        // Poll until the datagram shows up; loopback delivery is fast but
        // not instantaneous.
        client
            .set_read_timeout(Some(std::time::Duration::from_millis(10)))
            .unwrap();
        let mut buf = [0u8; MAX_PACKET_LEN];
        let mut received = None;
        for _ in 0..200 {
            responder.poll_once().unwrap();
            if let Ok((len, _)) = client.recv_from(&mut buf) {
                received = Some(len);
                break;
            }
        }

        let len = received.expect("no dns response within timeout");
        assert_eq!(&buf[0..2], &[0x00, 0x42]);
        assert_eq!(&buf[len - 4..len], &[192, 168, 4, 1]);
    }
}

//! UDP submission collaborator.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::debug;

/// Default APRS-IS UDP submission port.
pub const DEFAULT_UDP_PORT: u16 = 8080;

/// Sends one datagram; no acknowledgement is expected.
pub trait DatagramSend: Send + Sync {
    fn send_to(&self, payload: &[u8], host: &str, port: u16) -> io::Result<usize>;
}

/// Sends each datagram from a fresh ephemeral socket.
///
/// The host is resolved and each address is tried in turn, from a socket
/// bound in that address's family.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpSender;

impl DatagramSend for UdpSender {
    fn send_to(&self, payload: &[u8], host: &str, port: u16) -> io::Result<usize> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match send_from_matching_family(payload, addr) {
                Ok(sent) => {
                    debug!(host, port, %addr, sent, "udp datagram sent");
                    return Ok(sent);
                }
                Err(err) => {
                    debug!(%addr, error = %err, "udp send failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{host}:{port} did not resolve to any address"),
            )
        }))
    }
}

fn send_from_matching_family(payload: &[u8], addr: SocketAddr) -> io::Result<usize> {
    let local = match addr {
        SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
    };
    UdpSocket::bind(local)?.send_to(payload, addr)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn datagram_arrives_intact() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let sent = UdpSender
            .send_to(b"user N0CALL\nN0CALL>APRS:!x", "127.0.0.1", port)
            .unwrap();
        assert_eq!(sent, 26);

        let mut buf = [0u8; 64];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"user N0CALL\nN0CALL>APRS:!x");
    }

    #[test]
    fn datagram_reaches_ipv6_host() {
        // Hosts without IPv6 loopback have nothing to test.
        let Ok(receiver) = UdpSocket::bind("[::1]:0") else {
            return;
        };
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let sent = UdpSender.send_to(b"N0CALL>APRS:!v6", "::1", port).unwrap();
        assert_eq!(sent, 15);

        let mut buf = [0u8; 64];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"N0CALL>APRS:!v6");
    }
}

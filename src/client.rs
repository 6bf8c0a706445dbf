//! Blocking connection to a simulator endpoint.
//!
//! A [`Client`] owns at most one socket, either a TCP stream or a connected
//! UDP socket. The socket is released by [`Client::close`] or when the client
//! is dropped. Nothing here retries or reconnects; callers decide.

use crate::packet::MessageTag;
use std::io::{self, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4820;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server closed connection")]
    ConnectionClosed,
    #[error("unable to reach {endpoint}")]
    Connection {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("no connection established")]
    NotConnected,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug)]
enum Transport {
    Stream(TcpStream),
    Datagram(UdpSocket),
}

impl Transport {
    fn apply_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Transport::Stream(stream) => {
                stream.set_read_timeout(timeout)?;
                stream.set_write_timeout(timeout)
            }
            Transport::Datagram(socket) => {
                socket.set_read_timeout(timeout)?;
                socket.set_write_timeout(timeout)
            }
        }
    }

    fn send_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Transport::Stream(stream) => stream.write_all(bytes),
            Transport::Datagram(socket) => {
                let sent = socket.send(bytes)?;
                if sent != bytes.len() {
                    return Err(io::Error::new(io::ErrorKind::WriteZero, "datagram truncated"));
                }
                Ok(())
            }
        }
    }
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::Stream(stream) => stream.read(buf),
            Transport::Datagram(socket) => socket.recv(buf),
        }
    }
}

/// Reads exactly `size` bytes from `reader`, concatenating partial reads in
/// arrival order. A zero-length read before `size` bytes is a closed peer.
pub fn read_exact_from<R: Read>(reader: &mut R, size: usize) -> Result<Vec<u8>, ClientError> {
    let mut packet = vec![0u8; size];
    let mut filled = 0;

    while filled < size {
        match reader.read(&mut packet[filled..]) {
            Ok(0) => return Err(ClientError::ConnectionClosed),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(packet)
}

#[derive(Debug, Default)]
pub struct Client {
    transport: Option<Transport>,
    address: Option<SocketAddr>,
    timeout: Option<Duration>,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a stream connection to the first reachable address `hostname`
    /// resolves to. Does nothing when already connected.
    pub fn connect(&mut self, hostname: &str, port: u16) -> Result<(), ClientError> {
        if self.transport.is_some() {
            return Ok(());
        }

        let endpoint = format!("{}:{}", hostname, port);
        let mut last_error = None;
        for addr in resolve(hostname, port, &endpoint)? {
            match TcpStream::connect(addr) {
                Ok(stream) => {
                    info!("connected to {} ({})", endpoint, addr);
                    return self.attach(Transport::Stream(stream), addr);
                }
                Err(e) => {
                    warn!("connection to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(ClientError::Connection {
            endpoint,
            source: last_error.unwrap_or_else(no_address),
        })
    }

    /// Binds a local UDP socket and associates it with the first address
    /// `hostname` resolves to. Does nothing when a socket is already open.
    pub fn open_datagram(&mut self, hostname: &str, port: u16) -> Result<(), ClientError> {
        if self.transport.is_some() {
            return Ok(());
        }

        let endpoint = format!("{}:{}", hostname, port);
        let mut last_error = None;
        for addr in resolve(hostname, port, &endpoint)? {
            let local = match addr {
                SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
                SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
            };
            let opened = UdpSocket::bind(local).and_then(|socket| socket.connect(addr).map(|()| socket));
            match opened {
                Ok(socket) => {
                    info!("datagram socket associated with {} ({})", endpoint, addr);
                    return self.attach(Transport::Datagram(socket), addr);
                }
                Err(e) => {
                    warn!("datagram socket for {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(ClientError::Connection {
            endpoint,
            source: last_error.unwrap_or_else(no_address),
        })
    }

    /// Takes ownership of a freshly opened socket. A timeout applied to an
    /// earlier connection carries over.
    fn attach(&mut self, transport: Transport, addr: SocketAddr) -> Result<(), ClientError> {
        transport.apply_timeout(self.timeout)?;
        self.transport = Some(transport);
        self.address = Some(addr);
        Ok(())
    }

    /// Releases the socket. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            debug!("closing connection to {:?}", self.address);
            drop(transport);
        }
        self.address = None;
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Applies a read/write timeout to the open socket; `None` blocks
    /// indefinitely. Without an open socket this does nothing. Once applied,
    /// the timeout is reapplied to later connections.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), ClientError> {
        if let Some(transport) = &self.transport {
            transport.apply_timeout(timeout)?;
            self.timeout = timeout;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    pub fn port(&self) -> Option<u16> {
        self.address.map(|addr| addr.port())
    }

    pub fn server_address(&self) -> Option<IpAddr> {
        self.address.map(|addr| addr.ip())
    }

    pub fn send(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        let transport = self.transport.as_mut().ok_or(ClientError::NotConnected)?;
        transport.send_all(bytes)?;
        Ok(())
    }

    pub fn read_exact(&mut self, size: usize) -> Result<Vec<u8>, ClientError> {
        let transport = self.transport.as_mut().ok_or(ClientError::NotConnected)?;
        read_exact_from(transport, size)
    }

    pub fn read_message_tag(&mut self) -> Result<MessageTag, ClientError> {
        let packet = self.read_exact(1)?;
        Ok(MessageTag(u8::from_le_bytes([packet[0]])))
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}

fn resolve(hostname: &str, port: u16, endpoint: &str) -> Result<Vec<SocketAddr>, ClientError> {
    let addrs: Vec<SocketAddr> = (hostname, port)
        .to_socket_addrs()
        .map_err(|source| ClientError::Connection {
            endpoint: endpoint.to_string(),
            source,
        })?
        .collect();
    debug!("{} resolved to {:?}", endpoint, addrs);
    Ok(addrs)
}

fn no_address() -> io::Error {
    io::Error::new(io::ErrorKind::AddrNotAvailable, "no address resolved")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_require_connection() {
        let mut client = Client::new();
        assert!(!client.is_connected());
        assert!(matches!(client.read_exact(4), Err(ClientError::NotConnected)));
        assert!(matches!(client.read_message_tag(), Err(ClientError::NotConnected)));
        assert!(matches!(client.send(&[1, 2]), Err(ClientError::NotConnected)));
        assert!(client.port().is_none());
        assert!(client.server_address().is_none());
    }

    #[test]
    fn test_timeout_ignored_until_connected() {
        let mut client = Client::new();
        client.set_timeout(Some(Duration::from_millis(50))).unwrap();
        assert_eq!(client.timeout(), None);
        client.close();
        client.close();
    }
}

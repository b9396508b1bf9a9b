use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Blocking TCP listening endpoint.
///
/// Wraps a bound [`TcpListener`] and remembers the resolved local address,
/// which matters when binding port 0 or the unspecified address.
pub struct TcpEndpoint {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpEndpoint {
    /// Bind and listen on `addr`.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(%local_addr, "listening on tcp endpoint");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    ///
    /// Nagle is disabled on the returned stream: requests and responses are
    /// a handful of bytes and the peer waits for each reply.
    pub fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted connection");
        Ok((stream, peer))
    }

    /// Connect to a listening endpoint (blocking).
    pub fn connect(addr: SocketAddr, timeout: Option<Duration>) -> Result<TcpStream> {
        let stream = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    /// Resolved local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Address a local client can dial to reach this endpoint.
    ///
    /// An unspecified bind address (`0.0.0.0` / `::`) is replaced with the
    /// matching loopback address.
    pub fn dial_addr(&self) -> SocketAddr {
        dialable(self.local_addr)
    }
}

impl std::fmt::Debug for TcpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpEndpoint")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

fn dialable(addr: SocketAddr) -> SocketAddr {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, addr.port())
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::thread;

    use super::*;

    fn loopback_any_port() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[test]
    fn bind_resolves_ephemeral_port() {
        let endpoint = TcpEndpoint::bind(loopback_any_port()).unwrap();
        assert_ne!(endpoint.local_addr().port(), 0);
    }

    #[test]
    fn accept_and_exchange_bytes() {
        let endpoint = TcpEndpoint::bind(loopback_any_port()).unwrap();
        let addr = endpoint.dial_addr();

        let server = thread::spawn(move || {
            let (mut stream, peer) = endpoint.accept().unwrap();
            assert!(peer.ip().is_loopback());
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(&buf).unwrap();
        });

        let mut client = TcpEndpoint::connect(addr, Some(Duration::from_secs(2))).unwrap();
        client.write_all(b"ping").unwrap();
        let mut echoed = [0u8; 4];
        client.read_exact(&mut echoed).unwrap();
        assert_eq!(&echoed, b"ping");

        server.join().unwrap();
    }

    #[test]
    fn unspecified_bind_dials_loopback() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 1502);
        assert_eq!(
            dialable(addr),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 1502)
        );

        let addr = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 1502);
        assert_eq!(
            dialable(addr),
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 1502)
        );
    }

    #[test]
    fn bind_conflict_reports_address() {
        let first = TcpEndpoint::bind(loopback_any_port()).unwrap();
        let err = TcpEndpoint::bind(first.local_addr()).unwrap_err();
        assert!(matches!(err, TransportError::Bind { addr, .. } if addr == first.local_addr()));
    }
}

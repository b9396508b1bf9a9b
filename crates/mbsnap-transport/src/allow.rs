use std::net::IpAddr;

use crate::error::{Result, TransportError};

/// Peer IP allow-list applied to every accepted connection.
///
/// An empty list admits every peer. Addresses are compared in canonical
/// form, so an IPv4 peer arriving on a dual-stack socket as
/// `::ffff:a.b.c.d` still matches an `a.b.c.d` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    peers: Vec<IpAddr>,
}

impl AllowList {
    /// Build an allow-list from already-parsed addresses.
    pub fn new(peers: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            peers: peers.into_iter().map(|ip| ip.to_canonical()).collect(),
        }
    }

    /// Parse textual addresses (e.g. from a comma-separated flag).
    pub fn parse<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut peers = Vec::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            let ip: IpAddr = entry
                .parse()
                .map_err(|_| TransportError::InvalidPeer(entry.to_string()))?;
            peers.push(ip);
        }
        Ok(Self::new(peers))
    }

    /// True when the list restricts nothing.
    pub fn is_open(&self) -> bool {
        self.peers.is_empty()
    }

    /// Whether a connection from `ip` may proceed.
    pub fn permits(&self, ip: IpAddr) -> bool {
        self.is_open() || self.peers.contains(&ip.to_canonical())
    }

    /// Configured entries.
    pub fn peers(&self) -> &[IpAddr] {
        &self.peers
    }
}

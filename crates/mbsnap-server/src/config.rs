use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use mbsnap_registers::{AddressBase, DecodeOptions, DEFAULT_REGISTER_COUNT};
use mbsnap_transport::AllowList;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};

/// Default listening port for register traffic.
pub const DEFAULT_PORT: u16 = 502;
/// Default snapshot path.
pub const DEFAULT_OUTPUT: &str = "/tmp/moxa_values.txt";
/// Default minimum spacing between snapshot flushes.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 200;

/// Endpoint configuration.
///
/// Built once at startup and shared read-only with every connection.
/// Every field has a default, so a config file only lists what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Address to listen on.
    pub listen: IpAddr,
    pub port: u16,
    /// Snapshot file, rewritten on every flush.
    pub output: PathBuf,
    /// Protocol address that maps to engineering offset 0.
    pub address_base: AddressBase,
    /// Peers allowed to connect. Empty admits everyone.
    pub allowed_peers: Vec<IpAddr>,
    pub decode: DecodeOptions,
    /// Minimum spacing between snapshot flushes, in milliseconds.
    pub flush_interval_ms: u64,
    /// Size of the register store, in words.
    pub register_count: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            output: PathBuf::from(DEFAULT_OUTPUT),
            address_base: AddressBase::default(),
            allowed_peers: Vec::new(),
            decode: DecodeOptions::default(),
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            register_count: DEFAULT_REGISTER_COUNT,
        }
    }
}

impl BridgeConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_slice(&raw).map_err(|source| ServerError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no endpoint can run with.
    pub fn validate(&self) -> Result<()> {
        if self.register_count == 0 {
            return Err(ServerError::InvalidConfig(
                "register_count must be greater than zero".to_string(),
            ));
        }
        for (group, scale) in [
            ("ai", self.decode.scales.ai),
            ("ao", self.decode.scales.ao),
            ("tk", self.decode.scales.tk),
        ] {
            if !scale.is_finite() {
                return Err(ServerError::InvalidConfig(format!(
                    "scale for {group} must be finite"
                )));
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen, self.port)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn allow_list(&self) -> AllowList {
        AllowList::new(self.allowed_peers.iter().copied())
    }
}

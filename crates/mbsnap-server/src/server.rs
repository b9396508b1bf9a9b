use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mbsnap_registers::ChannelMap;
use mbsnap_transport::{AllowList, TcpEndpoint};
use tracing::{debug, info, info_span, warn};

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::session::serve_connection;

const WAKE_TIMEOUT: Duration = Duration::from_secs(1);
const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Accepts connections and runs one session thread per peer.
#[derive(Debug)]
pub struct Server {
    endpoint: TcpEndpoint,
    bridge: Arc<Bridge>,
    allow: AllowList,
    shutdown: Arc<AtomicBool>,
    next_conn_id: AtomicU64,
}

impl Server {
    /// Validate `config` and bind its listening address.
    pub fn bind(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;

        let span = ChannelMap::standard().register_span();
        if config.register_count < span {
            warn!(
                register_count = config.register_count,
                channel_span = span,
                "register store is smaller than the channel table; trailing channels read as zero"
            );
        }

        let endpoint = TcpEndpoint::bind(config.socket_addr())?;
        let allow = config.allow_list();
        if allow.is_open() {
            info!("accepting connections from any peer");
        } else {
            info!(peers = ?allow.peers(), "accepting connections from allow-listed peers only");
        }

        Ok(Self {
            endpoint,
            bridge: Arc::new(Bridge::new(config)),
            allow,
            shutdown: Arc::new(AtomicBool::new(false)),
            next_conn_id: AtomicU64::new(1),
        })
    }

    /// Resolved listening address.
    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// Handle that stops [`Server::serve`] from another thread.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            flag: Arc::clone(&self.shutdown),
            wake_addr: self.endpoint.dial_addr(),
        }
    }

    /// Accept connections until shut down, then write a final snapshot.
    ///
    /// Sessions already running are left to finish on their own threads.
    ///
    /// Accept errors (fd exhaustion among them) are retried after a delay
    /// that doubles from 10ms up to 1s and resets on the next success.
    pub fn serve(&self) -> Result<()> {
        let mut backoff = AcceptBackoff::new(ACCEPT_BACKOFF_MIN, ACCEPT_BACKOFF_MAX);
        loop {
            let accepted = self.endpoint.accept();
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            let (stream, peer) = match accepted {
                Ok(accepted) => {
                    backoff.reset();
                    accepted
                }
                Err(err) => {
                    let delay = backoff.next_delay();
                    warn!(error = %err, retry_in = ?delay, "accept failed");
                    thread::sleep(delay);
                    continue;
                }
            };

            if !self.allow.permits(peer.ip()) {
                info!(%peer, "rejecting connection from peer not on the allow list");
                drop(stream);
                continue;
            }

            let id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
            self.spawn_session(id, stream, peer);
        }

        info!("shutting down; writing final snapshot");
        if let Err(err) = self.bridge.flush_now() {
            warn!(error = %err, "final snapshot flush failed");
        }
        Ok(())
    }

    fn spawn_session(&self, id: u64, stream: TcpStream, peer: SocketAddr) {
        let bridge = Arc::clone(&self.bridge);
        let name = format!("conn-{id}");
        let spawned = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_session(&name, stream, peer, &bridge));
        if let Err(err) = spawned {
            warn!(%peer, error = %err, "failed to spawn session thread");
        }
    }
}

fn run_session(name: &str, stream: TcpStream, peer: SocketAddr, bridge: &Bridge) {
    let span = info_span!("session", conn = name, %peer);
    let _guard = span.enter();

    let reader = match stream.try_clone() {
        Ok(reader) => reader,
        Err(err) => {
            warn!(error = %err, "failed to clone stream");
            return;
        }
    };

    info!("session started");
    match serve_connection(reader, &stream, bridge) {
        Ok(answered) => info!(answered, "session ended"),
        Err(err) => debug!(error = %err, "session ended with error"),
    }
}

/// Capped exponential delay between failed accepts.
#[derive(Debug)]
struct AcceptBackoff {
    min: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl AcceptBackoff {
    fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            current: None,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = match self.current {
            None => self.min,
            Some(previous) => previous.saturating_mul(2).min(self.max),
        };
        self.current = Some(delay);
        delay
    }

    fn reset(&mut self) {
        self.current = None;
    }
}

/// Stops a running [`Server`].
#[derive(Debug, Clone)]
pub struct ServerHandle {
    flag: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl ServerHandle {
    /// Ask the accept loop to stop. Safe to call more than once.
    pub fn shutdown(&self) {
        if self.flag.swap(true, Ordering::SeqCst) {
            return;
        }
        // Unblock a pending accept.
        if let Err(err) = TcpEndpoint::connect(self.wake_addr, Some(WAKE_TIMEOUT)) {
            debug!(error = %err, "wake connection failed");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

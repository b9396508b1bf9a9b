use mbsnap_frame::{function_name, Request, Response};
use mbsnap_registers::{AddressBase, ChannelMap, RegisterStore};
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::snapshot_writer::SnapshotWriter;

/// State shared by every connection: the register store, the address
/// translation, and the snapshot writer.
#[derive(Debug)]
pub struct Bridge {
    store: RegisterStore,
    base: AddressBase,
    snapshots: SnapshotWriter,
}

impl Bridge {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            store: RegisterStore::new(config.register_count),
            base: config.address_base,
            snapshots: SnapshotWriter::new(
                config.output.clone(),
                ChannelMap::standard(),
                config.decode,
                config.flush_interval(),
            ),
        }
    }

    /// Answer one request PDU.
    ///
    /// Protocol refusals come back as exception responses. A write whose
    /// addresses fall partly or wholly outside the store still succeeds
    /// for the full requested range; the out-of-range words are dropped.
    pub fn handle_pdu(&self, pdu: &[u8]) -> Response {
        let request = match Request::parse(pdu) {
            Ok(request) => request,
            Err(exception) => {
                debug!(
                    function = exception.function,
                    function_name = function_name(exception.function),
                    code = ?exception.code,
                    "refusing request"
                );
                return Response::Exception(exception);
            }
        };

        let written = self.apply(&request);
        debug!(
            function_name = function_name(request.function().as_u8()),
            start = request.start(),
            quantity = request.quantity(),
            written,
            "applied write"
        );

        if let Err(err) = self.snapshots.maybe_flush(&self.store) {
            warn!(error = %err, "snapshot flush failed");
        }

        request.success()
    }

    /// Write the request's words into the store. Returns how many landed.
    pub fn apply(&self, request: &Request) -> usize {
        let offset = self.base.translate(request.start());
        match request {
            Request::WriteSingleRegister { value, .. } => {
                self.store.set_range(offset, std::slice::from_ref(value))
            }
            Request::WriteMultipleRegisters { values, .. } => self.store.set_range(offset, values),
        }
    }

    /// Persist the current image now, ignoring the throttle.
    pub fn flush_now(&self) -> Result<()> {
        self.snapshots.flush_now(&self.store)
    }

    pub fn store(&self) -> &RegisterStore {
        &self.store
    }

    pub fn snapshots(&self) -> &SnapshotWriter {
        &self.snapshots
    }

    pub fn address_base(&self) -> AddressBase {
        self.base
    }
}

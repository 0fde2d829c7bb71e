//! `WorkerBridge` (§4.9): the correlated request/response pending-table.
//! Reimplements the upstream NAPI boundary's guarded-access/uniform-error
//! shape (`get_bridge_runtime`, `bridge_err`) over in-process channels —
//! there is no JS host here to cross into.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use dashmap::DashMap;
use recall_core::config::BridgeConfig;
use tracing::warn;
use uuid::Uuid;

use crate::messages::{BridgeRequest, BridgeResponse, WorkerEvent};

pub struct WorkerBridge {
    pending: DashMap<Uuid, Sender<BridgeResponse>>,
    request_timeout: Duration,
    dispatch_tx: Sender<(Uuid, BridgeRequest)>,
    event_tx: Sender<WorkerEvent>,
}

impl WorkerBridge {
    /// Returns the bridge plus the host-side ends of the request and event
    /// channels; the worker-facing handle only ever sees the bridge and the
    /// `Sender` halves.
    pub fn new(config: &BridgeConfig) -> (Self, Receiver<(Uuid, BridgeRequest)>, Receiver<WorkerEvent>) {
        let (dispatch_tx, dispatch_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let bridge = Self { pending: DashMap::new(), request_timeout: Duration::from_secs(config.request_timeout_secs), dispatch_tx, event_tx };
        (bridge, dispatch_rx, event_rx)
    }

    pub fn send_event(&self, event: WorkerEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Worker side: dispatch `request`, block for the correlated reply, and
    /// degrade to the benign default if the host doesn't answer within the
    /// configured timeout (§4.9 "Timeout").
    pub fn call(&self, request: BridgeRequest) -> BridgeResponse {
        let request_id = Uuid::new_v4();
        let (tx, rx) = bounded(1);
        self.pending.insert(request_id, tx);

        if self.dispatch_tx.send((request_id, request.clone())).is_err() {
            self.pending.remove(&request_id);
            return request.benign_timeout_response();
        }

        match rx.recv_timeout(self.request_timeout) {
            Ok(response) => response,
            Err(_) => {
                self.pending.remove(&request_id);
                warn!(request_id = %request_id, "bridge request timed out, degrading to benign default");
                request.benign_timeout_response()
            }
        }
    }

    /// Host side: resolve a pending request by id. A no-op if the worker
    /// already gave up and removed its own entry (§4.9 "Cleanup").
    pub fn resolve(&self, request_id: Uuid, response: BridgeResponse) {
        if let Some((_, tx)) = self.pending.remove(&request_id) {
            let _ = tx.send(response);
        }
    }

    /// Called on worker exit: every still-pending request is resolved with
    /// its benign default so no caller blocks past process teardown (§4.9
    /// "On worker exit the bridge resolves or rejects all pending
    /// entries").
    pub fn clear_pending(&self, fallback: BridgeResponse) {
        for entry in self.pending.iter() {
            let _ = entry.value().send(fallback.clone());
        }
        self.pending.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

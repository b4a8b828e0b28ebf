mod control;
mod errors;
mod outbox;
mod registry;
mod signaling;
mod spaces;

pub use errors::ClientError;
pub use outbox::Outbox;
pub use registry::{Registry, RobotProfile};

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::{info, warn};

use tether_core::{ClientId, ClientMessage, DecodeError, ServerMessage, decode_frame};

use crate::config::{SecretStore, SpaceCatalog};

/// The single owner of all mutable signaling state: connection registry,
/// active space membership, and per-space control queues. Handlers run to
/// completion under one lock; outbound sends go through the lock-free
/// [`Outbox`] and never suspend, so no other handler can interleave
/// mid-mutation.
pub struct Engine {
    catalog: Arc<SpaceCatalog>,
    secrets: Arc<SecretStore>,
    outbox: Arc<Outbox>,
    registry: Registry,
    active_spaces: HashMap<String, HashSet<ClientId>>,
    control_queues: HashMap<String, VecDeque<ClientId>>,
}

impl Engine {
    pub fn new(catalog: Arc<SpaceCatalog>, secrets: Arc<SecretStore>, outbox: Arc<Outbox>) -> Self {
        Self {
            catalog,
            secrets,
            outbox,
            registry: Registry::default(),
            active_spaces: HashMap::new(),
            control_queues: HashMap::new(),
        }
    }

    pub fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }

    /// Register a freshly accepted connection and greet it with its id.
    pub fn accept(&mut self, client_id: ClientId, tx: mpsc::UnboundedSender<Message>) {
        self.outbox.attach(client_id, tx);
        self.registry.add(client_id);
        self.outbox
            .send(client_id, &ServerMessage::Connected { sid: client_id });
        info!(%client_id, "client connected");
    }

    /// Decode one inbound text frame and dispatch it.
    pub fn handle_frame(&mut self, client_id: ClientId, text: &str) {
        match decode_frame(text) {
            Ok(message) => self.handle_message(client_id, message),
            Err(DecodeError::Json(e)) => {
                warn!(%client_id, "invalid JSON frame: {e}");
                self.outbox
                    .send(client_id, &ServerMessage::error("Invalid JSON"));
            }
            Err(DecodeError::UnknownType(kind)) => {
                warn!(%client_id, kind = %kind, "unknown message type");
            }
            Err(e @ DecodeError::Payload { .. }) => {
                warn!(%client_id, "{e}");
                self.outbox
                    .send(client_id, &ServerMessage::error("Invalid message payload"));
            }
        }
    }

    pub fn handle_message(&mut self, client_id: ClientId, message: ClientMessage) {
        match message {
            ClientMessage::JoinSpace(payload) => self.on_join_space(client_id, payload),
            ClientMessage::LeaveSpace => self.on_leave_space(client_id),
            ClientMessage::Ping => self.outbox.send(client_id, &ServerMessage::Pong {}),
            ClientMessage::Offer(payload) => self.on_offer(client_id, payload),
            ClientMessage::Answer(payload) => self.on_answer(client_id, payload),
            ClientMessage::IceCandidate(payload) => self.on_ice_candidate(client_id, payload),
            ClientMessage::ControlOffer(payload) => self.on_control_offer(client_id, payload),
            ClientMessage::ControlAnswer(payload) => self.on_control_answer(client_id, payload),
            ClientMessage::RobotIdentify(payload) => self.on_robot_identify(client_id, payload),
            ClientMessage::ControlRequest => self.on_control_request(client_id),
            ClientMessage::ControlGranted(payload) => self.on_spoofed_grant(client_id, payload),
            ClientMessage::ControlRelease => self.on_control_release(client_id),
            ClientMessage::SetAngles(payload) => self.on_set_angles(client_id, payload),
        }
    }

    /// Disconnect cascade, in fixed order: robot teardown, human teardown,
    /// space exit, index cleanup. The socket task runs this exactly once,
    /// after its receive loop ends.
    pub fn handle_disconnect(&mut self, client_id: ClientId) {
        info!(%client_id, "client disconnected");
        self.on_robot_disconnect(client_id);
        self.on_human_disconnect(client_id);
        self.on_leave_space(client_id);
        self.registry.cleanup(&client_id);
        self.outbox.detach(&client_id);
    }

    pub(crate) fn reject(&self, client_id: ClientId, error: ClientError) {
        self.outbox
            .send(client_id, &ServerMessage::error(error.to_string()));
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            active_spaces: self.active_spaces.len(),
            total_participants: self.active_spaces.values().map(HashSet::len).sum(),
            connected_clients: self.registry.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub active_spaces: usize,
    pub total_participants: usize,
    pub connected_clients: usize,
}

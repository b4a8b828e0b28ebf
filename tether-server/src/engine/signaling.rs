use tracing::{debug, warn};

use tether_core::{AnswerPayload, ClientId, IceCandidatePayload, OfferPayload, ServerMessage};

use super::{ClientError, Engine};

/// WebRTC signaling forwarding. Viewer-plane messages (`offer`, `answer`,
/// `ice_candidate`) fan out to the rest of the sender's space; control-plane
/// messages (`control_offer`, `control_answer`) are strictly point-to-point
/// between a robot and its active controller so queued waiters never see
/// them.
impl Engine {
    pub(crate) fn on_offer(&mut self, client_id: ClientId, payload: OfferPayload) {
        let Some(space_id) = self.registry.space_of(&client_id).map(str::to_owned) else {
            warn!(%client_id, "dropping offer from a client outside any space");
            return;
        };
        let Some(offer) = payload.offer else {
            warn!(%client_id, "dropping offer without offer data");
            return;
        };
        debug!(space = %space_id, "forwarding offer");
        self.broadcast(
            &space_id,
            &ServerMessage::Offer {
                offer,
                sid: client_id,
            },
            Some(client_id),
        );
    }

    pub(crate) fn on_answer(&mut self, client_id: ClientId, payload: AnswerPayload) {
        let Some(space_id) = self.registry.space_of(&client_id).map(str::to_owned) else {
            warn!(%client_id, "dropping answer from a client outside any space");
            return;
        };
        let Some(answer) = payload.answer else {
            warn!(%client_id, "dropping answer without answer data");
            return;
        };
        debug!(space = %space_id, "forwarding answer");
        // TODO: narrow this to the original offer sender once viewer-plane
        // signaling grows targeted routing.
        self.broadcast(
            &space_id,
            &ServerMessage::Answer {
                answer,
                sid: client_id,
            },
            Some(client_id),
        );
    }

    pub(crate) fn on_ice_candidate(&mut self, client_id: ClientId, payload: IceCandidatePayload) {
        let Some(space_id) = self.registry.space_of(&client_id).map(str::to_owned) else {
            warn!(%client_id, "dropping ICE candidate from a client outside any space");
            return;
        };
        let Some(candidate) = payload.candidate else {
            warn!(%client_id, "dropping ICE candidate without candidate data");
            return;
        };
        debug!(space = %space_id, "forwarding ICE candidate");
        self.broadcast(
            &space_id,
            &ServerMessage::IceCandidate {
                candidate,
                sid: client_id,
            },
            Some(client_id),
        );
    }

    /// Controller → robot only.
    pub(crate) fn on_control_offer(&mut self, client_id: ClientId, payload: OfferPayload) {
        let Some(space_id) = self.registry.space_of(&client_id).map(str::to_owned) else {
            warn!(%client_id, "dropping control offer from a client outside any space");
            return;
        };
        let Some(offer) = payload.offer else {
            warn!(%client_id, "dropping control offer without offer data");
            return;
        };

        let Some(robot_client_id) = self.registry.find_robot_in_space(&space_id) else {
            warn!(space = %space_id, "control offer with no robot connected");
            self.reject(client_id, ClientError::NoRobotInSpace);
            return;
        };
        if self.registry.controller_of(&robot_client_id) != Some(client_id) {
            self.reject(client_id, ClientError::NotActiveController);
            return;
        }

        debug!(space = %space_id, "forwarding control offer to robot");
        self.outbox.send(
            robot_client_id,
            &ServerMessage::ControlOffer {
                offer,
                sid: client_id,
            },
        );
    }

    /// Robot → active controller only. With no controller the answer is
    /// dropped, never broadcast.
    pub(crate) fn on_control_answer(&mut self, client_id: ClientId, payload: AnswerPayload) {
        let Some(space_id) = self.registry.space_of(&client_id).map(str::to_owned) else {
            warn!(%client_id, "dropping control answer from a client outside any space");
            return;
        };
        let Some(answer) = payload.answer else {
            warn!(%client_id, "dropping control answer without answer data");
            return;
        };

        if !self.registry.is_robot(&client_id) {
            self.reject(client_id, ClientError::NotARobot);
            return;
        }
        let Some(controller_id) = self.registry.controller_of(&client_id) else {
            warn!(%client_id, "dropping control answer: no active controller");
            return;
        };

        debug!(space = %space_id, "forwarding control answer to controller");
        self.outbox.send(
            controller_id,
            &ServerMessage::ControlAnswer {
                answer,
                sid: client_id,
            },
        );
    }
}

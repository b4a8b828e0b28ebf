use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::client::ClientId;

/// One inbound text frame, split into its routing tag and raw payload.
/// The payload is validated per message kind in a second step so a missing
/// `data` object behaves like an empty one.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown message type '{0}'")]
    UnknownType(String),
    #[error("invalid payload for '{kind}': {source}")]
    Payload {
        kind: &'static str,
        source: serde_json::Error,
    },
}

/// Decode one wire frame into a [`ClientMessage`].
pub fn decode_frame(text: &str) -> Result<ClientMessage, DecodeError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    ClientMessage::from_envelope(&envelope.kind, envelope.data)
}

/// Everything a client may send. Payload fields are optional at this layer;
/// required-field enforcement lives in the handlers so each one keeps its
/// own rejection message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    JoinSpace(JoinSpacePayload),
    LeaveSpace,
    Ping,
    Offer(OfferPayload),
    Answer(AnswerPayload),
    IceCandidate(IceCandidatePayload),
    ControlOffer(OfferPayload),
    ControlAnswer(AnswerPayload),
    RobotIdentify(RobotIdentifyPayload),
    ControlRequest,
    /// Grants are an internal transition; a client sending one is up to no
    /// good. The payload is kept verbatim for logging.
    ControlGranted(Value),
    ControlRelease,
    SetAngles(SetAnglesPayload),
}

impl ClientMessage {
    fn from_envelope(kind: &str, data: Value) -> Result<Self, DecodeError> {
        let data = match data {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        fn payload<T: DeserializeOwned>(kind: &'static str, data: Value) -> Result<T, DecodeError> {
            serde_json::from_value(data).map_err(|source| DecodeError::Payload { kind, source })
        }

        Ok(match kind {
            "join_space" => Self::JoinSpace(payload("join_space", data)?),
            "leave_space" => Self::LeaveSpace,
            "ping" => Self::Ping,
            "offer" => Self::Offer(payload("offer", data)?),
            "answer" => Self::Answer(payload("answer", data)?),
            "ice_candidate" => Self::IceCandidate(payload("ice_candidate", data)?),
            "control_offer" => Self::ControlOffer(payload("control_offer", data)?),
            "control_answer" => Self::ControlAnswer(payload("control_answer", data)?),
            "robot_identify" => Self::RobotIdentify(payload("robot_identify", data)?),
            "control_request" => Self::ControlRequest,
            "control_granted" => Self::ControlGranted(data),
            "control_release" => Self::ControlRelease,
            "set_angles" => Self::SetAngles(payload("set_angles", data)?),
            other => return Err(DecodeError::UnknownType(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JoinSpacePayload {
    pub space: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OfferPayload {
    pub offer: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnswerPayload {
    pub answer: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IceCandidatePayload {
    pub candidate: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RobotIdentifyPayload {
    pub robot_id: Option<String>,
    pub robot_name: Option<String>,
    pub space: Option<String>,
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetAnglesPayload {
    pub robot_id: Option<String>,
    pub angles: Option<Value>,
}

/// Everything the server may emit. Serialized as
/// `{"type": <snake_case tag>, "data": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        sid: ClientId,
    },
    JoinedSpace {
        space: String,
        participants: Vec<ClientId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_robot: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        robot_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        robot_name: Option<String>,
    },
    UserJoined {
        sid: ClientId,
        participants: Vec<ClientId>,
    },
    UserLeft {
        sid: ClientId,
    },
    RobotJoined {
        robot_id: String,
        robot_name: String,
        client_id: ClientId,
    },
    Offer {
        offer: Value,
        sid: ClientId,
    },
    Answer {
        answer: Value,
        sid: ClientId,
    },
    IceCandidate {
        candidate: Value,
        sid: ClientId,
    },
    ControlOffer {
        offer: Value,
        sid: ClientId,
    },
    ControlAnswer {
        answer: Value,
        sid: ClientId,
    },
    /// Legacy grant handshake: asks a robot to approve a controller. The
    /// queue-based arbiter grants directly, but the message remains part of
    /// the wire contract for older onboard clients.
    ControlRequest {
        controller_id: ClientId,
    },
    ControlGranted {
        robot_id: ClientId,
        robot_name: String,
    },
    ControlReleased {
        #[serde(skip_serializing_if = "Option::is_none")]
        robot_id: Option<ClientId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        controller_id: Option<ClientId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    ControlPending {
        position: usize,
    },
    SetAngles {
        angles: Value,
    },
    Pong {},
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// `control_released` as seen by a (current or queued) controller: names
    /// the robot whose lease went away.
    pub fn control_released_to_controller(robot_client_id: ClientId, reason: Option<&str>) -> Self {
        Self::ControlReleased {
            robot_id: Some(robot_client_id),
            controller_id: None,
            reason: reason.map(str::to_owned),
        }
    }

    /// `control_released` as seen by a robot: names the controller that let
    /// go of it.
    pub fn control_released_to_robot(controller_id: ClientId, reason: Option<&str>) -> Self {
        Self::ControlReleased {
            robot_id: None,
            controller_id: Some(controller_id),
            reason: reason.map(str::to_owned),
        }
    }
}

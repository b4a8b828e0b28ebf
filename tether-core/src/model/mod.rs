mod client;
mod message;

pub use client::{ClientId, ClientRole};
pub use message::{
    AnswerPayload, ClientMessage, DecodeError, IceCandidatePayload, JoinSpacePayload,
    OfferPayload, RobotIdentifyPayload, ServerMessage, SetAnglesPayload, decode_frame,
};

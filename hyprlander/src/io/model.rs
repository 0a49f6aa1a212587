//! Model service abstraction.
//!
//! The [`ModelSession`] trait is the only thing the conversation driver knows
//! about the model service. The concrete chat lives in [`crate::io::gemini`];
//! tests use scripted sessions that replay canned replies.

use thiserror::Error;

use crate::core::types::{ModelReply, Part};

/// A model call that produced no reply.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("model request failed: {0}")]
    Transport(String),
    #[error("model service returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("unexpected model response: {0}")]
    Decode(String),
}

/// Stateful chat handle: every call appends to the remote dialogue.
pub trait ModelSession {
    /// Send one message made of `parts` and wait for the reply.
    fn send(&mut self, parts: &[Part]) -> Result<ModelReply, ServiceError>;
}

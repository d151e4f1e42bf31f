//! Simulator webhook ingress

pub mod dto;
pub mod handlers;

pub use dto::{EventDecodeError, WebhookAck, WebhookEvent, WebhookPayload};
pub use handlers::*;

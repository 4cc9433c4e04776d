//! Chat transport boundary.
//!
//! The notification core never talks to WhatsApp (or any other chat network)
//! directly. It hands [`OutboundMessage`]s to a [`ChatTransport`], reads back
//! delivery receipts, and mutates group metadata through the same trait.

pub mod error;
pub mod gating;
pub mod media;
pub mod message;
pub mod transport;

pub use {
    error::{Error, Result},
    message::{DeliveryInfo, MediaRef, MessageContent, OutboundMessage, SentMessage},
    transport::{ChatInfo, ChatTransport},
};

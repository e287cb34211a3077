//! Data Transfer Objects for event-bus communication
//!
//! This module contains the messages exchanged between the builder and the
//! rest of the system: inbound build requests, outbound error reports, and
//! the envelope that carries reply routing alongside every message.

pub mod message;
pub mod payload;

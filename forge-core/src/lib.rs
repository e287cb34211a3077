//! Forge Core
//!
//! Core types and abstractions for the Payload Forge build service.
//!
//! This crate contains:
//! - Domain types: Agent configuration entities, payload records, build stages
//! - DTOs: Wire messages exchanged over the event bus
//! - Templates: Placeholder substitution for build command lines
//! - Secrets: Per-payload key generation

pub mod domain;
pub mod dto;
pub mod secret;
pub mod template;

//! Scheduler layer for the builder
//!
//! This layer reads build requests from the inbound message stream and
//! hands each one to the build service, bounding how many run at once.

pub mod consumer;

pub use consumer::RequestConsumer;

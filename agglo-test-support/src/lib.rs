//! Test utilities shared by the agglo crates.
//!
//! [`tracing::RecordingLayer`] captures spans and events for instrumentation
//! assertions; [`ci::property_test_profile`] reads the property-test budget
//! from the environment.

pub mod ci;
pub mod tracing;

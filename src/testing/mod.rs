//! Test support
//!
//! Mock implementations of the remote collaborator traits, the transport
//! seam, and the clock, shared between unit tests and the integration suite.

pub mod mocks;

//! Integration and property test suite for the SCASH wallet engine.
//!
//! Drives whole flows (create, plan, sign, submit, confirm) against an
//! in-memory node and checks accounting invariants under randomized inputs.

pub mod helpers;

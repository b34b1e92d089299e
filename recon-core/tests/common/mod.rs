//! Test infrastructure for the Recon parser and writer
//!
//! Provides stochastic generation and chunked feed/pull drivers. Test
//! files import what they use from the submodules.

#![allow(dead_code)]

pub mod generators;
pub mod harness;

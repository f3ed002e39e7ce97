//! Shared test utilities for the client transport stack.
//!
//! This crate provides:
//! - Proptest generators for status codes, path templates and claim maps
//! - A scripted transport that records every attempt it serves
//! - Ready-made fixtures: a sample mock API and fast transport settings

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use fixtures::{fast_config, init_test_tracing, sample_router};
pub use generators::*;
pub use mocks::{Attempt, ScriptedTransport, get_request, json_request, status_response};

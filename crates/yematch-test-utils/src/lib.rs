//! Testing utilities for the YE-Match workspace
//!
//! Legacy report text builders and a scripted remote transport.

#![allow(missing_docs)]

pub mod fakes;
pub mod fixtures;

pub use fakes::{FakeTransport, Invocation};

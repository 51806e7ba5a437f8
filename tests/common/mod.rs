//! Unified Test Framework for suite-runner
//!
//! `framework` drives the binary; `recording` observes library runs.

pub mod framework;
pub mod recording;

#[allow(unused_imports)]
pub use framework::*;
#[allow(unused_imports)]
pub use recording::*;

//! The thread identity abstraction layer API.
//!
//! Platform crates implement [`thread::ThreadAbstraction`] so that code can ask "which thread am I running on?"
//! without depending on a specific operating system primitive.

#![no_std]
#![forbid(unsafe_code)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[cfg(any(test, feature = "test-suites"))]
extern crate std;

mod error;
mod id;
pub mod thread;

pub use error::{Error, Result};
pub use id::{ParseThreadIdError, ThreadId};

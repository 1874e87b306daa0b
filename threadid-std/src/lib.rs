//! Std thread identity abstraction layer.
//!
//! This provides the thread identity sources for platforms with the std library.

#![forbid(unsafe_code)]

pub mod thread;

pub use threadid_api::{Error, Result, ThreadId};

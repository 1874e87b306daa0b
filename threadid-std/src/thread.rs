//! Thread-related abstractions.
//!
//! Two sources are provided. [`Thread`] hands out runtime-assigned ids that are never reused within the process and
//! is the default. [`NativeThread`] reports the id the kernel uses for the thread, which is what debuggers, `top -H`
//! and `/proc/<pid>/task` show, but which the kernel may reuse once a thread has exited.

use std::cell::LazyCell;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

pub use threadid_api::thread::ThreadAbstraction;
use threadid_api::{Error, Result, ThreadId};

/// Returns the id of the current thread, as assigned by [`Thread`].
pub fn current_thread_id() -> ThreadId {
    Thread::current_thread_id()
}

/// Implements the [`ThreadAbstraction`] trait for standard Rust.
///
/// Ids are handed out from a process-wide counter the first time a thread asks for its id. They start at 1 and are
/// never reused, even after a thread terminates.
#[derive(Debug)]
pub struct Thread;

/// Global counter for generating unique thread ids.
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Thread-local storage for the current thread's id.
    static THREAD_ID: LazyCell<ThreadId> = const { LazyCell::new(|| {
        // `Relaxed` is enough, we don't care about what specific value a thread sees.
        // We just ensure that every value is unique.
        // This assumes that creating 2^64 threads is impractical and no overflow occurs.
        let raw = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        let id = ThreadId::from_raw(NonZeroU64::new(raw).expect("overflow should not occur"));
        tracing::trace!(thread_id = %id, "assigned thread id");
        id
    }) };
}

impl ThreadAbstraction for Thread {
    fn current_thread_id() -> ThreadId {
        THREAD_ID.with(|thread_id| **thread_id)
    }
}

/// Implements the [`ThreadAbstraction`] trait using the kernel's thread id.
///
/// Supported on Linux and Android, where this is `gettid(2)`. The id is queried on every call. On other platforms
/// [`NativeThread::try_current_thread_id`] returns [`Error::Unsupported`].
#[derive(Debug)]
pub struct NativeThread;

impl ThreadAbstraction for NativeThread {
    fn current_thread_id() -> ThreadId {
        Self::try_current_thread_id()
            .unwrap_or_else(|error| panic!("failed to query the native thread id: {error}"))
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn try_current_thread_id() -> Result<ThreadId> {
        let tid = nix::unistd::gettid().as_raw();
        let raw = u64::try_from(tid).map_err(|_| Error::InvalidId)?;
        ThreadId::try_from(raw)
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn try_current_thread_id() -> Result<ThreadId> {
        Err(Error::Unsupported)
    }
}

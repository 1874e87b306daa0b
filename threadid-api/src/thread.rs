//! Abstractions for thread-related operations.

use core::num::NonZeroU64;

use crate::{Result, ThreadId};

/// `ThreadAbstraction` is used to query thread-related information in a platform-agnostic manner.
pub trait ThreadAbstraction {
    /// Returns a unique identifier for the current thread.
    ///
    /// Repeated calls from the same thread return the same id, and no two threads that are alive at the same time
    /// share an id. Implementations document whether ids may be reused after a thread terminates.
    ///
    /// This never fails on a supported platform. If the underlying primitive cannot produce an id the runtime is in
    /// a state we cannot recover from, and implementations panic.
    ///
    /// This is useful for telemetry and tracing, where thread ids can be included
    /// in spans and logs to help correlate events to specific threads of execution.
    ///
    /// # Example
    ///
    /// ```rust
    /// use threadid_api::thread::ThreadAbstraction;
    /// use threadid_std::thread::Thread;
    ///
    /// let thread_id = Thread::current_thread_id();
    /// println!("Current thread id: {}", thread_id);
    /// ```
    fn current_thread_id() -> ThreadId;

    /// Returns a unique identifier for the current thread, or the reason the platform cannot provide one.
    ///
    /// The default implementation never fails. Implementations backed by a primitive that may be missing override
    /// this and build [`current_thread_id`](Self::current_thread_id) on top of it.
    fn try_current_thread_id() -> Result<ThreadId> {
        Ok(Self::current_thread_id())
    }
}

/// Implements the [`ThreadAbstraction`] trait for systems with a single callstack.
///
/// Only supports running on a single core (and thread) on `no_std` systems.
/// Using this on any system that runs code on multiple cores or threads breaks the uniqueness guarantee.
#[derive(Debug)]
pub struct SingleThread;

impl SingleThread {
    /// The id reported for the one and only callstack.
    pub const ID: ThreadId = ThreadId::from_raw(NonZeroU64::MIN);
}

impl ThreadAbstraction for SingleThread {
    fn current_thread_id() -> ThreadId {
        Self::ID
    }
}

#[cfg(feature = "test-suites")]
#[cfg_attr(coverage_nightly, coverage(off))]
pub mod test_suite {
    #![expect(missing_docs, reason = "tests")]
    //! Test suite for thread identity sources.

    use std::collections::HashSet;
    use std::sync::Barrier;
    use std::vec::Vec;

    use crate::thread::ThreadAbstraction;

    pub fn test_stable_within_thread<T: ThreadAbstraction>(calls: usize) {
        let first = T::current_thread_id();
        for _ in 1..calls {
            assert_eq!(
                T::current_thread_id(),
                first,
                "Thread id should be consistent within the same thread"
            );
        }
        assert_eq!(T::try_current_thread_id(), Ok(first));
    }

    pub fn test_unique_across_threads<T: ThreadAbstraction>(threads: usize) {
        let main_id = T::current_thread_id();
        // Every thread waits here until all of them have recorded their id, so all are alive at the same time.
        let barrier = Barrier::new(threads);

        let ids: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    scope.spawn(|| {
                        // Arrive even if the query panics, otherwise the remaining threads never get released.
                        let id = std::panic::catch_unwind(T::current_thread_id);
                        barrier.wait();
                        id.unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        let distinct: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(
            distinct.len(),
            threads,
            "Concurrently live threads should have pairwise distinct ids: {ids:?}"
        );
        assert!(
            !distinct.contains(&main_id),
            "Spawned threads should not share the calling thread's id"
        );
    }

    pub fn test_no_side_effects<T: ThreadAbstraction>() {
        let before = T::current_thread_id();

        let other = std::thread::scope(|scope| {
            scope
                .spawn(|| (T::current_thread_id(), T::current_thread_id()))
                .join()
                .unwrap()
        });

        assert_eq!(other.0, other.1);
        assert_eq!(
            T::current_thread_id(),
            before,
            "Calling from another thread should not change this thread's id"
        );
    }
}

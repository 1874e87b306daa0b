//! Records thread ids from many concurrently live threads and checks them.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Barrier;

use threadid_api::ThreadId;
use threadid_api::thread::ThreadAbstraction;

/// The id one probe thread observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Sample {
    /// Spawn order of the thread, starting at 0.
    pub thread: usize,
    /// The id the thread observed on every call.
    pub id: ThreadId,
}

/// A violation found while probing a thread identity source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The source could not produce an id.
    #[error("the thread identity source failed")]
    Source(#[from] threadid_api::Error),

    /// A thread saw its id change between calls.
    #[error("thread {thread} observed id {first} and later {later}")]
    Unstable {
        /// Spawn order of the thread.
        thread: usize,
        /// The id returned by the first call.
        first: ThreadId,
        /// The first differing id returned by a later call.
        later: ThreadId,
    },

    /// Two concurrently live threads were handed the same id.
    #[error("threads {first} and {second} were both assigned id {id}")]
    Duplicate {
        /// The shared id.
        id: ThreadId,
        /// Spawn order of the first thread holding the id.
        first: usize,
        /// Spawn order of the second thread holding the id.
        second: usize,
    },
}

/// Spawns `threads` threads that each query `T` `calls` times, keeping all of them alive until every thread has
/// finished querying.
///
/// Returns one [`Sample`] per thread in spawn order, after checking that every thread saw a stable id and that no
/// two threads share one.
#[tracing::instrument(skip_all, fields(threads = threads.get(), calls = calls.get()))]
pub fn probe<T: ThreadAbstraction>(
    threads: NonZeroUsize,
    calls: NonZeroUsize,
) -> Result<Vec<Sample>, ProbeError> {
    let barrier = Barrier::new(threads.get());

    let results: Vec<Result<Sample, ProbeError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads.get())
            .map(|thread| {
                let barrier = &barrier;
                scope.spawn(move || {
                    // Arrive even if the source panics, otherwise the remaining threads never get released.
                    let sample = std::panic::catch_unwind(|| sample::<T>(thread, calls));
                    barrier.wait();
                    sample.unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let samples = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    check_unique(&samples)?;

    tracing::debug!(threads = samples.len(), "all thread ids distinct");
    Ok(samples)
}

fn sample<T: ThreadAbstraction>(thread: usize, calls: NonZeroUsize) -> Result<Sample, ProbeError> {
    let first = T::try_current_thread_id()?;
    for _ in 1..calls.get() {
        let later = T::try_current_thread_id()?;
        if later != first {
            return Err(ProbeError::Unstable {
                thread,
                first,
                later,
            });
        }
    }
    tracing::trace!(thread, id = %first, "sampled");
    Ok(Sample { thread, id: first })
}

/// Checks that no two samples share an id.
pub fn check_unique(samples: &[Sample]) -> Result<(), ProbeError> {
    let mut seen = HashMap::with_capacity(samples.len());
    for sample in samples {
        if let Some(first) = seen.insert(sample.id, sample.thread) {
            return Err(ProbeError::Duplicate {
                id: sample.id,
                first,
                second: sample.thread,
            });
        }
    }
    Ok(())
}

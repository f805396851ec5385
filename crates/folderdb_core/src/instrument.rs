//! Iteration timing and completeness instrumentation.
//!
//! [`Timed`] wraps any iterator and measures every `next()` call.
//! [`drain`] runs a fallible sequence to its end through a [`Timed`]
//! stage and produces an [`IterationSummary`].
//!
//! ```rust
//! use folderdb_core::drain;
//! use folderdb_store::StoreResult;
//!
//! let items: Vec<StoreResult<u32>> = vec![Ok(1), Ok(2), Ok(3)];
//! let summary = drain("numbers", items.into_iter(), 6).unwrap();
//! assert_eq!(summary.matched, 3);
//! assert_eq!(summary.percentage, 50.0);
//! ```

use crate::error::{CoreError, CoreResult};
use folderdb_store::StoreResult;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Accumulated `next()` latency of a [`Timed`] iterator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Calls that produced an item.
    pub items: usize,
    /// Time spent in calls that produced an item.
    pub item_time: Duration,
    /// Time spent in the final call that reported the end.
    pub end_time: Duration,
}

impl StepStats {
    /// Average latency of a call that produced an item.
    #[must_use]
    pub fn average_per_item(&self) -> Option<Duration> {
        let items = u32::try_from(self.items).ok()?;
        if items == 0 {
            return None;
        }
        Some(self.item_time / items)
    }
}

/// Iterator stage that times each call to the wrapped iterator.
#[derive(Debug)]
pub struct Timed<I> {
    inner: I,
    stats: StepStats,
}

impl<I> Timed<I> {
    /// Wraps `inner`.
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            stats: StepStats::default(),
        }
    }

    /// Returns the latency recorded so far.
    #[must_use]
    pub fn stats(&self) -> StepStats {
        self.stats
    }
}

impl<I: Iterator> Iterator for Timed<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let start = Instant::now();
        let item = self.inner.next();
        let spent = start.elapsed();
        if item.is_some() {
            self.stats.items += 1;
            self.stats.item_time += spent;
        } else {
            self.stats.end_time += spent;
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Adds [`timed`](TimedExt::timed) to every iterator.
pub trait TimedExt: Iterator + Sized {
    /// Wraps the iterator in a [`Timed`] stage.
    fn timed(self) -> Timed<Self> {
        Timed::new(self)
    }
}

impl<I: Iterator> TimedExt for I {}

/// Result of draining one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationSummary {
    /// Name of the run.
    pub name: String,
    /// Items yielded before the end of the sequence.
    pub matched: usize,
    /// Reference total the match count is compared to.
    pub reference_total: usize,
    /// `matched / reference_total` in percent; 0 when the reference is 0.
    pub percentage: f64,
    /// Wall-clock time of the whole drain.
    pub elapsed: Duration,
    /// Average latency of a `next()` call that produced an item.
    pub avg_per_item: Option<Duration>,
}

impl fmt::Display for IterationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} ({:.2}%) in {:?}",
            self.name, self.matched, self.reference_total, self.percentage, self.elapsed
        )?;
        if let Some(avg) = self.avg_per_item {
            write!(f, ", {avg:?}/item")?;
        }
        Ok(())
    }
}

/// Returns `part / whole` in percent, or 0 for an empty whole.
#[must_use]
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Drains `iter` to its end, counting items and timing the run.
///
/// The end of the sequence is success. The first `Err` item stops the
/// drain and is returned as [`CoreError::Iteration`] (or
/// [`CoreError::Timeout`] for a deadline).
///
/// # Errors
///
/// Returns the wrapped sequence error, if any.
pub fn drain<I, T>(name: &str, iter: I, reference_total: usize) -> CoreResult<IterationSummary>
where
    I: Iterator<Item = StoreResult<T>>,
{
    let started = Instant::now();
    let mut timed = iter.timed();
    let mut matched = 0usize;

    for item in &mut timed {
        if let Err(err) = item {
            return Err(CoreError::iteration(name, err));
        }
        matched += 1;
    }

    let summary = IterationSummary {
        name: name.to_string(),
        matched,
        reference_total,
        percentage: percentage(matched, reference_total),
        elapsed: started.elapsed(),
        avg_per_item: timed.stats().average_per_item(),
    };
    debug!(%summary, "drained sequence");
    Ok(summary)
}

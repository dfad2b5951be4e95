//! Bounded polling
//!
//! The IT8951 exposes two independent readiness signals: the HRDY (busy) pin,
//! which gates every bus frame, and the LUT engine status register, which
//! stays non-zero while a refresh is still being driven onto the glass.
//! Both are waited on through [`poll_until`], which gives up after a timeout
//! instead of failing: the link has no error channel, so callers log the
//! [`PollOutcome::TimedOut`] and carry on.

/// Result of a bounded poll
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The condition held before the deadline
    Ready,
    /// The deadline elapsed first
    TimedOut {
        /// Time spent pausing between checks, in milliseconds
        waited_ms: u32,
    },
}

impl PollOutcome {
    /// `true` if the polled condition was observed
    pub fn is_ready(self) -> bool {
        matches!(self, PollOutcome::Ready)
    }
}

/// Something that can sleep between two polls
///
/// Implemented by [`Interface`](crate::interface::Interface) on top of its
/// `DelayNs`. Elapsed time is accounted from the requested pauses, since
/// embedded-hal offers no monotonic clock.
pub trait Pause {
    /// Block for roughly `us` microseconds
    fn pause_us(&mut self, us: u32);
}

/// Check `ready` until it returns `true` or `timeout_ms` worth of pauses has
/// been spent, pausing `interval_us` between checks.
///
/// The condition is always checked at least once, so a zero timeout is a
/// single non-blocking probe. Errors raised by `ready` abort the poll.
pub fn poll_until<C, E, F>(
    ctx: &mut C,
    timeout_ms: u32,
    interval_us: u32,
    mut ready: F,
) -> Result<PollOutcome, E>
where
    C: Pause + ?Sized,
    F: FnMut(&mut C) -> Result<bool, E>,
{
    let budget_us = u64::from(timeout_ms) * 1_000;
    let interval_us = interval_us.max(1);
    let mut waited_us: u64 = 0;

    loop {
        if ready(ctx)? {
            return Ok(PollOutcome::Ready);
        }
        if waited_us >= budget_us {
            let waited_ms = u32::try_from(waited_us / 1_000).unwrap_or(u32::MAX);
            return Ok(PollOutcome::TimedOut { waited_ms });
        }
        ctx.pause_us(interval_us);
        waited_us += u64::from(interval_us);
    }
}

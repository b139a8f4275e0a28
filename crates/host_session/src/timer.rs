//! Recurring timers over the tick stream with disposable subscriptions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

/// Ticks per second of the host engine.
pub const TICKS_PER_SECOND: u64 = 60;

/// Handle to a timer subscription. Dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    name: &'static str,
    live: Arc<AtomicBool>,
}

impl Subscription {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.live.swap(false, Ordering::AcqRel) {
            trace!("Unsubscribed {}", self.name);
        }
    }
}

/// Fires every `every` ticks, but only while someone is subscribed.
#[derive(Debug)]
pub struct RecurringTimer {
    every: u64,
    subscribers: Vec<(&'static str, Arc<AtomicBool>)>,
}

impl RecurringTimer {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            subscribers: Vec::new(),
        }
    }

    pub fn every_tick() -> Self {
        Self::new(1)
    }

    pub fn every_second() -> Self {
        Self::new(TICKS_PER_SECOND)
    }

    pub fn subscribe(&mut self, name: &'static str) -> Subscription {
        let live = Arc::new(AtomicBool::new(true));
        self.subscribers.push((name, live.clone()));
        trace!("Subscribed {name}");
        Subscription { name, live }
    }

    /// Drops dead entries and reports whether anyone is still listening.
    pub fn has_subscribers(&mut self) -> bool {
        self.subscribers
            .retain(|(_, live)| live.load(Ordering::Acquire));
        !self.subscribers.is_empty()
    }

    /// Whether the timer fires on `tick`.
    pub fn fires_at(&mut self, tick: u64) -> bool {
        tick % self.every == 0 && self.has_subscribers()
    }
}

/// The "retry until done, then stop" shape: runs `attempt` while `slot` holds
/// a subscription and releases it once `attempt` reports completion.
///
/// Returns `true` if the poll is finished (or was not running).
pub fn poll_until<F>(slot: &mut Option<Subscription>, attempt: F) -> bool
where
    F: FnOnce() -> bool,
{
    if slot.is_none() {
        return true;
    }
    if attempt() {
        slot.take();
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_only_fires_with_subscribers() {
        let mut timer = RecurringTimer::every_second();
        assert!(!timer.fires_at(60));

        let sub = timer.subscribe("poll");
        assert!(!timer.fires_at(59));
        assert!(timer.fires_at(60));
        assert!(timer.fires_at(120));

        drop(sub);
        assert!(!timer.fires_at(180));
        assert!(!timer.has_subscribers());
    }

    #[test]
    fn each_subscription_is_independent() {
        let mut timer = RecurringTimer::every_tick();
        let a = timer.subscribe("a");
        let b = timer.subscribe("b");

        assert_eq!(b.name(), "b");
        a.cancel();
        assert!(timer.has_subscribers());
        assert!(timer.fires_at(7));

        drop(b);
        assert!(!timer.fires_at(8));
    }

    #[test]
    fn poll_until_releases_on_completion() {
        let mut timer = RecurringTimer::every_tick();
        let mut slot = Some(timer.subscribe("retry"));

        assert!(!poll_until(&mut slot, || false));
        assert!(slot.is_some());
        assert!(poll_until(&mut slot, || true));
        assert!(slot.is_none());
        assert!(!timer.has_subscribers());

        let mut ran = false;
        assert!(poll_until(&mut slot, || {
            ran = true;
            true
        }));
        assert!(!ran);
    }
}

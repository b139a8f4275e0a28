//! Turns the raw tick stream and engine events into session signals.
//!
//! The engine has no "session started" or "world is interactive" event, only
//! a ~60 Hz tick and a few discrete notifications. The clock latches those
//! transitions and stops doing per-tick work as soon as nothing is pending.

use tracing::trace;

use crate::gate::Participant;
use crate::host::{EngineEvent, PeerId, Roster, TickFacts};
use crate::timer::{RecurringTimer, Subscription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    /// A save was loaded; the only session boundary.
    SessionStarted,
    /// First tick after `SessionStarted`.
    FirstTick,
    /// First tick (or local warp) after `SessionStarted` where the local
    /// player can act.
    WorldInteractive,
    ParticipantJoined(PeerId),
    ParticipantLeft(PeerId),
    /// Low-frequency poll, only while someone subscribed to it.
    SecondElapsed,
}

#[derive(Debug)]
pub struct SessionClock {
    tick: u64,
    sessions: u64,
    every_tick: RecurringTimer,
    every_second: RecurringTimer,
    first_tick: Option<Subscription>,
    interactive_watch: Option<Subscription>,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            tick: 0,
            sessions: 0,
            every_tick: RecurringTimer::every_tick(),
            every_second: RecurringTimer::every_second(),
            first_tick: None,
            interactive_watch: None,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of sessions started so far.
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    pub fn on_event(&mut self, event: &EngineEvent) -> Vec<SessionSignal> {
        match event {
            EngineEvent::SaveLoaded => {
                self.sessions += 1;
                self.first_tick = Some(self.every_tick.subscribe("first-tick"));
                self.interactive_watch = Some(self.every_tick.subscribe("world-interactive"));
                vec![SessionSignal::SessionStarted]
            }
            EngineEvent::PeerConnected(peer) => vec![SessionSignal::ParticipantJoined(*peer)],
            EngineEvent::PeerDisconnected(peer) => vec![SessionSignal::ParticipantLeft(*peer)],
            EngineEvent::LocalPlayerWarped => match self.interactive_watch.take() {
                Some(_) => vec![SessionSignal::WorldInteractive],
                None => Vec::new(),
            },
            EngineEvent::ButtonPressed(_) => Vec::new(),
        }
    }

    pub fn on_tick(&mut self, facts: &TickFacts) -> Vec<SessionSignal> {
        self.tick += 1;
        let mut signals = Vec::new();

        if self.every_tick.fires_at(self.tick) {
            if self.first_tick.take().is_some() {
                signals.push(SessionSignal::FirstTick);
            }
            if self.interactive_watch.is_some() && facts.world_ready && facts.player_free {
                self.interactive_watch = None;
                trace!("World interactive at tick {}", self.tick);
                signals.push(SessionSignal::WorldInteractive);
            }
        }

        if self.every_second.fires_at(self.tick) {
            signals.push(SessionSignal::SecondElapsed);
        }

        signals
    }

    /// Subscribes to [`SessionSignal::SecondElapsed`].
    pub fn subscribe_seconds(&mut self, name: &'static str) -> Subscription {
        self.every_second.subscribe(name)
    }

    /// Whether the clock still inspects every tick.
    pub fn is_watching_ticks(&mut self) -> bool {
        self.every_tick.has_subscribers()
    }

    pub fn is_polling_seconds(&mut self) -> bool {
        self.every_second.has_subscribers()
    }

    /// Connected participants, resolved lazily. Call again to restart.
    pub fn participants<'a>(&self, roster: &'a dyn Roster) -> ParticipantList<'a> {
        ParticipantList {
            roster,
            peers: roster.connected_peers().into_iter(),
        }
    }
}

pub struct ParticipantList<'a> {
    roster: &'a dyn Roster,
    peers: std::vec::IntoIter<PeerId>,
}

impl Iterator for ParticipantList<'_> {
    type Item = Participant;

    fn next(&mut self) -> Option<Participant> {
        self.peers
            .next()
            .map(|peer| Participant::resolve(peer, self.roster))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.peers.size_hint()
    }
}

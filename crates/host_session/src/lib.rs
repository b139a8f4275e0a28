//! Session lifecycle extensions for a multiplayer host.
//!
//! The crate sits between a host engine's tick loop and its console:
//! - [`SessionClock`] reconstructs "session started", "first tick" and
//!   "world interactive" from raw ticks and sparse events
//! - [`AccessGate`] admits or evicts remote peers against the hot-reloaded
//!   allow-list
//! - [`OneShotRunner`] runs host setup (configure, pause, invite-code capture)
//!   at most once per session
//! - [`Orchestrator`] wires them together and owns the per-session state
//!
//! Everything runs on the engine's tick thread except the allow-list reload,
//! which swaps snapshots from its own worker.

#[cfg(feature = "bevy")]
mod bevy_adapter;

pub mod clock;
pub mod config;
pub mod effects;
pub mod error;
pub mod gate;
pub mod host;
pub mod logging;
pub mod oneshot;
pub mod orchestrator;
pub mod timer;

#[cfg(feature = "bevy")]
pub use bevy_adapter::*;

pub use allowlist::{AllowList, AllowListEntries, AllowListStore};
pub use clock::{ParticipantList, SessionClock, SessionSignal};
pub use config::{HostConfig, LogLevel, MoveBuildingPermission, PauseMethod, SleepAnnounceMode};
pub use error::{ConfigError, EffectError, HostError};
pub use gate::{AccessGate, Participant, Verdict, evaluate};
pub use host::{
    Clipboard, CommandSink, EngineEvent, HostServices, InviteCodeSource, Notifier, PauseControl,
    PeerId, Roster, TickFacts,
};
pub use logging::{LogGuard, init_logging};
pub use oneshot::{Effect, EffectState, OneShotRunner, RunOutcome, SessionFlags};
pub use orchestrator::{HostingSessionState, Orchestrator, Phase};
pub use timer::{RecurringTimer, Subscription, TICKS_PER_SECOND, poll_until};

//! The host engine as seen from this crate.
//!
//! The engine itself is out of reach: it is sampled once per tick into
//! [`TickFacts`], reports discrete [`EngineEvent`]s, and exposes a handful of
//! capabilities behind the traits below. Every capability may fail; callers
//! log and carry on.

use std::fmt;
use std::sync::Arc;

use crate::error::HostError;

/// Connection-layer identifier of a remote participant. Signed: the engine's
/// player ids may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub i64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine state sampled at the start of every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickFacts {
    /// A save is loaded and the world exists.
    pub world_ready: bool,
    /// This process is the main (authoritative) player.
    pub authoritative_host: bool,
    /// More than one player can be in the session.
    pub multiplayer_active: bool,
    /// The local player can act (no menu, cutscene or transition).
    pub player_free: bool,
    pub paused: bool,
    /// In-game time is currently advancing.
    pub time_passing: bool,
    /// A hosting server object exists for this session.
    pub hosting_server: bool,
}

/// Discrete engine notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SaveLoaded,
    PeerConnected(PeerId),
    PeerDisconnected(PeerId),
    LocalPlayerWarped,
    ButtonPressed(String),
}

/// Opaque console of the host engine.
pub trait CommandSink: Send + Sync {
    fn execute(&self, command_line: &str) -> Result<(), HostError>;
}

/// Online roster lookups. Resolution is best effort: a freshly connected
/// peer may not be known yet.
pub trait Roster: Send + Sync {
    fn resolve_display_name(&self, peer: PeerId) -> Option<String>;
    fn resolve_unique_id(&self, peer: PeerId) -> Option<String>;
    fn connected_peers(&self) -> Vec<PeerId>;
}

pub trait PauseControl: Send + Sync {
    fn pause_direct(&self) -> Result<(), HostError>;
    fn resume(&self) -> Result<(), HostError>;
    /// Submits the synchronized pause vote. `HostError::Unavailable` when the
    /// chat box does not exist yet.
    fn request_pause_vote(&self) -> Result<(), HostError>;
}

pub trait InviteCodeSource: Send + Sync {
    fn try_get_invite_code(&self) -> Option<String>;
}

pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), HostError>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> Result<(), HostError>;
}

/// Capabilities handed to the orchestrator at construction.
#[derive(Clone)]
pub struct HostServices {
    pub commands: Arc<dyn CommandSink>,
    pub roster: Arc<dyn Roster>,
    pub pause: Arc<dyn PauseControl>,
    pub invite_codes: Option<Arc<dyn InviteCodeSource>>,
    pub clipboard: Option<Arc<dyn Clipboard>>,
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl HostServices {
    /// Shows `message` if a notifier exists. Failures are logged only.
    pub(crate) fn notify(&self, message: &str) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify(message) {
                tracing::debug!("Notification failed: {e}");
            }
        }
    }
}

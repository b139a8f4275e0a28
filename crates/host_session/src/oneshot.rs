//! Effects that must run at most once per hosting session.
//!
//! Each effect is `Pending` until its action succeeds once, then `Completed`
//! until the next session start. A failing action leaves the effect
//! `Pending` so the next eligible tick tries again.

use tracing::{debug, error, info};

use crate::error::EffectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    AutoConfigure,
    AutoPause,
    InviteCodeCapture,
}

impl Effect {
    pub const ALL: [Effect; 3] = [
        Effect::AutoConfigure,
        Effect::AutoPause,
        Effect::InviteCodeCapture,
    ];

    fn index(self) -> usize {
        match self {
            Effect::AutoConfigure => 0,
            Effect::AutoPause => 1,
            Effect::InviteCodeCapture => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Effect::AutoConfigure => "auto-configure",
            Effect::AutoPause => "auto-pause",
            Effect::InviteCodeCapture => "invite-code capture",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectState {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Ran,
    Skipped,
    Failed,
}

/// Read-only view of the per-session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionFlags {
    pub has_auto_configured: bool,
    pub has_auto_paused: bool,
    pub has_invite_code_captured: bool,
}

#[derive(Debug, Default)]
pub struct OneShotRunner {
    states: [EffectState; 3],
}

impl OneShotRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session boundary: every effect goes back to `Pending`.
    pub fn reset(&mut self) {
        self.states = [EffectState::Pending; 3];
    }

    pub fn state(&self, effect: Effect) -> EffectState {
        self.states[effect.index()]
    }

    pub fn is_completed(&self, effect: Effect) -> bool {
        self.state(effect) == EffectState::Completed
    }

    pub fn flags(&self) -> SessionFlags {
        SessionFlags {
            has_auto_configured: self.is_completed(Effect::AutoConfigure),
            has_auto_paused: self.is_completed(Effect::AutoPause),
            has_invite_code_captured: self.is_completed(Effect::InviteCodeCapture),
        }
    }

    /// Runs `action` if `effect` is still pending and `condition` holds.
    pub fn try_run<C, A>(&mut self, effect: Effect, condition: C, action: A) -> RunOutcome
    where
        C: FnOnce() -> bool,
        A: FnOnce() -> Result<(), EffectError>,
    {
        if self.is_completed(effect) || !condition() {
            return RunOutcome::Skipped;
        }

        match action() {
            Ok(()) => {
                self.states[effect.index()] = EffectState::Completed;
                info!("{} completed", effect.name());
                RunOutcome::Ran
            }
            Err(e) if e.is_transient() => {
                debug!("{} not done yet: {e}", effect.name());
                RunOutcome::Failed
            }
            Err(e) => {
                error!("{} failed: {e}", effect.name());
                RunOutcome::Failed
            }
        }
    }
}

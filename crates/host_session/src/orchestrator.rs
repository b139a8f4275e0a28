//! Wires session signals to the gate and the one-shot effects.
//!
//! One orchestrator lives for the whole host process. It starts `Idle`,
//! becomes `Active` on the first loaded save and re-enters `Active` on every
//! later load; the load is the only point where per-session state resets.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use allowlist::{AllowListError, AllowListStore, AllowListWatcher};
use tracing::{debug, error, info, warn};

use crate::clock::{SessionClock, SessionSignal};
use crate::config::HostConfig;
use crate::effects;
use crate::gate::{AccessGate, Participant};
use crate::host::{EngineEvent, HostServices, PeerId, TickFacts};
use crate::logging::routine;
use crate::oneshot::{Effect, OneShotRunner, RunOutcome, SessionFlags};
use crate::timer::{Subscription, poll_until};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No save loaded yet.
    Idle,
    Active,
}

/// "Is this process the authoritative host of a live multiplayer session?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostingSessionState {
    pub authoritative_host: bool,
    pub multiplayer_active: bool,
    pub world_interactive: bool,
}

impl HostingSessionState {
    pub fn derive(facts: &TickFacts, world_interactive: bool) -> Self {
        Self {
            authoritative_host: facts.authoritative_host,
            multiplayer_active: facts.multiplayer_active,
            world_interactive,
        }
    }

    pub fn is_active_host(&self) -> bool {
        self.authoritative_host && self.multiplayer_active && self.world_interactive
    }
}

pub struct Orchestrator {
    config: Arc<HostConfig>,
    services: HostServices,
    clock: SessionClock,
    gate: AccessGate,
    runner: OneShotRunner,
    phase: Phase,
    world_interactive: bool,
    facts: TickFacts,
    configure_poll: Option<Subscription>,
    pause_poll: Option<Subscription>,
    invite_poll: Option<Subscription>,
    watcher: Option<AllowListWatcher>,
}

impl Orchestrator {
    /// Builds an orchestrator around an existing store. The store is used as
    /// is; call [`AllowListStore::load`] beforehand if needed.
    pub fn new(
        config: Arc<HostConfig>,
        services: HostServices,
        store: Arc<AllowListStore>,
    ) -> Self {
        let gate = AccessGate::new(store, services.clone());
        let orchestrator = Self {
            config,
            services,
            clock: SessionClock::new(),
            gate,
            runner: OneShotRunner::new(),
            phase: Phase::Idle,
            world_interactive: false,
            facts: TickFacts::default(),
            configure_poll: None,
            pause_poll: None,
            invite_poll: None,
            watcher: None,
        };

        if orchestrator.config.mod_enabled {
            routine(
                orchestrator.config.log_level,
                &format!(
                    "Host session ready (gate: {}, pause: {}, configure: {}, invite: {})",
                    orchestrator.is_enabled_gate(),
                    orchestrator.is_enabled(Effect::AutoPause),
                    orchestrator.is_enabled(Effect::AutoConfigure),
                    orchestrator.is_enabled(Effect::InviteCodeCapture),
                ),
            );
        } else {
            info!("Host session extensions disabled");
        }
        orchestrator
    }

    /// Builds an orchestrator whose allow-list lives at
    /// `<data_dir>/<allow_list_file>`, loading and watching it when the gate
    /// is enabled.
    pub fn start(config: Arc<HostConfig>, services: HostServices, data_dir: &Path) -> Self {
        let store = Arc::new(AllowListStore::open(
            data_dir.join(&config.allow_list_file),
        ));
        let mut orchestrator = Self::new(config, services, store);
        if orchestrator.is_enabled_gate() {
            orchestrator.activate_allow_list();
        }
        orchestrator
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn flags(&self) -> SessionFlags {
        self.runner.flags()
    }

    pub fn config(&self) -> &Arc<HostConfig> {
        &self.config
    }

    pub fn hosting_state(&self) -> HostingSessionState {
        HostingSessionState::derive(&self.facts, self.world_interactive)
    }

    pub fn is_polling(&self, effect: Effect) -> bool {
        match effect {
            Effect::AutoConfigure => self.configure_poll.is_some(),
            Effect::AutoPause => self.pause_poll.is_some(),
            Effect::InviteCodeCapture => self.invite_poll.is_some(),
        }
    }

    pub fn is_watching_allow_list(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn allow_list(&self) -> &Arc<AllowListStore> {
        self.gate.store()
    }

    // ==========================================================================
    // Engine entry points
    // ==========================================================================

    pub fn on_event(&mut self, event: &EngineEvent, facts: &TickFacts) {
        self.facts = *facts;
        if !self.config.mod_enabled {
            return;
        }
        if let EngineEvent::ButtonPressed(key) = event {
            self.on_button(key);
            return;
        }
        for signal in self.clock.on_event(event) {
            self.dispatch(signal);
        }
    }

    pub fn on_tick(&mut self, facts: &TickFacts) {
        self.facts = *facts;
        if !self.config.mod_enabled {
            return;
        }
        for signal in self.clock.on_tick(facts) {
            self.dispatch(signal);
        }
    }

    /// Installs a new configuration snapshot and reacts to toggles that
    /// changed.
    pub fn apply_config(&mut self, config: Arc<HostConfig>) {
        if *config == *self.config {
            return;
        }
        let was_gate = self.is_enabled_gate();
        let was_enabled = Effect::ALL.map(|effect| self.is_enabled(effect));
        let moved = config.allow_list_file != self.config.allow_list_file;
        let resettled = config.reload_settle_ms != self.config.reload_settle_ms;
        self.config = config;

        if moved {
            self.watcher = None;
            let dir = self
                .gate
                .store()
                .file_path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let store = Arc::new(AllowListStore::open(dir.join(&self.config.allow_list_file)));
            info!("Allow-list moved to {}", store.file_path().display());
            self.gate.set_store(store);
        }

        match (was_gate, self.is_enabled_gate()) {
            (false, true) => {
                self.activate_allow_list();
                info!("Allow-list gate enabled");
            }
            (true, false) => {
                self.watcher = None;
                info!("Allow-list gate disabled");
            }
            (true, true) if moved => self.activate_allow_list(),
            (true, true) if resettled && self.watcher.is_some() => {
                if let Err(e) = self.watch_allow_list() {
                    warn!("Allow-list hot reload unavailable: {e}");
                }
            }
            _ => {}
        }

        for (effect, was) in Effect::ALL.into_iter().zip(was_enabled) {
            let now = self.is_enabled(effect);
            if was && !now {
                *self.poll_slot(effect) = None;
                info!("{} disabled", effect.name());
            } else if !was && now {
                info!("{} enabled", effect.name());
                if self.phase == Phase::Active {
                    self.subscribe_poll(effect);
                }
            }
        }
    }

    /// Releases every subscription and the file watch.
    pub fn shutdown(&mut self) {
        for effect in Effect::ALL {
            *self.poll_slot(effect) = None;
        }
        self.watcher = None;
        self.phase = Phase::Idle;
        debug!("Host session extensions shut down");
    }

    // ==========================================================================
    // Signal handling
    // ==========================================================================

    fn dispatch(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::SessionStarted => self.begin_session(),
            SessionSignal::FirstTick => self.rescan("first tick after load"),
            SessionSignal::WorldInteractive => {
                self.world_interactive = true;
                debug!("World is interactive");
                self.rescan("world interactive");
                self.attempt(Effect::AutoPause);
                self.attempt(Effect::AutoConfigure);
                self.settle_polls();
            }
            SessionSignal::ParticipantJoined(peer) => self.on_join(peer),
            SessionSignal::ParticipantLeft(peer) => self.gate.forget(peer),
            SessionSignal::SecondElapsed => {
                for effect in Effect::ALL {
                    if self.is_polling(effect) {
                        self.attempt(effect);
                    }
                }
                self.settle_polls();
            }
        }
    }

    fn begin_session(&mut self) {
        self.phase = Phase::Active;
        self.world_interactive = false;
        self.runner.reset();
        self.gate.reset();

        routine(
            self.config.log_level,
            &format!(
                "Save loaded (host: {}, multiplayer: {})",
                self.facts.authoritative_host, self.facts.multiplayer_active
            ),
        );

        for effect in Effect::ALL {
            *self.poll_slot(effect) = None;
            if self.is_enabled(effect) {
                self.subscribe_poll(effect);
            }
        }
    }

    fn on_join(&mut self, peer: PeerId) {
        if !self.is_enabled_gate() || !self.facts.authoritative_host {
            return;
        }
        let participant = Participant::resolve(peer, self.services.roster.as_ref());
        if self.config.show_player_join_info {
            info!(
                "Player joined: {} (unique id: {}, peer id: {})",
                participant.display_name.as_deref().unwrap_or("Unknown"),
                participant.unique_id.as_deref().unwrap_or("Unknown"),
                participant.peer_id
            );
        }
        self.gate.check(&participant);
    }

    fn rescan(&mut self, reason: &str) {
        if !self.is_enabled_gate() || !self.facts.authoritative_host {
            return;
        }
        let participants = self.clock.participants(self.services.roster.as_ref());
        let rejected = self.gate.rescan(participants);
        debug!("Re-checked connected players ({reason}): {rejected} rejected");
    }

    fn on_button(&mut self, key: &str) {
        if !self.config.enable_manual_toggle
            || !key.eq_ignore_ascii_case(&self.config.pause_toggle_key)
        {
            return;
        }
        let facts = self.facts;
        if !(facts.world_ready && facts.authoritative_host && facts.multiplayer_active) {
            return;
        }

        if facts.paused {
            match self.services.pause.resume() {
                Ok(()) => {
                    self.services.notify("Game resumed");
                    info!("Game resumed (manual)");
                }
                Err(e) => error!("Failed to resume: {e}"),
            }
        } else {
            match self.services.pause.pause_direct() {
                Ok(()) => {
                    self.services.notify("Game paused");
                    info!("Game paused (manual)");
                }
                Err(e) => error!("Failed to pause: {e}"),
            }
        }
    }

    // ==========================================================================
    // One-shot effects
    // ==========================================================================

    fn attempt(&mut self, effect: Effect) -> RunOutcome {
        let enabled = self.is_enabled(effect);
        let state = self.hosting_state();
        let facts = self.facts;
        let config = &self.config;
        let services = &self.services;

        match effect {
            Effect::AutoConfigure => self.runner.try_run(
                effect,
                || enabled && state.is_active_host(),
                || effects::auto_configure(config, services),
            ),
            Effect::AutoPause => self.runner.try_run(
                effect,
                || enabled && state.is_active_host(),
                || effects::auto_pause(config, services, &facts),
            ),
            Effect::InviteCodeCapture => self.runner.try_run(
                effect,
                || enabled && facts.world_ready && facts.authoritative_host && facts.hosting_server,
                || effects::capture_invite_code(config, services),
            ),
        }
    }

    /// Drops the poll of every effect that has completed.
    fn settle_polls(&mut self) {
        for effect in Effect::ALL {
            let done = self.runner.is_completed(effect);
            if poll_until(self.poll_slot(effect), || done) && done {
                debug!("Stopped polling {}", effect.name());
            }
        }
    }

    fn subscribe_poll(&mut self, effect: Effect) {
        if !self.facts.authoritative_host || self.runner.is_completed(effect) {
            return;
        }
        let subscription = self.clock.subscribe_seconds(effect.name());
        *self.poll_slot(effect) = Some(subscription);
    }

    fn poll_slot(&mut self, effect: Effect) -> &mut Option<Subscription> {
        match effect {
            Effect::AutoConfigure => &mut self.configure_poll,
            Effect::AutoPause => &mut self.pause_poll,
            Effect::InviteCodeCapture => &mut self.invite_poll,
        }
    }

    fn is_enabled(&self, effect: Effect) -> bool {
        let config = &self.config;
        config.mod_enabled
            && match effect {
                Effect::AutoConfigure => config.auto_configure_enabled,
                Effect::AutoPause => config.auto_pause_enabled,
                Effect::InviteCodeCapture => {
                    config.invite_code_enabled && self.services.invite_codes.is_some()
                }
            }
    }

    fn is_enabled_gate(&self) -> bool {
        self.config.mod_enabled && self.config.whitelist_enabled
    }

    // ==========================================================================
    // Allow-list
    // ==========================================================================

    fn activate_allow_list(&mut self) {
        let list = self.gate.store().load();
        debug!("Allow-list ready ({} entries)", list.total_count());
        if let Err(e) = self.watch_allow_list() {
            warn!("Allow-list hot reload unavailable: {e}");
        }
    }

    /// Starts hot reload of the allow-list file. Replaces a running watch.
    pub fn watch_allow_list(&mut self) -> Result<(), AllowListError> {
        self.watcher = None;
        let store = self.gate.store().clone();
        let level = self.config.log_level;
        let settle = Duration::from_millis(self.config.reload_settle_ms);
        let watcher = store.watch(settle, move |list| {
            routine(
                level,
                &format!("Allow-list reloaded ({} entries)", list.total_count()),
            );
        })?;
        self.watcher = Some(watcher);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_host_needs_all_three_facts() {
        let facts = TickFacts {
            authoritative_host: true,
            multiplayer_active: true,
            ..TickFacts::default()
        };
        assert!(!HostingSessionState::derive(&facts, false).is_active_host());
        assert!(HostingSessionState::derive(&facts, true).is_active_host());

        let solo = TickFacts {
            authoritative_host: true,
            ..TickFacts::default()
        };
        assert!(!HostingSessionState::derive(&solo, true).is_active_host());
    }
}

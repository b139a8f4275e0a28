//! Recording fakes for the host engine's capabilities.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use host_session::{
    AllowListStore, Clipboard, CommandSink, HostConfig, HostError, HostServices,
    InviteCodeSource, Notifier, Orchestrator, PauseControl, PeerId, Roster, TickFacts,
};
use tempfile::TempDir;

#[derive(Default)]
pub struct RecordingSink {
    pub commands: Mutex<Vec<String>>,
    pub failures_left: AtomicUsize,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn kicks(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|c| c.starts_with("kick "))
            .collect()
    }

    pub fn config_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|c| !c.starts_with("kick "))
            .collect()
    }
}

impl CommandSink for RecordingSink {
    fn execute(&self, command_line: &str) -> Result<(), HostError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(HostError::CommandFailed {
                command: command_line.to_string(),
                reason: "console busy".into(),
            });
        }
        self.commands.lock().unwrap().push(command_line.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRoster {
    // peer -> (display name, unique id)
    pub peers: Mutex<BTreeMap<i64, (Option<String>, Option<String>)>>,
}

impl FakeRoster {
    pub fn connect(&self, peer: i64, name: Option<&str>, unique: Option<&str>) {
        self.peers.lock().unwrap().insert(
            peer,
            (name.map(str::to_string), unique.map(str::to_string)),
        );
    }

    pub fn disconnect(&self, peer: i64) {
        self.peers.lock().unwrap().remove(&peer);
    }
}

impl Roster for FakeRoster {
    fn resolve_display_name(&self, peer: PeerId) -> Option<String> {
        self.peers.lock().unwrap().get(&peer.0).and_then(|p| p.0.clone())
    }

    fn resolve_unique_id(&self, peer: PeerId) -> Option<String> {
        self.peers.lock().unwrap().get(&peer.0).and_then(|p| p.1.clone())
    }

    fn connected_peers(&self) -> Vec<PeerId> {
        self.peers.lock().unwrap().keys().map(|p| PeerId(*p)).collect()
    }
}

pub struct FakePause {
    pub direct: AtomicUsize,
    pub votes: AtomicUsize,
    pub resumes: AtomicUsize,
    pub chat_available: AtomicBool,
}

impl Default for FakePause {
    fn default() -> Self {
        Self {
            direct: AtomicUsize::new(0),
            votes: AtomicUsize::new(0),
            resumes: AtomicUsize::new(0),
            chat_available: AtomicBool::new(true),
        }
    }
}

impl PauseControl for FakePause {
    fn pause_direct(&self) -> Result<(), HostError> {
        self.direct.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&self) -> Result<(), HostError> {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn request_pause_vote(&self) -> Result<(), HostError> {
        if !self.chat_available.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable("chat box"));
        }
        self.votes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeInvite {
    pub code: Mutex<Option<String>>,
}

impl InviteCodeSource for FakeInvite {
    fn try_get_invite_code(&self) -> Option<String> {
        self.code.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct FakeClipboard {
    pub texts: Mutex<Vec<String>>,
    pub broken: AtomicBool,
}

impl Clipboard for FakeClipboard {
    fn set_text(&self, text: &str) -> Result<(), HostError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(HostError::Clipboard("no display".into()));
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl Notifier for FakeNotifier {
    fn notify(&self, message: &str) -> Result<(), HostError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub sink: Arc<RecordingSink>,
    pub roster: Arc<FakeRoster>,
    pub pause: Arc<FakePause>,
    pub invite: Arc<FakeInvite>,
    pub clipboard: Arc<FakeClipboard>,
    pub notifier: Arc<FakeNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            sink: Arc::default(),
            roster: Arc::default(),
            pause: Arc::default(),
            invite: Arc::default(),
            clipboard: Arc::default(),
            notifier: Arc::default(),
        }
    }

    pub fn services(&self) -> HostServices {
        HostServices {
            commands: self.sink.clone(),
            roster: self.roster.clone(),
            pause: self.pause.clone(),
            invite_codes: Some(self.invite.clone() as Arc<dyn InviteCodeSource>),
            clipboard: Some(self.clipboard.clone() as Arc<dyn Clipboard>),
            notifier: Some(self.notifier.clone() as Arc<dyn Notifier>),
        }
    }

    pub fn allow_list_path(&self) -> std::path::PathBuf {
        self.dir.path().join("whitelist.json")
    }

    pub fn write_allow_list(&self, json: &str) {
        fs::write(self.allow_list_path(), json).unwrap();
    }

    /// Orchestrator over a loaded store, without a file watch.
    pub fn orchestrator(&self, config: HostConfig) -> Orchestrator {
        let store = Arc::new(AllowListStore::open(self.allow_list_path()));
        store.load();
        Orchestrator::new(Arc::new(config), self.services(), store)
    }
}

/// Authoritative host of a running multiplayer session, free to act.
pub fn host_facts() -> TickFacts {
    TickFacts {
        world_ready: true,
        authoritative_host: true,
        multiplayer_active: true,
        player_free: true,
        paused: false,
        time_passing: true,
        hosting_server: true,
    }
}

/// Host with the world still loading.
pub fn loading_facts() -> TickFacts {
    TickFacts {
        world_ready: false,
        player_free: false,
        time_passing: false,
        ..host_facts()
    }
}

pub fn run_ticks(orchestrator: &mut Orchestrator, facts: &TickFacts, ticks: usize) {
    for _ in 0..ticks {
        orchestrator.on_tick(facts);
    }
}

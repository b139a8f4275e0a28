//! Allow-list gate for remote participants.

use std::collections::HashSet;
use std::sync::Arc;

use allowlist::{AllowList, AllowListStore};
use tracing::{debug, error, info};

use crate::host::{HostServices, PeerId, Roster};

/// A connected remote peer with whatever identity has resolved so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub peer_id: PeerId,
    pub display_name: Option<String>,
    pub unique_id: Option<String>,
}

impl Participant {
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            display_name: None,
            unique_id: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_unique_id(mut self, id: impl Into<String>) -> Self {
        self.unique_id = Some(id.into());
        self
    }

    /// Looks the peer up in the roster. Fields are trimmed the same way
    /// allow-list entries are; missing or blank ones stay `None`.
    pub fn resolve(peer_id: PeerId, roster: &dyn Roster) -> Self {
        let non_blank = |s: String| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        Self {
            peer_id,
            display_name: roster.resolve_display_name(peer_id).and_then(non_blank),
            unique_id: roster.resolve_unique_id(peer_id).and_then(non_blank),
        }
    }

    /// Best human-readable handle: display name, else the raw peer id.
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => self.peer_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Evict,
}

/// Pure admission rule.
///
/// An empty list admits everyone. Otherwise any single matching identity
/// channel is enough.
pub fn evaluate(participant: &Participant, list: &AllowList) -> Verdict {
    if list.is_empty() {
        return Verdict::Admit;
    }

    let by_name = participant
        .display_name
        .as_deref()
        .is_some_and(|name| list.has_display_name(name));
    let by_unique_id = participant
        .unique_id
        .as_deref()
        .is_some_and(|id| list.has_unique_id(id));
    let by_peer_id = list.has_peer_id(&participant.peer_id.to_string());

    if by_name || by_unique_id || by_peer_id {
        Verdict::Admit
    } else {
        Verdict::Evict
    }
}

/// Applies [`evaluate`] against the live allow-list and kicks rejected peers.
pub struct AccessGate {
    store: Arc<AllowListStore>,
    services: HostServices,
    // peers already kicked this session
    evicted: HashSet<PeerId>,
}

impl AccessGate {
    pub fn new(store: Arc<AllowListStore>, services: HostServices) -> Self {
        Self {
            store,
            services,
            evicted: HashSet::new(),
        }
    }

    pub fn store(&self) -> &Arc<AllowListStore> {
        &self.store
    }

    /// Points the gate at another allow-list. Evictions recorded this
    /// session are kept.
    pub fn set_store(&mut self, store: Arc<AllowListStore>) {
        self.store = store;
    }

    /// Evaluates `participant` against the current snapshot and evicts on
    /// rejection.
    pub fn check(&mut self, participant: &Participant) -> Verdict {
        let list = self.store.snapshot();
        let verdict = evaluate(participant, &list);
        debug!(
            "Gate verdict for {} (list generation {}): {:?}",
            participant.label(),
            list.generation(),
            verdict
        );
        if verdict == Verdict::Evict {
            self.evict(participant);
        }
        verdict
    }

    /// Checks every participant; returns how many were rejected.
    pub fn rescan<I>(&mut self, participants: I) -> usize
    where
        I: IntoIterator<Item = Participant>,
    {
        let mut rejected = 0;
        for participant in participants {
            if self.check(&participant) == Verdict::Evict {
                rejected += 1;
            }
        }
        rejected
    }

    /// Forgets a previous eviction so a reconnect is judged again.
    pub fn forget(&mut self, peer: PeerId) {
        self.evicted.remove(&peer);
    }

    pub fn reset(&mut self) {
        self.evicted.clear();
    }

    fn evict(&mut self, participant: &Participant) {
        if self.evicted.contains(&participant.peer_id) {
            debug!("{} already removed this session", participant.label());
            return;
        }

        let label = participant.label();
        let command = format!("kick {label}");
        match self.services.commands.execute(&command) {
            Ok(()) => {
                self.evicted.insert(participant.peer_id);
                info!("Removed {label}: not on the allow-list");
                debug!("Executed `{command}`");
                self.services
                    .notify(&format!("{label} is not on the allow-list and was removed"));
            }
            Err(e) => error!("Failed to remove {label}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allowlist::AllowListEntries;

    fn list(names: &[&str], unique: &[&str], peers: &[&str]) -> AllowList {
        let entries = AllowListEntries {
            display_names: names.iter().map(|s| s.to_string()).collect(),
            unique_ids: unique.iter().map(|s| s.to_string()).collect(),
            peer_ids: peers.iter().map(|s| s.to_string()).collect(),
        };
        AllowList::new(entries, 1)
    }

    #[test]
    fn empty_list_admits_everyone() {
        let empty = AllowList::empty();
        assert_eq!(evaluate(&Participant::new(PeerId(1)), &empty), Verdict::Admit);
        assert_eq!(
            evaluate(
                &Participant::new(PeerId(2))
                    .with_display_name("Mallory")
                    .with_unique_id("666"),
                &empty
            ),
            Verdict::Admit
        );
    }

    #[test]
    fn display_name_match() {
        let allow = list(&["Alice"], &[], &[]);
        let bob = Participant::new(PeerId(1))
            .with_display_name("Bob")
            .with_unique_id("42");
        let alice = Participant::new(PeerId(2)).with_display_name("Alice");

        assert_eq!(evaluate(&bob, &allow), Verdict::Evict);
        assert_eq!(evaluate(&alice, &allow), Verdict::Admit);
    }

    #[test]
    fn any_single_channel_is_enough() {
        let allow = list(&["Alice"], &["42"], &["7"]);

        let by_unique = Participant::new(PeerId(1)).with_unique_id("42");
        let by_peer = Participant::new(PeerId(7));
        let nobody = Participant::new(PeerId(8))
            .with_display_name("alice")
            .with_unique_id("43");

        assert_eq!(evaluate(&by_unique, &allow), Verdict::Admit);
        assert_eq!(evaluate(&by_peer, &allow), Verdict::Admit);
        // names are case-sensitive
        assert_eq!(evaluate(&nobody, &allow), Verdict::Evict);
    }

    #[test]
    fn unresolved_identity_only_matches_peer_id() {
        let allow = list(&["Alice"], &["1"], &[]);
        let pending = Participant::new(PeerId(1));
        assert_eq!(evaluate(&pending, &allow), Verdict::Evict);
    }

    #[test]
    fn negative_peer_id_matches_its_listed_form() {
        let allow = list(&["Alice"], &[], &["-4242"]);
        assert_eq!(evaluate(&Participant::new(PeerId(-4242)), &allow), Verdict::Admit);
        assert_eq!(evaluate(&Participant::new(PeerId(4242)), &allow), Verdict::Evict);
        assert_eq!(Participant::new(PeerId(-4242)).label(), "-4242");
    }

    struct OneName(&'static str);

    impl Roster for OneName {
        fn resolve_display_name(&self, _: PeerId) -> Option<String> {
            Some(self.0.to_string())
        }

        fn resolve_unique_id(&self, _: PeerId) -> Option<String> {
            Some("  ".to_string())
        }

        fn connected_peers(&self) -> Vec<PeerId> {
            vec![PeerId(1)]
        }
    }

    #[test]
    fn resolved_names_are_trimmed_like_list_entries() {
        let allow = list(&["Alice"], &[], &[]);
        let padded = Participant::resolve(PeerId(1), &OneName(" Alice\t"));
        assert_eq!(padded.display_name.as_deref(), Some("Alice"));
        assert_eq!(padded.unique_id, None);
        assert_eq!(evaluate(&padded, &allow), Verdict::Admit);
    }

    #[test]
    fn label_falls_back_to_peer_id() {
        assert_eq!(Participant::new(PeerId(55)).label(), "55");
        assert_eq!(
            Participant::new(PeerId(55)).with_display_name("Eve").label(),
            "Eve"
        );
    }
}

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// On-disk shape of the allow-list.
///
/// Three independent identity channels; order inside each is irrelevant and
/// duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AllowListEntries {
    pub display_names: BTreeSet<String>,
    pub unique_ids: BTreeSet<String>,
    pub peer_ids: BTreeSet<String>,
}

impl AllowListEntries {
    pub fn total_count(&self) -> usize {
        self.display_names.len() + self.unique_ids.len() + self.peer_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Drops blank entries and surrounding whitespace.
    pub(crate) fn normalized(self) -> Self {
        fn clean(set: BTreeSet<String>) -> BTreeSet<String> {
            set.into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }

        Self {
            display_names: clean(self.display_names),
            unique_ids: clean(self.unique_ids),
            peer_ids: clean(self.peer_ids),
        }
    }
}

/// Immutable snapshot of the allow-list.
///
/// A new snapshot is built for every load; `generation` increases strictly
/// with each one so readers can tell two snapshots apart cheaply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    entries: AllowListEntries,
    generation: u64,
}

impl AllowList {
    pub fn new(entries: AllowListEntries, generation: u64) -> Self {
        Self {
            entries: entries.normalized(),
            generation,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entries(&self) -> &AllowListEntries {
        &self.entries
    }

    pub fn total_count(&self) -> usize {
        self.entries.total_count()
    }

    /// An empty list disables gating entirely.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_display_name(&self, name: &str) -> bool {
        self.entries.display_names.contains(name)
    }

    pub fn has_unique_id(&self, id: &str) -> bool {
        self.entries.unique_ids.contains(id)
    }

    pub fn has_peer_id(&self, id: &str) -> bool {
        self.entries.peer_ids.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_entries_are_dropped() {
        let mut entries = AllowListEntries::default();
        entries.display_names.insert("  Alice ".into());
        entries.display_names.insert("   ".into());
        entries.peer_ids.insert(String::new());

        let list = AllowList::new(entries, 1);
        assert_eq!(list.total_count(), 1);
        assert!(list.has_display_name("Alice"));
        assert!(!list.is_empty());
    }

    #[test]
    fn deserializes_pascal_case_with_missing_sections() {
        let json = r#"{ "DisplayNames": ["Alice", "Alice"], "PeerIds": ["7"] }"#;
        let entries: AllowListEntries = serde_json::from_str(json).unwrap();

        assert_eq!(entries.display_names.len(), 1);
        assert!(entries.unique_ids.is_empty());
        assert!(entries.peer_ids.contains("7"));
    }

    #[test]
    fn default_list_is_empty() {
        let list = AllowList::empty();
        assert!(list.is_empty());
        assert_eq!(list.generation(), 0);
    }
}

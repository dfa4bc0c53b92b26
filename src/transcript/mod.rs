//! Per-page, per-day chat transcripts.
//!
//! A transcript is persisted as its rendered markup, the same string that is
//! displayed, and every save replaces the previous snapshot under the key.

pub mod entry;
pub mod key;
pub mod storage;

pub use entry::{BackendMessage, ChatEntry, MessageInput, Role};
pub use key::{DEFAULT_KEY_PREFIX, TranscriptKey, key_for};
pub use storage::{FileStorage, MemoryStorage, TranscriptStorage};

use crate::markup::format_message;
use chrono::{DateTime, Utc};

/// Greeting shown when a page is opened with no history for the day
pub const WELCOME_MESSAGE: &str = "👋 You can now ask me anything about this page!";

/// Marker in front of transient error notices
pub const NOTICE_PREFIX: &str = "❌ ";

/// Whether an appended entry is written through to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    Save,
    Skip,
}

/// Keyed snapshot persistence over a [`TranscriptStorage`] backend.
///
/// Backend faults never surface: a failed load reads as no history and a
/// failed save is logged.
pub struct TranscriptStore<S: TranscriptStorage> {
    storage: S,
    prefix: String,
}

impl<S: TranscriptStorage> TranscriptStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_prefix(storage, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(storage: S, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key_for(&self, url: &str, now: DateTime<Utc>) -> TranscriptKey {
        key_for(url, now)
    }

    /// Replaces the snapshot stored under `key`
    pub fn save(&mut self, key: &TranscriptKey, rendered: &str) {
        let storage_key = key.storage_key(&self.prefix);
        match self.storage.set(&storage_key, rendered) {
            Ok(()) => ::log::debug!("Saved transcript {} ({} bytes)", storage_key, rendered.len()),
            Err(e) => ::log::warn!("Failed to save transcript {}: {}", storage_key, e),
        }
    }

    /// Snapshot previously saved under `key`, verbatim
    pub fn load(&self, key: &TranscriptKey) -> Option<String> {
        let storage_key = key.storage_key(&self.prefix);
        match self.storage.get(&storage_key) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                ::log::warn!("Ignoring unreadable transcript {}: {}", storage_key, e);
                None
            }
        }
    }
}

/// The transcript of the current page and day, as displayed
#[derive(Debug, Clone)]
pub struct Transcript {
    key: TranscriptKey,
    entries: Vec<ChatEntry>,
    rendered: String,
}

impl Transcript {
    /// Opens the transcript for `url` on the day of `now`, restoring any
    /// saved snapshot
    pub fn open<S: TranscriptStorage>(
        store: &TranscriptStore<S>,
        url: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let key = store.key_for(url, now);
        let rendered = store.load(&key).unwrap_or_default();
        ::log::info!(
            "Opened transcript {} ({})",
            key,
            if rendered.is_empty() { "empty" } else { "restored" }
        );
        Self {
            key,
            entries: Vec::new(),
            rendered,
        }
    }

    pub fn key(&self) -> &TranscriptKey {
        &self.key
    }

    /// Entries appended during this session
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Full display markup, restored history included
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.trim().is_empty()
    }

    /// Formats `entry`, appends it to the display and, unless skipped,
    /// saves the whole rendered transcript
    pub fn append<S: TranscriptStorage>(
        &mut self,
        store: &mut TranscriptStore<S>,
        entry: ChatEntry,
        persist: Persist,
    ) {
        self.rendered.push_str(&render_entry(&entry));
        self.entries.push(entry);
        if persist == Persist::Save {
            store.save(&self.key, &self.rendered);
        }
    }

    /// Appends the greeting if there is nothing to show yet
    pub fn greet_if_empty<S: TranscriptStorage>(&mut self, store: &mut TranscriptStore<S>) {
        if self.is_empty() {
            self.append(store, ChatEntry::bot(WELCOME_MESSAGE), Persist::Save);
        }
    }

    /// Shows an error notice that is not replayed on reload
    pub fn notice<S: TranscriptStorage>(&mut self, store: &mut TranscriptStore<S>, message: &str) {
        let entry = ChatEntry::bot(format!("{NOTICE_PREFIX}{message}"));
        self.append(store, entry, Persist::Skip);
    }

    /// Switches to the transcript for `url` on the day of `now` if that is a
    /// different key. The old transcript stays in storage.
    pub fn follow<S: TranscriptStorage>(
        &mut self,
        store: &TranscriptStore<S>,
        url: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if store.key_for(url, now) == self.key {
            return false;
        }
        *self = Self::open(store, url, now);
        true
    }

    /// This session's entries as backend conversation history
    pub fn backend_history(&self) -> Vec<BackendMessage> {
        self.entries.iter().map(ChatEntry::to_backend).collect()
    }
}

/// Display markup of a single entry
pub fn render_entry(entry: &ChatEntry) -> String {
    format!(
        "<div class=\"message {}\">{}</div>",
        entry.role,
        format_message(&entry.content)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 3, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_load_returns_saved_snapshot_verbatim() {
        let mut store = TranscriptStore::new(MemoryStorage::new());
        let key = store.key_for("https://x.com/a", day());
        assert_eq!(store.load(&key), None);

        store.save(&key, "<div>first</div>");
        store.save(&key, "<div>second</div>");
        assert_eq!(store.load(&key).as_deref(), Some("<div>second</div>"));
        assert_eq!(store.storage().len(), 1);
    }

    #[test]
    fn test_append_formats_and_persists() {
        let mut store = TranscriptStore::new(MemoryStorage::new());
        let mut transcript = Transcript::open(&store, "https://x.com/a", day());

        transcript.append(&mut store, ChatEntry::user("What is **this**?"), Persist::Save);
        transcript.append(&mut store, ChatEntry::bot("A page.\nThat's all"), Persist::Save);

        let expected = "<div class=\"message user\">What is <strong>this</strong>?</div>\
                        <div class=\"message bot\">A page.<br>That's all</div>";
        assert_eq!(transcript.rendered(), expected);
        assert_eq!(store.load(transcript.key()).as_deref(), Some(expected));
        assert_eq!(transcript.entries().len(), 2);
    }

    #[test]
    fn test_skipped_entries_are_not_replayed() {
        let mut store = TranscriptStore::new(MemoryStorage::new());
        let mut transcript = Transcript::open(&store, "https://x.com/a", day());
        transcript.append(&mut store, ChatEntry::user("hello"), Persist::Save);
        transcript.notice(&mut store, "Backend not responding.");

        assert!(transcript.rendered().contains("❌ Backend not responding."));
        let reopened = Transcript::open(&store, "https://x.com/a", day());
        assert_eq!(
            reopened.rendered(),
            "<div class=\"message user\">hello</div>"
        );
        assert!(reopened.entries().is_empty());
    }

    #[test]
    fn test_greeting_only_on_empty_history() {
        let mut store = TranscriptStore::new(MemoryStorage::new());
        let mut transcript = Transcript::open(&store, "https://x.com/a", day());
        transcript.greet_if_empty(&mut store);
        transcript.greet_if_empty(&mut store);
        assert_eq!(transcript.rendered().matches(WELCOME_MESSAGE).count(), 1);

        let mut reopened = Transcript::open(&store, "https://x.com/a", day());
        reopened.greet_if_empty(&mut store);
        assert_eq!(reopened.rendered().matches(WELCOME_MESSAGE).count(), 1);
    }

    #[test]
    fn test_new_day_starts_empty_and_keeps_old_history() {
        let mut store = TranscriptStore::new(MemoryStorage::new());
        let mut transcript = Transcript::open(&store, "https://x.com/a", day());
        transcript.append(&mut store, ChatEntry::user("yesterday"), Persist::Save);

        assert!(!transcript.follow(&store, "https://x.com/a", day()));
        assert!(transcript.follow(&store, "https://x.com/a", day() + Duration::days(1)));
        assert!(transcript.is_empty());

        let old = store.load(&key_for("https://x.com/a", day()));
        assert_eq!(
            old.as_deref(),
            Some("<div class=\"message user\">yesterday</div>")
        );

        assert!(transcript.follow(&store, "https://x.com/b", day() + Duration::days(1)));
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_corrupt_history_file_reads_as_no_history() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("history.json");
        std::fs::write(&path, "{ nope").unwrap();

        let store = TranscriptStore::new(FileStorage::new(&path));
        let key = store.key_for("https://x.com/a", day());
        assert_eq!(store.load(&key), None);
    }

    #[test]
    fn test_greeting_replaces_corrupt_history() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("history.json");
        std::fs::write(&path, "{ nope").unwrap();

        let mut store = TranscriptStore::new(FileStorage::new(&path));
        let mut transcript = Transcript::open(&store, "https://x.com/a", day());
        assert!(transcript.is_empty());
        transcript.greet_if_empty(&mut store);
        assert_eq!(transcript.entries(), &[ChatEntry::bot(WELCOME_MESSAGE)]);

        let reopened = Transcript::open(&store, "https://x.com/a", day());
        assert_eq!(reopened.rendered(), transcript.rendered());
        assert_eq!(reopened.rendered().matches(WELCOME_MESSAGE).count(), 1);
    }

    #[test]
    fn test_failed_save_keeps_the_displayed_transcript() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        // A directory where the history file should be makes every write fail
        let path = temp_dir.path().join("history.json");
        std::fs::create_dir(&path).unwrap();

        let mut store = TranscriptStore::new(FileStorage::new(&path));
        let mut transcript = Transcript::open(&store, "https://x.com/a", day());
        transcript.append(&mut store, ChatEntry::user("hello"), Persist::Save);

        assert_eq!(
            transcript.rendered(),
            "<div class=\"message user\">hello</div>"
        );
        assert_eq!(store.load(transcript.key()), None);
    }

    #[test]
    fn test_backend_history_maps_roles() {
        let mut store = TranscriptStore::new(MemoryStorage::new());
        let mut transcript = Transcript::open(&store, "https://x.com/a", day());
        transcript.append(&mut store, ChatEntry::user("q"), Persist::Save);
        transcript.append(&mut store, ChatEntry::bot("a"), Persist::Save);

        let roles: Vec<_> = transcript
            .backend_history()
            .into_iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec!["user", "assistant"]);
    }
}

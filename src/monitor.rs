//! Detection of material changes to a page's visible text.

use crate::dom::{HtmlDocument, PageDocument};
use crate::error::ExtractError;
use crate::extract::descriptor::truncate_chars;
use crate::extract::walker::visible_text;
use crate::source::{PageSnapshot, PageSource};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_SNAPSHOT_CHARS: usize = 1000;
pub const DEFAULT_CHANGE_THRESHOLD: usize = 100;

/// Notification sent when the page content changed: `{"type":"content-changed","url":...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "content-changed")]
pub struct ContentChanged {
    pub url: String,
}

/// Sampling parameters of a [`ChangeDetector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Time between samples
    pub interval: Duration,
    /// Characters of visible text kept per sample
    pub snapshot_chars: usize,
    /// Samples this short or shorter never notify
    pub threshold: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            snapshot_chars: DEFAULT_SNAPSHOT_CHARS,
            threshold: DEFAULT_CHANGE_THRESHOLD,
        }
    }
}

/// Remembers the last reported snapshot and decides when a new sample is a
/// change worth reporting
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    config: DetectorConfig,
    last_snapshot: String,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl ChangeDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            last_snapshot: String::new(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn last_snapshot(&self) -> &str {
        &self.last_snapshot
    }

    /// Feeds one sample of visible text taken from `url`.
    ///
    /// The sample is cut to `snapshot_chars`; it is reported, and becomes the
    /// new reference, only if it differs from the reference and is longer
    /// than `threshold`.
    pub fn observe(&mut self, visible_text: &str, url: &str) -> Option<ContentChanged> {
        let snapshot = truncate_chars(visible_text, self.config.snapshot_chars);
        if snapshot == self.last_snapshot || snapshot.chars().count() <= self.config.threshold {
            return None;
        }
        self.last_snapshot = snapshot;
        ::log::info!("Content changed on {}", url);
        Some(ContentChanged {
            url: url.to_string(),
        })
    }

    /// Samples a parsed document
    pub fn observe_document<D: PageDocument>(
        &mut self,
        doc: &D,
    ) -> Result<Option<ContentChanged>, ExtractError> {
        let body = doc.body().ok_or(ExtractError::MissingBody)?;
        let text = visible_text(&body);
        Ok(self.observe(&text, doc.url()))
    }

    /// Samples raw page source
    pub fn observe_page(
        &mut self,
        page: &PageSnapshot,
    ) -> Result<Option<ContentChanged>, ExtractError> {
        let doc = HtmlDocument::parse(&page.source, page.url.as_str());
        self.observe_document(&doc)
    }

    /// Polls `source` every interval on a background task, sending each
    /// change to `notify`. The first sample is taken one interval from now.
    pub fn start<P>(mut self, mut source: P, notify: mpsc::Sender<ContentChanged>) -> DetectorHandle
    where
        P: PageSource + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let interval = self.config.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        ::log::debug!("Change detector stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let page = match source.fetch().await {
                            Ok(page) => page,
                            Err(e) => {
                                ::log::warn!("Failed to sample page: {}", e);
                                continue;
                            }
                        };
                        let event = match self.observe_page(&page) {
                            Ok(Some(event)) => event,
                            Ok(None) => continue,
                            Err(e) => {
                                ::log::warn!("Failed to read {}: {}", page.url, e);
                                continue;
                            }
                        };
                        if notify.send(event).await.is_err() {
                            ::log::debug!("Notification channel closed, stopping detector");
                            break;
                        }
                    }
                }
            }
            self
        });

        DetectorHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

/// Running detector task
pub struct DetectorHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<ChangeDetector>,
}

impl DetectorHandle {
    /// Stops polling and hands the detector back with its last snapshot
    pub async fn stop(mut self) -> Option<ChangeDetector> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        match self.task.await {
            Ok(detector) => Some(detector),
            Err(e) => {
                ::log::error!("Change detector task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn text_of_len(len: usize, last: char) -> String {
        let mut text = "x".repeat(len - 1);
        text.push(last);
        text
    }

    #[test]
    fn test_notifies_on_material_changes_only() {
        let mut detector = ChangeDetector::default();
        let url = "https://example.com/";

        assert_eq!(detector.observe("", url), None);
        assert_eq!(detector.observe(&"y".repeat(39), url), None);

        let first = text_of_len(150, 'a');
        assert_eq!(
            detector.observe(&first, url),
            Some(ContentChanged { url: url.to_string() })
        );
        assert_eq!(detector.observe(&first, url), None);

        let second = text_of_len(150, 'b');
        assert!(detector.observe(&second, url).is_some());

        assert_eq!(detector.observe(&"z".repeat(50), url), None);
        assert_eq!(detector.last_snapshot(), second);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut detector = ChangeDetector::default();
        assert!(detector.observe(&"a".repeat(100), "u").is_none());
        assert!(detector.observe(&"a".repeat(101), "u").is_some());
    }

    #[test]
    fn test_only_the_snapshot_prefix_is_compared() {
        let mut detector = ChangeDetector::default();
        let base = "p".repeat(DEFAULT_SNAPSHOT_CHARS);
        assert!(detector.observe(&format!("{base} tail one"), "u").is_some());
        assert!(detector.observe(&format!("{base} tail two"), "u").is_none());
        assert_eq!(detector.last_snapshot().chars().count(), DEFAULT_SNAPSHOT_CHARS);
    }

    #[test]
    fn test_observe_page_uses_visible_text() {
        let mut detector = ChangeDetector::default();
        let words = "word ".repeat(30);
        let page = PageSnapshot {
            url: "https://example.com/live".to_string(),
            source: format!("<body><p>{words}</p><script>{words}</script></body>"),
        };
        let event = detector.observe_page(&page).unwrap().unwrap();
        assert_eq!(event.url, "https://example.com/live");
        assert_eq!(detector.last_snapshot(), words.trim());
    }

    #[test]
    fn test_notification_wire_shape() {
        let event = ContentChanged {
            url: "https://example.com/".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({ "type": "content-changed", "url": "https://example.com/" })
        );
    }

    /// Serves a fixed sequence of page bodies, then repeats the last one
    struct ScriptedSource {
        pages: VecDeque<String>,
        last: String,
    }

    impl ScriptedSource {
        fn new(pages: &[String]) -> Self {
            Self {
                pages: pages.iter().cloned().collect(),
                last: String::new(),
            }
        }
    }

    impl PageSource for ScriptedSource {
        fn fetch(
            &mut self,
        ) -> impl std::future::Future<Output = Result<PageSnapshot, ExtractError>> + Send {
            if let Some(next) = self.pages.pop_front() {
                self.last = next;
            }
            let source = format!("<body><p>{}</p></body>", self.last);
            async move {
                Ok(PageSnapshot {
                    url: "https://example.com/feed".to_string(),
                    source,
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_task_reports_changes_until_stopped() {
        let long_a = text_of_len(150, 'a');
        let long_b = text_of_len(150, 'b');
        let pages = [
            "short".to_string(),
            long_a.clone(),
            long_a.clone(),
            long_b.clone(),
        ];
        let (tx, mut rx) = mpsc::channel(8);
        let handle = ChangeDetector::default().start(ScriptedSource::new(&pages), tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.url, "https://example.com/feed");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.url, "https://example.com/feed");

        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 3).await;
        assert!(rx.try_recv().is_err());

        let detector = handle.stop().await.unwrap();
        assert_eq!(detector.last_snapshot(), long_b);
    }
}

//! Bridge from git transfer progress to sync events
//!
//! The remote reports progress as free text on the sideband channel
//! (`Receiving objects:  42% (21/50)`), and libgit2 reports object counts on
//! its own. Both are turned into [`SyncEvent`]s for one source.

use std::cell::Cell;
use std::sync::LazyLock;

use regex::Regex;

use crate::event::{EventSender, SyncEvent};

static PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(\d+)%").expect("valid percentage pattern")
});

/// Last percentage found in a chunk of progress text, as a fraction
pub fn parse_percent(text: &str) -> Option<f64> {
    PERCENT
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .last()
        .map(|value| f64::from(value.min(100)) / 100.0)
}

/// Progress sink of one fetcher
///
/// Consecutive duplicate percentages are dropped. Send failures are ignored:
/// the reporter may have stopped after an interrupt while the fetch goes on.
pub struct ProgressWriter {
    index: usize,
    events: EventSender,
    last: Cell<Option<u8>>,
}

impl ProgressWriter {
    pub fn new(index: usize, events: EventSender) -> Self {
        Self {
            index,
            events,
            last: Cell::new(None),
        }
    }

    /// Feed a chunk of textual progress output
    pub fn write(&self, text: &str) {
        if text.to_lowercase().contains("submodule") {
            self.submodule(text.trim().to_string());
            return;
        }
        if let Some(fraction) = parse_percent(text) {
            self.fraction(fraction);
        }
    }

    /// Report a fraction in `0.0..=1.0`
    pub fn fraction(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole = (fraction * 100.0).round() as u8;
        if self.last.get() == Some(whole) {
            return;
        }
        self.last.set(Some(whole));
        let _ = self.events.send(SyncEvent::Progress {
            index: self.index,
            percent: fraction,
        });
    }

    /// Report a submodule operation
    pub fn submodule(&self, message: String) {
        let _ = self.events.send(SyncEvent::Submodule {
            index: self.index,
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event;

    fn drain(rx: &mut event::EventReceiver) -> Vec<SyncEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("Receiving objects:  42% (21/50)"), Some(0.42));
        assert_eq!(parse_percent("Counting: 10%\rCounting: 55%"), Some(0.55));
        assert_eq!(parse_percent("Enumerating objects: 5, done."), None);
        assert_eq!(parse_percent("250%"), Some(1.0));
    }

    #[test]
    fn test_write_emits_progress() {
        let (tx, mut rx) = event::channel();
        let writer = ProgressWriter::new(3, tx);

        writer.write("Receiving objects:  50% (1/2)");

        assert_eq!(
            drain(&mut rx),
            vec![SyncEvent::Progress {
                index: 3,
                percent: 0.5
            }]
        );
    }

    #[test]
    fn test_write_detects_submodule_text() {
        let (tx, mut rx) = event::channel();
        let writer = ProgressWriter::new(0, tx);

        writer.write("Submodule 'lib' registered for path 'lib' 10%\n");

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SyncEvent::Submodule { index: 0, .. }));
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let (tx, mut rx) = event::channel();
        let writer = ProgressWriter::new(1, tx);

        writer.fraction(0.2);
        writer.fraction(0.201);
        writer.fraction(0.3);

        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = event::channel();
        drop(rx);
        let writer = ProgressWriter::new(0, tx);
        writer.write("Resolving deltas: 100%");
        writer.submodule("Updating submodule x".to_string());
    }
}

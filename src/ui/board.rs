//! Display state of a sync run
//!
//! The board holds one row per source and folds [`SyncEvent`]s into it. It
//! knows nothing about terminals, so labels can be checked directly.

use crate::event::{SyncEvent, TerminalStatus};

/// Fraction from which a running transfer is shown as finishing
pub const FINISHING_AT: f64 = 0.99;

#[derive(Debug, Clone, PartialEq)]
struct Row {
    name: String,
    percent: f64,
    submodule: Option<String>,
    terminal: Option<TerminalStatus>,
}

/// Per-source display state, indexed by declared position
#[derive(Debug, Clone, Default)]
pub struct ProgressBoard {
    rows: Vec<Row>,
}

impl ProgressBoard {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = names
            .into_iter()
            .map(|name| Row {
                name: name.into(),
                percent: 0.0,
                submodule: None,
                terminal: None,
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fold one event in; returns the index of the changed row
    ///
    /// Events for unknown indices and anything after a terminal event are
    /// ignored.
    pub fn apply(&mut self, event: &SyncEvent) -> Option<usize> {
        let index = event.index();
        let row = self.rows.get_mut(index)?;
        if row.terminal.is_some() {
            return None;
        }

        match event {
            SyncEvent::Progress { percent, .. } => row.percent = percent.clamp(0.0, 1.0),
            SyncEvent::Submodule { message, .. } => row.submodule = Some(message.clone()),
            SyncEvent::Done { status, .. } => {
                if status.is_ok() {
                    row.percent = 1.0;
                }
                row.terminal = Some(status.clone());
            }
        }
        Some(index)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.rows.get(index).map(|row| row.name.as_str())
    }

    pub fn percent(&self, index: usize) -> Option<f64> {
        self.rows.get(index).map(|row| row.percent)
    }

    pub fn terminal(&self, index: usize) -> Option<&TerminalStatus> {
        self.rows.get(index).and_then(|row| row.terminal.as_ref())
    }

    /// Last submodule notice, while submodule work is shown
    pub fn submodule_message(&self, index: usize) -> Option<&str> {
        let row = self.rows.get(index)?;
        if row.terminal.is_some() {
            return None;
        }
        row.submodule.as_deref()
    }

    /// Status label of a row
    ///
    /// Precedence: error, done, submodules, finishing, raw percentage.
    pub fn status_label(&self, index: usize) -> Option<String> {
        let row = self.rows.get(index)?;

        let label = match &row.terminal {
            Some(TerminalStatus::Failed(reason)) => format!("[ERROR: {reason}]"),
            Some(TerminalStatus::Ok { warning: Some(warning) }) => format!("[DONE] ({warning})"),
            Some(TerminalStatus::Ok { warning: None }) => "[DONE]".to_string(),
            None if row.submodule.is_some() => "[SUBMODULES]".to_string(),
            None if row.percent >= FINISHING_AT => "[FINISHING]".to_string(),
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            None => format!("{}%", (row.percent * 100.0).round() as u32),
        };
        Some(label)
    }

    pub fn all_done(&self) -> bool {
        self.rows.iter().all(|row| row.terminal.is_some())
    }

    pub fn done_count(&self) -> usize {
        self.rows.iter().filter(|row| row.terminal.is_some()).count()
    }
}

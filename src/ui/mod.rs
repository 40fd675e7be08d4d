//! Live progress display
//!
//! A single task owns the display. It drains the event channel, folds events
//! into a [`ProgressBoard`] and redraws the bar of the source that changed.
//! It stops when every source is terminal, or as soon as the interrupt future
//! resolves; fetches are never cancelled from here.
//!
//! ## Module Organization
//!
//! - `board.rs`: terminal-independent display state

pub mod board;

pub use board::ProgressBoard;

use std::future::Future;
use std::sync::Arc;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::event::{EventReceiver, TerminalStatus};

/// Why the reporter stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterExit {
    /// Every source reported a terminal event
    Completed,
    /// The operator interrupted the display
    Interrupted,
}

/// Where the reporter draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Live bars on stderr
    #[default]
    Interactive,
    /// No output; state is still tracked
    Hidden,
}

/// Multi-bar renderer of a [`ProgressBoard`]
pub struct ProgressReporter {
    board: ProgressBoard,
    multi: MultiProgress,
    bars: Vec<ProgressBar>,
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>24.bold} [{bar:40.cyan/blue}] {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

impl ProgressReporter {
    pub fn new(names: Vec<String>, mode: DisplayMode) -> Self {
        let target = match mode {
            DisplayMode::Interactive => ProgressDrawTarget::stderr(),
            DisplayMode::Hidden => ProgressDrawTarget::hidden(),
        };
        let multi = MultiProgress::with_draw_target(target);
        let bars = names
            .iter()
            .map(|name| {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(bar_style());
                bar.set_prefix(name.clone());
                bar.set_message("0%");
                bar
            })
            .collect();

        Self {
            board: ProgressBoard::new(names),
            multi,
            bars,
        }
    }

    fn render(&self, index: usize) {
        let (Some(bar), Some(label)) = (self.bars.get(index), self.board.status_label(index))
        else {
            return;
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let position = (self.board.percent(index).unwrap_or(0.0) * 100.0).round() as u64;
        bar.set_position(position);

        let message = match self.board.terminal(index) {
            Some(TerminalStatus::Failed(_)) => style(label).red().to_string(),
            Some(TerminalStatus::Ok { warning: Some(_) }) => style(label).yellow().to_string(),
            Some(TerminalStatus::Ok { warning: None }) => style(label).green().to_string(),
            None => match self.board.submodule_message(index) {
                Some(notice) => format!("{} {}", style(label).cyan(), style(notice).dim()),
                None => label,
            },
        };

        if self.board.terminal(index).is_some() {
            bar.finish_with_message(message);
        } else {
            bar.set_message(message);
        }
    }

    fn abandon(&self) {
        for bar in &self.bars {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
        let _ = self.multi.clear();
    }

    /// Drain `events` until every source is terminal or `interrupt` resolves
    ///
    /// Returns the final board along with the reason for stopping.
    pub async fn run<F>(
        mut self,
        mut events: EventReceiver,
        interrupt: F,
    ) -> (ProgressBoard, ReporterExit)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        while !self.board.all_done() {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if let Some(index) = self.board.apply(&event) {
                            self.render(index);
                        }
                    }
                    None => {
                        log::debug!(
                            "Event channel closed with {} of {} sources done",
                            self.board.done_count(),
                            self.board.len()
                        );
                        break;
                    }
                },
                () = &mut interrupt => {
                    self.abandon();
                    return (self.board, ReporterExit::Interrupted);
                }
            }
        }

        (self.board, ReporterExit::Completed)
    }
}

/// Resolves on Ctrl-C; never resolves when the handler cannot be installed
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::debug!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Exit the process with status 130 on the next Ctrl-C
pub fn exit_on_next_interrupt() -> JoinHandle<()> {
    tokio::spawn(async {
        ctrl_c().await;
        eprintln!("Interrupted");
        std::process::exit(130);
    })
}

/// Holds the exit-on-next-interrupt task of one sync run
///
/// Clones share the same slot: one clone arms it from the interrupt future,
/// the owner disarms it once the run is over.
#[derive(Debug, Clone, Default)]
pub struct InterruptLatch {
    armed: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl InterruptLatch {
    pub fn arm(&self) {
        let previous = self.armed.lock().replace(exit_on_next_interrupt());
        if let Some(handle) = previous {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.lock().is_some()
    }

    /// Abort the armed task; returns its handle when there was one
    pub fn disarm(&self) -> Option<JoinHandle<()>> {
        let handle = self.armed.lock().take()?;
        handle.abort();
        Some(handle)
    }
}

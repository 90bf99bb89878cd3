//! Navigation state shared by the controller and every handler.
//!
//! Handlers never assign flags directly; they call the intent methods below
//! and the controller reads the result after the handler returns.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::transcript::Transcript;

/// How far a backtrack unwinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backtrack {
    /// One directory level.
    Local,
    /// To the enclosing score's inner directory.
    Score,
    /// All the way to the scores listing.
    Scores,
}

/// A request to move somewhere specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Enter `path` on top of the current directory.
    Enter(PathBuf),
    /// Swap the current directory for a sibling.
    Replace(PathBuf),
}

#[derive(Debug, Default)]
pub struct Session {
    current_directory: PathBuf,
    pending_input: VecDeque<String>,
    is_quitting: bool,
    is_backtracking_locally: bool,
    is_backtracking_to_score: bool,
    is_navigating_to_scores: bool,
    pending_redraw: bool,
    pending_menu_rebuild: bool,
    is_test: bool,
    show_all_commands: bool,
    skip_confirmation: bool,
    navigation: Option<Navigation>,
    attempted: Vec<String>,
    transcript: Transcript,
}

impl Session {
    pub fn new(is_test: bool) -> Self {
        Session {
            is_test,
            pending_redraw: true,
            ..Default::default()
        }
    }

    /// Reset everything except the test-mode flag, optionally queueing
    /// scripted input.
    pub fn reinitialize(&mut self, input: Option<&str>) {
        *self = Session::new(self.is_test);
        if let Some(input) = input {
            self.queue_input(input);
        }
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Queue whitespace-separated tokens to be consumed before the terminal.
    pub fn queue_input(&mut self, input: &str) {
        self.pending_input
            .extend(input.split_whitespace().map(str::to_string));
    }

    pub fn next_input(&mut self) -> Option<String> {
        self.pending_input.pop_front()
    }

    pub fn has_pending_input(&self) -> bool {
        !self.pending_input.is_empty()
    }

    // ── Location ─────────────────────────────────────────────────────

    pub fn current_directory(&self) -> &Path {
        &self.current_directory
    }

    /// Called by the controller whenever a frame becomes current.
    pub fn enter_directory(&mut self, directory: &Path) {
        self.current_directory = directory.to_path_buf();
        self.clear_backtracking();
        self.pending_redraw = true;
    }

    // ── Intents ──────────────────────────────────────────────────────

    pub fn request_quit(&mut self) {
        self.clear_backtracking();
        self.navigation = None;
        self.is_quitting = true;
    }

    pub fn request_backtrack(&mut self, backtrack: Backtrack) {
        if self.is_quitting {
            return;
        }
        self.clear_backtracking();
        match backtrack {
            Backtrack::Local => self.is_backtracking_locally = true,
            Backtrack::Score => self.is_backtracking_to_score = true,
            Backtrack::Scores => self.is_navigating_to_scores = true,
        }
    }

    pub fn request_navigation(&mut self, navigation: Navigation) {
        if self.is_quitting {
            return;
        }
        self.clear_backtracking();
        self.navigation = Some(navigation);
    }

    pub fn request_redraw(&mut self) {
        self.pending_redraw = true;
    }

    /// The visible tree or its metadata changed.
    pub fn request_menu_rebuild(&mut self) {
        self.pending_menu_rebuild = true;
        self.pending_redraw = true;
    }

    pub fn toggle_show_all_commands(&mut self) {
        self.show_all_commands = !self.show_all_commands;
        self.pending_redraw = true;
    }

    // ── Controller side ──────────────────────────────────────────────

    pub fn is_quitting(&self) -> bool {
        self.is_quitting
    }

    pub fn backtrack(&self) -> Option<Backtrack> {
        if self.is_backtracking_locally {
            Some(Backtrack::Local)
        } else if self.is_backtracking_to_score {
            Some(Backtrack::Score)
        } else if self.is_navigating_to_scores {
            Some(Backtrack::Scores)
        } else {
            None
        }
    }

    pub fn clear_backtracking(&mut self) {
        self.is_backtracking_locally = false;
        self.is_backtracking_to_score = false;
        self.is_navigating_to_scores = false;
    }

    pub fn take_navigation(&mut self) -> Option<Navigation> {
        self.navigation.take()
    }

    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.pending_redraw)
    }

    pub fn take_menu_rebuild(&mut self) -> bool {
        std::mem::take(&mut self.pending_menu_rebuild)
    }

    pub fn show_all_commands(&self) -> bool {
        self.show_all_commands
    }

    // ── Confirmation ─────────────────────────────────────────────────

    pub fn skip_confirmation(&self) -> bool {
        self.skip_confirmation
    }

    pub fn set_skip_confirmation(&mut self, skip: bool) {
        self.skip_confirmation = skip;
    }

    // ── Test mode ────────────────────────────────────────────────────

    pub fn is_test(&self) -> bool {
        self.is_test
    }

    /// Note an external effect that test mode suppressed.
    pub fn record_attempt(&mut self, what: &str) {
        log::debug!("test mode: attempted {}", what);
        self.attempted.push(format!("attempted {}", what));
    }

    pub fn attempted(&self) -> &[String] {
        &self.attempted
    }

    pub fn has_attempted(&self, what: &str) -> bool {
        let marker = format!("attempted {}", what);
        self.attempted.iter().any(|a| *a == marker)
    }

    // ── Transcript ───────────────────────────────────────────────────

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }
}

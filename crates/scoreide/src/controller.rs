//! The navigation controller.
//!
//! One loop drives the whole session: present the current menu, read a
//! token, dispatch it, then settle whatever navigation the handler asked
//! for. Directory levels live on an explicit stack of frames; the bottom
//! frame is always the home listing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::classify::{self, DirectoryKind, Roots};
use crate::collaborators::{Collaborators, Launcher, Renderer, Repository, TemplateExpander, Terminal};
use crate::command::{CommandKind, Registry};
use crate::config::Configuration;
use crate::error::{IdeError, Result};
use crate::handlers;
use crate::io::Interaction;
use crate::menu::{self, Menu, Resolution};
use crate::session::{Backtrack, Navigation, Session};
use crate::transcript::Transcript;

/// A command handler. Handlers read the session, do their work, and signal
/// the controller through the session's intent methods.
pub type Handler = fn(&mut Ide) -> Result<()>;

/// What a token resolved to, detached from the menu that resolved it.
enum Target {
    Command(CommandKind),
    Directory(PathBuf),
    File(PathBuf),
}

pub struct Ide {
    config: Configuration,
    roots: Roots,
    registry: Registry,
    handlers: HashMap<CommandKind, Handler>,
    session: Session,
    stack: Vec<PathBuf>,
    menu: Option<Menu>,
    terminal: Box<dyn Terminal>,
    pub(crate) repository: Box<dyn Repository>,
    pub(crate) renderer: Box<dyn Renderer>,
    pub(crate) templates: Box<dyn TemplateExpander>,
    pub(crate) launcher: Box<dyn Launcher>,
}

impl Ide {
    /// Validate the configured roots and wire up the collaborators.
    pub fn new(config: Configuration, collaborators: Collaborators, is_test: bool) -> Result<Ide> {
        let roots = config.roots()?;
        let Collaborators {
            terminal,
            repository,
            renderer,
            templates,
            launcher,
        } = collaborators;
        Ok(Ide {
            config,
            roots,
            registry: Registry::standard(),
            handlers: handlers::table(),
            session: Session::new(is_test),
            stack: Vec::new(),
            menu: None,
            terminal,
            repository,
            renderer,
            templates,
            launcher,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transcript(&self) -> &Transcript {
        self.session.transcript()
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Directories from home to the current one.
    pub fn stack(&self) -> &[PathBuf] {
        &self.stack
    }

    /// Run one session from the home listing until quit or end of input.
    ///
    /// `input` is a whitespace-separated token script consumed before the
    /// terminal is asked for anything.
    pub fn run(&mut self, input: Option<&str>) -> Result<()> {
        self.session.reinitialize(input);
        let home = self.roots.home(self.session.is_test()).to_path_buf();
        log::info!("starting session in {}", home.display());
        self.stack = vec![home.clone()];
        self.menu = None;
        self.session.enter_directory(&home);

        while !self.session.is_quitting() {
            self.present()?;
            let Some(token) = self.read_token()? else {
                log::debug!("input exhausted");
                self.session.request_quit();
                break;
            };
            self.dispatch(&token)?;
            if self.session.is_quitting() {
                break;
            }
            self.settle();
        }

        log::info!("session finished after {} transcript entries", self.transcript().len());
        self.terminal.clear()
    }

    // ── Loop steps ───────────────────────────────────────────────────

    fn present(&mut self) -> Result<()> {
        while self.stack.len() > 1 && !self.current_directory().is_dir() {
            let gone = self.trim(self.current_directory());
            self.display(&[format!("Directory no longer exists: {}", gone)])?;
            self.stack.pop();
            self.enter_top();
        }
        if self.session.take_menu_rebuild() || self.menu.is_none() {
            self.menu = Some(menu::build(
                self.current_directory(),
                &self.roots,
                &self.registry,
            )?);
        }
        if self.session.take_redraw()
            && let Some(menu) = &self.menu
        {
            let lines = menu.lines(self.session.show_all_commands());
            self.session.transcript_mut().record_menu(&menu.title, &lines);
            self.terminal.display(&lines)?;
            if !menu.warnings.is_empty() {
                self.session.transcript_mut().record_display(&menu.warnings);
                self.terminal.display(&menu.warnings)?;
            }
        }
        Ok(())
    }

    fn read_token(&mut self) -> Result<Option<String>> {
        let token = match self.session.next_input() {
            Some(token) => Some(token),
            None => self.terminal.prompt("")?,
        };
        Ok(token.map(|token| {
            self.session.transcript_mut().record_input("", &token);
            token.trim().to_string()
        }))
    }

    fn dispatch(&mut self, token: &str) -> Result<()> {
        log::debug!("dispatching {:?} in {}", token, self.current_directory().display());
        if token.is_empty() {
            self.session.request_redraw();
            return Ok(());
        }
        if let Some(command) = token.strip_prefix('!')
            && !command.trim().is_empty()
        {
            return handlers::navigation::run_shell(self, command.trim());
        }
        if let Some(name) = token.strip_prefix('%')
            && !name.is_empty()
        {
            return handlers::navigation::search(self, name);
        }

        match self.resolve(token) {
            Some(Target::Command(kind)) => self.run_command(kind, false),
            Some(Target::Directory(path)) => {
                self.session.request_navigation(Navigation::Enter(path));
                Ok(())
            }
            Some(Target::File(path)) => self.open_file(&path),
            None => {
                if let Some(relative) = self.config.alias(token).map(str::to_string) {
                    return self.follow_alias(token, &relative);
                }
                if let Some(base) = token.strip_suffix('!')
                    && let Some(kind) = self.menu.as_ref().and_then(|m| m.command(base)).map(|c| c.kind)
                {
                    return self.run_command(kind, true);
                }
                log::debug!("unresolved token {:?}", token);
                self.display(&[format!("Unknown command: {:?}.", token)])
            }
        }
    }

    fn resolve(&self, token: &str) -> Option<Target> {
        Some(match self.menu.as_ref()?.resolve(token)? {
            Resolution::Command(command) => Target::Command(command.kind),
            Resolution::Asset(asset) if asset.is_directory => Target::Directory(asset.path.clone()),
            Resolution::Asset(asset) => Target::File(asset.path.clone()),
        })
    }

    fn follow_alias(&mut self, token: &str, relative: &str) -> Result<()> {
        let path = classify::normalize(&self.roots.scores.join(relative));
        if path.is_dir() {
            log::debug!("alias {:?} → {}", token, path.display());
            self.session.request_navigation(Navigation::Enter(path));
            Ok(())
        } else if path.is_file() {
            self.open_file(&path)
        } else {
            let shown = self.trim(&path);
            self.display(&[format!("Alias {:?} points at a missing path: {}", token, shown)])
        }
    }

    /// Apply the navigation or backtrack the last handler requested.
    fn settle(&mut self) {
        if let Some(navigation) = self.session.take_navigation() {
            match navigation {
                Navigation::Enter(path) => {
                    // Entering a directory already on the stack unwinds to it.
                    let path = classify::normalize(&path);
                    match self.stack.iter().position(|frame| *frame == path) {
                        Some(index) => self.stack.truncate(index + 1),
                        None => self.stack.push(path),
                    }
                }
                Navigation::Replace(path) => {
                    let path = classify::normalize(&path);
                    if self.stack.len() > 1 {
                        self.stack.pop();
                    }
                    self.stack.push(path);
                }
            }
        } else if let Some(backtrack) = self.session.backtrack() {
            match backtrack {
                Backtrack::Local => {
                    if self.stack.len() > 1 {
                        self.stack.pop();
                    }
                }
                Backtrack::Score => {
                    let Some(score) = classify::enclosing_score(self.current_directory(), &self.roots)
                    else {
                        self.session.clear_backtracking();
                        return;
                    };
                    while self.stack.len() > 1
                        && self.stack.last().is_some_and(|top| *top != score && top.starts_with(&score))
                    {
                        self.stack.pop();
                    }
                    if self.stack.last() != Some(&score) {
                        self.stack.push(score);
                    }
                }
                Backtrack::Scores => self.stack.truncate(1),
            }
        } else {
            return;
        }
        self.enter_top();
    }

    fn enter_top(&mut self) {
        let top = self.current_directory().to_path_buf();
        log::debug!("entering {} (depth {})", top.display(), self.stack.len());
        self.menu = None;
        self.session.enter_directory(&top);
    }

    // ── Handler support ──────────────────────────────────────────────

    fn run_command(&mut self, kind: CommandKind, skip_confirmation: bool) -> Result<()> {
        let Some(handler) = self.handlers.get(&kind).copied() else {
            log::warn!("no handler registered for {:?}", kind);
            return self.display(&[format!("Command not available: {:?}.", kind)]);
        };
        self.session.set_skip_confirmation(skip_confirmation);
        let result = handler(self);
        self.session.set_skip_confirmation(false);
        match result {
            // Only filesystem failures end the session.
            Err(e) if !matches!(e, IdeError::Io(_)) => self.show_error(&e),
            other => other,
        }
    }

    pub(crate) fn open_file(&mut self, path: &Path) -> Result<()> {
        self.open_files(&[path.to_path_buf()])
    }

    /// Hand every path to the launcher in one call.
    pub(crate) fn open_files(&mut self, paths: &[PathBuf]) -> Result<()> {
        if self.suppressed("open") {
            return Ok(());
        }
        if let Err(e) = self.launcher.open(paths) {
            return self.show_error(&e);
        }
        Ok(())
    }

    pub(crate) fn edit_file(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            let shown = self.trim(path);
            return self.display(&[format!("File not found: {}.", shown)]);
        }
        if self.suppressed("edit") {
            return Ok(());
        }
        if let Err(e) = self.launcher.edit(path) {
            return self.show_error(&e);
        }
        Ok(())
    }

    pub fn current_directory(&self) -> &Path {
        self.stack
            .last()
            .map(PathBuf::as_path)
            .unwrap_or_else(|| self.session.current_directory())
    }

    pub(crate) fn kind(&self) -> DirectoryKind {
        classify::classify(self.current_directory(), &self.roots)
    }

    /// Inner directory of the score around the current directory.
    pub(crate) fn score(&self) -> Option<PathBuf> {
        classify::enclosing_score(self.current_directory(), &self.roots)
    }

    pub(crate) fn menu(&self) -> Option<&Menu> {
        self.menu.as_ref()
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// In test mode, record that `what` would have happened and report
    /// `true` so the caller skips the real effect.
    pub(crate) fn suppressed(&mut self, what: &str) -> bool {
        if self.session.is_test() {
            self.session.record_attempt(what);
            true
        } else {
            false
        }
    }

    /// Show a collaborator failure instead of propagating it.
    pub(crate) fn show_error(&mut self, error: &IdeError) -> Result<()> {
        log::warn!("{}", error);
        let lines: Vec<String> = error.to_string().lines().map(str::to_string).collect();
        self.display(&lines)
    }

    /// Lines for the `;` help: the navigation sections of the current menu.
    pub(crate) fn navigation_lines(&self) -> Vec<String> {
        let Some(menu) = &self.menu else {
            return Vec::new();
        };
        menu.sections
            .iter()
            .filter(|s| s.section.is_navigation())
            .flat_map(|s| s.commands.iter())
            .filter(|c| !c.is_hidden)
            .map(|c| format!("      {} ({})", c.description, c.token))
            .collect()
    }
}

impl Interaction for Ide {
    fn display(&mut self, lines: &[String]) -> Result<()> {
        self.session.transcript_mut().record_display(lines);
        self.terminal.display(lines)
    }

    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        let answer = match self.session.next_input() {
            Some(answer) => Some(answer),
            None => self.terminal.prompt(message)?,
        };
        if let Some(answer) = &answer {
            self.session.transcript_mut().record_input(message, answer);
        }
        Ok(answer)
    }

    fn confirm(&mut self, message: &str) -> Result<bool> {
        if self.session.skip_confirmation() {
            return Ok(true);
        }
        let prompt = format!("{} (y/n)", message);
        if self.session.is_test() {
            self.session.transcript_mut().record_input(&prompt, "y");
            return Ok(true);
        }
        let answer = match self.session.next_input() {
            Some(answer) => matches!(answer.trim(), "y" | "yes" | "Y"),
            None => self.terminal.confirm(message)?,
        };
        self.session
            .transcript_mut()
            .record_input(&prompt, if answer { "y" } else { "n" });
        Ok(answer)
    }

    fn request_quit(&mut self) {
        self.session.request_quit();
    }

    /// Paths below a root show relative to it.
    fn trim(&self, path: &Path) -> String {
        match self.roots.root_of(path) {
            Some(root) => match path.strip_prefix(root) {
                Ok(relative) if !relative.as_os_str().is_empty() => relative.display().to_string(),
                _ => path.display().to_string(),
            },
            None => path.display().to_string(),
        }
    }
}

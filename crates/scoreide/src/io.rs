//! The user-facing side of a handler: display, prompt, confirm.

use std::path::Path;

use crate::error::Result;

/// What prompts, getters and the candidate protocol need from their caller.
pub trait Interaction {
    fn display(&mut self, lines: &[String]) -> Result<()>;

    /// One answer, or `None` when input is exhausted.
    fn prompt(&mut self, message: &str) -> Result<Option<String>>;

    fn confirm(&mut self, message: &str) -> Result<bool>;

    /// The user typed the quit token inside a prompt.
    fn request_quit(&mut self) {}

    /// How a path is shown in messages.
    fn trim(&self, path: &Path) -> String {
        path.display().to_string()
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::collections::VecDeque;

    /// Canned answers; records everything shown.
    #[derive(Default)]
    pub struct Scripted {
        pub answers: VecDeque<String>,
        pub shown: Vec<String>,
        pub prompts: Vec<String>,
        pub quit: bool,
    }

    impl Scripted {
        pub fn new(answers: &[&str]) -> Self {
            Scripted {
                answers: answers.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn saw(&self, line: &str) -> bool {
            self.shown.iter().any(|l| l == line)
        }

        pub fn saw_text(&self, text: &str) -> bool {
            self.shown.iter().any(|l| l.contains(text))
        }
    }

    impl Interaction for Scripted {
        fn display(&mut self, lines: &[String]) -> Result<()> {
            self.shown.extend(lines.iter().cloned());
            Ok(())
        }

        fn prompt(&mut self, message: &str) -> Result<Option<String>> {
            self.prompts.push(message.to_string());
            Ok(self.answers.pop_front())
        }

        fn confirm(&mut self, message: &str) -> Result<bool> {
            self.prompts.push(message.to_string());
            Ok(matches!(self.answers.pop_front().as_deref(), Some("y")))
        }

        fn request_quit(&mut self) {
            self.quit = true;
        }
    }
}

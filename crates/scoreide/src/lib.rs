#![doc = include_str!("../README.md")]

pub mod boilerplate;
pub mod candidate;
pub mod classify;
pub mod collaborators;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod getter;
pub mod io;
pub mod listing;
pub mod menu;
pub mod metadata;
pub mod names;
pub mod session;
pub mod transcript;
pub mod view;

mod handlers;

#[cfg(test)]
mod test_support;

pub use boilerplate::Boilerplate;
pub use classify::{DirectoryKind, Roots};
pub use collaborators::{
    Collaborators, Launcher, RenderOutput, Renderer, Repository, TemplateExpander, Terminal,
};
pub use config::{Composer, Configuration};
pub use controller::{Handler, Ide};
pub use error::{IdeError, Result};
pub use io::Interaction;
pub use session::Session;
pub use transcript::Transcript;

//! TOML configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::classify::Roots;
use crate::error::{IdeError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Composer {
    pub full_name: String,
    pub email: String,
    pub github_username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub scores_directory: Option<PathBuf>,
    pub example_scores_directory: Option<PathBuf>,
    pub boilerplate_directory: Option<PathBuf>,
    pub editor: String,
    pub opener: String,
    pub lilypond: String,
    pub latex: String,
    pub python: String,
    pub lilypond_version: String,
    pub lilypond_language: String,
    /// Where the renderer keeps the output of the last LilyPond run.
    pub lilypond_log: Option<PathBuf>,
    pub composer: Composer,
    /// Token → path relative to the scores directory.
    pub aliases: BTreeMap<String, String>,
}

impl Default for Configuration {
    fn default() -> Self {
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        Configuration {
            scores_directory: None,
            example_scores_directory: None,
            boilerplate_directory: None,
            editor: std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string()),
            opener: opener.to_string(),
            lilypond: "lilypond".to_string(),
            latex: "pdflatex".to_string(),
            python: "python3".to_string(),
            lilypond_version: "2.24.0".to_string(),
            lilypond_language: "english".to_string(),
            lilypond_log: None,
            composer: Composer::default(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Configuration {
    pub fn from_toml(text: &str) -> Result<Configuration> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path`, or defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Configuration> {
        if !path.is_file() {
            log::debug!("no configuration at {}, using defaults", path.display());
            return Ok(Configuration::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn with_scores_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.scores_directory = Some(directory.into());
        self
    }

    pub fn with_example_scores_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.example_scores_directory = Some(directory.into());
        self
    }

    /// Resolve and validate the root directories.
    pub fn roots(&self) -> Result<Roots> {
        let scores = self
            .scores_directory
            .clone()
            .ok_or_else(|| IdeError::MissingRoot(PathBuf::from("<unset>")))?;
        if !scores.is_dir() {
            return Err(IdeError::MissingRoot(scores));
        }
        let mut roots = Roots::new(scores);
        if let Some(examples) = &self.example_scores_directory {
            if !examples.is_dir() {
                return Err(IdeError::MissingRoot(examples.clone()));
            }
            roots = roots.with_examples(examples);
        }
        Ok(roots)
    }

    pub fn alias(&self, token: &str) -> Option<&str> {
        self.aliases.get(token).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_configuration() {
        let config = Configuration::from_toml(
            r#"
            scores_directory = "/home/u/scores"
            lilypond_version = "2.25.1"
            lilypond_log = "/home/u/.scoreide/lily.log"

            [composer]
            full_name = "Ada Composer"

            [aliases]
            sti = "stirrings_still/stirrings_still"
            "#,
        )
        .unwrap();
        assert_eq!(config.scores_directory, Some(PathBuf::from("/home/u/scores")));
        assert_eq!(config.lilypond_version, "2.25.1");
        assert_eq!(config.lilypond, "lilypond");
        assert_eq!(config.lilypond_log, Some(PathBuf::from("/home/u/.scoreide/lily.log")));
        assert_eq!(config.composer.full_name, "Ada Composer");
        assert_eq!(config.alias("sti"), Some("stirrings_still/stirrings_still"));
        assert_eq!(config.alias("nope"), None);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Configuration::from_toml("scores_directory = [").unwrap_err();
        assert!(matches!(err, IdeError::Config(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.scores_directory, None);
    }

    #[test]
    fn test_roots_validation() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Configuration::default().roots(),
            Err(IdeError::MissingRoot(_))
        ));
        assert!(matches!(
            Configuration::default()
                .with_scores_directory(dir.path().join("missing"))
                .roots(),
            Err(IdeError::MissingRoot(_))
        ));
        let roots = Configuration::default()
            .with_scores_directory(dir.path())
            .roots()
            .unwrap();
        assert_eq!(roots.home(true), dir.path());
    }
}

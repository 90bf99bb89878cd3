//! Built-in file templates.

use anyhow::anyhow;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::collaborators::TemplateExpander;
use crate::error::Result;

const BUILTIN: &[(&str, &str)] = &[
    ("README.md", include_str!("../boilerplate/README.md")),
    ("back-cover.tex", include_str!("../boilerplate/back-cover.tex")),
    ("definition.py", include_str!("../boilerplate/definition.py")),
    ("front-cover.tex", include_str!("../boilerplate/front-cover.tex")),
    ("music.ly", include_str!("../boilerplate/music.ly")),
    ("preface.tex", include_str!("../boilerplate/preface.tex")),
    ("score.tex", include_str!("../boilerplate/score.tex")),
    ("stylesheet.ily", include_str!("../boilerplate/stylesheet.ily")),
];

/// Templates compiled into the binary, optionally shadowed by files in a
/// user directory of the same name.
#[derive(Debug, Clone, Default)]
pub struct Boilerplate {
    directory: Option<PathBuf>,
}

impl Boilerplate {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn with_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn names() -> Vec<&'static str> {
        BUILTIN.iter().map(|(name, _)| *name).collect()
    }

    /// Raw template text.
    pub fn template(&self, name: &str) -> Result<String> {
        if let Some(directory) = &self.directory {
            let path = directory.join(name);
            if path.is_file() {
                return Ok(std::fs::read_to_string(path)?);
            }
        }
        BUILTIN
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, text)| text.to_string())
            .ok_or_else(|| anyhow!("unknown template: {}", name).into())
    }
}

impl TemplateExpander for Boilerplate {
    fn expand(&self, name: &str, substitutions: &BTreeMap<String, String>) -> Result<Vec<u8>> {
        let mut text = self.template(name)?;
        for (key, value) in substitutions {
            text = text.replace(key.as_str(), value);
        }
        Ok(text.into_bytes())
    }
}

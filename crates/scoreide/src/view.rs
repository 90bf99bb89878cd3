//! Saved views: named, ordered filters over a directory listing.
//!
//! A view is a list of patterns. Each pattern contributes the entries it
//! matches, in pattern order, so a view both restricts and reorders. The
//! pattern language is deliberately closed:
//!
//! ```text
//! pattern := ["not"] field op value
//!          | word                     exact match on the display string
//! field   := "name" | "display" | "path" | "md:" key
//! op      := "==" | "!=" | "^=" | "$=" | "~="
//! value   := word | "quoted string" | 'quoted string'
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::error::{IdeError, Result};
use crate::metadata::{Metadata, display_value};

pub const VIEWS_FILE: &str = "__views__.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Name,
    Display,
    Path,
    Metadata(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    NotEquals,
    Prefix,
    Suffix,
    Contains,
}

const OPERATORS: &[(&str, Op)] = &[
    ("==", Op::Equals),
    ("!=", Op::NotEquals),
    ("^=", Op::Prefix),
    ("$=", Op::Suffix),
    ("~=", Op::Contains),
];

/// What a pattern is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub name: &'a str,
    pub display: &'a str,
    pub path: &'a Path,
    pub metadata: &'a Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub negated: bool,
    pub field: Field,
    pub op: Op,
    pub value: String,
}

impl FromStr for Pattern {
    type Err = IdeError;

    fn from_str(s: &str) -> Result<Pattern> {
        let text = s.trim();
        if text.is_empty() {
            return Err(IdeError::InvalidView("empty pattern".into()));
        }
        let (negated, text) = match text.strip_prefix("not ") {
            Some(rest) => (true, rest.trim_start()),
            None => (false, text),
        };

        let operator = OPERATORS
            .iter()
            .filter_map(|(token, op)| text.find(token).map(|at| (at, *token, *op)))
            .min_by_key(|(at, _, _)| *at);

        let Some((at, token, op)) = operator else {
            return Ok(Pattern {
                negated,
                field: Field::Display,
                op: Op::Equals,
                value: unquote(text).to_string(),
            });
        };

        let field = match text[..at].trim() {
            "name" => Field::Name,
            "display" => Field::Display,
            "path" => Field::Path,
            other => match other.strip_prefix("md:") {
                Some(key) if !key.is_empty() => Field::Metadata(key.to_string()),
                _ => return Err(IdeError::InvalidView(format!("unknown field: {:?}", other))),
            },
        };
        let value = unquote(text[at + token.len()..].trim());
        if value.is_empty() && !text.ends_with("\"\"") && !text.ends_with("''") {
            return Err(IdeError::InvalidView(format!("missing value: {:?}", s)));
        }
        Ok(Pattern {
            negated,
            field,
            op,
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "not ")?;
        }
        let field = match &self.field {
            Field::Name => "name".to_string(),
            Field::Display => "display".to_string(),
            Field::Path => "path".to_string(),
            Field::Metadata(key) => format!("md:{}", key),
        };
        let op = OPERATORS
            .iter()
            .find(|(_, op)| *op == self.op)
            .map(|(token, _)| *token)
            .unwrap_or("==");
        write!(f, "{} {} {:?}", field, op, self.value)
    }
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

impl Pattern {
    pub fn matches(&self, subject: &Subject<'_>) -> bool {
        let path;
        let metadata_value;
        let actual: Option<&str> = match &self.field {
            Field::Name => Some(subject.name),
            Field::Display => Some(subject.display),
            Field::Path => {
                path = subject.path.to_string_lossy();
                Some(path.as_ref())
            }
            Field::Metadata(key) => {
                metadata_value = subject.metadata.get(key).map(display_value);
                metadata_value.as_deref()
            }
        };
        let hit = match (self.op, actual) {
            (Op::NotEquals, None) => true,
            (_, None) => false,
            (Op::Equals, Some(a)) => a == self.value,
            (Op::NotEquals, Some(a)) => a != self.value,
            (Op::Prefix, Some(a)) => a.starts_with(&self.value),
            (Op::Suffix, Some(a)) => a.ends_with(&self.value),
            (Op::Contains, Some(a)) => a.contains(&self.value),
        };
        hit != self.negated
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub name: String,
    pub patterns: Vec<Pattern>,
}

impl View {
    pub fn parse(name: &str, patterns: &[String]) -> Result<View> {
        let patterns = patterns
            .iter()
            .map(|p| p.parse())
            .collect::<Result<Vec<Pattern>>>()?;
        Ok(View {
            name: name.to_string(),
            patterns,
        })
    }

    /// Keep the matching items, ordered by the first pattern that matched.
    pub fn apply<T, F>(&self, items: Vec<T>, subject: F) -> Vec<T>
    where
        F: Fn(&T) -> Subject<'_>,
    {
        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        let mut out = Vec::new();
        for pattern in &self.patterns {
            for slot in slots.iter_mut() {
                let hit = slot.as_ref().is_some_and(|item| pattern.matches(&subject(item)));
                if hit && let Some(item) = slot.take() {
                    out.push(item);
                }
            }
        }
        out
    }
}

/// All views defined for one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewInventory {
    #[serde(default)]
    views: BTreeMap<String, Vec<String>>,
}

impl ViewInventory {
    pub fn load(directory: &Path) -> Result<ViewInventory> {
        let path = directory.join(VIEWS_FILE);
        if !path.is_file() {
            return Ok(ViewInventory::default());
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// [`ViewInventory::load`], except that a views file that is not valid
    /// JSON reads as empty and leaves a line in `warnings`.
    pub fn load_or_warn(directory: &Path, warnings: &mut Vec<String>) -> Result<ViewInventory> {
        match ViewInventory::load(directory) {
            Err(IdeError::Json(e)) => {
                let path = directory.join(VIEWS_FILE);
                log::warn!("can not interpret {}: {}", path.display(), e);
                warnings.push(format!("Can not interpret views {}: {}", path.display(), e));
                Ok(ViewInventory::default())
            }
            other => other,
        }
    }

    pub fn save(&self, directory: &Path) -> Result<()> {
        let path = directory.join(VIEWS_FILE);
        if self.views.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
            return Ok(());
        }
        let mut tmp = tempfile::NamedTempFile::new_in(directory)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.views.keys().cloned().collect()
    }

    pub fn patterns(&self, name: &str) -> Option<&[String]> {
        self.views.get(name).map(Vec::as_slice)
    }

    /// The named view, or `None` if it is missing or no longer parses.
    pub fn view(&self, name: &str) -> Option<View> {
        let patterns = self.views.get(name)?;
        match View::parse(name, patterns) {
            Ok(view) => Some(view),
            Err(e) => {
                log::warn!("ignoring view {:?}: {}", name, e);
                None
            }
        }
    }

    /// Validate and store a view.
    pub fn insert(&mut self, name: &str, patterns: Vec<String>) -> Result<()> {
        View::parse(name, &patterns)?;
        self.views.insert(name.to_string(), patterns);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.views.remove(name).is_some()
    }
}

//! Name coercion and comparison helpers.
//!
//! Everything that turns user input into a filesystem name, or a name into a
//! sort key, goes through here so that every directory kind agrees on the
//! same rules.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::classify::DirectoryKind;

/// Strip diacritics by decomposing and dropping combining marks.
///
/// ```
/// use scoreide::names::strip_diacritics;
///
/// assert_eq!(strip_diacritics("Étude à la mode"), "Etude a la mode");
/// assert_eq!(strip_diacritics("plain"), "plain");
/// ```
pub fn strip_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Comparison key for listing order. Display strings keep their diacritics;
/// only the key is folded.
pub fn sort_key(s: &str) -> String {
    strip_diacritics(s).replace(['\'', '’'], "").to_lowercase()
}

/// Scripted input uses `~` for spaces.
pub fn untilde(token: &str) -> String {
    token.replace('~', " ")
}

/// Lowercase, ASCII-folded, words joined by `_`.
///
/// ```
/// use scoreide::names::to_snake_case;
///
/// assert_eq!(to_snake_case("Red Score"), "red_score");
/// assert_eq!(to_snake_case("  magic-numbers "), "magic_numbers");
/// ```
pub fn to_snake_case(s: &str) -> String {
    join_words(s, '_')
}

/// Lowercase, ASCII-folded, words joined by `-`.
pub fn to_dash_case(s: &str) -> String {
    join_words(s, '-')
}

fn join_words(s: &str, separator: char) -> String {
    let folded = strip_diacritics(s);
    let mut out = String::with_capacity(folded.len());
    let mut pending = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            if pending && !out.is_empty() {
                out.push(separator);
            }
            pending = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending = true;
        }
    }
    out
}

/// How names are coerced for new assets in a directory of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingRule {
    /// `red_score`, `magic_numbers`, `tools.py`
    Snake,
    /// `letter-score`, `front-cover.tex`
    Dash,
    /// Segments keep case: `A`, `01`, `_`
    Segment,
}

impl NamingRule {
    pub fn for_container(kind: DirectoryKind) -> NamingRule {
        match kind {
            DirectoryKind::Segments => NamingRule::Segment,
            DirectoryKind::Builds
            | DirectoryKind::Build
            | DirectoryKind::Distribution
            | DirectoryKind::Stylesheets => NamingRule::Dash,
            _ => NamingRule::Snake,
        }
    }

    /// Coerce a stem (no extension) under this rule. Returns `None` when
    /// nothing usable is left.
    pub fn coerce_stem(self, stem: &str) -> Option<String> {
        let coerced = match self {
            NamingRule::Snake => to_snake_case(stem),
            NamingRule::Dash => to_dash_case(stem),
            NamingRule::Segment => strip_diacritics(stem.trim())
                .chars()
                .map(|c| if c.is_whitespace() { '_' } else { c })
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .collect(),
        };
        if coerced.is_empty() { None } else { Some(coerced) }
    }

    /// Coerce a file name, keeping its extension (or `default_extension`
    /// when the user typed none).
    pub fn coerce_file_name(self, name: &str, default_extension: Option<&str>) -> Option<String> {
        let name = name.trim();
        let (stem, extension) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
            _ => (name, default_extension),
        };
        let stem = self.coerce_stem(stem)?;
        Some(match extension {
            Some(ext) => format!("{}.{}", stem, ext.to_ascii_lowercase()),
            None => stem,
        })
    }
}

/// Reserved infrastructure names never shown in listings.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
        || name.starts_with("__")
        || name.ends_with(".pyc")
        || name.contains(".candidate.")
}

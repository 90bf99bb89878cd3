//! Path classification.
//!
//! Every question of the form "what kind of directory is this" is answered
//! here, lexically, from the path's position under one of the known roots.
//! Nothing is cached: directories can be renamed mid-session, so callers
//! classify again after every navigation.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Directories that live directly inside a score's inner directory.
pub const CONTENTS_DIRECTORIES: &[&str] = &[
    "materials",
    "segments",
    "builds",
    "distribution",
    "stylesheets",
    "tools",
    "test",
];

/// The role a path plays in a scores tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryKind {
    /// The root listing of all scores.
    Scores,
    /// `<scores>/<score>`: the wrapper holding repository files.
    ScoreOuter,
    /// `<scores>/<score>/<score>`: the score contents.
    ScoreInner,
    Materials,
    Material,
    Segments,
    Segment,
    Builds,
    Build,
    Distribution,
    Stylesheets,
    Tools,
    Test,
    /// Anything with an extension at a position no directory kind claims.
    File,
    /// Outside every root, or an unrecognized directory.
    Unknown,
}

impl DirectoryKind {
    pub fn is_package(self) -> bool {
        matches!(
            self,
            DirectoryKind::Material | DirectoryKind::Segment | DirectoryKind::Build
        )
    }

    /// The directory kind whose children are packages of this kind.
    pub fn package_container(self) -> Option<DirectoryKind> {
        match self {
            DirectoryKind::Material | DirectoryKind::Materials => Some(DirectoryKind::Materials),
            DirectoryKind::Segment | DirectoryKind::Segments => Some(DirectoryKind::Segments),
            DirectoryKind::Build | DirectoryKind::Builds => Some(DirectoryKind::Builds),
            _ => None,
        }
    }

    /// Reserved basename of a contents directory kind.
    pub fn contents_name(self) -> Option<&'static str> {
        Some(match self {
            DirectoryKind::Materials => "materials",
            DirectoryKind::Segments => "segments",
            DirectoryKind::Builds => "builds",
            DirectoryKind::Distribution => "distribution",
            DirectoryKind::Stylesheets => "stylesheets",
            DirectoryKind::Tools => "tools",
            DirectoryKind::Test => "test",
            _ => return None,
        })
    }

    fn from_contents_name(name: &str) -> Option<DirectoryKind> {
        Some(match name {
            "materials" => DirectoryKind::Materials,
            "segments" => DirectoryKind::Segments,
            "builds" => DirectoryKind::Builds,
            "distribution" => DirectoryKind::Distribution,
            "stylesheets" => DirectoryKind::Stylesheets,
            "tools" => DirectoryKind::Tools,
            "test" => DirectoryKind::Test,
            _ => return None,
        })
    }
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DirectoryKind::Scores => "scores-root",
            DirectoryKind::ScoreOuter => "score-outer",
            DirectoryKind::ScoreInner => "score-inner",
            DirectoryKind::Materials => "materials-dir",
            DirectoryKind::Material => "material-package",
            DirectoryKind::Segments => "segments-dir",
            DirectoryKind::Segment => "segment-package",
            DirectoryKind::Builds => "builds-dir",
            DirectoryKind::Build => "build-package",
            DirectoryKind::Distribution => "distribution-dir",
            DirectoryKind::Stylesheets => "stylesheets-dir",
            DirectoryKind::Tools => "tools-dir",
            DirectoryKind::Test => "test-dir",
            DirectoryKind::File => "plain-file",
            DirectoryKind::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// The known root directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    pub scores: PathBuf,
    pub examples: Option<PathBuf>,
}

impl Roots {
    pub fn new(scores: impl Into<PathBuf>) -> Self {
        Roots {
            scores: normalize(&scores.into()),
            examples: None,
        }
    }

    pub fn with_examples(mut self, examples: impl Into<PathBuf>) -> Self {
        self.examples = Some(normalize(&examples.into()));
        self
    }

    /// Where navigation starts: the example scores in test mode when
    /// configured, the user's scores otherwise.
    pub fn home(&self, is_test: bool) -> &Path {
        match (&self.examples, is_test) {
            (Some(examples), true) => examples,
            _ => &self.scores,
        }
    }

    /// The root `path` lives under, preferring the deepest match.
    pub fn root_of(&self, path: &Path) -> Option<&Path> {
        let path = normalize(path);
        std::iter::once(&self.scores)
            .chain(self.examples.iter())
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .map(|root| root.as_path())
    }

    /// Path components below the owning root.
    pub fn relative_parts(&self, path: &Path) -> Option<Vec<String>> {
        let root = self.root_of(path)?;
        let path = normalize(path);
        let relative = path.strip_prefix(root).ok()?;
        Some(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect(),
        )
    }
}

/// Lexically resolve `.` and `..` without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Classify `path` against `roots`. Total: never panics, never errors.
pub fn classify(path: &Path, roots: &Roots) -> DirectoryKind {
    let Some(parts) = roots.relative_parts(path) else {
        return DirectoryKind::Unknown;
    };
    let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
    match parts.as_slice() {
        [] => DirectoryKind::Scores,
        [_] => DirectoryKind::ScoreOuter,
        [outer, inner] if outer == inner => DirectoryKind::ScoreInner,
        [outer, inner, contents] if outer == inner => {
            DirectoryKind::from_contents_name(contents).unwrap_or_else(|| file_or_unknown(contents))
        }
        [outer, inner, contents, name] if outer == inner => match *contents {
            "materials" => DirectoryKind::Material,
            "segments" => DirectoryKind::Segment,
            "builds" => DirectoryKind::Build,
            _ => file_or_unknown(name),
        },
        [.., last] => file_or_unknown(last),
    }
}

fn file_or_unknown(name: &str) -> DirectoryKind {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => DirectoryKind::File,
        _ => DirectoryKind::Unknown,
    }
}

/// True iff `path` is at or below a score's inner directory.
pub fn in_score(path: &Path, roots: &Roots) -> bool {
    score_directory(path, roots).is_some()
}

/// The inner directory of the score containing `path`, if `path` is at or
/// below it.
pub fn score_directory(path: &Path, roots: &Roots) -> Option<PathBuf> {
    let root = roots.root_of(path)?.to_path_buf();
    let parts = roots.relative_parts(path)?;
    match parts.as_slice() {
        [outer, inner, ..] if outer == inner => Some(root.join(outer).join(inner)),
        _ => None,
    }
}

/// The inner directory for any path at or below a score wrapper.
pub fn enclosing_score(path: &Path, roots: &Roots) -> Option<PathBuf> {
    let root = roots.root_of(path)?.to_path_buf();
    let parts = roots.relative_parts(path)?;
    let outer = parts.first()?;
    Some(root.join(outer).join(outer))
}

/// The wrapper (outer directory) of the score containing `path`.
pub fn wrapper_directory(path: &Path, roots: &Roots) -> Option<PathBuf> {
    enclosing_score(path, roots).and_then(|inner| inner.parent().map(Path::to_path_buf))
}

/// `<score>/<kind>` for the score containing `path`.
pub fn contents_directory(path: &Path, roots: &Roots, kind: DirectoryKind) -> Option<PathBuf> {
    let name = kind.contents_name()?;
    enclosing_score(path, roots).map(|inner| inner.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> Roots {
        Roots::new("/home/u/scores").with_examples("/opt/ide/scores")
    }

    fn kind(path: &str) -> DirectoryKind {
        classify(Path::new(path), &roots())
    }

    #[test]
    fn test_classify_by_depth() {
        assert_eq!(kind("/home/u/scores"), DirectoryKind::Scores);
        assert_eq!(kind("/home/u/scores/red_score"), DirectoryKind::ScoreOuter);
        assert_eq!(kind("/home/u/scores/red_score/red_score"), DirectoryKind::ScoreInner);
        assert_eq!(kind("/home/u/scores/red_score/README.md"), DirectoryKind::File);
        assert_eq!(kind("/home/u/scores/red_score/other"), DirectoryKind::Unknown);
    }

    #[test]
    fn test_classify_contents_and_packages() {
        let inner = "/home/u/scores/red_score/red_score";
        assert_eq!(kind(&format!("{inner}/materials")), DirectoryKind::Materials);
        assert_eq!(kind(&format!("{inner}/materials/tempi")), DirectoryKind::Material);
        assert_eq!(kind(&format!("{inner}/segments/A")), DirectoryKind::Segment);
        assert_eq!(kind(&format!("{inner}/builds/letter")), DirectoryKind::Build);
        assert_eq!(kind(&format!("{inner}/distribution")), DirectoryKind::Distribution);
        assert_eq!(kind(&format!("{inner}/stylesheets")), DirectoryKind::Stylesheets);
        assert_eq!(kind(&format!("{inner}/tools")), DirectoryKind::Tools);
        assert_eq!(kind(&format!("{inner}/test")), DirectoryKind::Test);
        assert_eq!(kind(&format!("{inner}/tools/helpers.py")), DirectoryKind::File);
        assert_eq!(kind(&format!("{inner}/materials/tempi/definition.py")), DirectoryKind::File);
        assert_eq!(kind(&format!("{inner}/builds/letter/_segments")), DirectoryKind::Unknown);
        assert_eq!(kind(&format!("{inner}/etc")), DirectoryKind::Unknown);
    }

    #[test]
    fn test_classify_outside_roots_is_unknown() {
        assert_eq!(kind("/tmp"), DirectoryKind::Unknown);
        assert_eq!(kind("/home/u"), DirectoryKind::Unknown);
        assert_eq!(kind(""), DirectoryKind::Unknown);
    }

    #[test]
    fn test_classify_mismatched_inner_is_not_score() {
        assert_eq!(
            kind("/home/u/scores/red_score/blue_score/materials"),
            DirectoryKind::Unknown
        );
    }

    #[test]
    fn test_classify_normalizes_parent_components() {
        assert_eq!(
            kind("/home/u/scores/red_score/red_score/materials/../segments"),
            DirectoryKind::Segments
        );
    }

    #[test]
    fn test_example_root() {
        assert_eq!(kind("/opt/ide/scores/blue_score/blue_score"), DirectoryKind::ScoreInner);
        assert_eq!(roots().home(true), Path::new("/opt/ide/scores"));
        assert_eq!(roots().home(false), Path::new("/home/u/scores"));
    }

    #[test]
    fn test_in_score() {
        let r = roots();
        assert!(!in_score(Path::new("/home/u/scores"), &r));
        assert!(!in_score(Path::new("/home/u/scores/red_score"), &r));
        assert!(in_score(Path::new("/home/u/scores/red_score/red_score"), &r));
        assert!(in_score(Path::new("/home/u/scores/red_score/red_score/segments/A"), &r));
    }

    #[test]
    fn test_score_helpers() {
        let r = roots();
        let segment = Path::new("/home/u/scores/red_score/red_score/segments/A");
        assert_eq!(
            contents_directory(segment, &r, DirectoryKind::Builds),
            Some(PathBuf::from("/home/u/scores/red_score/red_score/builds"))
        );
        assert_eq!(
            wrapper_directory(segment, &r),
            Some(PathBuf::from("/home/u/scores/red_score"))
        );
        assert_eq!(
            enclosing_score(Path::new("/home/u/scores/red_score"), &r),
            Some(PathBuf::from("/home/u/scores/red_score/red_score"))
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DirectoryKind::Materials.to_string(), "materials-dir");
        assert_eq!(DirectoryKind::File.to_string(), "plain-file");
    }
}

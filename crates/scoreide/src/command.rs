//! The command registry.
//!
//! Every command is a row of data: its token, where it applies, and which
//! menu section it belongs to. The menu builder filters this table; it never
//! calls a handler to find out whether a command applies.

use std::path::Path;

use crate::classify::DirectoryKind;

/// Every command the controller knows, one variant per handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    // back / home / quit
    Back,
    Home,
    Score,
    Quit,
    Up,
    // system
    ShowCommands,
    ShowNavigation,
    Shell,
    EditLilypondLog,
    // in-score navigation
    Materials,
    Segments,
    Builds,
    Distribution,
    Stylesheets,
    Tools,
    Test,
    Wrapper,
    // siblings
    PreviousPackage,
    NextPackage,
    PreviousScore,
    NextScore,
    // depots
    MaterialsDepot,
    SegmentsDepot,
    BuildsDepot,
    DistributionDepot,
    StylesheetsDepot,
    ToolsDepot,
    TestDepot,
    // basic
    New,
    Copy,
    Rename,
    Remove,
    // git
    GitAdd,
    GitCommit,
    GitStatus,
    GitDiff,
    GitRevert,
    GitUpdate,
    GitAddEvery,
    GitCommitEvery,
    GitStatusEvery,
    GitUpdateEvery,
    // metadata and views
    ShowMetadata,
    EditTitle,
    EditYear,
    ListViews,
    NewView,
    SetView,
    ClearView,
    RenumberSegments,
    // definitions and illustrations
    EditDefinition,
    EditEveryDefinition,
    CheckDefinition,
    CheckEveryDefinition,
    EditIllustration,
    MakeIllustrationLy,
    InterpretEveryLy,
    MakeIllustration,
    MakeEveryIllustration,
    OpenIllustration,
    OpenEveryIllustration,
    // builds
    GenerateMusic,
    InterpretMusic,
    CollectSegments,
    GenerateStylesheet,
    GenerateFrontCover,
    InterpretFrontCover,
    GeneratePreface,
    InterpretPreface,
    GenerateScore,
    InterpretScore,
    GenerateBackCover,
    InterpretBackCover,
    PushScorePdf,
    OpenEveryScorePdf,
    EditScoreStylesheet,
}

/// Menu sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Basic,
    Build,
    Definition,
    Illustration,
    Git,
    Global,
    Metadata,
    View,
    Navigation,
    Sibling,
    Depot,
    System,
    BackHomeQuit,
}

impl Section {
    pub const ORDER: &'static [Section] = &[
        Section::Basic,
        Section::Build,
        Section::Definition,
        Section::Illustration,
        Section::Git,
        Section::Global,
        Section::Metadata,
        Section::View,
        Section::Navigation,
        Section::Sibling,
        Section::Depot,
        Section::System,
        Section::BackHomeQuit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::Basic => "basic",
            Section::Build => "build",
            Section::Definition => "definition",
            Section::Illustration => "illustration",
            Section::Git => "git",
            Section::Global => "star",
            Section::Metadata => "metadata",
            Section::View => "views",
            Section::Navigation => "navigation",
            Section::Sibling => "sibling navigation",
            Section::Depot => "depots",
            Section::System => "system",
            Section::BackHomeQuit => "back-home-quit",
        }
    }

    /// Only the basic section shows without `?`.
    pub fn is_hidden(self) -> bool {
        self != Section::Basic
    }

    /// Sections listed by the `;` navigation help.
    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            Section::Navigation | Section::Sibling | Section::Depot | Section::BackHomeQuit
        )
    }
}

/// A registered command. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub token: &'static str,
    pub description: &'static str,
    pub section: Section,
    /// Directory kinds the command applies to; empty means all.
    pub directories: &'static [DirectoryKind],
    /// `Some(true)`: only in a score. `Some(false)`: only outside. `None`: both.
    pub in_score: Option<bool>,
    pub is_hidden: bool,
    /// A file that must exist in the current directory.
    pub required_file: Option<&'static str>,
    /// Token of the single-asset command this one repeats over many.
    pub bulk_variant_of: Option<&'static str>,
}

impl Command {
    pub fn applies(&self, kind: DirectoryKind, in_score: bool, directory: &Path) -> bool {
        (self.directories.is_empty() || self.directories.contains(&kind))
            && self.in_score.is_none_or(|required| required == in_score)
            && self
                .required_file
                .is_none_or(|file| directory.join(file).is_file())
    }

    pub fn is_bulk(&self) -> bool {
        self.bulk_variant_of.is_some()
    }
}

use DirectoryKind as K;

const CONTAINERS: &[DirectoryKind] = &[
    K::Materials,
    K::Segments,
    K::Builds,
    K::Distribution,
    K::Stylesheets,
    K::Tools,
    K::Test,
];

const LISTINGS: &[DirectoryKind] = &[
    K::Scores,
    K::Materials,
    K::Segments,
    K::Builds,
    K::Distribution,
    K::Stylesheets,
    K::Tools,
    K::Test,
];

const MANAGED: &[DirectoryKind] = &[
    K::Scores,
    K::Materials,
    K::Material,
    K::Segments,
    K::Segment,
    K::Builds,
    K::Build,
    K::Distribution,
    K::Stylesheets,
    K::Tools,
    K::Test,
    K::Unknown,
];

const BELOW_ROOT: &[DirectoryKind] = &[
    K::ScoreOuter,
    K::ScoreInner,
    K::Materials,
    K::Material,
    K::Segments,
    K::Segment,
    K::Builds,
    K::Build,
    K::Distribution,
    K::Stylesheets,
    K::Tools,
    K::Test,
    K::Unknown,
];

const PACKAGE_CONTAINERS: &[DirectoryKind] = &[K::Materials, K::Segments, K::Builds];
const PACKAGES_AND_CONTAINERS: &[DirectoryKind] = &[
    K::Materials,
    K::Material,
    K::Segments,
    K::Segment,
    K::Builds,
    K::Build,
];
const DEFINED_PACKAGES: &[DirectoryKind] = &[K::Material, K::Segment];
const DEFINED_CONTAINERS: &[DirectoryKind] = &[K::Materials, K::Segments];

const fn command(
    kind: CommandKind,
    token: &'static str,
    description: &'static str,
    section: Section,
    directories: &'static [DirectoryKind],
) -> Command {
    Command {
        kind,
        token,
        description,
        section,
        directories,
        in_score: None,
        is_hidden: false,
        required_file: None,
        bulk_variant_of: None,
    }
}

const fn in_score(mut c: Command) -> Command {
    c.in_score = Some(true);
    c
}

const fn requires(mut c: Command, file: &'static str) -> Command {
    c.required_file = Some(file);
    c
}

const fn bulk(mut c: Command, of: &'static str) -> Command {
    c.bulk_variant_of = Some(of);
    c
}

const fn hidden(mut c: Command) -> Command {
    c.is_hidden = true;
    c
}

use CommandKind as C;
use Section as S;

const COMMANDS: &[Command] = &[
    // basic
    command(C::New, "new", "new", S::Basic, MANAGED),
    command(C::Copy, "cp", "copy", S::Basic, CONTAINERS),
    command(C::Rename, "ren", "rename", S::Basic, LISTINGS),
    command(C::Remove, "rm", "remove", S::Basic, LISTINGS),
    // build
    command(C::GenerateMusic, "mlg", "music.ly - generate", S::Build, &[K::Build]),
    command(C::InterpretMusic, "mli", "music.ly - interpret", S::Build, &[K::Build]),
    command(C::CollectSegments, "ggc", "segment lys - collect", S::Build, &[K::Build]),
    command(C::GenerateStylesheet, "ssig", "stylesheet.ily - generate", S::Build, &[K::Build]),
    command(C::GenerateFrontCover, "fcg", "front cover - generate", S::Build, &[K::Build]),
    command(C::InterpretFrontCover, "fci", "front cover - interpret", S::Build, &[K::Build]),
    command(C::GeneratePreface, "pfg", "preface - generate", S::Build, &[K::Build]),
    command(C::InterpretPreface, "pfi", "preface - interpret", S::Build, &[K::Build]),
    command(C::GenerateScore, "scg", "score - generate", S::Build, &[K::Build]),
    command(C::InterpretScore, "sci", "score - interpret", S::Build, &[K::Build]),
    command(C::GenerateBackCover, "bcg", "back cover - generate", S::Build, &[K::Build]),
    command(C::InterpretBackCover, "bci", "back cover - interpret", S::Build, &[K::Build]),
    command(C::PushScorePdf, "spp", "score pdf - push to distribution", S::Build, &[K::Build]),
    in_score(command(C::EditScoreStylesheet, "sty", "stylesheet - edit", S::Build, &[])),
    // definition
    command(C::EditDefinition, "df", "definition - edit", S::Definition, DEFINED_PACKAGES),
    bulk(
        command(C::EditEveryDefinition, "df*", "definition - edit every", S::Definition, DEFINED_CONTAINERS),
        "df",
    ),
    command(C::CheckDefinition, "dfk", "definition - check", S::Definition, DEFINED_PACKAGES),
    bulk(
        command(C::CheckEveryDefinition, "dfk*", "definition - check every", S::Definition, DEFINED_CONTAINERS),
        "dfk",
    ),
    // illustration
    command(C::EditIllustration, "lye", "illustration.ly - edit", S::Illustration, DEFINED_PACKAGES),
    requires(
        command(C::MakeIllustrationLy, "lym", "illustration.ly - make", S::Illustration, &[K::Material]),
        "definition.py",
    ),
    bulk(
        command(C::InterpretEveryLy, "lyi*", "illustration.ly - interpret every", S::Illustration, DEFINED_CONTAINERS),
        "pdfm",
    ),
    command(C::MakeIllustration, "pdfm", "illustration.pdf - make", S::Illustration, DEFINED_PACKAGES),
    bulk(
        command(C::MakeEveryIllustration, "pdfm*", "illustration.pdf - make every", S::Illustration, DEFINED_CONTAINERS),
        "pdfm",
    ),
    requires(
        command(C::OpenIllustration, "pdfo", "illustration.pdf - open", S::Illustration, DEFINED_PACKAGES),
        "illustration.pdf",
    ),
    bulk(
        command(C::OpenEveryIllustration, "io*", "illustration.pdf - open every", S::Illustration, DEFINED_CONTAINERS),
        "pdfo",
    ),
    // git
    in_score(command(C::GitAdd, "add", "git - add", S::Git, &[])),
    in_score(command(C::GitCommit, "ci", "git - commit", S::Git, &[])),
    in_score(command(C::GitStatus, "st", "git - status", S::Git, &[])),
    in_score(command(C::GitDiff, "diff", "git - diff", S::Git, &[])),
    in_score(command(C::GitRevert, "rev", "git - revert", S::Git, &[])),
    in_score(command(C::GitUpdate, "up", "git - update", S::Git, &[])),
    bulk(command(C::GitAddEvery, "add*", "git - add every score", S::Global, &[K::Scores]), "add"),
    bulk(command(C::GitCommitEvery, "ci*", "git - commit every score", S::Global, &[K::Scores]), "ci"),
    bulk(command(C::GitStatusEvery, "st*", "git - status of every score", S::Global, &[K::Scores]), "st"),
    bulk(command(C::GitUpdateEvery, "up*", "git - update every score", S::Global, &[K::Scores]), "up"),
    command(C::OpenEveryScorePdf, "so*", "score pdf - open every", S::Global, &[K::Scores]),
    // metadata
    command(C::ShowMetadata, "md", "metadata - show", S::Metadata, &[]),
    command(C::EditTitle, "ti", "metadata - edit title", S::Metadata, &[K::ScoreInner]),
    command(C::EditYear, "yr", "metadata - edit year", S::Metadata, &[K::ScoreInner]),
    command(C::RenumberSegments, "sn", "segments - renumber", S::Metadata, &[K::Segments]),
    // views
    command(C::ListViews, "wl", "views - list", S::View, LISTINGS),
    command(C::NewView, "wn", "views - new", S::View, LISTINGS),
    command(C::SetView, "ws", "views - set", S::View, LISTINGS),
    command(C::ClearView, "wc", "views - clear", S::View, LISTINGS),
    // navigation
    in_score(command(C::Materials, "mm", "go to materials", S::Navigation, &[])),
    in_score(command(C::Segments, "gg", "go to segments", S::Navigation, &[])),
    in_score(command(C::Builds, "bb", "go to builds", S::Navigation, &[])),
    in_score(command(C::Distribution, "dd", "go to distribution", S::Navigation, &[])),
    in_score(command(C::Stylesheets, "yy", "go to stylesheets", S::Navigation, &[])),
    in_score(command(C::Tools, "oo", "go to tools", S::Navigation, &[])),
    in_score(command(C::Test, "tt", "go to test", S::Navigation, &[])),
    in_score(command(C::Wrapper, "ww", "go to wrapper", S::Navigation, &[])),
    // siblings
    command(C::PreviousPackage, "<", "previous package", S::Sibling, PACKAGES_AND_CONTAINERS),
    command(C::NextPackage, ">", "next package", S::Sibling, PACKAGES_AND_CONTAINERS),
    command(C::PreviousScore, "<<", "previous score", S::Sibling, &[]),
    command(C::NextScore, ">>", "next score", S::Sibling, &[]),
    // depots
    command(C::MaterialsDepot, "hhm", "depot - materials", S::Depot, &[]),
    command(C::SegmentsDepot, "hhg", "depot - segments", S::Depot, &[]),
    command(C::BuildsDepot, "hhb", "depot - builds", S::Depot, &[]),
    command(C::DistributionDepot, "hhd", "depot - distribution", S::Depot, &[]),
    command(C::StylesheetsDepot, "hhy", "depot - stylesheets", S::Depot, &[]),
    command(C::ToolsDepot, "hho", "depot - tools", S::Depot, &[]),
    command(C::TestDepot, "hht", "depot - test", S::Depot, &[]),
    // system
    command(C::ShowCommands, "?", "show all commands", S::System, &[]),
    command(C::ShowNavigation, ";", "show navigation commands", S::System, &[]),
    command(C::Shell, "!", "shell command", S::System, &[]),
    command(C::EditLilypondLog, "log", "LilyPond log - edit", S::System, &[]),
    // back / home / quit
    command(C::Back, "b", "back", S::BackHomeQuit, &[]),
    command(C::Home, "h", "home", S::BackHomeQuit, &[]),
    in_score(command(C::Score, "s", "score", S::BackHomeQuit, &[])),
    command(C::Up, "..", "up", S::BackHomeQuit, BELOW_ROOT),
    hidden(command(C::Quit, "q", "quit", S::BackHomeQuit, &[])),
];

/// The full, static command table.
#[derive(Debug, Clone)]
pub struct Registry {
    commands: &'static [Command],
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

impl Registry {
    pub fn standard() -> Self {
        Registry { commands: COMMANDS }
    }

    pub fn commands(&self) -> &'static [Command] {
        self.commands
    }

    pub fn find(&self, token: &str) -> Option<&'static Command> {
        self.commands.iter().find(|c| c.token == token)
    }

    pub fn get(&self, kind: CommandKind) -> Option<&'static Command> {
        self.commands.iter().find(|c| c.kind == kind)
    }

    /// Commands that apply in `directory`, in table order.
    pub fn applicable<'a>(
        &'a self,
        kind: DirectoryKind,
        in_score: bool,
        directory: &'a Path,
    ) -> impl Iterator<Item = &'static Command> + 'a {
        self.commands
            .iter()
            .filter(move |c| c.applies(kind, in_score, directory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_unique() {
        let registry = Registry::standard();
        let mut seen = HashSet::new();
        for c in registry.commands() {
            assert!(seen.insert(c.token), "duplicate token {}", c.token);
        }
    }

    #[test]
    fn test_every_kind_registered_once() {
        let registry = Registry::standard();
        let kinds: HashSet<CommandKind> = registry.commands().iter().map(|c| c.kind).collect();
        assert_eq!(kinds.len(), registry.commands().len());
    }

    #[test]
    fn test_bulk_variants_point_at_real_tokens() {
        let registry = Registry::standard();
        for c in registry.commands().iter().filter(|c| c.is_bulk()) {
            let of = c.bulk_variant_of.unwrap();
            assert!(registry.find(of).is_some(), "{} is bulk of missing {}", c.token, of);
        }
    }

    #[test]
    fn test_in_score_predicate() {
        let ci = Registry::standard().find("ci").unwrap();
        let dir = Path::new("/nonexistent");
        assert!(ci.applies(DirectoryKind::Materials, true, dir));
        assert!(!ci.applies(DirectoryKind::Scores, false, dir));
    }

    #[test]
    fn test_required_file_predicate() {
        let dir = tempfile::tempdir().unwrap();
        let pdfo = Registry::standard().find("pdfo").unwrap();
        assert!(!pdfo.applies(DirectoryKind::Material, true, dir.path()));
        std::fs::write(dir.path().join("illustration.pdf"), b"%PDF").unwrap();
        assert!(pdfo.applies(DirectoryKind::Material, true, dir.path()));
    }

    #[test]
    fn test_make_ly_only_in_defined_materials() {
        let dir = tempfile::tempdir().unwrap();
        let lym = Registry::standard().find("lym").unwrap();
        std::fs::write(dir.path().join("definition.py"), "").unwrap();
        assert!(lym.applies(DirectoryKind::Material, true, dir.path()));
        assert!(!lym.applies(DirectoryKind::Segment, true, dir.path()));
        assert!(!lym.applies(DirectoryKind::Material, true, Path::new("/nonexistent")));
    }

    #[test]
    fn test_only_basic_is_visible_by_default() {
        assert!(!Section::Basic.is_hidden());
        assert!(Section::Git.is_hidden());
        assert!(Section::BackHomeQuit.is_navigation());
        assert!(!Section::Git.is_navigation());
    }

    #[test]
    fn test_applicable_at_scores_root() {
        let registry = Registry::standard();
        let tokens: Vec<&str> = registry
            .applicable(DirectoryKind::Scores, false, Path::new("/nonexistent"))
            .map(|c| c.token)
            .collect();
        assert!(tokens.contains(&"new"));
        assert!(tokens.contains(&"ci*"));
        assert!(tokens.contains(&"so*"));
        assert!(tokens.contains(&"log"));
        assert!(!tokens.contains(&"ci"));
        assert!(!tokens.contains(&"sty"));
        assert!(!tokens.contains(&"mm"));
        assert!(!tokens.contains(&".."));
        assert!(tokens.contains(&"q"));
    }
}

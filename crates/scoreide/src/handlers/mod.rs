//! Command handlers, one function per [`CommandKind`].

pub(crate) mod build;
pub(crate) mod files;
pub(crate) mod git;
pub(crate) mod illustrate;
pub(crate) mod metadata;
pub(crate) mod navigation;

use std::collections::HashMap;

use crate::command::CommandKind;
use crate::controller::Handler;

/// The dispatch table, built once per [`Ide`](crate::Ide).
pub(crate) fn table() -> HashMap<CommandKind, Handler> {
    use CommandKind as C;
    let entries: &[(CommandKind, Handler)] = &[
        (C::Back, navigation::back),
        (C::Home, navigation::home),
        (C::Score, navigation::score),
        (C::Quit, navigation::quit),
        (C::Up, navigation::up),
        (C::ShowCommands, navigation::show_commands),
        (C::ShowNavigation, navigation::show_navigation),
        (C::Shell, navigation::shell),
        (C::EditLilypondLog, build::edit_lilypond_log),
        (C::Materials, navigation::materials),
        (C::Segments, navigation::segments),
        (C::Builds, navigation::builds),
        (C::Distribution, navigation::distribution),
        (C::Stylesheets, navigation::stylesheets),
        (C::Tools, navigation::tools),
        (C::Test, navigation::test),
        (C::Wrapper, navigation::wrapper),
        (C::PreviousPackage, navigation::previous_package),
        (C::NextPackage, navigation::next_package),
        (C::PreviousScore, navigation::previous_score),
        (C::NextScore, navigation::next_score),
        (C::MaterialsDepot, navigation::materials_depot),
        (C::SegmentsDepot, navigation::segments_depot),
        (C::BuildsDepot, navigation::builds_depot),
        (C::DistributionDepot, navigation::distribution_depot),
        (C::StylesheetsDepot, navigation::stylesheets_depot),
        (C::ToolsDepot, navigation::tools_depot),
        (C::TestDepot, navigation::test_depot),
        (C::New, files::new),
        (C::Copy, files::copy),
        (C::Rename, files::rename),
        (C::Remove, files::remove),
        (C::GitAdd, git::add),
        (C::GitCommit, git::commit),
        (C::GitStatus, git::status),
        (C::GitDiff, git::diff),
        (C::GitRevert, git::revert),
        (C::GitUpdate, git::update),
        (C::GitAddEvery, git::add_every),
        (C::GitCommitEvery, git::commit_every),
        (C::GitStatusEvery, git::status_every),
        (C::GitUpdateEvery, git::update_every),
        (C::ShowMetadata, metadata::show),
        (C::EditTitle, metadata::edit_title),
        (C::EditYear, metadata::edit_year),
        (C::ListViews, metadata::list_views),
        (C::NewView, metadata::new_view),
        (C::SetView, metadata::set_view),
        (C::ClearView, metadata::clear_view),
        (C::RenumberSegments, metadata::renumber_segments),
        (C::EditDefinition, illustrate::edit_definition),
        (C::EditEveryDefinition, illustrate::edit_every_definition),
        (C::CheckDefinition, illustrate::check_definition),
        (C::CheckEveryDefinition, illustrate::check_every_definition),
        (C::EditIllustration, illustrate::edit_illustration),
        (C::MakeIllustrationLy, illustrate::make_illustration_ly),
        (C::InterpretEveryLy, illustrate::interpret_every_ly),
        (C::MakeIllustration, illustrate::make_illustration),
        (C::MakeEveryIllustration, illustrate::make_every_illustration),
        (C::OpenIllustration, illustrate::open_illustration),
        (C::OpenEveryIllustration, illustrate::open_every_illustration),
        (C::GenerateMusic, build::generate_music),
        (C::InterpretMusic, build::interpret_music),
        (C::CollectSegments, build::collect_segments),
        (C::GenerateStylesheet, build::generate_stylesheet),
        (C::GenerateFrontCover, build::generate_front_cover),
        (C::InterpretFrontCover, build::interpret_front_cover),
        (C::GeneratePreface, build::generate_preface),
        (C::InterpretPreface, build::interpret_preface),
        (C::GenerateScore, build::generate_score),
        (C::InterpretScore, build::interpret_score),
        (C::GenerateBackCover, build::generate_back_cover),
        (C::InterpretBackCover, build::interpret_back_cover),
        (C::PushScorePdf, build::push_score_pdf),
        (C::OpenEveryScorePdf, build::open_every_score_pdf),
        (C::EditScoreStylesheet, build::edit_score_stylesheet),
    ];
    entries.iter().copied().collect()
}

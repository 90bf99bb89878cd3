//! Build packages: generate the LilyPond and LaTeX sources of a printed
//! score, collect segment illustrations, and interpret the results.

use chrono::Datelike;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::candidate::{self, Overwrite};
use crate::classify::Roots;
use crate::controller::Ide;
use crate::error::Result;
use crate::handlers::illustrate;
use crate::io::Interaction;
use crate::listing;
use crate::metadata::{Metadata, display_value, keys};
use crate::names;

const SEGMENTS_DIRECTORY: &str = "_segments";
const DEFAULT_PAPER_SIZE: &str = "letter";

/// Template substitutions for `score`, and for `build` when generating
/// inside one.
pub(crate) fn substitutions(
    ide: &Ide,
    score: &Path,
    build: Option<&Path>,
) -> Result<BTreeMap<String, String>> {
    let config = ide.configuration();
    let score_metadata = Metadata::load(score)?;
    let build_metadata = match build {
        Some(build) => Metadata::load(build)?,
        None => Metadata::default(),
    };
    let paper_size = build_metadata
        .get_str(keys::PAPER_SIZE)
        .unwrap_or(DEFAULT_PAPER_SIZE)
        .to_string();
    let title = score_metadata
        .get_str(keys::TITLE)
        .map(str::to_string)
        .unwrap_or_else(|| listing::basename(score));
    let year = score_metadata
        .get(keys::YEAR)
        .map(display_value)
        .unwrap_or_else(|| chrono::Local::now().year().to_string());

    let mut out = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        out.insert(key.to_string(), value);
    };
    put("SCORE_TITLE", title);
    put("SCORE_YEAR", year);
    put(
        "FORCES_TAGLINE",
        score_metadata
            .get_str(keys::FORCES_TAGLINE)
            .unwrap_or_default()
            .to_string(),
    );
    put("LATEX_PAPER", format!("{}paper", paper_size));
    put("PAPER_SIZE", paper_size);
    put("LILYPOND_VERSION", config.lilypond_version.clone());
    put("LILYPOND_LANGUAGE", config.lilypond_language.clone());
    put("COMPOSER_NAME", config.composer.full_name.clone());
    put("COMPOSER_EMAIL", config.composer.email.clone());
    put("COMPOSER_GITHUB", config.composer.github_username.clone());
    if let Some(build) = build {
        let include = r#"\include "stylesheet.ily""#;
        put(
            "STYLESHEET_INCLUDE",
            if build.join("stylesheet.ily").is_file() {
                include.to_string()
            } else {
                format!("%{}", include)
            },
        );
        put("SEGMENT_INCLUDES", segment_includes(score, build, ide.roots())?);
    }
    Ok(out)
}

/// One include per visible segment, commented out until collected.
fn segment_includes(score: &Path, build: &Path, roots: &Roots) -> Result<String> {
    let mut lines = Vec::new();
    for segment in listing::visible_directories(&score.join("segments"), roots)? {
        let file_name = format!("segment-{}.ly", listing::basename(&segment));
        let comment = if build.join(SEGMENTS_DIRECTORY).join(&file_name).is_file() {
            ""
        } else {
            "%"
        };
        lines.push(format!(
            "{}        \\include \"{}/{}\"",
            comment, SEGMENTS_DIRECTORY, file_name
        ));
    }
    Ok(lines.join("\n"))
}

/// Expand `template`, showing the failure instead of propagating it.
pub(crate) fn expand(
    ide: &mut Ide,
    template: &str,
    substitutions: &BTreeMap<String, String>,
) -> Result<Option<Vec<u8>>> {
    match ide.templates.expand(template, substitutions) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) => {
            ide.show_error(&e)?;
            Ok(None)
        }
    }
}

fn generate(ide: &mut Ide, template: &str, file_name: &str) -> Result<()> {
    let build = ide.current_directory().to_path_buf();
    let Some(score) = ide.score() else {
        return Ok(());
    };
    let destination = build.join(file_name);
    let shown = ide.trim(&destination);
    ide.display(&[format!("Generating {} ...", shown)])?;
    let substitutions = substitutions(ide, &score, Some(&build))?;
    let Some(bytes) = expand(ide, template, &substitutions)? else {
        return Ok(());
    };
    candidate::make_candidate(ide, &destination, Overwrite::Prompt, candidate::write_bytes(&bytes))?;
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

fn interpret(ide: &mut Ide, source_name: &str) -> Result<()> {
    let build = ide.current_directory().to_path_buf();
    let source = build.join(source_name);
    let destination = source.with_extension("pdf");
    illustrate::interpret(ide, &source, &destination, Overwrite::Prompt)
}

pub(crate) fn generate_music(ide: &mut Ide) -> Result<()> {
    generate(ide, "music.ly", "music.ly")
}

pub(crate) fn interpret_music(ide: &mut Ide) -> Result<()> {
    interpret(ide, "music.ly")
}

pub(crate) fn generate_stylesheet(ide: &mut Ide) -> Result<()> {
    generate(ide, "stylesheet.ily", "stylesheet.ily")
}

pub(crate) fn generate_front_cover(ide: &mut Ide) -> Result<()> {
    generate(ide, "front-cover.tex", "front-cover.tex")
}

pub(crate) fn interpret_front_cover(ide: &mut Ide) -> Result<()> {
    interpret(ide, "front-cover.tex")
}

pub(crate) fn generate_preface(ide: &mut Ide) -> Result<()> {
    generate(ide, "preface.tex", "preface.tex")
}

pub(crate) fn interpret_preface(ide: &mut Ide) -> Result<()> {
    interpret(ide, "preface.tex")
}

pub(crate) fn generate_score(ide: &mut Ide) -> Result<()> {
    generate(ide, "score.tex", "score.tex")
}

pub(crate) fn interpret_score(ide: &mut Ide) -> Result<()> {
    interpret(ide, "score.tex")
}

pub(crate) fn generate_back_cover(ide: &mut Ide) -> Result<()> {
    generate(ide, "back-cover.tex", "back-cover.tex")
}

pub(crate) fn interpret_back_cover(ide: &mut Ide) -> Result<()> {
    interpret(ide, "back-cover.tex")
}

/// Copy every segment's `illustration.ly` into the build's `_segments`.
pub(crate) fn collect_segments(ide: &mut Ide) -> Result<()> {
    let build = ide.current_directory().to_path_buf();
    let Some(score) = ide.score() else {
        return Ok(());
    };
    let target = build.join(SEGMENTS_DIRECTORY);
    std::fs::create_dir_all(&target)?;
    for segment in listing::visible_directories(&score.join("segments"), ide.roots())? {
        let source = segment.join("illustration.ly");
        if !source.is_file() {
            let shown = ide.trim(&source);
            ide.display(&[format!("Skipping {}: file not found.", shown)])?;
            continue;
        }
        let bytes = std::fs::read(&source)?;
        let destination = target.join(format!("segment-{}.ly", listing::basename(&segment)));
        candidate::make_candidate(ide, &destination, Overwrite::Always, candidate::write_bytes(&bytes))?;
    }
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

/// Copy `score.pdf` to the distribution directory as
/// `<score>-<build>-score.pdf`.
pub(crate) fn push_score_pdf(ide: &mut Ide) -> Result<()> {
    let build = ide.current_directory().to_path_buf();
    let Some(score) = ide.score() else {
        return Ok(());
    };
    let source = build.join("score.pdf");
    if !source.is_file() {
        let shown = ide.trim(&source);
        return ide.display(&[format!("File not found: {}.", shown)]);
    }
    let name = format!(
        "{}-{}-score.pdf",
        names::to_dash_case(&listing::basename(&score)),
        listing::basename(&build)
    );
    let destination = score.join("distribution").join(name);
    let bytes = std::fs::read(&source)?;
    candidate::make_candidate(ide, &destination, Overwrite::Prompt, candidate::write_bytes(&bytes))?;
    Ok(())
}

/// The score pdf of `score`: the first `*score.pdf` in distribution, else
/// the first build that has a `score.pdf`.
fn score_pdf(score: &Path, roots: &Roots) -> Result<Option<PathBuf>> {
    let distributed = listing::visible(&score.join("distribution"), roots)?
        .into_iter()
        .find(|l| !l.is_directory && l.name.ends_with("score.pdf"))
        .map(|l| l.path);
    if distributed.is_some() {
        return Ok(distributed);
    }
    Ok(listing::visible_directories(&score.join("builds"), roots)?
        .into_iter()
        .map(|build| build.join("score.pdf"))
        .find(|pdf| pdf.is_file()))
}

pub(crate) fn open_every_score_pdf(ide: &mut Ide) -> Result<()> {
    let home = ide.current_directory().to_path_buf();
    let mut paths = Vec::new();
    for score in listing::visible_directories(&home, ide.roots())? {
        if let Some(pdf) = score_pdf(&score, ide.roots())? {
            paths.push(pdf);
        }
    }
    if !illustrate::confirm_every(ide, "open", &paths, "score.pdf")? {
        return Ok(());
    }
    ide.open_files(&paths)
}

/// Edit `stylesheets/stylesheet.ily`, creating it empty when missing.
pub(crate) fn edit_score_stylesheet(ide: &mut Ide) -> Result<()> {
    let Some(score) = ide.score() else {
        return Ok(());
    };
    let stylesheets = score.join("stylesheets");
    let path = stylesheets.join("stylesheet.ily");
    if !path.is_file() {
        std::fs::create_dir_all(&stylesheets)?;
        std::fs::write(&path, "")?;
        log::info!("created {}", path.display());
        ide.session_mut().request_menu_rebuild();
    }
    ide.edit_file(&path)
}

pub(crate) fn edit_lilypond_log(ide: &mut Ide) -> Result<()> {
    let Some(path) = ide.configuration().lilypond_log.clone() else {
        return ide.display(&["No LilyPond log configured.".to_string()]);
    };
    ide.edit_file(&path)
}

#[cfg(test)]
mod tests {
    use crate::collaborators::Collaborators;
    use crate::controller::Ide;
    use crate::test_support::Fixture;

    #[test]
    fn test_music_includes_track_collected_segments() {
        let fx = Fixture::new();
        let letter = fx.red().join("builds/letter");
        let mut ide = fx.ide();

        ide.run(Some("red bb letter mlg q")).unwrap();
        let music = std::fs::read_to_string(letter.join("music.ly")).unwrap();
        assert!(music.contains("%        \\include \"_segments/segment-A.ly\""));
        assert!(music.contains("title = \"Red Score\""));
        assert!(music.contains("subtitle = \"for piano\""));
        assert!(music.contains("#(set-paper-size \"letter\")"));
        assert!(music.contains("\\version \"2.24.0\""));

        ide.run(Some("red bb letter ggc mlg q")).unwrap();
        assert!(letter.join("_segments/segment-_.ly").is_file());
        assert!(letter.join("_segments/segment-B.ly").is_file());
        let music = std::fs::read_to_string(letter.join("music.ly")).unwrap();
        assert!(music.contains("\n        \\include \"_segments/segment-A.ly\""));
        assert!(ide.transcript().contains_text("... compare differently."));
        assert!(
            ide.transcript()
                .contains("Overwriting red_score/red_score/builds/letter/music.ly ...")
        );
    }

    #[test]
    fn test_collect_overwrites_without_asking() {
        let fx = Fixture::new();
        let collected = fx.red().join("builds/letter/_segments/segment-A.ly");
        let mut ide = fx.ide();
        ide.run(Some("red bb letter ggc q")).unwrap();
        std::fs::write(fx.red().join("segments/A/illustration.ly"), "\\score { d'1 }\n").unwrap();
        ide.run(Some("red bb letter ggc q")).unwrap();
        assert_eq!(std::fs::read_to_string(collected).unwrap(), "\\score { d'1 }\n");
        assert!(!ide.transcript().contains_text("(y/n)"));
    }

    #[test]
    fn test_stylesheet_and_covers() {
        let fx = Fixture::new();
        let letter = fx.red().join("builds/letter");
        let mut ide = fx.ide();
        ide.run(Some("red bb letter ssig fcg bcg pfg scg q")).unwrap();
        let stylesheet = std::fs::read_to_string(letter.join("stylesheet.ily")).unwrap();
        assert!(stylesheet.contains("#(set-default-paper-size \"letter\")"));
        let front = std::fs::read_to_string(letter.join("front-cover.tex")).unwrap();
        assert!(front.contains("\\usepackage[letterpaper]{geometry}"));
        assert!(front.contains("{\\Huge Red Score}"));
        for name in ["back-cover.tex", "preface.tex", "score.tex"] {
            assert!(letter.join(name).is_file(), "missing {}", name);
        }
        assert!(
            ide.transcript()
                .contains("Generating red_score/red_score/builds/letter/front-cover.tex ...")
        );
    }

    #[test]
    fn test_stylesheet_include_follows_file() {
        let fx = Fixture::new();
        let letter = fx.red().join("builds/letter");
        let mut ide = fx.ide();
        ide.run(Some("red bb letter ssig mlg q")).unwrap();
        let music = std::fs::read_to_string(letter.join("music.ly")).unwrap();
        assert!(music.contains("\n\\include \"stylesheet.ily\""));
    }

    #[test]
    fn test_interpret_is_attempted_in_test_mode() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("red bb letter mli q")).unwrap();
        assert!(
            ide.transcript()
                .contains("File not found: red_score/red_score/builds/letter/music.ly.")
        );
        ide.run(Some("red bb letter mlg mli q")).unwrap();
        assert!(ide.session().has_attempted("render"));
    }

    #[test]
    fn test_push_score_pdf() {
        let fx = Fixture::new();
        let letter = fx.red().join("builds/letter");
        let mut ide = fx.ide();
        ide.run(Some("red bb letter spp q")).unwrap();
        assert!(
            ide.transcript()
                .contains("File not found: red_score/red_score/builds/letter/score.pdf.")
        );
        std::fs::write(letter.join("score.pdf"), b"%PDF-1.4\n").unwrap();
        ide.run(Some("red bb letter spp q")).unwrap();
        assert!(
            fx.red()
                .join("distribution/red-score-letter-score.pdf")
                .is_file()
        );
    }

    #[test]
    fn test_open_every_score_pdf() {
        let fx = Fixture::new();
        std::fs::write(
            fx.red().join("distribution/red-score-letter-score.pdf"),
            b"%PDF",
        )
        .unwrap();
        let green_build = fx.green().join("builds/letter");
        std::fs::create_dir_all(&green_build).unwrap();
        std::fs::write(green_build.join("score.pdf"), b"%PDF").unwrap();

        let mut ide = fx.ide();
        ide.run(Some("so* q")).unwrap();
        let transcript = ide.transcript();
        assert!(transcript.contains("Will open ..."));
        assert!(transcript.contains("   red_score/red_score/distribution/red-score-letter-score.pdf"));
        assert!(transcript.contains("   green_score/green_score/builds/letter/score.pdf"));
        assert!(!transcript.contains_text("blue_score/blue_score"));
        assert!(ide.session().has_attempted("open"));
    }

    #[test]
    fn test_edit_score_stylesheet_creates_it() {
        let fx = Fixture::new();
        let stylesheet = fx.red().join("stylesheets/stylesheet.ily");
        assert!(!stylesheet.exists());
        let mut ide = fx.ide();
        ide.run(Some("red mm sty q")).unwrap();
        assert!(stylesheet.is_file());
        assert!(ide.session().has_attempted("edit"));
    }

    #[test]
    fn test_edit_lilypond_log() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("log q")).unwrap();
        assert!(ide.transcript().contains("No LilyPond log configured."));

        let lily_log = fx.home().join("lily.log");
        let mut config = fx.configuration();
        config.lilypond_log = Some(lily_log.clone());
        let mut ide = Ide::new(config, Collaborators::inert(), true).unwrap();
        ide.run(Some("log q")).unwrap();
        assert!(ide.transcript().contains_text("File not found"));

        std::fs::write(&lily_log, "GNU LilyPond 2.24.0\n").unwrap();
        ide.run(Some("log q")).unwrap();
        assert!(ide.session().has_attempted("edit"));
    }
}

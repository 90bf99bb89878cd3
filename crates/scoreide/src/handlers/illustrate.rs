//! Definitions and illustrations of material and segment packages.

use std::path::{Path, PathBuf};

use crate::candidate::{Candidate, Generated, Overwrite};
use crate::controller::Ide;
use crate::error::Result;
use crate::io::Interaction;
use crate::listing;

const DEFINITION: &str = "definition.py";
const ILLUSTRATION_LY: &str = "illustration.ly";
const ILLUSTRATION_PDF: &str = "illustration.pdf";

/// Render `source` into `destination` through the candidate protocol.
pub(crate) fn interpret(
    ide: &mut Ide,
    source: &Path,
    destination: &Path,
    overwrite: Overwrite,
) -> Result<()> {
    let shown = ide.trim(source);
    if !source.is_file() {
        return ide.display(&[format!("File not found: {}.", shown)]);
    }
    ide.display(&[format!("Interpreting {} ...", shown)])?;
    if ide.suppressed("render") {
        return Ok(());
    }
    let candidate = Candidate::new(destination)?;
    let output = match ide.renderer.render(source, Some(candidate.path())) {
        Ok(output) => output,
        Err(e) => return ide.show_error(&e),
    };
    let generated = if output.failed() {
        Generated::Failed(output.stderr)
    } else {
        Generated::Ready
    };
    candidate.resolve(ide, generated, overwrite)?;
    ide.session_mut().request_menu_rebuild();
    Ok(())
}

fn check(ide: &mut Ide, package: &Path) -> Result<()> {
    let source = package.join(DEFINITION);
    let shown = ide.trim(&source);
    if !source.is_file() {
        return ide.display(&[format!("File not found: {}.", shown)]);
    }
    ide.display(&[format!("Checking {} ...", shown)])?;
    if ide.suppressed("render") {
        return Ok(());
    }
    match ide.renderer.render(&source, None) {
        Err(e) => ide.show_error(&e),
        Ok(output) if output.failed() => {
            let mut lines = vec![format!("{} FAILED:", shown)];
            lines.extend(output.stderr);
            ide.display(&lines)
        }
        Ok(_) => ide.display(&[format!("{} OK.", shown)]),
    }
}

fn packages(ide: &Ide) -> Result<Vec<PathBuf>> {
    listing::visible_directories(ide.current_directory(), ide.roots())
}

fn make_pdf(ide: &mut Ide, package: &Path, overwrite: Overwrite) -> Result<()> {
    interpret(
        ide,
        &package.join(ILLUSTRATION_LY),
        &package.join(ILLUSTRATION_PDF),
        overwrite,
    )
}

/// `file_name` in every visible package that has one.
fn in_every_package(ide: &Ide, file_name: &str) -> Result<Vec<PathBuf>> {
    Ok(packages(ide)?
        .into_iter()
        .map(|package| package.join(file_name))
        .filter(|path| path.is_file())
        .collect())
}

/// Show the files about to be acted on and ask once. `false` when there
/// is nothing to do or the user declined.
pub(crate) fn confirm_every(
    ide: &mut Ide,
    verb: &str,
    paths: &[PathBuf],
    file_name: &str,
) -> Result<bool> {
    if paths.is_empty() {
        ide.display(&[format!("No {} files found.", file_name)])?;
        return Ok(false);
    }
    let mut lines = vec![format!("Will {} ...", verb)];
    lines.extend(paths.iter().map(|p| format!("   {}", ide.trim(p))));
    ide.display(&lines)?;
    ide.confirm("Ok?")
}

pub(crate) fn edit_definition(ide: &mut Ide) -> Result<()> {
    let path = ide.current_directory().join(DEFINITION);
    ide.edit_file(&path)
}

pub(crate) fn edit_every_definition(ide: &mut Ide) -> Result<()> {
    let paths = in_every_package(ide, DEFINITION)?;
    if !confirm_every(ide, "edit", &paths, DEFINITION)? {
        return Ok(());
    }
    for path in &paths {
        ide.edit_file(path)?;
    }
    Ok(())
}

pub(crate) fn check_definition(ide: &mut Ide) -> Result<()> {
    let package = ide.current_directory().to_path_buf();
    check(ide, &package)
}

pub(crate) fn check_every_definition(ide: &mut Ide) -> Result<()> {
    for package in packages(ide)? {
        check(ide, &package)?;
    }
    Ok(())
}

pub(crate) fn edit_illustration(ide: &mut Ide) -> Result<()> {
    let path = ide.current_directory().join(ILLUSTRATION_LY);
    ide.edit_file(&path)
}

/// Run the material's definition to write its `illustration.ly`.
pub(crate) fn make_illustration_ly(ide: &mut Ide) -> Result<()> {
    let package = ide.current_directory().to_path_buf();
    interpret(
        ide,
        &package.join(DEFINITION),
        &package.join(ILLUSTRATION_LY),
        Overwrite::Prompt,
    )
}

pub(crate) fn interpret_every_ly(ide: &mut Ide) -> Result<()> {
    let sources = in_every_package(ide, ILLUSTRATION_LY)?;
    if sources.is_empty() {
        return ide.display(&[format!("No {} files found.", ILLUSTRATION_LY)]);
    }
    let mut lines = vec!["Will interpret ...".to_string()];
    for source in &sources {
        lines.push(format!("   INPUT: {}", ide.trim(source)));
        lines.push(format!("  OUTPUT: {}", ide.trim(&source.with_file_name(ILLUSTRATION_PDF))));
    }
    ide.display(&lines)?;
    if !ide.confirm("Ok?")? {
        return Ok(());
    }
    for source in &sources {
        let destination = source.with_file_name(ILLUSTRATION_PDF);
        interpret(ide, source, &destination, Overwrite::Always)?;
    }
    Ok(())
}

pub(crate) fn make_illustration(ide: &mut Ide) -> Result<()> {
    let package = ide.current_directory().to_path_buf();
    make_pdf(ide, &package, Overwrite::Prompt)
}

pub(crate) fn make_every_illustration(ide: &mut Ide) -> Result<()> {
    for package in packages(ide)? {
        make_pdf(ide, &package, Overwrite::Always)?;
    }
    Ok(())
}

pub(crate) fn open_illustration(ide: &mut Ide) -> Result<()> {
    let path = ide.current_directory().join(ILLUSTRATION_PDF);
    ide.open_file(&path)
}

pub(crate) fn open_every_illustration(ide: &mut Ide) -> Result<()> {
    let paths = in_every_package(ide, ILLUSTRATION_PDF)?;
    if !confirm_every(ide, "open", &paths, ILLUSTRATION_PDF)? {
        return Ok(());
    }
    ide.open_files(&paths)
}

#[cfg(test)]
mod tests {
    use crate::collaborators::{Collaborators, RenderOutput, Renderer};
    use crate::error::Result;
    use crate::test_support::Fixture;
    use std::cell::Cell;
    use std::path::Path;

    /// Writes a pdf echoing the source, with a creation date that changes
    /// every call. Sources containing `error` fail.
    #[derive(Default)]
    struct Echo {
        calls: Cell<u32>,
    }

    impl Renderer for Echo {
        fn render(&self, source: &Path, output: Option<&Path>) -> Result<RenderOutput> {
            self.calls.set(self.calls.get() + 1);
            let text = std::fs::read_to_string(source)?;
            if text.contains("error") {
                return Ok(RenderOutput {
                    stdout: Vec::new(),
                    stderr: vec!["error: unexpected token".to_string()],
                });
            }
            if let Some(output) = output {
                let pdf = format!(
                    "%PDF-1.4\n/CreationDate (D:2024010100000{})\n{}",
                    self.calls.get(),
                    text
                );
                std::fs::write(output, pdf)?;
            }
            Ok(RenderOutput::default())
        }
    }

    fn candidates_in(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".candidate."))
            .count()
    }

    #[test]
    fn test_make_illustration_twice() {
        let fx = Fixture::new();
        let package = fx.red().join("segments/A");
        let mut ide = fx.ide_with(Collaborators::inert().with_renderer(Echo::default()), false);

        ide.run(Some("red gg A pdfm q")).unwrap();
        assert!(package.join("illustration.pdf").is_file());
        assert!(
            ide.transcript()
                .contains("Writing red_score/red_score/segments/A/illustration.pdf ...")
        );

        ide.run(Some("red gg A pdfm q")).unwrap();
        assert!(ide.transcript().contains_text("... compare the same."));
        assert_eq!(candidates_in(&package), 0);
    }

    #[test]
    fn test_render_failure_keeps_destination() {
        let fx = Fixture::new();
        let package = fx.red().join("segments/B");
        std::fs::write(package.join("illustration.pdf"), b"%PDF-1.4\nold\n").unwrap();
        std::fs::write(package.join("illustration.ly"), "error here\n").unwrap();
        let mut ide = fx.ide_with(Collaborators::inert().with_renderer(Echo::default()), false);

        ide.run(Some("red gg B pdfm q")).unwrap();
        assert!(ide.transcript().contains("error: unexpected token"));
        assert_eq!(
            std::fs::read(package.join("illustration.pdf")).unwrap(),
            b"%PDF-1.4\nold\n"
        );
        assert_eq!(candidates_in(&package), 0);
    }

    #[test]
    fn test_make_every_illustration() {
        let fx = Fixture::new();
        let mut ide = fx.ide_with(Collaborators::inert().with_renderer(Echo::default()), false);
        ide.run(Some("red gg pdfm* q")).unwrap();
        for segment in ["_", "A", "B"] {
            assert!(fx.red().join("segments").join(segment).join("illustration.pdf").is_file());
        }
    }

    #[test]
    fn test_make_illustration_ly() {
        let fx = Fixture::new();
        let tempi = fx.red().join("materials/tempi");
        let mut ide = fx.ide_with(Collaborators::inert().with_renderer(Echo::default()), false);
        ide.run(Some("red mm tempi lym q")).unwrap();
        assert!(tempi.join("illustration.ly").is_file());
        assert!(
            ide.transcript()
                .contains("Writing red_score/red_score/materials/tempi/illustration.ly ...")
        );
        assert_eq!(candidates_in(&tempi), 0);
    }

    #[test]
    fn test_interpret_every_ly() {
        let fx = Fixture::new();
        let mut ide = fx.ide_with(Collaborators::inert().with_renderer(Echo::default()), false);
        ide.run(Some("red gg lyi* n q")).unwrap();
        assert!(ide.transcript().contains("Will interpret ..."));
        assert!(
            ide.transcript()
                .contains("   INPUT: red_score/red_score/segments/A/illustration.ly")
        );
        assert!(!fx.red().join("segments/A/illustration.pdf").exists());

        ide.run(Some("red gg lyi* y q")).unwrap();
        for segment in ["_", "A", "B"] {
            assert!(fx.red().join("segments").join(segment).join("illustration.pdf").is_file());
        }
    }

    #[test]
    fn test_open_every_illustration() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("red gg io* q")).unwrap();
        assert!(ide.transcript().contains("No illustration.pdf files found."));
        assert!(!ide.session().has_attempted("open"));

        for segment in ["A", "B"] {
            let pdf = fx.red().join("segments").join(segment).join("illustration.pdf");
            std::fs::write(pdf, b"%PDF").unwrap();
        }
        ide.run(Some("red gg io* q")).unwrap();
        assert!(ide.transcript().contains("Will open ..."));
        assert!(ide.transcript().contains("   red_score/red_score/segments/B/illustration.pdf"));
        assert!(ide.session().has_attempted("open"));
    }

    #[test]
    fn test_edit_every_definition() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("red mm df* q")).unwrap();
        assert!(ide.transcript().contains("Will edit ..."));
        assert!(ide.transcript().contains("   red_score/red_score/materials/ranges/definition.py"));
        assert!(ide.session().has_attempted("edit"));
    }

    #[test]
    fn test_check_definition() {
        let fx = Fixture::new();
        std::fs::write(fx.red().join("materials/ranges/definition.py"), "error\n").unwrap();
        let mut ide = fx.ide_with(Collaborators::inert().with_renderer(Echo::default()), false);
        ide.run(Some("red mm dfk* q")).unwrap();
        let transcript = ide.transcript();
        assert!(transcript.contains("red_score/red_score/materials/magic_numbers/definition.py OK."));
        assert!(transcript.contains("red_score/red_score/materials/ranges/definition.py FAILED:"));
        assert!(transcript.contains("red_score/red_score/materials/tempi/definition.py OK."));
    }

    #[test]
    fn test_test_mode_only_attempts() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("red gg A pdfm dfk lye q")).unwrap();
        assert!(ide.session().has_attempted("render"));
        assert!(ide.session().has_attempted("edit"));
        assert!(!fx.red().join("segments/A/illustration.pdf").exists());
    }

    #[test]
    fn test_open_requires_pdf() {
        let fx = Fixture::new();
        let mut ide = fx.ide();
        ide.run(Some("red gg A pdfo q")).unwrap();
        assert!(ide.transcript().contains("Unknown command: \"pdfo\"."));
        std::fs::write(fx.red().join("segments/A/illustration.pdf"), b"%PDF").unwrap();
        ide.run(Some("red gg A pdfo q")).unwrap();
        assert!(ide.session().has_attempted("open"));
    }
}

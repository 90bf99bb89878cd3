//! Generate-to-candidate, compare, then promote or preserve.
//!
//! Generated output first lands in `<stem>.candidate.<ext>` next to its
//! destination. Only a missing destination, an identical comparison, or an
//! explicit overwrite decides what happens to it. The candidate never
//! survives the call: [`Candidate`] removes it on drop, whatever the exit
//! path.

use similar::TextDiff;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::io::Interaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Wrote,
    Preserved,
    Overwrote,
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Outcome::Wrote => "wrote",
            Outcome::Preserved => "preserved",
            Outcome::Overwrote => "overwrote",
            Outcome::Failed => "failed",
        };
        write!(f, "{}", word)
    }
}

/// What to do when candidate and destination differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    /// Ask first.
    Prompt,
    /// Bulk commands replace without asking.
    Always,
}

/// What the generator reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    Ready,
    /// Diagnostics to show; the destination stays untouched.
    Failed(Vec<String>),
}

/// `music.ly` → `music.candidate.ly`; `Makefile` → `Makefile.candidate`.
pub fn candidate_path(destination: &Path) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match destination.extension() {
        Some(ext) => format!("{}.candidate.{}", stem, ext.to_string_lossy()),
        None => format!("{}.candidate", stem),
    };
    destination.with_file_name(name)
}

/// A candidate file that is removed when dropped.
#[derive(Debug)]
pub struct Candidate {
    path: PathBuf,
    destination: PathBuf,
}

impl Candidate {
    /// Reserve the candidate path for `destination`, clearing any stale
    /// candidate left by a crashed run.
    pub fn new(destination: &Path) -> Result<Candidate> {
        let path = candidate_path(destination);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(Candidate {
            path,
            destination: destination.to_path_buf(),
        })
    }

    /// Where the generator must write.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Compare against the destination and promote or discard.
    pub fn resolve<I>(self, io: &mut I, generated: Generated, overwrite: Overwrite) -> Result<Outcome>
    where
        I: Interaction + ?Sized,
    {
        let outcome = self.settle(io, generated, overwrite)?;
        log::info!("{} {}", outcome, self.destination.display());
        Ok(outcome)
    }

    fn settle<I>(&self, io: &mut I, generated: Generated, overwrite: Overwrite) -> Result<Outcome>
    where
        I: Interaction + ?Sized,
    {
        let destination = io.trim(&self.destination);
        if let Generated::Failed(diagnostics) = generated {
            io.display(&diagnostics)?;
            return Ok(Outcome::Failed);
        }
        if !self.path.is_file() {
            io.display(&[format!("No output produced for {} ...", destination)])?;
            return Ok(Outcome::Failed);
        }
        if !self.destination.exists() {
            io.display(&[format!("Writing {} ...", destination)])?;
            std::fs::rename(&self.path, &self.destination)?;
            return Ok(Outcome::Wrote);
        }

        let mut lines = vec![
            "The files ...".to_string(),
            format!("  {}", io.trim(&self.path)),
            format!("  {}", destination),
        ];
        if same_content(&self.path, &self.destination)? {
            lines.push("... compare the same.".to_string());
            lines.push(format!("Preserving {} ...", destination));
            io.display(&lines)?;
            return Ok(Outcome::Preserved);
        }
        lines.push("... compare differently.".to_string());
        if overwrite == Overwrite::Prompt
            && let Some(diff) = text_diff(&self.destination, &self.path)?
        {
            lines.extend(diff.lines().map(str::to_string));
        }
        io.display(&lines)?;

        let replace = match overwrite {
            Overwrite::Always => true,
            Overwrite::Prompt => io.confirm(&format!("Overwrite {}?", destination))?,
        };
        if replace {
            io.display(&[format!("Overwriting {} ...", destination)])?;
            std::fs::rename(&self.path, &self.destination)?;
            Ok(Outcome::Overwrote)
        } else {
            io.display(&[format!("Preserving {} ...", destination)])?;
            Ok(Outcome::Preserved)
        }
    }
}

impl Drop for Candidate {
    fn drop(&mut self) {
        if self.path.exists()
            && let Err(e) = std::fs::remove_file(&self.path)
        {
            log::warn!("could not remove {}: {}", self.path.display(), e);
        }
    }
}

/// Run `generate` against a fresh candidate for `destination`, then
/// resolve it.
pub fn make_candidate<I, G>(
    io: &mut I,
    destination: &Path,
    overwrite: Overwrite,
    generate: G,
) -> Result<Outcome>
where
    I: Interaction + ?Sized,
    G: FnOnce(&Path) -> Result<Generated>,
{
    let candidate = Candidate::new(destination)?;
    let generated = generate(candidate.path())?;
    candidate.resolve(io, generated, overwrite)
}

/// Generator writing fixed bytes.
pub fn write_bytes(bytes: &[u8]) -> impl FnOnce(&Path) -> Result<Generated> + '_ {
    move |path| {
        std::fs::write(path, bytes)?;
        Ok(Generated::Ready)
    }
}

/// Lines that legitimately differ between otherwise equal PDF renders.
const PDF_VOLATILE: &[&[u8]] = &[b"/CreationDate", b"/ModDate", b"/ID ["];

fn volatile_markers(path: &Path) -> &'static [&'static [u8]] {
    match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => PDF_VOLATILE,
        _ => &[],
    }
}

/// Compare two files, ignoring volatile lines for the file type.
pub fn same_content(a: &Path, b: &Path) -> Result<bool> {
    let left = std::fs::read(a)?;
    let right = std::fs::read(b)?;
    let markers = volatile_markers(b);
    if markers.is_empty() {
        return Ok(left == right);
    }
    let stable = |bytes: &[u8]| -> Vec<Vec<u8>> {
        bytes
            .split(|b| *b == b'\n')
            .filter(|line| {
                !markers
                    .iter()
                    .any(|m| line.windows(m.len()).any(|w| w == *m))
            })
            .map(<[u8]>::to_vec)
            .collect()
    };
    Ok(stable(&left) == stable(&right))
}

/// Unified diff from `old` to `new` when both are text.
fn text_diff(old: &Path, new: &Path) -> Result<Option<String>> {
    let (Ok(old_text), Ok(new_text)) = (
        String::from_utf8(std::fs::read(old)?),
        String::from_utf8(std::fs::read(new)?),
    ) else {
        return Ok(None);
    };
    let diff = TextDiff::from_lines(&old_text, &new_text);
    let unified = diff.unified_diff().context_radius(3).to_string();
    Ok(if unified.is_empty() { None } else { Some(unified) })
}

#![doc = include_str!("../README.md")]

use anyhow::{Context, Result, anyhow, bail};
use git2::build::CheckoutBuilder;
use git2::{DiffFormat, DiffOptions, IndexAddOption, Oid, Status, StatusOptions};
use std::path::{Path, PathBuf};

use scoreide::collaborators::{self, CLEAN_STATUS};

/// The repository collaborator over libgit2.
///
/// Every call discovers the repository enclosing the path it is given and
/// limits itself to that path; paths in the answers are relative to it.
#[derive(Debug, Clone, Default)]
pub struct GitRepository;

/// Where `pull` fetches from.
const REMOTE: &str = "origin";

impl GitRepository {
    pub fn new() -> Self {
        GitRepository
    }

    pub fn status_lines(&self, path: &Path) -> Result<Vec<String>> {
        let scope = Scope::open(path)?;
        let changes = scope.changes()?;
        let mut lines = Vec::new();
        if let Some(branch) = scope.branch() {
            lines.push(format!("On branch {}", branch));
        }
        if changes.is_empty() {
            lines.push(CLEAN_STATUS.to_string());
            return Ok(lines);
        }
        for (relative, status) in &changes {
            lines.push(format!("{}: {}", describe(*status), scope.shown(relative)));
        }
        Ok(lines)
    }

    pub fn add_all(&self, path: &Path) -> Result<Vec<String>> {
        let scope = Scope::open(path)?;
        let spec = scope.pathspec();
        let mut index = scope.repo.index()?;
        let mut lines = Vec::new();
        let mut note = |p: &Path, _: &[u8]| -> i32 {
            lines.push(format!("add '{}'", p.display()));
            0
        };
        index.add_all(
            [spec],
            IndexAddOption::DEFAULT,
            Some(&mut note as &mut git2::IndexMatchedPath),
        )?;
        index.update_all([spec], None)?;
        index.write()?;
        log::debug!("staged {} paths under {}", lines.len(), path.display());
        Ok(lines)
    }

    pub fn commit_index(&self, path: &Path, message: &str) -> Result<Vec<String>> {
        let scope = Scope::open(path)?;
        let repo = &scope.repo;
        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        if let Some(parent) = &parent
            && parent.tree_id() == tree_id
        {
            return Ok(vec![CLEAN_STATUS.to_string()]);
        }
        let tree = repo.find_tree(tree_id)?;
        let signature = repo
            .signature()
            .context("Set user.name and user.email before committing")?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        let branch = scope.branch().unwrap_or_else(|| "HEAD".to_string());
        log::info!("committed {} on {}", oid, branch);
        Ok(vec![format!("[{} {}] {}", branch, short_oid(oid), message)])
    }

    pub fn revert_changes(&self, path: &Path) -> Result<Vec<String>> {
        let scope = Scope::open(path)?;
        let reverted: Vec<String> = scope
            .changes()?
            .into_iter()
            .filter(|(_, status)| !status.is_wt_new())
            .map(|(relative, _)| format!("Reverted {}", scope.shown(&relative)))
            .collect();
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        if let Some(spec) = &scope.spec {
            checkout.path(spec.as_str());
        }
        scope.repo.checkout_head(Some(&mut checkout))?;
        Ok(reverted)
    }

    pub fn diff_lines(&self, path: &Path) -> Result<Vec<String>> {
        let scope = Scope::open(path)?;
        let repo = &scope.repo;
        let head_tree = repo.head().ok().and_then(|head| head.peel_to_tree().ok());
        let mut options = DiffOptions::new();
        if let Some(spec) = &scope.spec {
            options.pathspec(spec.as_str());
        }
        let diff = repo.diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut options))?;

        let mut lines = Vec::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let content = String::from_utf8_lossy(line.content());
            match line.origin() {
                origin @ ('+' | '-' | ' ') => {
                    lines.push(format!("{}{}", origin, content.trim_end_matches('\n')))
                }
                _ => lines.extend(content.lines().map(str::to_string)),
            }
            true
        })?;
        Ok(lines)
    }

    /// Fetch the current branch and fast-forward to it.
    pub fn pull(&self, path: &Path) -> Result<Vec<String>> {
        let scope = Scope::open(path)?;
        let repo = &scope.repo;
        let branch = scope
            .branch()
            .ok_or_else(|| anyhow!("{} has no current branch", path.display()))?;
        let mut remote = repo
            .find_remote(REMOTE)
            .with_context(|| format!("No remote named {:?}", REMOTE))?;
        remote
            .fetch(&[branch.as_str()], None, None)
            .with_context(|| format!("Failed to fetch {} from {}", branch, REMOTE))?;

        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let incoming = repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repo.merge_analysis(&[&incoming])?;
        if analysis.is_up_to_date() {
            return Ok(vec!["Already up to date.".to_string()]);
        }
        if !analysis.is_fast_forward() {
            bail!("{} has diverged from {}; merge by hand", branch, REMOTE);
        }
        let refname = format!("refs/heads/{}", branch);
        repo.find_reference(&refname)?
            .set_target(incoming.id(), "fast-forward")?;
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::new().force()))?;
        Ok(vec![format!("Fast-forward to {}.", short_oid(incoming.id()))])
    }

    pub fn untracked_paths(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let scope = Scope::open(path)?;
        Ok(scope
            .changes()?
            .into_iter()
            .filter(|(_, status)| status.is_wt_new())
            .map(|(relative, _)| path.join(scope.shown(&relative)))
            .collect())
    }

    pub fn modified_paths(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let scope = Scope::open(path)?;
        Ok(scope
            .changes()?
            .into_iter()
            .filter(|(_, status)| !status.is_wt_new())
            .map(|(relative, _)| path.join(scope.shown(&relative)))
            .collect())
    }

    /// True when the index holds `path` or anything below it.
    pub fn tracks(&self, path: &Path) -> Result<bool> {
        let scope = Scope::open(path)?;
        let index = scope.repo.index()?;
        let Some(spec) = &scope.spec else {
            return Ok(!index.is_empty());
        };
        let prefix = format!("{}/", spec);
        Ok(index.iter().any(|entry| {
            let entry = String::from_utf8_lossy(&entry.path);
            entry == spec.as_str() || entry.starts_with(&prefix)
        }))
    }

    /// Drop `path` from the index and the working tree.
    pub fn remove_tracked(&self, path: &Path) -> Result<Vec<String>> {
        let scope = Scope::open(path)?;
        let Some(spec) = &scope.spec else {
            bail!("Refusing to remove the repository root {}", path.display());
        };
        let prefix = format!("{}/", spec);
        let mut index = scope.repo.index()?;
        let lines: Vec<String> = index
            .iter()
            .map(|entry| String::from_utf8_lossy(&entry.path).into_owned())
            .filter(|entry| entry == spec || entry.starts_with(&prefix))
            .map(|entry| format!("rm '{}'", entry))
            .collect();
        index.remove_all([spec.as_str()], None)?;
        index.write()?;
        collaborators::remove_path(path)?;
        Ok(lines)
    }
}

impl collaborators::Repository for GitRepository {
    fn status(&self, path: &Path) -> scoreide::Result<Vec<String>> {
        Ok(self.status_lines(path)?)
    }

    fn add(&self, path: &Path) -> scoreide::Result<Vec<String>> {
        Ok(self.add_all(path)?)
    }

    fn commit(&self, path: &Path, message: &str) -> scoreide::Result<Vec<String>> {
        Ok(self.commit_index(path, message)?)
    }

    fn revert(&self, path: &Path) -> scoreide::Result<Vec<String>> {
        Ok(self.revert_changes(path)?)
    }

    fn diff(&self, path: &Path) -> scoreide::Result<Vec<String>> {
        Ok(self.diff_lines(path)?)
    }

    fn update(&self, path: &Path) -> scoreide::Result<Vec<String>> {
        Ok(self.pull(path)?)
    }

    fn untracked(&self, path: &Path) -> scoreide::Result<Vec<PathBuf>> {
        Ok(self.untracked_paths(path)?)
    }

    fn modified(&self, path: &Path) -> scoreide::Result<Vec<PathBuf>> {
        Ok(self.modified_paths(path)?)
    }

    fn is_tracked(&self, path: &Path) -> scoreide::Result<bool> {
        Ok(self.tracks(path)?)
    }

    fn remove(&self, path: &Path) -> scoreide::Result<Vec<String>> {
        Ok(self.remove_tracked(path)?)
    }
}

// ============================================================================
// Scoping
// ============================================================================

/// A repository narrowed to one path inside its working tree.
struct Scope {
    repo: git2::Repository,
    /// Workdir-relative path with `/` separators; `None` for the whole tree.
    spec: Option<String>,
}

impl Scope {
    fn open(path: &Path) -> Result<Scope> {
        let repo = git2::Repository::discover(path)
            .with_context(|| format!("No git repository at {}", path.display()))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| anyhow!("Bare repository at {}", path.display()))?
            .canonicalize()?;
        let target = canonical(path)?;
        let relative = target.strip_prefix(&workdir).with_context(|| {
            format!("{} is outside {}", target.display(), workdir.display())
        })?;
        let spec = relative.to_string_lossy().replace('\\', "/");
        Ok(Scope {
            repo,
            spec: (!spec.is_empty()).then_some(spec),
        })
    }

    fn pathspec(&self) -> &str {
        self.spec.as_deref().unwrap_or("*")
    }

    fn branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        head.shorthand().map(str::to_string)
    }

    /// Changed and untracked paths under the scope, workdir-relative.
    fn changes(&self) -> Result<Vec<(String, Status)>> {
        let mut options = StatusOptions::new();
        options.include_untracked(true).recurse_untracked_dirs(true);
        if let Some(spec) = &self.spec {
            options.pathspec(spec.as_str());
        }
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .filter(|entry| !entry.status().is_ignored())
            .filter_map(|entry| entry.path().map(|p| (p.to_string(), entry.status())))
            .collect())
    }

    /// A workdir-relative path shown relative to the scope.
    fn shown(&self, relative: &str) -> String {
        match &self.spec {
            Some(spec) => relative
                .strip_prefix(spec.as_str())
                .map(|rest| rest.trim_start_matches('/'))
                .filter(|rest| !rest.is_empty())
                .unwrap_or(relative)
                .to_string(),
            None => relative.to_string(),
        }
    }
}

/// Canonicalize `path`, or its parent when `path` itself is gone.
fn canonical(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.canonicalize()?);
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => Ok(parent.canonicalize()?.join(name)),
        _ => bail!("Cannot resolve {}", path.display()),
    }
}

fn describe(status: Status) -> &'static str {
    if status.is_wt_new() {
        "untracked"
    } else if status.is_index_new() {
        "new file"
    } else if status.intersects(Status::WT_DELETED | Status::INDEX_DELETED) {
        "deleted"
    } else if status.intersects(Status::WT_RENAMED | Status::INDEX_RENAMED) {
        "renamed"
    } else {
        "modified"
    }
}

fn short_oid(oid: Oid) -> String {
    oid.to_string()[..7].to_string()
}

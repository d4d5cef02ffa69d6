//! Local Git workspace operations via `git2`.
//!
//! A [`GitWorkspace`] wraps one clone (packaging or upstream). The packaging
//! flow is: `sync` the clone, `prepare` the branch layout for a cycle while
//! capturing a [`RollbackMarker`], run the import, then either `commit_all`
//! or `rollback` to the marker. Rollback restores every recorded ref
//! byte-for-byte and deletes branches the prepare created, so a failed
//! import leaves no trace.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use git2::{
    build::CheckoutBuilder, BranchType, DescribeFormatOptions, DescribeOptions, FetchOptions,
    IndexAddOption, Oid, Repository, Signature, StatusOptions,
};
use tracing::{debug, info, instrument, warn};

use crate::errors::GitError;

/// High-level workspace wrapping a `git2::Repository`.
pub struct GitWorkspace {
    repo: Repository,
    repo_path: PathBuf,
}

/// State captured before mutating a packaging repository, sufficient to
/// restore it exactly.
#[derive(Debug, Clone)]
pub struct RollbackMarker {
    /// Branch name -> commit OID at capture time.
    branch_tips: HashMap<String, Oid>,
    /// Branches that did not exist at capture time and were created by
    /// `prepare`; rollback deletes them.
    created_branches: Vec<String>,
    /// Branch checked out at capture time.
    head_branch: String,
}

impl RollbackMarker {
    pub fn head_branch(&self) -> &str {
        &self.head_branch
    }

    pub fn created_branches(&self) -> &[String] {
        &self.created_branches
    }

    pub fn recorded_tip(&self, branch: &str) -> Option<Oid> {
        self.branch_tips.get(branch).copied()
    }
}

impl GitWorkspace {
    /// Open an existing repository at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .map_err(|_| GitError::RepositoryNotFound(path.display().to_string()))?;
        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
        })
    }

    /// Open `path` if it is already a clone of `url`, otherwise clone it.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn clone_or_open(url: &str, path: &Path) -> Result<Self, GitError> {
        if path.join(".git").exists() {
            debug!("repository already cloned");
            return Self::open(path);
        }
        info!("cloning repository");
        let repo = Repository::clone(url, path).map_err(|e| GitError::Network {
            url: url.to_string(),
            detail: e.message().to_string(),
        })?;
        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.repo_path
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    fn signature(&self) -> Result<Signature<'static>, GitError> {
        let name = std::env::var("DEBFULLNAME")
            .unwrap_or_else(|_| "Ubuntu OpenStack Developers".to_string());
        let email = std::env::var("DEBEMAIL")
            .unwrap_or_else(|_| "ubuntu-openstack-dev@lists.launchpad.net".to_string());
        Ok(Signature::now(&name, &email)?)
    }

    // -----------------------------------------------------------------------
    // Syncing
    // -----------------------------------------------------------------------

    /// Fetch all refs and tags from origin.
    #[instrument(skip(self), fields(path = %self.repo_path.display()))]
    pub fn fetch_origin(&self) -> Result<(), GitError> {
        let mut remote = self.repo.find_remote("origin")?;
        let mut opts = FetchOptions::new();
        opts.download_tags(git2::AutotagOption::All);
        remote
            .fetch(&[] as &[&str], Some(&mut opts), None)
            .map_err(|e| GitError::Network {
                url: remote.url().unwrap_or("origin").to_string(),
                detail: e.message().to_string(),
            })?;
        debug!("fetch completed");
        Ok(())
    }

    /// Fetch origin and fast-forward `branch` to its remote tip. The branch
    /// is created from the remote if it does not exist locally yet. A local
    /// branch that is ahead of the remote (imports not yet pushed) is left
    /// alone; a diverged branch is left alone with a warning.
    #[instrument(skip(self), fields(path = %self.repo_path.display()))]
    pub fn sync_branch(&self, branch: &str) -> Result<(), GitError> {
        self.fetch_origin()?;
        let remote_ref = format!("refs/remotes/origin/{branch}");
        let remote_commit = self
            .repo
            .find_reference(&remote_ref)
            .map_err(|_| GitError::RefNotFound(remote_ref.clone()))?
            .peel_to_commit()?;

        match self.repo.find_branch(branch, BranchType::Local) {
            Ok(local) => {
                let local_oid = local
                    .get()
                    .target()
                    .ok_or_else(|| GitError::RefNotFound(branch.to_string()))?;
                if local_oid != remote_commit.id() {
                    if self.repo.graph_descendant_of(remote_commit.id(), local_oid)? {
                        let name = format!("refs/heads/{branch}");
                        let mut reference = self.repo.find_reference(&name)?;
                        reference
                            .set_target(remote_commit.id(), "stackpack: fast-forward sync")?;
                    } else if !self.repo.graph_descendant_of(local_oid, remote_commit.id())? {
                        warn!(branch, "local branch diverged from origin, leaving as is");
                    }
                }
            }
            Err(_) => {
                self.repo.branch(branch, &remote_commit, false)?;
            }
        }
        self.checkout_branch(branch)?;
        info!(branch, "synced with remote");
        Ok(())
    }

    /// Whether the working tree or index carry local modifications.
    /// Untracked files count: a stray file could be clobbered by checkout.
    pub fn is_dirty(&self) -> Result<bool, GitError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(!statuses.is_empty())
    }

    // -----------------------------------------------------------------------
    // Branch plumbing
    // -----------------------------------------------------------------------

    pub fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        Ok(self.repo.find_branch(name, BranchType::Local).is_ok())
    }

    fn branch_tip(&self, name: &str) -> Result<Option<Oid>, GitError> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(branch) => Ok(branch.get().target()),
            Err(_) => Ok(None),
        }
    }

    /// Resolve a branch locally, falling back to its origin remote-tracking
    /// ref.
    fn find_branch_commit(&self, name: &str) -> Result<Option<git2::Commit<'_>>, GitError> {
        if let Ok(branch) = self.repo.find_branch(name, BranchType::Local) {
            return Ok(Some(branch.get().peel_to_commit()?));
        }
        let remote_ref = format!("refs/remotes/origin/{name}");
        match self.repo.find_reference(&remote_ref) {
            Ok(reference) => Ok(Some(reference.peel_to_commit()?)),
            Err(_) => Ok(None),
        }
    }

    #[instrument(skip(self), fields(path = %self.repo_path.display()))]
    pub fn checkout_branch(&self, name: &str) -> Result<(), GitError> {
        let refname = format!("refs/heads/{name}");
        self.repo
            .find_reference(&refname)
            .map_err(|_| GitError::RefNotFound(refname.clone()))?;
        self.repo.set_head(&refname)?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))?;
        debug!(branch = name, "checked out");
        Ok(())
    }

    fn current_branch(&self) -> Result<String, GitError> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(GitError::DetachedHead(self.repo_path.display().to_string()));
        }
        head.shorthand()
            .map(|s| s.to_string())
            .ok_or_else(|| GitError::DetachedHead(self.repo_path.display().to_string()))
    }

    // -----------------------------------------------------------------------
    // Prepare and rollback
    // -----------------------------------------------------------------------

    /// Prepare the packaging repository for importing into `cycle`.
    ///
    /// Records the tip of every branch the import may touch, ensures the
    /// per-cycle upstream branch exists (seeded from the previous cycle's
    /// branch when available, otherwise from the packaging branch), checks
    /// out the packaging branch, and points `debian/gbp.conf` at the cycle's
    /// upstream branch. Refuses to touch a dirty tree.
    #[instrument(skip(self), fields(path = %self.repo_path.display()))]
    pub fn prepare(
        &self,
        packaging_branch: &str,
        upstream_branch: &str,
        previous_upstream_branch: Option<&str>,
    ) -> Result<RollbackMarker, GitError> {
        if self.is_dirty()? {
            return Err(GitError::DirtyWorkingTree {
                path: self.repo_path.display().to_string(),
            });
        }

        let mut branch_tips = HashMap::new();
        for name in [packaging_branch, upstream_branch, "pristine-tar"] {
            if let Some(oid) = self.branch_tip(name)? {
                branch_tips.insert(name.to_string(), oid);
            }
        }
        let mut marker = RollbackMarker {
            branch_tips,
            created_branches: Vec::new(),
            head_branch: self.current_branch()?,
        };

        // A failed prepare must not leak the branches it created.
        match self.prepare_branches(packaging_branch, upstream_branch, previous_upstream_branch, &mut marker)
        {
            Ok(()) => Ok(marker),
            Err(e) => {
                if let Err(rb) = self.rollback(&marker) {
                    warn!(error = %rb, "could not undo partial prepare");
                }
                Err(e)
            }
        }
    }

    fn prepare_branches(
        &self,
        packaging_branch: &str,
        upstream_branch: &str,
        previous_upstream_branch: Option<&str>,
        marker: &mut RollbackMarker,
    ) -> Result<(), GitError> {
        if !self.branch_exists(upstream_branch)? {
            let seed = previous_upstream_branch
                .map(|name| self.find_branch_commit(name))
                .transpose()?
                .flatten();
            let seed = match seed {
                Some(commit) => commit,
                None => self
                    .find_branch_commit(packaging_branch)?
                    .ok_or_else(|| GitError::RefNotFound(packaging_branch.to_string()))?,
            };
            self.repo.branch(upstream_branch, &seed, false)?;
            marker.created_branches.push(upstream_branch.to_string());
            info!(branch = upstream_branch, seed = %seed.id(), "created upstream branch");
        }

        self.checkout_branch(packaging_branch)?;
        if self.update_gbp_conf(upstream_branch)? {
            self.commit_all(&format!(
                "d/gbp.conf: track upstream branch {upstream_branch}"
            ))?;
        }
        Ok(())
    }

    /// Point the `upstream-branch` setting of `debian/gbp.conf` at `branch`.
    /// Returns whether the file changed. A missing gbp.conf gets a minimal
    /// one written.
    fn update_gbp_conf(&self, branch: &str) -> Result<bool, GitError> {
        let path = self.repo_path.join("debian").join("gbp.conf");
        let wanted = format!("upstream-branch = {branch}");
        if !path.exists() {
            std::fs::create_dir_all(self.repo_path.join("debian"))?;
            std::fs::write(&path, format!("[DEFAULT]\ndebian-branch = master\n{wanted}\n"))?;
            return Ok(true);
        }
        let content = std::fs::read_to_string(&path)?;
        let mut changed = false;
        let mut found = false;
        let mut lines: Vec<String> = Vec::new();
        for line in content.lines() {
            let key = line.split('=').next().unwrap_or("").trim();
            if key == "upstream-branch" {
                found = true;
                if line.trim() != wanted {
                    changed = true;
                    lines.push(wanted.clone());
                    continue;
                }
            }
            lines.push(line.to_string());
        }
        if !found {
            lines.push(wanted);
            changed = true;
        }
        if changed {
            std::fs::write(&path, lines.join("\n") + "\n")?;
        }
        Ok(changed)
    }

    /// Restore the repository to the state recorded in `marker`. Idempotent:
    /// rolling back twice is a no-op the second time.
    #[instrument(skip(self, marker), fields(path = %self.repo_path.display()))]
    pub fn rollback(&self, marker: &RollbackMarker) -> Result<(), GitError> {
        for (name, oid) in &marker.branch_tips {
            let refname = format!("refs/heads/{name}");
            match self.repo.find_reference(&refname) {
                Ok(mut reference) => {
                    if reference.target() != Some(*oid) {
                        reference.set_target(*oid, "stackpack: rollback")?;
                        info!(branch = %name, oid = %oid, "reset branch");
                    }
                }
                Err(_) => {
                    // The import deleted a recorded branch; recreate it.
                    let commit = self.repo.find_commit(*oid)?;
                    self.repo.branch(name, &commit, false)?;
                    info!(branch = %name, oid = %oid, "recreated branch");
                }
            }
        }

        self.checkout_branch(&marker.head_branch)?;

        for name in &marker.created_branches {
            match self.repo.find_branch(name, BranchType::Local) {
                Ok(mut branch) => {
                    branch.delete()?;
                    info!(branch = %name, "deleted created branch");
                }
                Err(_) => {}
            }
        }

        // Force-checkout above restored tracked files; drop anything the
        // failed import left untracked.
        self.remove_untracked()?;
        Ok(())
    }

    fn remove_untracked(&self) -> Result<(), GitError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        for entry in statuses.iter() {
            if entry.status().contains(git2::Status::WT_NEW) {
                if let Some(rel) = entry.path() {
                    let full = self.repo_path.join(rel);
                    if full.is_file() {
                        std::fs::remove_file(&full)?;
                        debug!(path = rel, "removed untracked file");
                    }
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Commits, tags, describe
    // -----------------------------------------------------------------------

    /// Stage everything and commit on the current branch.
    #[instrument(skip(self, message), fields(path = %self.repo_path.display()))]
    pub fn commit_all(&self, message: &str) -> Result<Oid, GitError> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;
        let sig = self.signature()?;
        let parent = self.repo.head()?.peel_to_commit()?;
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?;
        info!(sha = %oid, "created commit");
        Ok(oid)
    }

    /// Tags pointing exactly at HEAD.
    pub fn head_tags(&self) -> Result<Vec<String>, GitError> {
        let head = self.repo.head()?.peel_to_commit()?.id();
        let mut tags = Vec::new();
        for name in self.repo.tag_names(None)?.iter().flatten() {
            let refname = format!("refs/tags/{name}");
            if let Ok(reference) = self.repo.find_reference(&refname) {
                if reference.peel_to_commit()?.id() == head {
                    tags.push(name.to_string());
                }
            }
        }
        Ok(tags)
    }

    /// `git describe --tags --long` of HEAD, e.g. `12.0.0-5-gabc1234`.
    pub fn describe_long(&self) -> Result<String, GitError> {
        let mut opts = DescribeOptions::new();
        opts.describe_tags();
        let describe = self.repo.describe(&opts)?;
        let mut fmt = DescribeFormatOptions::new();
        fmt.always_use_long_format(true);
        Ok(describe.format(Some(&fmt))?)
    }

    /// OID of the current HEAD commit.
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        Ok(self.repo.head()?.peel_to_commit()?.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo(dir: &Path) -> GitWorkspace {
        let repo = Repository::init(dir).unwrap();
        {
            let sig = Signature::now("Test", "test@example.com").unwrap();
            let mut index = repo.index().unwrap();
            std::fs::write(dir.join("README"), "hello\n").unwrap();
            index.add_path(Path::new("README")).unwrap();
            index.write().unwrap();
            let tree_oid = index.write_tree().unwrap();
            let tree = repo.find_tree(tree_oid).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
                .unwrap();
        }
        // Default branch name varies by git config; normalize to master.
        {
            let head = repo.head().unwrap().peel_to_commit().unwrap();
            if repo.find_branch("master", BranchType::Local).is_err() {
                repo.branch("master", &head, false).unwrap();
            }
        }
        repo.set_head("refs/heads/master").unwrap();
        repo.checkout_head(Some(CheckoutBuilder::new().force()))
            .unwrap();
        drop(repo);
        GitWorkspace::open(dir).unwrap()
    }

    #[test]
    fn test_dirty_detection() {
        let dir = tempfile::tempdir().unwrap();
        let ws = init_repo(dir.path());
        assert!(!ws.is_dirty().unwrap());
        std::fs::write(dir.path().join("stray"), "x").unwrap();
        assert!(ws.is_dirty().unwrap());
    }

    #[test]
    fn test_prepare_creates_upstream_branch_and_gbp_conf() {
        let dir = tempfile::tempdir().unwrap();
        let ws = init_repo(dir.path());

        let marker = ws.prepare("master", "upstream-epoxy", None).unwrap();
        assert!(ws.branch_exists("upstream-epoxy").unwrap());
        assert_eq!(marker.created_branches(), ["upstream-epoxy".to_string()]);
        assert_eq!(marker.head_branch(), "master");

        let conf =
            std::fs::read_to_string(dir.path().join("debian").join("gbp.conf")).unwrap();
        assert!(conf.contains("upstream-branch = upstream-epoxy"));
        // gbp.conf edit was committed; tree is clean again.
        assert!(!ws.is_dirty().unwrap());
    }

    #[test]
    fn test_prepare_refuses_dirty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let ws = init_repo(dir.path());
        std::fs::write(dir.path().join("stray"), "x").unwrap();
        assert!(matches!(
            ws.prepare("master", "upstream-epoxy", None),
            Err(GitError::DirtyWorkingTree { .. })
        ));
    }

    #[test]
    fn test_failed_prepare_leaves_no_created_branches() {
        let dir = tempfile::tempdir().unwrap();
        let ws = init_repo(dir.path());
        // A file where the debian directory belongs makes the gbp.conf
        // write fail after the upstream branch was already created.
        std::fs::write(dir.path().join("debian"), "not a directory").unwrap();
        ws.commit_all("debian placeholder").unwrap();
        let before = ws.head_oid().unwrap();

        assert!(ws.prepare("master", "upstream-epoxy", None).is_err());
        assert!(!ws.branch_exists("upstream-epoxy").unwrap());
        assert_eq!(ws.head_oid().unwrap(), before);
        assert!(!ws.is_dirty().unwrap());
    }

    #[test]
    fn test_rollback_restores_everything() {
        let dir = tempfile::tempdir().unwrap();
        let ws = init_repo(dir.path());
        let before = ws.head_oid().unwrap();

        let marker = ws.prepare("master", "upstream-epoxy", None).unwrap();
        // Simulate a partial import: extra commit and an untracked file.
        std::fs::write(dir.path().join("imported"), "data").unwrap();
        ws.commit_all("partial import").unwrap();
        std::fs::write(dir.path().join("leftover.tar.gz"), "junk").unwrap();

        ws.rollback(&marker).unwrap();

        assert_eq!(ws.head_oid().unwrap(), before);
        assert!(!ws.branch_exists("upstream-epoxy").unwrap());
        assert!(!dir.path().join("imported").exists());
        assert!(!dir.path().join("leftover.tar.gz").exists());
        assert!(!dir.path().join("debian").join("gbp.conf").exists());

        // Idempotent.
        ws.rollback(&marker).unwrap();
        assert_eq!(ws.head_oid().unwrap(), before);
    }

    #[test]
    fn test_head_tags_and_describe() {
        let dir = tempfile::tempdir().unwrap();
        let ws = init_repo(dir.path());
        let head = ws.head_oid().unwrap();
        let obj = ws.repo().find_object(head, None).unwrap();
        ws.repo().tag_lightweight("12.0.0", &obj, false).unwrap();

        assert_eq!(ws.head_tags().unwrap(), ["12.0.0".to_string()]);
        let described = ws.describe_long().unwrap();
        assert!(described.starts_with("12.0.0-0-g"));
    }
}

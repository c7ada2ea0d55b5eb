//! Test utilities for creating temporary git remotes and clones

#![cfg(test)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::models::{LocalRepository, RepositoryRecord};
use crate::services::credentials_service::SshCredentials;

/// A bare repository standing in for a forge-hosted remote
pub struct TestRemote {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestRemote {
    /// Create a bare remote whose `main` branch holds one commit with `files`
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("remote.git");

        let repo = git2::Repository::init_bare(&path).expect("Failed to init bare repo");
        repo.set_head("refs/heads/main").expect("Failed to set HEAD");

        let remote = Self { dir, path };
        remote.push_branch("main", files);
        remote
    }

    /// Get the git2 repository
    pub fn repo(&self) -> git2::Repository {
        git2::Repository::open_bare(&self.path).expect("Failed to open remote")
    }

    /// Listing record pointing at this remote
    pub fn record(&self, name: &str) -> RepositoryRecord {
        RepositoryRecord {
            name: name.to_string(),
            ssh_url: self.path.to_string_lossy().to_string(),
            default_branch: "main".to_string(),
            license: None,
            fork: false,
            archived: false,
        }
    }

    /// Create a bare remote whose `main` branch holds `count` files of
    /// `size` incompressible bytes each, so cloning it takes a while
    pub fn with_bulk_files(count: usize, size: usize) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("remote.git");

        let repo = git2::Repository::init_bare(&path).expect("Failed to init bare repo");
        repo.set_head("refs/heads/main").expect("Failed to set HEAD");

        let mut builder = repo.treebuilder(None).expect("Failed to create tree builder");
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        for i in 0..count {
            let content: Vec<u8> = (0..size)
                .map(|_| {
                    // xorshift64
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    state as u8
                })
                .collect();
            let blob = repo.blob(&content).expect("Failed to write blob");
            builder
                .insert(format!("data-{:05}.bin", i), blob, 0o100644)
                .expect("Failed to insert blob");
        }
        let tree_oid = builder.write().expect("Failed to write tree");
        let tree = repo.find_tree(tree_oid).expect("Failed to find tree");
        let sig = git2::Signature::now("Remote User", "remote@example.com")
            .expect("Failed to create signature");
        repo.commit(Some("refs/heads/main"), &sig, &sig, "Bulk commit", &tree, &[])
            .expect("Failed to create commit");

        Self { dir, path }
    }

    /// Listing record that reaches this remote through a `file://` URL.
    /// Unlike a plain path, libgit2 then runs the real fetch transport and
    /// reports transfer progress.
    pub fn file_url_record(&self, name: &str) -> RepositoryRecord {
        let url = url::Url::from_file_path(&self.path).expect("Failed to build file URL");
        RepositoryRecord {
            ssh_url: url.to_string(),
            ..self.record(name)
        }
    }

    /// Add a commit with `files` on top of `branch`, creating the branch from
    /// `main` when it does not exist yet
    pub fn push_branch(&self, branch: &str, files: &[(&str, &str)]) -> git2::Oid {
        let repo = self.repo();
        let refname = format!("refs/heads/{}", branch);

        let parent = repo
            .find_reference(&refname)
            .or_else(|_| repo.find_reference("refs/heads/main"))
            .ok()
            .and_then(|r| r.peel_to_commit().ok());
        let parent_tree = parent.as_ref().map(|c| c.tree().expect("Failed to get tree"));

        let mut builder = repo
            .treebuilder(parent_tree.as_ref())
            .expect("Failed to create tree builder");
        for (name, content) in files {
            let blob = repo.blob(content.as_bytes()).expect("Failed to write blob");
            builder
                .insert(*name, blob, 0o100644)
                .expect("Failed to insert blob");
        }
        let tree_oid = builder.write().expect("Failed to write tree");
        let tree = repo.find_tree(tree_oid).expect("Failed to find tree");

        let sig = git2::Signature::now("Remote User", "remote@example.com")
            .expect("Failed to create signature");
        let parents: Vec<&git2::Commit> = parent.as_ref().into_iter().collect();

        repo.commit(Some(&refname), &sig, &sig, "Remote commit", &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Current tip of a branch on the remote
    pub fn branch_head(&self, branch: &str) -> git2::Oid {
        self.repo()
            .find_reference(&format!("refs/heads/{}", branch))
            .expect("Failed to find branch")
            .target()
            .expect("Failed to get target")
    }

    /// Plain clone of this remote into a fresh temp dir
    pub fn clone_into_temp(&self, name: &str) -> TestClone {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join(name);
        git2::Repository::clone(&self.path.to_string_lossy(), &path).expect("Failed to clone");

        TestClone {
            _dir: dir,
            local: LocalRepository {
                name: name.to_string(),
                path,
                branch: "main".to_string(),
            },
        }
    }
}

/// A working clone that lives as long as its temp dir
pub struct TestClone {
    _dir: TempDir,
    pub local: LocalRepository,
}

impl TestClone {
    pub fn path(&self) -> &Path {
        &self.local.path
    }
}

/// Credentials backed by a placeholder key file. Local remotes never ask for
/// them.
pub fn test_credentials() -> (TempDir, SshCredentials) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let key = dir.path().join("id_test");
    std::fs::write(&key, "not a real key").expect("Failed to write key");
    let creds = SshCredentials::from_path(&key.to_string_lossy(), None)
        .expect("Failed to load credentials");
    (dir, creds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_has_main() {
        let remote = TestRemote::with_files(&[("README.md", "# Test Repo")]);
        let repo = remote.repo();
        assert!(repo.is_bare());
        assert!(repo.find_reference("refs/heads/main").is_ok());
    }

    #[test]
    fn test_push_branch_builds_on_main() {
        let remote = TestRemote::with_files(&[("README.md", "# Test Repo")]);
        let main = remote.branch_head("main");
        let dev = remote.push_branch("develop", &[("DEV.md", "dev")]);

        let repo = remote.repo();
        let commit = repo.find_commit(dev).unwrap();
        assert_eq!(commit.parent_id(0).unwrap(), main);
        let tree = commit.tree().unwrap();
        assert!(tree.get_name("README.md").is_some());
        assert!(tree.get_name("DEV.md").is_some());
    }

    #[test]
    fn test_file_url_record_points_at_remote() {
        let remote = TestRemote::with_files(&[("README.md", "# Test Repo")]);
        let record = remote.file_url_record("me/test");
        assert!(record.ssh_url.starts_with("file://"));
        let url = url::Url::parse(&record.ssh_url).unwrap();
        assert_eq!(url.to_file_path().unwrap(), remote.path);
    }

    #[test]
    fn test_clone_into_temp() {
        let remote = TestRemote::with_files(&[("README.md", "# Test Repo")]);
        let clone = remote.clone_into_temp("me/test");
        assert!(clone.path().join("README.md").exists());
    }
}

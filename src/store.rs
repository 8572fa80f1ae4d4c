//! The content store: a local clone of the remote repository.
//!
//! Every read the resolver, renderer, listing builder and search engine
//! perform goes through [`ContentStore`], and so does every write the sync
//! loop performs. There is no locking: the sync loop may rewrite any file
//! between two calls, so each call observes whatever the tree holds at
//! that moment. Each [`read`](ContentStore::read) loads a whole file in
//! one call and either returns its bytes or fails.

use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::StoreConfig;
use crate::error::SyncError;
use crate::vcs::VersionControl;

/// One immediate child of a store directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub file_name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

pub struct ContentStore {
    config: StoreConfig,
    content_root: PathBuf,
    vcs: Arc<dyn VersionControl>,
}

impl ContentStore {
    pub fn new(config: StoreConfig, vcs: Arc<dyn VersionControl>) -> Self {
        let content_root = config.content_root();
        Self {
            config,
            content_root,
            vcs,
        }
    }

    /// Directory holding the clone.
    pub fn repo_root(&self) -> &Path {
        &self.config.local_path
    }

    /// Directory whose subtree is served.
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn suffix(&self) -> &str {
        &self.config.suffix
    }

    pub fn remote_url(&self) -> &str {
        &self.config.remote_url
    }

    // ============ Sync side ============

    pub fn is_present(&self) -> bool {
        self.repo_root().join(".git").exists()
    }

    pub fn clone_from_remote(&self) -> Result<(), SyncError> {
        self.vcs.clone_repo(
            &self.config.remote_url,
            self.config.branch.as_deref(),
            self.repo_root(),
        )
    }

    pub fn pull(&self) -> Result<(), SyncError> {
        self.vcs
            .pull(self.repo_root(), self.config.branch.as_deref())
    }

    // ============ Read side ============

    /// Map a URL path onto a location under the content root.
    ///
    /// Empty segments are ignored. Returns `None` if any segment would
    /// step outside the content root.
    pub fn locate(&self, url_path: &str) -> Option<PathBuf> {
        let mut path = self.content_root.clone();
        for segment in url_path.split('/').filter(|s| !s.is_empty()) {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => path.push(segment),
                _ => return None,
            }
        }
        Some(path)
    }

    /// The document file backing `path`, i.e. `<path>.<suffix>`.
    pub fn document_file(&self, path: &Path) -> PathBuf {
        let mut os = path.as_os_str().to_owned();
        os.push(".");
        os.push(&self.config.suffix);
        PathBuf::from(os)
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
    }

    pub fn is_file(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }

    pub fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    /// Immediate children of `dir`.
    ///
    /// A symlink counts as a directory only if it resolves to one; a
    /// dangling link is listed as a file.
    pub fn read_dir(&self, dir: &Path) -> io::Result<Vec<StoreEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            let path = entry.path();
            let file_type = entry.file_type()?;
            let is_dir = if file_type.is_symlink() {
                self.is_dir(&path)
            } else {
                file_type.is_dir()
            };
            entries.push(StoreEntry {
                file_name,
                path,
                is_dir,
            });
        }
        Ok(entries)
    }

    /// Walk every entry below the content root in file-name order. The
    /// root itself is not yielded.
    pub fn walk(&self) -> impl Iterator<Item = walkdir::Result<walkdir::DirEntry>> {
        WalkDir::new(&self.content_root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
    }

    /// Strip the document suffix from a file name, if present.
    pub fn item_name<'a>(&self, file_name: &'a str) -> &'a str {
        file_name
            .strip_suffix(self.config.suffix.as_str())
            .and_then(|stem| stem.strip_suffix('.'))
            .filter(|stem| !stem.is_empty())
            .unwrap_or(file_name)
    }

    /// URL path of a location under the content root, with the document
    /// suffix removed from the final segment.
    pub fn url_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.content_root).ok()?;
        let mut segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if let Some(last) = segments.last_mut() {
            *last = self.item_name(last).to_string();
        }
        Some(segments.join("/"))
    }

    /// Time of the last commit touching `path`, or `None` when git has
    /// no history for it. Filesystem mtimes are never consulted: a pull
    /// rewrites them.
    pub fn last_modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        let relative = path.strip_prefix(self.repo_root()).unwrap_or(path);
        self.vcs.last_commit_time(self.repo_root(), relative)
    }

    /// Link to the source of `path` on the remote's web interface.
    ///
    /// `git@host:owner/repo.git` and `https://host/owner/repo.git` both map
    /// to `https://host/owner/repo`. GitLab hosts get the `/-/blob/` form.
    pub fn source_url(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(self.repo_root()).ok()?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");

        let remote = self.config.remote_url.trim_end_matches('/');
        let remote = remote.strip_suffix(".git").unwrap_or(remote);
        let base = match remote.strip_prefix("git@") {
            Some(scp) => format!("https://{}", scp.replacen(':', "/", 1)),
            None => remote.to_string(),
        };
        let rev = self.config.branch.as_deref().unwrap_or("HEAD");
        let blob = if base.contains("gitlab") { "-/blob" } else { "blob" };
        Some(format!("{}/{}/{}/{}", base, blob, rev, relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::vcs::GitCli;
    use tempfile::TempDir;

    fn store_at(tmp: &TempDir) -> ContentStore {
        let cfg = Config::for_store("https://github.com/example/site", tmp.path());
        ContentStore::new(cfg.store, Arc::new(GitCli::new()))
    }

    #[test]
    fn test_locate_joins_segments() {
        let tmp = TempDir::new().unwrap();
        let store = store_at(&tmp);
        assert_eq!(
            store.locate("notes/foo").unwrap(),
            tmp.path().join("data").join("notes").join("foo")
        );
        assert_eq!(
            store.locate("/notes//foo/").unwrap(),
            tmp.path().join("data").join("notes").join("foo")
        );
    }

    #[test]
    fn test_locate_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let store = store_at(&tmp);
        assert!(store.locate("../secret").is_none());
        assert!(store.locate("notes/./foo").is_none());
    }

    #[test]
    fn test_item_name_strips_only_document_suffix() {
        let tmp = TempDir::new().unwrap();
        let store = store_at(&tmp);
        assert_eq!(store.item_name("foo.md"), "foo");
        assert_eq!(store.item_name("foo.png"), "foo.png");
        assert_eq!(store.item_name("notes"), "notes");
        assert_eq!(store.item_name(".md"), ".md");
        assert_eq!(store.item_name("readme"), "readme");
    }

    #[test]
    fn test_url_path_round_trips_locate() {
        let tmp = TempDir::new().unwrap();
        let store = store_at(&tmp);
        let dir = store.locate("notes/foo").unwrap();
        let file = store.document_file(&dir);
        assert!(file.ends_with("notes/foo.md"));
        assert_eq!(store.url_path(&file).unwrap(), "notes/foo");
        assert!(store.url_path(Path::new("/elsewhere/x.md")).is_none());
    }

    #[test]
    fn test_read_dir_includes_hidden() {
        let tmp = TempDir::new().unwrap();
        let store = store_at(&tmp);
        let root = store.content_root().to_path_buf();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join(".hidden"), "h").unwrap();

        let mut names: Vec<_> = store
            .read_dir(&root)
            .unwrap()
            .into_iter()
            .map(|e| (e.file_name, e.is_dir))
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                (".hidden".to_string(), false),
                ("a.md".to_string(), false),
                ("sub".to_string(), true)
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_read_dir_lists_dangling_symlink_as_file() {
        let tmp = TempDir::new().unwrap();
        let store = store_at(&tmp);
        let root = store.content_root().to_path_buf();
        fs::create_dir_all(root.join("sub")).unwrap();
        std::os::unix::fs::symlink(root.join("gone.md"), root.join("broken.md")).unwrap();
        std::os::unix::fs::symlink(root.join("sub"), root.join("alias")).unwrap();

        let mut names: Vec<_> = store
            .read_dir(&root)
            .unwrap()
            .into_iter()
            .map(|e| (e.file_name, e.is_dir))
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                ("alias".to_string(), true),
                ("broken.md".to_string(), false),
                ("sub".to_string(), true)
            ]
        );
    }

    #[test]
    fn test_source_url_is_relative_to_repo() {
        let tmp = TempDir::new().unwrap();
        let store = store_at(&tmp);
        let file = store.document_file(&store.locate("notes/foo").unwrap());
        assert_eq!(
            store.source_url(&file).unwrap(),
            "https://github.com/example/site/blob/HEAD/data/notes/foo.md"
        );
    }

    fn store_with_remote(tmp: &TempDir, remote: &str, branch: Option<&str>) -> ContentStore {
        let mut cfg = Config::for_store(remote, tmp.path());
        cfg.store.branch = branch.map(String::from);
        ContentStore::new(cfg.store, Arc::new(GitCli::new()))
    }

    #[test]
    fn test_source_url_from_ssh_remote() {
        let tmp = TempDir::new().unwrap();
        let store = store_with_remote(&tmp, "git@github.com:example/site.git", Some("main"));
        let file = store.content_root().join("about.md");
        assert_eq!(
            store.source_url(&file).unwrap(),
            "https://github.com/example/site/blob/main/data/about.md"
        );
    }

    #[test]
    fn test_source_url_gitlab_layout() {
        let tmp = TempDir::new().unwrap();
        let store = store_with_remote(&tmp, "https://gitlab.com/example/site.git", None);
        let file = store.content_root().join("about.md");
        assert_eq!(
            store.source_url(&file).unwrap(),
            "https://gitlab.com/example/site/-/blob/HEAD/data/about.md"
        );
    }

    #[test]
    fn test_source_url_outside_repo_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = store_at(&tmp);
        assert!(store.source_url(Path::new("/elsewhere/x.md")).is_none());
    }
}

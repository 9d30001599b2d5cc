//! Folder traversal: flatten a folder tree into filtered [`SourceFile`]s.
//!
//! The walk is depth-first pre-order, driven by an explicit stack of pending child listings
//! instead of call recursion. Output order is the order a recursive descent over the same
//! listings would produce. Each listing call completes before the next sibling is visited.
//!
//! Two listers are provided: [`RemoteLister`] over the browsing service and [`LocalLister`]
//! over the local filesystem. Both yield slash-rooted paths relative to the storage root, so
//! an equivalent tree produces the same `relative_path`s from either side.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task;
use tracing::{debug, info};

use crate::contract::{Explorer, ExplorerScope, FolderLocator};
use crate::error::DiscoveryError;
use crate::filter::{include, FilterConfig};
use crate::source_file::{normalize, SourceFile};

/// A child returned by a listing: either a folder to descend into or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listed<L> {
    Directory(L),
    File(SourceFile),
}

/// Lists the immediate children of one folder.
#[async_trait]
pub trait Lister: Send + Sync {
    type Location: fmt::Debug + Send + Sync;

    async fn list(
        &self,
        location: &Self::Location,
    ) -> Result<Vec<Listed<Self::Location>>, DiscoveryError>;
}

/// Walk everything reachable from `root`, keeping the files accepted by `filter`.
///
/// A failed listing anywhere in the tree aborts the walk; callers decide how to degrade.
pub async fn traverse<L: Lister>(
    lister: &L,
    root: L::Location,
    filter: &FilterConfig,
) -> Result<Vec<SourceFile>, DiscoveryError> {
    info!(root = ?root, "Finding source files");
    let mut files = Vec::new();
    let mut folders = 1usize;
    let mut pending = vec![lister.list(&root).await?.into_iter()];

    while let Some(children) = pending.last_mut() {
        match children.next() {
            None => {
                pending.pop();
            }
            Some(Listed::File(file)) => {
                if include(&file, filter) {
                    debug!(path = %file.relative_path, size = file.size_in_bytes, "Included source file");
                    files.push(file);
                }
            }
            Some(Listed::Directory(folder)) => {
                debug!(folder = ?folder, "Descending into folder");
                folders += 1;
                let listing = lister.list(&folder).await?;
                pending.push(listing.into_iter());
            }
        }
    }

    info!(files = files.len(), folders, "Traversal complete");
    Ok(files)
}

/// Lists folders of one portal through the browsing service.
///
/// The root may be addressed by folder id or by path; every subfolder is addressed by its
/// path.
pub struct RemoteLister<'a> {
    pub explorer: &'a dyn Explorer,
    pub scope: &'a ExplorerScope,
    pub portal_id: &'a str,
}

#[async_trait]
impl Lister for RemoteLister<'_> {
    type Location = FolderLocator;

    async fn list(
        &self,
        location: &FolderLocator,
    ) -> Result<Vec<Listed<FolderLocator>>, DiscoveryError> {
        let entries = self
            .explorer
            .get_folder_content(self.scope, self.portal_id, location)
            .await
            .map_err(|e| DiscoveryError::Listing {
                location: location.to_string(),
                message: e.to_string(),
            })?;

        entries
            .into_iter()
            .map(|entry| {
                if entry.is_directory {
                    return Ok(Listed::Directory(FolderLocator::BrowsePath(entry.path)));
                }
                let size = entry.size_in_bytes.ok_or_else(|| DiscoveryError::Listing {
                    location: location.to_string(),
                    message: format!("file {} has no size", entry.path),
                })?;
                Ok(Listed::File(normalize(entry.path, size, entry.last_modified_on)))
            })
            .collect()
    }
}

/// Lists folders below a local root directory.
///
/// Children are sorted by name. Symlinks to files are followed; symlinked directories are
/// skipped so a link cycle cannot loop the walk.
#[derive(Debug, Clone)]
pub struct LocalLister {
    root: PathBuf,
}

impl LocalLister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalLister { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `/`-joined path of `path` below the root, with a leading `/`.
    fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let mut out = String::new();
        for component in relative.components() {
            if let Component::Normal(part) = component {
                out.push('/');
                out.push_str(&part.to_string_lossy());
            }
        }
        out
    }
}

impl LocalLister {
    fn list_blocking(&self, location: &Path) -> Result<Vec<Listed<PathBuf>>, DiscoveryError> {
        let listing_error = |e: std::io::Error| DiscoveryError::Listing {
            location: location.display().to_string(),
            message: e.to_string(),
        };

        let mut entries = fs::read_dir(location)
            .map_err(listing_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(listing_error)?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = entry.path();
            let is_symlink = entry.file_type().map_err(listing_error)?.is_symlink();
            let metadata = fs::metadata(&path).map_err(listing_error)?;

            if metadata.is_dir() {
                if is_symlink {
                    debug!(path = %path.display(), "Skipping symlinked directory");
                    continue;
                }
                children.push(Listed::Directory(path));
            } else {
                let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
                children.push(Listed::File(normalize(
                    self.relative_path(&path),
                    metadata.len(),
                    modified,
                )));
            }
        }
        Ok(children)
    }
}

#[async_trait]
impl Lister for LocalLister {
    type Location = PathBuf;

    /// Filesystem calls run on the blocking pool.
    async fn list(&self, location: &PathBuf) -> Result<Vec<Listed<PathBuf>>, DiscoveryError> {
        let lister = self.clone();
        let location = location.clone();
        let display = location.display().to_string();
        task::spawn_blocking(move || lister.list_blocking(&location))
            .await
            .map_err(|e| DiscoveryError::Listing {
                location: display,
                message: e.to_string(),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{FolderEntry, MockExplorer};
    use crate::error::ServiceError;
    use crate::filter::{FilterSection, InclusionSection};
    use std::fs::{create_dir_all, write};
    use tempfile::tempdir;

    fn paths(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    fn entry(path: &str, is_directory: bool, size: u64) -> FolderEntry {
        FolderEntry {
            path: path.to_string(),
            is_directory,
            size_in_bytes: (!is_directory).then_some(size),
            last_modified_on: None,
        }
    }

    #[tokio::test]
    async fn local_walk_is_preorder_and_slash_rooted() {
        let tmp = tempdir().unwrap();
        create_dir_all(tmp.path().join("b/inner")).unwrap();
        write(tmp.path().join("a.txt"), b"a").unwrap();
        write(tmp.path().join("b/inner/deep.mov"), b"deep").unwrap();
        write(tmp.path().join("b/z.txt"), b"zz").unwrap();
        write(tmp.path().join("c.txt"), b"ccc").unwrap();

        let lister = LocalLister::new(tmp.path());
        let files = traverse(&lister, tmp.path().to_path_buf(), &FilterConfig::default())
            .await
            .unwrap();

        assert_eq!(
            paths(&files),
            vec!["/a.txt", "/b/inner/deep.mov", "/b/z.txt", "/c.txt"]
        );
        assert_eq!(files[1].size_in_bytes, 4);
        assert!(files.iter().all(|f| f.last_modified_on.is_some()));
    }

    #[tokio::test]
    async fn local_walk_of_empty_folder_is_empty() {
        let tmp = tempdir().unwrap();
        create_dir_all(tmp.path().join("empty/also_empty")).unwrap();
        let lister = LocalLister::new(tmp.path());
        let files = traverse(&lister, tmp.path().to_path_buf(), &FilterConfig::default())
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn local_walk_of_missing_root_is_a_listing_error() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let lister = LocalLister::new(&missing);
        let err = traverse(&lister, missing.clone(), &FilterConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Listing { .. }));
    }

    #[tokio::test]
    async fn remote_walk_switches_to_path_addressing_below_root() {
        let mut explorer = MockExplorer::new();
        explorer
            .expect_get_folder_content()
            .withf(|_, portal, folder| {
                portal == "p1" && *folder == FolderLocator::FolderId("home".into())
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(vec![
                    entry("/a.mov", false, 500),
                    entry("/clips", true, 0),
                    entry("/z.txt", false, 1),
                ])
            });
        explorer
            .expect_get_folder_content()
            .withf(|_, _, folder| *folder == FolderLocator::BrowsePath("/clips".into()))
            .times(1)
            .returning(|_, _, _| Ok(vec![entry("/clips/b.mov", false, 7)]));

        let scope = ExplorerScope {
            account_id: "acc".into(),
            service_id: "svc".into(),
        };
        let lister = RemoteLister {
            explorer: &explorer,
            scope: &scope,
            portal_id: "p1",
        };
        let filter = FilterConfig::compile(&FilterSection {
            inclusions: Some(InclusionSection {
                relative_file_path: Some(r"\.mov$".into()),
                last_modified_before: None,
            }),
            exclusions: None,
        })
        .unwrap();

        let files = traverse(&lister, FolderLocator::FolderId("home".into()), &filter)
            .await
            .unwrap();
        assert_eq!(paths(&files), vec!["/a.mov", "/clips/b.mov"]);
    }

    #[tokio::test]
    async fn remote_listing_failure_aborts_walk() {
        let mut explorer = MockExplorer::new();
        explorer
            .expect_get_folder_content()
            .withf(|_, _, folder| matches!(folder, FolderLocator::FolderId(_)))
            .returning(|_, _, _| Ok(vec![entry("/broken", true, 0)]));
        explorer
            .expect_get_folder_content()
            .withf(|_, _, folder| matches!(folder, FolderLocator::BrowsePath(_)))
            .returning(|_, _, _| Err(ServiceError::Http("connection reset".into())));

        let scope = ExplorerScope {
            account_id: "acc".into(),
            service_id: "svc".into(),
        };
        let lister = RemoteLister {
            explorer: &explorer,
            scope: &scope,
            portal_id: "p1",
        };
        let err = traverse(&lister, FolderLocator::FolderId("home".into()), &FilterConfig::default())
            .await
            .unwrap_err();
        match err {
            DiscoveryError::Listing { location, message } => {
                assert_eq!(location, "path /broken");
                assert!(message.contains("connection reset"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn remote_directory_without_size_is_walked() {
        let mut explorer = MockExplorer::new();
        explorer
            .expect_get_folder_content()
            .withf(|_, _, folder| matches!(folder, FolderLocator::FolderId(_)))
            .returning(|_, _, _| {
                let rows = r#"[
                    {"path":"/clips","isDirectory":true,"sizeInBytes":null},
                    {"path":"/a.mov","isDirectory":false,"sizeInBytes":3,"lastModifiedOn":1704067200000}
                ]"#;
                Ok(serde_json::from_str(rows).unwrap())
            });
        explorer
            .expect_get_folder_content()
            .withf(|_, _, folder| matches!(folder, FolderLocator::BrowsePath(_)))
            .returning(|_, _, _| Ok(vec![entry("/clips/b.mov", false, 7)]));

        let scope = ExplorerScope {
            account_id: "acc".into(),
            service_id: "svc".into(),
        };
        let lister = RemoteLister {
            explorer: &explorer,
            scope: &scope,
            portal_id: "p1",
        };
        let files = traverse(&lister, FolderLocator::FolderId("home".into()), &FilterConfig::default())
            .await
            .unwrap();
        assert_eq!(paths(&files), vec!["/clips/b.mov", "/a.mov"]);
        assert!(files[1].last_modified_on.is_some());
    }

    #[tokio::test]
    async fn remote_file_without_size_is_a_listing_error() {
        let mut explorer = MockExplorer::new();
        explorer.expect_get_folder_content().returning(|_, _, _| {
            Ok(vec![FolderEntry {
                path: "/a.mov".into(),
                is_directory: false,
                size_in_bytes: None,
                last_modified_on: None,
            }])
        });

        let scope = ExplorerScope {
            account_id: "acc".into(),
            service_id: "svc".into(),
        };
        let lister = RemoteLister {
            explorer: &explorer,
            scope: &scope,
            portal_id: "p1",
        };
        let err = traverse(&lister, FolderLocator::FolderId("home".into()), &FilterConfig::default())
            .await
            .unwrap_err();
        match err {
            DiscoveryError::Listing { location, message } => {
                assert_eq!(location, "folder home");
                assert!(message.contains("/a.mov"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}

use crate::error::{CompareError, Result};
use globset::{GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Async discovery of the documents inside a control or test directory.
///
/// Include and exclude globs are matched against the path relative to the
/// directory being scanned, so `*.bak.xml` excludes `a.bak.xml` at the top
/// level and `**/*.bak.xml` excludes it anywhere.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File extensions to include (e.g., ["xml", "cmdi"])
    extensions: Vec<String>,
    /// Include patterns set
    include_set: Option<GlobSet>,
    /// Exclude patterns set
    exclude_set: Option<GlobSet>,
    /// Maximum depth for directory traversal (None = unlimited)
    max_depth: Option<usize>,
    /// Follow symbolic links
    follow_symlinks: bool,
}

impl FileDiscovery {
    /// Top-level files only, `.xml` extension
    pub fn new() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            include_set: None,
            exclude_set: None,
            max_depth: Some(0),
            follow_symlinks: false,
        }
    }

    /// Set file extensions to discover
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.to_lowercase())
            .collect();
        self
    }

    /// Add include patterns
    pub fn with_include_patterns(mut self, patterns: &[String]) -> Result<Self> {
        self.include_set = build_glob_set(patterns)?;
        Ok(self)
    }

    /// Add exclude patterns
    pub fn with_exclude_patterns(mut self, patterns: &[String]) -> Result<Self> {
        self.exclude_set = build_glob_set(patterns)?;
        Ok(self)
    }

    /// Set maximum traversal depth (`Some(0)` = top level only)
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Shorthand for unlimited depth vs. top level only
    pub fn with_recursive(self, recursive: bool) -> Self {
        self.with_max_depth(if recursive { None } else { Some(0) })
    }

    /// Set whether to follow symbolic links
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Discover documents under `root`, returned as paths relative to it and
    /// sorted.
    pub async fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(root)
            .await
            .map_err(|e| CompareError::FileSystemTraversal {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !metadata.is_dir() {
            return Err(CompareError::FileSystemTraversal {
                path: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        let mut files = Vec::new();
        self.discover_files_recursive(root, root, 0, &mut files)
            .await?;
        files.sort();

        debug!(root = %root.display(), count = files.len(), "discovered documents");
        Ok(files)
    }

    /// Recursive helper for discovering files
    fn discover_files_recursive<'a>(
        &'a self,
        root: &'a Path,
        dir: &'a Path,
        depth: usize,
        files: &'a mut Vec<PathBuf>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + 'a>> {
        Box::pin(async move {
            let mut read_dir = fs::read_dir(dir).await?;

            while let Some(entry) = read_dir.next_entry().await? {
                let entry_path = entry.path();

                // Handle symlinks
                if entry_path.is_symlink() && !self.follow_symlinks {
                    continue;
                }

                let metadata = match fs::metadata(&entry_path).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        // Log error but continue processing other files
                        warn!(path = %entry_path.display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                };

                if metadata.is_file() {
                    let relative = entry_path
                        .strip_prefix(root)
                        .unwrap_or(&entry_path)
                        .to_path_buf();
                    if self.should_process(&relative) {
                        files.push(relative);
                    }
                } else if metadata.is_dir() {
                    // Only recurse into directories if we can still go deeper
                    if let Some(max_depth) = self.max_depth
                        && depth >= max_depth
                    {
                        continue;
                    }

                    if let Err(e) = self
                        .discover_files_recursive(root, &entry_path, depth + 1, files)
                        .await
                    {
                        warn!(path = %entry_path.display(), error = %e, "skipping directory");
                    }
                }
            }

            Ok(())
        })
    }

    /// Check if a relative path should be processed based on extension and patterns
    pub fn should_process(&self, path: &Path) -> bool {
        // Check extension
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(extension) if self.extensions.contains(&extension.to_lowercase()) => {}
            _ => return false,
        }

        // Check exclude patterns first
        if let Some(exclude_set) = &self.exclude_set
            && exclude_set.is_match(path)
        {
            return false;
        }

        // Check include patterns (if any are specified, at least one must match)
        if let Some(include_set) = &self.include_set {
            return include_set.is_match(path);
        }

        true
    }

    /// Discover both directories and pair their documents by relative path.
    pub async fn discover_pairs(&self, control_dir: &Path, test_dir: &Path) -> Result<Vec<FilePair>> {
        let (control_files, test_files) = futures::future::try_join(
            self.discover_files(control_dir),
            self.discover_files(test_dir),
        )
        .await?;

        Ok(pair_files(control_dir, &control_files, test_dir, &test_files))
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| CompareError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        builder.add(glob);
    }

    let set = builder.build().map_err(|e| CompareError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })?;
    Ok(Some(set))
}

/// A control document and its test counterpart. At least one side is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePair {
    /// Relative path with `/` separators, used in console and report lines
    pub name: String,
    pub control: Option<PathBuf>,
    pub test: Option<PathBuf>,
}

impl FilePair {
    pub fn is_complete(&self) -> bool {
        self.control.is_some() && self.test.is_some()
    }
}

/// Join two relative file lists into pairs sorted by name.
pub fn pair_files(
    control_dir: &Path,
    control_files: &[PathBuf],
    test_dir: &Path,
    test_files: &[PathBuf],
) -> Vec<FilePair> {
    let mut pairs: BTreeMap<String, FilePair> = BTreeMap::new();

    for relative in control_files {
        let name = pair_name(relative);
        pairs
            .entry(name.clone())
            .or_insert_with(|| FilePair {
                name,
                control: None,
                test: None,
            })
            .control = Some(control_dir.join(relative));
    }

    for relative in test_files {
        let name = pair_name(relative);
        pairs
            .entry(name.clone())
            .or_insert_with(|| FilePair {
                name,
                control: None,
                test: None,
            })
            .test = Some(test_dir.join(relative));
    }

    pairs.into_values().collect()
}

fn pair_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

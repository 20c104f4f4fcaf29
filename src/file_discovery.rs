use crate::error::{Result, ServerError};
use globset::{GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Lazy recursive file discovery filtered by extension and exclude globs
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File extensions to include (e.g., ["xsd"])
    extensions: Vec<String>,
    /// Exclude patterns set
    exclude_set: Option<GlobSet>,
}

impl FileDiscovery {
    /// Create a new FileDiscovery instance looking for schema files
    pub fn new() -> Self {
        Self {
            extensions: vec!["xsd".to_string()],
            exclude_set: None,
        }
    }

    /// Set file extensions to discover
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Add exclude patterns
    pub fn with_exclude_patterns(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            self.exclude_set = None;
            return Ok(self);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = globset::GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    ServerError::Config(format!("Invalid glob pattern '{}': {}", pattern, e))
                })?;
            builder.add(glob);
        }

        self.exclude_set = Some(builder.build().map_err(|e| {
            ServerError::Config(format!("Failed to build exclude glob set: {}", e))
        })?);
        Ok(self)
    }

    /// Discover files under `path` (file or directory).
    ///
    /// Fails only when `path` itself cannot be inspected. Entries that fail
    /// during the walk are logged and skipped.
    pub fn discover<'a>(&'a self, path: &Path) -> Result<Box<dyn Iterator<Item = PathBuf> + 'a>> {
        let metadata = std::fs::metadata(path).map_err(ServerError::from)?;

        if metadata.is_file() {
            let single = self.should_process(path).then(|| path.to_path_buf());
            return Ok(Box::new(single.into_iter()));
        }

        if !metadata.is_dir() {
            return Err(ServerError::FileSystemTraversal {
                path: path.to_path_buf(),
                reason: "not a file or directory".to_string(),
            });
        }

        let mut builder = WalkBuilder::new(path);
        builder.standard_filters(false).follow_links(false);

        if let Some(exclude_set) = self.exclude_set.clone() {
            builder.filter_entry(move |entry| !exclude_set.is_match(entry.path()));
        }

        let files = builder.build().filter_map(move |entry| match entry {
            Ok(entry) => {
                let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
                (is_file && self.should_process(entry.path())).then(|| entry.into_path())
            }
            Err(e) => {
                tracing::warn!("Error processing directory entry: {}", e);
                None
            }
        });

        Ok(Box::new(files))
    }

    /// Check if a file should be processed based on extensions and patterns
    pub fn should_process(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        if !self.extensions.contains(&extension.to_lowercase()) {
            return false;
        }

        if let Some(exclude_set) = &self.exclude_set
            && exclude_set.is_match(path)
        {
            return false;
        }

        true
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

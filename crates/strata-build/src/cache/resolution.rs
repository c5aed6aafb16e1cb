//! Module resolution caches
//!
//! A `None` entry records a failed resolution so repeated lookups of a
//! missing module do not touch the filesystem again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolutions of in-project specifiers, keyed by (specifier, containing directory)
#[derive(Debug, Default)]
pub struct ModuleResolutionCache {
    entries: HashMap<(String, PathBuf), Option<PathBuf>>,
}

impl ModuleResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached resolution; outer `None` means not cached
    pub fn get(&self, specifier: &str, containing_dir: &Path) -> Option<Option<PathBuf>> {
        self.entries
            .get(&(specifier.to_string(), containing_dir.to_path_buf()))
            .cloned()
    }

    pub fn insert(&mut self, specifier: &str, containing_dir: &Path, resolved: Option<PathBuf>) {
        self.entries
            .insert((specifier.to_string(), containing_dir.to_path_buf()), resolved);
    }

    /// Drop entries that resolved to `path` and every failed resolution
    pub fn invalidate_file(&mut self, path: &Path) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, resolved| matches!(resolved, Some(p) if p != path));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolutions of cross-project package specifiers, keyed by specifier
#[derive(Debug, Default)]
pub struct ProjectResolutionCache {
    entries: HashMap<String, Option<PathBuf>>,
}

impl ProjectResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached resolution; outer `None` means not cached
    pub fn get(&self, specifier: &str) -> Option<Option<PathBuf>> {
        self.entries.get(specifier).cloned()
    }

    pub fn insert(&mut self, specifier: &str, resolved: Option<PathBuf>) {
        self.entries.insert(specifier.to_string(), resolved);
    }

    /// Remove the entry for `specifier`. Returns whether one existed.
    pub fn invalidate(&mut self, specifier: &str) -> bool {
        self.entries.remove(specifier).is_some()
    }

    pub fn contains(&self, specifier: &str) -> bool {
        self.entries.contains_key(specifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_cache_distinguishes_directories() {
        let mut cache = ModuleResolutionCache::new();
        cache.insert("./a", Path::new("/p/src"), Some(PathBuf::from("/p/src/a.st")));

        assert_eq!(
            cache.get("./a", Path::new("/p/src")),
            Some(Some(PathBuf::from("/p/src/a.st")))
        );
        assert_eq!(cache.get("./a", Path::new("/p/lib")), None);
    }

    #[test]
    fn test_invalidate_file_drops_matches_and_failures() {
        let mut cache = ModuleResolutionCache::new();
        cache.insert("./a", Path::new("/p/src"), Some(PathBuf::from("/p/src/a.st")));
        cache.insert("./b", Path::new("/p/src"), Some(PathBuf::from("/p/src/b.st")));
        cache.insert("./c", Path::new("/p/src"), None);

        let removed = cache.invalidate_file(Path::new("/p/src/a.st"));

        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("./b", Path::new("/p/src")).is_some());
    }

    #[test]
    fn test_project_cache_invalidate() {
        let mut cache = ProjectResolutionCache::new();
        cache.insert("@acme/core", None);

        assert!(cache.contains("@acme/core"));
        assert!(cache.invalidate("@acme/core"));
        assert!(!cache.invalidate("@acme/core"));
        assert!(cache.is_empty());
    }
}

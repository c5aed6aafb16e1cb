//! Parsed source files shared by every project

use crate::error::BuildResult;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A loaded and parsed source file
#[derive(Debug)]
pub struct SourceFile<S> {
    /// Absolute path
    pub path: PathBuf,
    /// Language target the file was parsed for
    pub target: String,
    /// File contents
    pub text: String,
    /// SHA-256 of the contents
    pub version: String,
    /// Backend parse result
    pub syntax: S,
}

impl<S> SourceFile<S> {
    /// Create a source file, computing its version from the text
    pub fn new(path: impl Into<PathBuf>, target: impl Into<String>, text: String, syntax: S) -> Self {
        Self {
            path: path.into(),
            target: target.into(),
            version: compute_version(&text),
            text,
            syntax,
        }
    }
}

/// Content hash used as a source file version
pub fn compute_version(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Source files bucketed by language target
#[derive(Debug)]
pub struct SourceFileCache<S> {
    buckets: HashMap<String, HashMap<PathBuf, Rc<SourceFile<S>>>>,
}

impl<S> SourceFileCache<S> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    /// Cached file for a target, if loaded
    pub fn get(&self, target: &str, path: &Path) -> Option<Rc<SourceFile<S>>> {
        self.buckets.get(target)?.get(path).cloned()
    }

    /// Return the cached file, or load it with `loader` and cache the result.
    /// Failed loads are not cached.
    pub fn get_or_load<F>(&mut self, target: &str, path: &Path, loader: F) -> BuildResult<Rc<SourceFile<S>>>
    where
        F: FnOnce(&Path) -> BuildResult<SourceFile<S>>,
    {
        let bucket = self.buckets.entry(target.to_string()).or_default();
        if let Some(file) = bucket.get(path) {
            return Ok(Rc::clone(file));
        }

        let file = Rc::new(loader(path)?);
        bucket.insert(path.to_path_buf(), Rc::clone(&file));
        Ok(file)
    }

    /// Remove `path` from every target bucket. Returns whether anything was cached.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let mut removed = false;
        for bucket in self.buckets.values_mut() {
            removed |= bucket.remove(path).is_some();
        }
        removed
    }

    /// Number of cached files across all targets
    pub fn len(&self) -> usize {
        self.buckets.values().map(HashMap::len).sum()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> Default for SourceFileCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

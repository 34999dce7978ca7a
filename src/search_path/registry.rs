//! Where published search paths live.

use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::runtime::Runtime;

use super::SearchPathEntry;

/// Name of the Prolog file the runtime consults to find installed packages.
pub const SEARCH_PATHS_FILE: &str = "search_paths.pl";

/// Process-wide search-path state.
///
/// `publish` replaces the whole set; nothing is ever patched in place.
#[cfg_attr(test, mockall::automock)]
pub trait SearchPathRegistry: Send + Sync {
    fn publish(&self, entries: &[SearchPathEntry]) -> Result<()>;
    fn entries(&self) -> Vec<SearchPathEntry>;
}

/// In-memory registry. Starts empty.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: RwLock<Vec<SearchPathEntry>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchPathRegistry for MemoryRegistry {
    fn publish(&self, entries: &[SearchPathEntry]) -> Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        *guard = entries.to_vec();
        Ok(())
    }

    fn entries(&self) -> Vec<SearchPathEntry> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Registry persisted as `file_search_path/2` facts.
pub struct FileRegistry<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    memory: MemoryRegistry,
}

impl<'a, R: Runtime> FileRegistry<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self {
            runtime,
            path,
            memory: MemoryRegistry::new(),
        }
    }

    /// Registry file inside an install root.
    pub fn in_root(runtime: &'a R, install_root: &Path) -> Self {
        Self::new(runtime, install_root.join(SEARCH_PATHS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: Runtime> SearchPathRegistry for FileRegistry<'_, R> {
    #[tracing::instrument(skip(self, entries))]
    fn publish(&self, entries: &[SearchPathEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        debug!("Writing {} search path(s) to {:?}", entries.len(), self.path);
        self.runtime
            .write(&self.path, render_prolog(entries).as_bytes())
            .with_context(|| format!("Failed to publish search paths to {:?}", self.path))?;

        self.memory.publish(entries)
    }

    fn entries(&self) -> Vec<SearchPathEntry> {
        self.memory.entries()
    }
}

/// Render entries as a consultable Prolog file.
pub fn render_prolog(entries: &[SearchPathEntry]) -> String {
    let mut out = String::from(
        "% Generated by plpm. Do not edit.\n\
         :- multifile user:file_search_path/2.\n\
         :- dynamic user:file_search_path/2.\n\n",
    );
    for entry in entries {
        out.push_str(&format!(
            "user:file_search_path({}, '{}').\n",
            entry.kind.alias(),
            quote_atom(&entry.dir.to_string_lossy())
        ));
    }
    out
}

fn quote_atom(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

//! Per-scan file evidence with memoized content access.
//!
//! Each collected file is read at most once per scan: the first consumer
//! loads a bounded prefix (the database-wide read span) and every digest is
//! computed from that cached prefix and remembered by view and cap.

use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{trace, warn};

use super::fs::{read_prefix, FsNode};
use crate::core::{ContainerKind, Fingerprint, FingerprintCap};

/// Which bytes of a file a fingerprint was taken over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentView {
    Raw,
    Unwrapped { kind: ContainerKind, inner: Option<String> },
}

/// Content recovered from inside a wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrappedContent {
    pub kind: ContainerKind,
    /// Inner entry name for archive-like wrappers.
    pub inner: Option<String>,
    pub data: Arc<[u8]>,
    /// Full length of the inner content, which may exceed `data`.
    pub logical_size: u64,
}

impl UnwrappedContent {
    pub fn view(&self) -> ContentView {
        ContentView::Unwrapped {
            kind: self.kind,
            inner: self.inner.clone(),
        }
    }
}

/// A file found by the collector.
pub struct FileEvidence {
    node: Arc<dyn FsNode>,
    display_name: String,
    lower_name: String,
    depth: usize,
    read_span: u64,
    prefix: OnceCell<Result<Arc<[u8]>, String>>,
    digests: Mutex<HashMap<(ContentView, FingerprintCap), Fingerprint>>,
    effective: OnceCell<UnwrappedContent>,
}

impl FileEvidence {
    pub fn new(node: Arc<dyn FsNode>, depth: usize, read_span: u64) -> Self {
        let display_name = node.display_name().to_string();
        let lower_name = display_name.to_lowercase();
        Self {
            node,
            display_name,
            lower_name,
            depth,
            read_span,
            prefix: OnceCell::new(),
            digests: Mutex::new(HashMap::new()),
            effective: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.node.path()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn lower_name(&self) -> &str {
        &self.lower_name
    }

    /// Directory depth below the scan root; root entries are at depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Size of the file as stored.
    pub fn raw_size(&self) -> u64 {
        self.node.size()
    }

    /// Size after an accepted unwrap, otherwise the stored size.
    pub fn size(&self) -> u64 {
        self.effective
            .get()
            .map(|c| c.logical_size)
            .unwrap_or_else(|| self.raw_size())
    }

    pub fn is_loaded(&self) -> bool {
        self.prefix.get().is_some()
    }

    /// Leading bytes of the file, read on first use.
    pub fn prefix(&self) -> Result<Arc<[u8]>, String> {
        self.prefix
            .get_or_init(|| match read_prefix(self.node.as_ref(), self.read_span) {
                Ok(buf) => Ok(Arc::from(buf)),
                Err(e) => {
                    warn!(file = %self.display_name, error = %e, "failed to read file");
                    Err(e.to_string())
                }
            })
            .clone()
    }

    /// Fingerprint of `data` as the `view` of this file, memoized.
    pub fn fingerprint_with(
        &self,
        view: ContentView,
        cap: FingerprintCap,
        data: &[u8],
    ) -> Fingerprint {
        let key = (view, cap);
        if let Ok(digests) = self.digests.lock() {
            if let Some(fp) = digests.get(&key) {
                return *fp;
            }
        }
        let fp = Fingerprint::of_prefix(data, cap);
        trace!(file = %self.display_name, view = ?key.0, fingerprint = %fp, "computed fingerprint");
        if let Ok(mut digests) = self.digests.lock() {
            digests.insert(key, fp);
        }
        fp
    }

    /// Fingerprint of the stored bytes.
    pub fn raw_fingerprint(&self, cap: FingerprintCap) -> Result<Fingerprint, String> {
        let data = self.prefix()?;
        Ok(self.fingerprint_with(ContentView::Raw, cap, &data))
    }

    /// Makes `content` the effective content for everything downstream.
    /// The first accepted unwrap wins.
    pub fn accept_unwrapped(&self, content: UnwrappedContent) {
        let _ = self.effective.set(content);
    }

    pub fn unwrapped(&self) -> Option<&UnwrappedContent> {
        self.effective.get()
    }
}

impl fmt::Debug for FileEvidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEvidence")
            .field("path", &self.path())
            .field("display_name", &self.display_name)
            .field("size", &self.size())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Case-folded filename to evidence. Ordered, so iteration is deterministic.
#[derive(Debug, Default)]
pub struct NameMap {
    entries: BTreeMap<String, Arc<FileEvidence>>,
}

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts unless the case-folded name is taken; returns whether it was.
    pub fn insert(&mut self, evidence: FileEvidence) -> bool {
        let key = evidence.lower_name().to_string();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, Arc::new(evidence));
        true
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Arc<FileEvidence>> {
        self.entries.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<FileEvidence>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<FileEvidence>> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::fs::MemoryTree;

    fn evidence_for(root: &Arc<crate::detection::fs::MemoryNode>, name: &str) -> FileEvidence {
        let node = root
            .list()
            .unwrap()
            .into_iter()
            .find(|n| n.display_name() == name)
            .unwrap();
        FileEvidence::new(node, 1, 4096)
    }

    #[test]
    fn prefix_is_read_once() {
        let root = MemoryTree::new().file("GAME.DAT", vec![1u8; 100]).build();
        let ev = evidence_for(&root, "GAME.DAT");
        assert!(!ev.is_loaded());
        let a = ev.raw_fingerprint(FingerprintCap::PREFIX_5000).unwrap();
        let b = ev.raw_fingerprint(FingerprintCap::WHOLE_FILE_MIB).unwrap();
        assert_eq!(a, b);
        assert_eq!(root.read_count("GAME.DAT"), 1);
        assert_eq!(ev.lower_name(), "game.dat");
    }

    #[test]
    fn accepted_unwrap_changes_effective_size() {
        let root = MemoryTree::new().file("Loom", vec![0u8; 300]).build();
        let ev = evidence_for(&root, "Loom");
        assert_eq!(ev.size(), 300);
        ev.accept_unwrapped(UnwrappedContent {
            kind: ContainerKind::MacBinary,
            inner: None,
            data: Arc::from(vec![0u8; 20]),
            logical_size: 20,
        });
        assert_eq!(ev.size(), 20);
        assert_eq!(ev.raw_size(), 300);
    }

    #[test]
    fn read_failures_are_reported_not_fatal() {
        let root = MemoryTree::new().unreadable("LOCKED").build();
        let ev = evidence_for(&root, "LOCKED");
        assert!(ev.prefix().is_err());
        assert!(ev.raw_fingerprint(FingerprintCap::PREFIX_5000).is_err());
    }

    #[test]
    fn name_map_first_insert_wins() {
        let root = MemoryTree::new()
            .file("a/Data", b"one".to_vec())
            .file("b/DATA", b"two".to_vec())
            .build();
        let dirs = root.list().unwrap();
        let mut map = NameMap::new();
        for dir in dirs {
            for node in dir.list().unwrap() {
                map.insert(FileEvidence::new(node, 2, 64));
            }
        }
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("data").unwrap().display_name(), "Data");
        assert!(map.contains("DATA"));
    }
}

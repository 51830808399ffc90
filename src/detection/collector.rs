//! Bounded, case-insensitive directory scan.
//!
//! The root is always listed. Subdirectories are only entered when their name
//! matches one of the packaging-layout globs and the depth limit allows it, so
//! unrelated folders next to the game data are never walked.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

use super::config::CollectorConfig;
use super::evidence::{FileEvidence, NameMap};
use super::fs::FsNode;
use crate::error::{ResolverError, Result};

pub struct FileCollector {
    globs: GlobSet,
    read_span: u64,
}

impl FileCollector {
    /// Compiles the directory globs (case-insensitive). `read_span` bounds
    /// how many bytes of each collected file can ever be read.
    pub fn new(config: &CollectorConfig, read_span: u64) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.directory_globs {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    ResolverError::InvalidInput(format!("bad directory glob '{}': {}", pattern, e))
                })?;
            builder.add(glob);
        }
        let globs = builder
            .build()
            .map_err(|e| ResolverError::InvalidInput(e.to_string()))?;
        Ok(Self { globs, read_span })
    }

    pub fn descends_into(&self, dir_name: &str) -> bool {
        self.globs.is_match(dir_name)
    }

    /// Walks `root` breadth-first. Shallower files win name collisions;
    /// siblings are visited in name order.
    pub fn collect(&self, root: &dyn FsNode, max_depth: usize) -> NameMap {
        let mut map = NameMap::new();
        let mut queue: VecDeque<(Arc<dyn FsNode>, usize)> = VecDeque::new();
        self.visit(root, 1, max_depth, &mut map, &mut queue);
        while let Some((dir, depth)) = queue.pop_front() {
            self.visit(dir.as_ref(), depth, max_depth, &mut map, &mut queue);
        }
        debug!(root = %root.path().display(), files = map.len(), "collected evidence");
        map
    }

    fn visit(
        &self,
        dir: &dyn FsNode,
        depth: usize,
        max_depth: usize,
        map: &mut NameMap,
        queue: &mut VecDeque<(Arc<dyn FsNode>, usize)>,
    ) {
        let mut children = match dir.list() {
            Ok(c) => c,
            Err(e) => {
                warn!(dir = %dir.path().display(), error = %e, "skipping unreadable directory");
                return;
            }
        };
        children.sort_by(|a, b| a.display_name().cmp(b.display_name()));

        for child in children {
            if child.is_directory() {
                if depth < max_depth && self.descends_into(child.display_name()) {
                    queue.push_back((child, depth + 1));
                } else {
                    debug!(dir = %child.path().display(), "not descending");
                }
                continue;
            }
            let path = child.path().to_path_buf();
            if !map.insert(FileEvidence::new(child, depth, self.read_span)) {
                debug!(path = %path.display(), "case-insensitive name collision, keeping first");
            }
        }
    }
}

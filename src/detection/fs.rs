//! Directory-listing capability the resolver scans through.
//!
//! The resolver only needs `{ is_directory, display_name, open_for_read, path }`
//! per entry, so it works the same over the real filesystem ([`DiskNode`]) and
//! over an in-memory tree ([`MemoryTree`]) that counts reads.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// One entry of a listable tree.
pub trait FsNode: Send + Sync + fmt::Debug {
    /// Stable identity of the entry; memoization is keyed by it.
    fn path(&self) -> &Path;
    /// Case-preserved name as shown to the user.
    fn display_name(&self) -> &str;
    fn is_directory(&self) -> bool;
    /// Byte length of a file, 0 for directories.
    fn size(&self) -> u64;
    /// Children of a directory. Entries that cannot be inspected are skipped.
    fn list(&self) -> io::Result<Vec<Arc<dyn FsNode>>>;
    fn open_for_read(&self) -> io::Result<Box<dyn Read + Send + '_>>;
}

/// A reader that stops after `limit` bytes.
pub struct BoundedReader<R> {
    inner: R,
    bytes_read: u64,
    limit: u64,
}

impl<R: Read> BoundedReader<R> {
    pub fn new(reader: R, limit: u64) -> Self {
        Self {
            inner: reader,
            bytes_read: 0,
            limit,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.bytes_read >= self.limit {
            return Ok(0);
        }
        let remaining = self.limit - self.bytes_read;
        let max_to_read = std::cmp::min(buf.len() as u64, remaining) as usize;
        let n = self.inner.read(&mut buf[..max_to_read])?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// Reads at most `limit` leading bytes of a node.
pub fn read_prefix(node: &dyn FsNode, limit: u64) -> io::Result<Vec<u8>> {
    let expected = node.size().min(limit);
    let mut reader = BoundedReader::new(node.open_for_read()?, limit);
    let mut buf = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
    reader.read_to_end(&mut buf)?;
    debug!(
        path = %node.path().display(),
        bytes = reader.bytes_read(),
        limit = reader.limit(),
        "read prefix"
    );
    Ok(buf)
}

/// A file or directory on the host filesystem.
#[derive(Debug, Clone)]
pub struct DiskNode {
    path: PathBuf,
    name: String,
    is_dir: bool,
    size: u64,
}

impl DiskNode {
    /// Stats `path`, following symlinks.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let meta = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self {
            path: path.to_path_buf(),
            name,
            is_dir: meta.is_dir(),
            size: if meta.is_dir() { 0 } else { meta.len() },
        })
    }
}

impl FsNode for DiskNode {
    fn path(&self) -> &Path {
        &self.path
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_directory(&self) -> bool {
        self.is_dir
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn list(&self) -> io::Result<Vec<Arc<dyn FsNode>>> {
        let mut out: Vec<Arc<dyn FsNode>> = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(dir = %self.path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            match DiskNode::open(entry.path()) {
                Ok(node) => out.push(Arc::new(node)),
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping unreadable entry")
                }
            }
        }
        Ok(out)
    }

    fn open_for_read(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

#[derive(Debug, Clone)]
enum MemoryEntry {
    File(Arc<[u8]>),
    Dir,
    Unreadable,
    LockedDir,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: BTreeMap<PathBuf, MemoryEntry>,
    reads: Mutex<HashMap<PathBuf, usize>>,
}

/// Builder for an in-memory tree, mainly for tests and embedding.
///
/// Paths are relative to the root and use `/` separators; parent
/// directories are created implicitly.
#[derive(Debug, Default)]
pub struct MemoryTree {
    entries: BTreeMap<PathBuf, MemoryEntry>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, path: &str, entry: MemoryEntry) {
        let path = PathBuf::from(path);
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.entries
                .entry(ancestor.to_path_buf())
                .or_insert(MemoryEntry::Dir);
        }
        self.entries.insert(path, entry);
    }

    pub fn file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        let data: Vec<u8> = data.into();
        self.insert(path, MemoryEntry::File(Arc::from(data)));
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.insert(path, MemoryEntry::Dir);
        self
    }

    /// A file that shows up in listings but cannot be opened.
    pub fn unreadable(mut self, path: &str) -> Self {
        self.insert(path, MemoryEntry::Unreadable);
        self
    }

    /// A directory that shows up in listings but cannot be listed.
    pub fn unreadable_dir(mut self, path: &str) -> Self {
        self.insert(path, MemoryEntry::LockedDir);
        self
    }

    pub fn build(self) -> Arc<MemoryNode> {
        let inner = Arc::new(MemoryInner {
            entries: self.entries,
            reads: Mutex::new(HashMap::new()),
        });
        Arc::new(MemoryNode {
            inner,
            path: PathBuf::new(),
            name: String::new(),
        })
    }
}

/// A node of a [`MemoryTree`]. Every node shares the tree's read counters.
#[derive(Debug, Clone)]
pub struct MemoryNode {
    inner: Arc<MemoryInner>,
    path: PathBuf,
    name: String,
}

impl MemoryNode {
    fn is_root(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    fn entry(&self) -> Option<&MemoryEntry> {
        self.inner.entries.get(&self.path)
    }

    /// How many times the file at `path` was opened for reading.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        self.inner
            .reads
            .lock()
            .map(|r| r.get(path.as_ref()).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total opens across the tree.
    pub fn total_reads(&self) -> usize {
        self.inner
            .reads
            .lock()
            .map(|r| r.values().sum())
            .unwrap_or(0)
    }
}

impl FsNode for MemoryNode {
    fn path(&self) -> &Path {
        &self.path
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_directory(&self) -> bool {
        self.is_root() || matches!(self.entry(), Some(MemoryEntry::Dir | MemoryEntry::LockedDir))
    }

    fn size(&self) -> u64 {
        match self.entry() {
            Some(MemoryEntry::File(data)) => data.len() as u64,
            _ => 0,
        }
    }

    fn list(&self) -> io::Result<Vec<Arc<dyn FsNode>>> {
        if !self.is_directory() || matches!(self.entry(), Some(MemoryEntry::LockedDir)) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot list {}", self.path.display()),
            ));
        }
        let children = self
            .inner
            .entries
            .keys()
            .filter(|p| p.parent() == Some(self.path.as_path()))
            .map(|p| {
                let name = p
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Arc::new(MemoryNode {
                    inner: Arc::clone(&self.inner),
                    path: p.clone(),
                    name,
                }) as Arc<dyn FsNode>
            })
            .collect();
        Ok(children)
    }

    fn open_for_read(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        match self.entry() {
            Some(MemoryEntry::File(data)) => {
                if let Ok(mut reads) = self.inner.reads.lock() {
                    *reads.entry(self.path.clone()).or_insert(0) += 1;
                }
                Ok(Box::new(io::Cursor::new(Arc::clone(data))))
            }
            _ if self.is_directory() => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", self.path.display()),
            )),
            _ => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot open {}", self.path.display()),
            )),
        }
    }
}

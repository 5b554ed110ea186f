//! Filesystem primitives behind every sysfs lookup.
//!
//! Everything that touches sysfs goes through [`SysfsReader`] so topology
//! resolution can be exercised against an in-memory tree.

use std::io;
use std::path::{Path, PathBuf};

/// Read-only view of sysfs used by path resolution and drive location.
pub trait SysfsReader {
    /// List the entries of `dir` as full paths, in whatever order the
    /// underlying filesystem yields them.
    fn scan_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Read the first line of a text attribute, without the trailing newline.
    /// `None` if the file is missing or unreadable.
    fn read_text(&self, path: &Path) -> Option<String>;

    /// File-status check that does not follow symlinks (`lstat`).
    fn is_dir(&self, path: &Path) -> io::Result<bool>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFs;

impl SysfsReader for HostFs {
    fn scan_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn read_text(&self, path: &Path) -> Option<String> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(first_line(&contents).to_string())
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(std::fs::symlink_metadata(path)?.file_type().is_dir())
    }
}

fn first_line(contents: &str) -> &str {
    contents.split('\n').next().unwrap_or_default()
}

// ── Mock sysfs for testing ──

/// In-memory sysfs tree for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone)]
    enum Node {
        Dir,
        File(String),
        /// Listed by its parent but fails the status check.
        Broken,
    }

    /// Sysfs tree whose directory listings preserve insertion order.
    #[derive(Debug, Default)]
    pub struct MockSysfs {
        nodes: Vec<(PathBuf, Node)>,
        /// Recorded `scan_dir` calls, in order.
        pub scans: RefCell<Vec<PathBuf>>,
        /// Recorded `read_text` calls, in order.
        pub reads: RefCell<Vec<PathBuf>>,
    }

    impl MockSysfs {
        pub fn new() -> Self {
            Self::default()
        }

        fn node(&self, path: &Path) -> Option<&Node> {
            self.nodes.iter().find(|(p, _)| p == path).map(|(_, n)| n)
        }

        fn insert(&mut self, path: &Path, node: Node) {
            if let Some(parent) = path.parent()
                && parent != path
                && !parent.as_os_str().is_empty()
            {
                self.add_dir(parent);
            }
            match self.nodes.iter_mut().find(|(p, _)| p == path) {
                Some((_, existing)) => {
                    if !matches!(node, Node::Dir) {
                        *existing = node;
                    }
                }
                None => self.nodes.push((path.to_path_buf(), node)),
            }
        }

        /// Create a directory and any missing parents.
        pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
            self.insert(path.as_ref(), Node::Dir);
            self
        }

        /// Create a text attribute (parents created as needed).
        pub fn add_file(&mut self, path: impl AsRef<Path>, contents: &str) -> &mut Self {
            self.insert(path.as_ref(), Node::File(contents.to_string()));
            self
        }

        /// Create an entry whose status check fails.
        pub fn add_broken(&mut self, path: impl AsRef<Path>) -> &mut Self {
            self.insert(path.as_ref(), Node::Broken);
            self
        }
    }

    impl SysfsReader for MockSysfs {
        fn scan_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
            self.scans.borrow_mut().push(dir.to_path_buf());
            match self.node(dir) {
                Some(Node::Dir) => Ok(self
                    .nodes
                    .iter()
                    .filter(|(p, _)| p.parent() == Some(dir))
                    .map(|(p, _)| p.clone())
                    .collect()),
                Some(_) => Err(io::Error::other("not a directory")),
                None => Err(io::Error::from(io::ErrorKind::NotFound)),
            }
        }

        fn read_text(&self, path: &Path) -> Option<String> {
            self.reads.borrow_mut().push(path.to_path_buf());
            match self.node(path) {
                Some(Node::File(contents)) => Some(first_line(contents).to_string()),
                _ => None,
            }
        }

        fn is_dir(&self, path: &Path) -> io::Result<bool> {
            match self.node(path) {
                Some(Node::Dir) => Ok(true),
                Some(Node::File(_)) => Ok(false),
                Some(Node::Broken) => Err(io::Error::other("mock: stat failure injected")),
                None => Err(io::Error::from(io::ErrorKind::NotFound)),
            }
        }
    }
}

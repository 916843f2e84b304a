//! The virtual file system a codec exposes: every archive entry is a
//! [`VirtualFile`], either a nested [`Container`] or a [`Leaf`] with bytes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;

/// A shared view into an archive buffer. Cloning never copies bytes.
#[derive(Clone)]
pub struct Payload {
    data: Rc<[u8]>,
    offset: usize,
    len: usize,
}

impl Payload {
    pub fn new(data: Rc<[u8]>) -> Self {
        let len = data.len();
        Payload { data, offset: 0, len }
    }

    pub fn empty() -> Self {
        Payload::new(Rc::from(Vec::new().into_boxed_slice()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[self.offset..self.offset + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sub-view relative to this one, `None` when it would run past the end.
    pub fn slice(&self, start: usize, len: usize) -> Option<Payload> {
        let end = start.checked_add(len)?;
        if end > self.len {
            return None;
        }
        Some(Payload {
            data: self.data.clone(),
            offset: self.offset + start,
            len,
        })
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Payload::new(Rc::from(data.into_boxed_slice()))
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({} bytes @ {})", self.len, self.offset)
    }
}

/// Splits `name` into stem and extension, the extension keeping its dot.
/// A leading dot alone does not start an extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => name.split_at(i),
        _ => (name, ""),
    }
}

/// What every entry has in common.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    name: String,
    extension: String,
    virtual_path: Vec<String>,
}

impl EntryInfo {
    /// The top-level container itself; it has no virtual path.
    pub fn root(name: &str) -> Self {
        let (_, extension) = split_extension(name);
        EntryInfo {
            name: name.to_string(),
            extension: extension.to_string(),
            virtual_path: Vec::new(),
        }
    }

    pub fn child_of(parent: &EntryInfo, name: &str) -> Self {
        let (stem, extension) = split_extension(name);
        let mut virtual_path = parent.virtual_path.clone();
        virtual_path.push(stem.to_string());
        EntryInfo {
            name: name.to_string(),
            extension: extension.to_string(),
            virtual_path,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Extension-stripped names from below the root down to this entry.
    pub fn virtual_path(&self) -> &[String] {
        &self.virtual_path
    }
}

#[derive(Debug, Clone)]
pub struct Container {
    info: EntryInfo,
    payload: Payload,
}

impl Container {
    pub fn new(info: EntryInfo, payload: Payload) -> Self {
        Container { info, payload }
    }

    pub fn info(&self) -> &EntryInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

#[derive(Debug, Clone)]
pub struct Leaf {
    info: EntryInfo,
    payload: Payload,
}

impl Leaf {
    pub fn new(info: EntryInfo, payload: Payload) -> Self {
        Leaf { info, payload }
    }

    pub fn info(&self) -> &EntryInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn bytes(&self) -> &[u8] {
        self.payload.bytes()
    }
}

#[derive(Debug, Clone)]
pub enum VirtualFile {
    Container(Container),
    Leaf(Leaf),
}

impl VirtualFile {
    pub fn info(&self) -> &EntryInfo {
        match self {
            VirtualFile::Container(c) => c.info(),
            VirtualFile::Leaf(l) => l.info(),
        }
    }

    pub fn name(&self) -> &str {
        self.info().name()
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            VirtualFile::Container(c) => Some(c),
            VirtualFile::Leaf(_) => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.as_container().is_some()
    }
}

/// Handle on a container file on disk. Its contents are only reachable while
/// it is activated.
#[derive(Debug, Clone)]
pub struct ArchiveRoot {
    path: PathBuf,
    info: EntryInfo,
}

impl ArchiveRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let info = EntryInfo::root(&name);
        ArchiveRoot { path, info }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &EntryInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    /// The file system extension, `""` for a bare directory.
    pub fn extension(&self) -> &str {
        self.info.extension()
    }
}

/// An activated root. Dropping it releases the archive buffer.
#[derive(Debug)]
pub struct Active<'a> {
    root: &'a ArchiveRoot,
    container: Container,
}

impl<'a> Active<'a> {
    pub fn new(root: &'a ArchiveRoot, payload: Payload) -> Self {
        debug!("activated {} ({} bytes)", root.path().display(), payload.len());
        Active {
            root,
            container: Container::new(root.info().clone(), payload),
        }
    }

    pub fn root(&self) -> &ArchiveRoot {
        self.root
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The root as a record of its own.
    pub fn record(&self) -> VirtualFile {
        VirtualFile::Container(self.container.clone())
    }
}

impl Drop for Active<'_> {
    fn drop(&mut self) {
        debug!("deactivated {}", self.root.path().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions() {
        assert_eq!(split_extension("sound.wav"), ("sound", ".wav"));
        assert_eq!(split_extension("a.b.pac"), ("a.b", ".pac"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }

    #[test]
    fn virtual_paths_strip_extensions() {
        let root = EntryInfo::root("game.pac");
        assert_eq!(root.extension(), ".pac");
        assert!(root.virtual_path().is_empty());

        let inner = EntryInfo::child_of(&root, "chars.pac");
        let leaf = EntryInfo::child_of(&inner, "ryu.hip");
        assert_eq!(inner.virtual_path(), ["chars"]);
        assert_eq!(leaf.virtual_path(), ["chars", "ryu"]);
        assert_eq!(leaf.name(), "ryu.hip");
        assert_eq!(leaf.extension(), ".hip");
    }

    #[test]
    fn payload_slices_share_the_buffer() {
        let payload = Payload::from(b"0123456789".to_vec());
        let inner = payload.slice(2, 5).unwrap();
        assert_eq!(inner.bytes(), b"23456");
        assert_eq!(inner.slice(1, 2).unwrap().bytes(), b"34");
        assert!(inner.slice(4, 2).is_none());
        assert!(payload.slice(usize::MAX, 2).is_none());
    }

    #[test]
    fn root_handle_from_path() {
        let root = ArchiveRoot::new("/X/game.pac");
        assert_eq!(root.name(), "game.pac");
        assert_eq!(root.extension(), ".pac");
        assert_eq!(ArchiveRoot::new("/X/data").extension(), "");
    }
}

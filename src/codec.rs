use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::pac_nom::{detect, detect_len, entries, HEADER_SIZE};
use crate::pac_write;
use crate::request::PackRequest;
use crate::vfs::{Active, ArchiveRoot, Container, EntryInfo, Leaf, Payload, VirtualFile};

//Glue between the virtual file system and a container format.
//The PAC parsing lives in pac_nom and the writing in pac_write,
//change the format there.

/// What the packer needs from a container format.
pub trait Codec {
    /// Cheap signature and structure check.
    fn validate(&self, path: &Path) -> bool;

    /// Fails for files that aren't containers or have no extension.
    fn open(&self, path: &Path) -> Result<ArchiveRoot>;

    /// Acquires the root's contents. Dropping the returned guard releases them.
    fn activate<'a>(&self, root: &'a ArchiveRoot) -> Result<Active<'a>>;

    /// Immediate children of a container, in stored order.
    fn children(&self, container: &Container) -> Result<Vec<VirtualFile>>;

    fn serialize(&self, request: &PackRequest) -> Result<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PacCodec;

impl PacCodec {
    pub fn new() -> Self {
        PacCodec
    }

    //Only the header is read here, the rest waits for activate().
    fn read_header(path: &Path) -> Result<bool> {
        let len = fs::metadata(path)?.len() as usize;
        let mut header = vec![0; HEADER_SIZE.min(len)];
        File::open(path)?.read_exact(&mut header)?;
        Ok(detect_len(&header, len).is_some())
    }
}

impl Codec for PacCodec {
    fn validate(&self, path: &Path) -> bool {
        Self::read_header(path).unwrap_or(false)
    }

    fn open(&self, path: &Path) -> Result<ArchiveRoot> {
        let root = ArchiveRoot::new(path);
        if !self.validate(path) {
            return Err(Error::InvalidContainer(root.name().to_string()));
        }
        if root.extension().trim().is_empty() {
            return Err(Error::NoExtension(root.name().to_string()));
        }
        Ok(root)
    }

    fn activate<'a>(&self, root: &'a ArchiveRoot) -> Result<Active<'a>> {
        let data = fs::read(root.path())?;
        if detect(&data).is_none() {
            return Err(Error::InvalidContainer(root.name().to_string()));
        }
        Ok(Active::new(root, Payload::new(Rc::from(data.into_boxed_slice()))))
    }

    fn children(&self, container: &Container) -> Result<Vec<VirtualFile>> {
        let payload = container.payload();
        let bytes = payload.bytes();
        let (order, header) =
            detect(bytes).ok_or_else(|| Error::InvalidContainer(container.name().to_string()))?;
        let (_, table) = entries(&bytes[HEADER_SIZE..], order, &header)?;

        table
            .into_iter()
            .map(|entry| -> Result<VirtualFile> {
                let start = header.data_start as usize + entry.offset as usize;
                let data = payload.slice(start, entry.size as usize).ok_or_else(|| {
                    Error::Corrupted(format!(
                        "'{}' in {} points past the end of the container",
                        entry.name,
                        container.name()
                    ))
                })?;
                let info = EntryInfo::child_of(container.info(), &entry.name);
                Ok(if detect(data.bytes()).is_some() {
                    VirtualFile::Container(Container::new(info, data))
                } else {
                    VirtualFile::Leaf(Leaf::new(info, data))
                })
            })
            .collect()
    }

    fn serialize(&self, request: &PackRequest) -> Result<Vec<u8>> {
        pac_write::serialize(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn packed(dir: &Path) -> Vec<u8> {
        fs::write(dir.join("readme.txt"), b"read me").unwrap();
        fs::create_dir(dir.join("chars")).unwrap();
        fs::write(dir.join("chars").join("ryu.hip"), b"ryu").unwrap();
        PacCodec.serialize(&PackRequest::new(dir)).unwrap()
    }

    #[test]
    fn open_rejects_non_containers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pac");
        fs::write(&path, b"plain text").unwrap();
        assert!(!PacCodec.validate(&path));
        assert!(matches!(PacCodec.open(&path), Err(Error::InvalidContainer(_))));
        assert!(!PacCodec.validate(&dir.path().join("missing.pac")));
    }

    #[test]
    fn open_rejects_missing_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        fs::create_dir(&source).unwrap();
        let bytes = packed(&source);
        let path = dir.path().join("archive");
        fs::write(&path, bytes).unwrap();
        assert!(PacCodec.validate(&path));
        assert!(matches!(PacCodec.open(&path), Err(Error::NoExtension(_))));
    }

    #[test]
    fn children_of_an_activated_root() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        fs::create_dir(&source).unwrap();
        let path = dir.path().join("archive.pac");
        fs::write(&path, packed(&source)).unwrap();

        let root = PacCodec.open(&path).unwrap();
        let active = PacCodec.activate(&root).unwrap();
        let children = PacCodec.children(active.container()).unwrap();
        let names: Vec<_> = children.iter().map(VirtualFile::name).collect();
        assert_eq!(names, ["chars.pac", "readme.txt"]);
        assert!(children[0].is_container());

        match &children[1] {
            VirtualFile::Leaf(leaf) => assert_eq!(leaf.bytes(), b"read me"),
            other => panic!("expected a leaf, got {:?}", other),
        }

        let nested = PacCodec.children(children[0].as_container().unwrap()).unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].info().virtual_path(), ["chars", "ryu"]);
    }
}

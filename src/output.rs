//! Where unpacked records land on disk.

use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use log::debug;

use crate::error::{Error, Result};
use crate::overwrite::{KeySource, OverwriteGuard};
use crate::vfs::{ArchiveRoot, VirtualFile};

/// Appended to a root that was a bare directory rather than an archive.
pub const UNPACK_SUFFIX: &str = "_unpack";

/// Resolves `path` against the working directory and drops `.`/`..`
/// lexically, without touching the file system.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push(Component::RootDir.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }
    result
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Directory(PathBuf),
    Written(PathBuf),
    /// An existing file the user chose not to overwrite.
    Kept(PathBuf),
}

/// Maps the records of one top-level archive onto the save folder.
#[derive(Debug)]
pub struct OutputLayout<'a> {
    root: &'a ArchiveRoot,
    base_directory: String,
    save_folder: PathBuf,
}

impl<'a> OutputLayout<'a> {
    pub fn new(root: &'a ArchiveRoot, base_directory: &Path, save_folder: &Path) -> io::Result<Self> {
        Ok(OutputLayout {
            root,
            base_directory: base_directory.to_string_lossy().into_owned(),
            save_folder: absolute(save_folder)?,
        })
    }

    pub fn path_for(&self, record: &VirtualFile) -> Result<PathBuf> {
        let primary = self.root.path().to_string_lossy();
        let first = primary
            .strip_prefix(self.base_directory.as_str())
            .unwrap_or(&*primary)
            .to_string();

        let mut segments = Vec::with_capacity(record.info().virtual_path().len() + 1);
        segments.push(first);
        segments.extend(record.info().virtual_path().iter().cloned());

        let extension = self.root.extension();
        if extension.trim().is_empty() {
            segments[0].push_str(UNPACK_SUFFIX);
        }

        // Ancestors name directories; a leaf keeps its real file name.
        if let VirtualFile::Leaf(leaf) = record {
            if let Some(last) = segments.last_mut() {
                *last = leaf.name().to_string();
            }
        }

        let separator = MAIN_SEPARATOR.to_string();
        let joined = segments.join(separator.as_str()).replace('?', "_");
        let mut full = self.save_folder.as_os_str().to_os_string();
        full.push(&joined);
        let resolved = absolute(Path::new(&full))?;

        if !resolved.starts_with(&self.save_folder) {
            return Err(Error::PathEscape {
                entry: record.info().virtual_path().join("/"),
                resolved,
            });
        }

        if extension.trim().is_empty() {
            return Ok(resolved);
        }
        let resolved = resolved.to_string_lossy().replacen(extension, "", 1);
        Ok(PathBuf::from(resolved))
    }

    /// Creates the directory of a container, or writes a leaf's bytes after
    /// asking `guard` about non-empty files already in the way.
    pub fn materialize<K: KeySource>(
        &self,
        record: &VirtualFile,
        guard: &mut OverwriteGuard<K>,
    ) -> Result<Outcome> {
        let path = self.path_for(record)?;
        let leaf = match record {
            VirtualFile::Container(_) => {
                fs::create_dir_all(&path).map_err(|source| Error::WriteFailed {
                    path: path.clone(),
                    source,
                })?;
                return Ok(Outcome::Directory(path));
            }
            VirtualFile::Leaf(leaf) => leaf,
        };

        let occupied = fs::metadata(&path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if occupied && !guard.decide(&path)? {
            debug!("kept {}", path.display());
            return Ok(Outcome::Kept(path));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::WriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, leaf.bytes()).map_err(|source| Error::WriteFailed {
            path: path.clone(),
            source,
        })?;
        debug!("wrote {}", path.display());
        Ok(Outcome::Written(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overwrite::ScriptedKeys;
    use crate::vfs::{Container, EntryInfo, Leaf, Payload};

    fn base() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from("C:\\X")
        } else {
            PathBuf::from("/X")
        }
    }

    fn leaf(parent: &EntryInfo, name: &str) -> VirtualFile {
        VirtualFile::Leaf(Leaf::new(EntryInfo::child_of(parent, name), Payload::empty()))
    }

    fn container(parent: &EntryInfo, name: &str) -> VirtualFile {
        VirtualFile::Container(Container::new(EntryInfo::child_of(parent, name), Payload::empty()))
    }

    #[test]
    fn leaf_in_root_loses_archive_extension() {
        let root = ArchiveRoot::new(base().join("game.pac"));
        let layout = OutputLayout::new(&root, &base(), &base()).unwrap();
        let path = layout.path_for(&leaf(root.info(), "sound.wav")).unwrap();
        assert_eq!(path, base().join("game").join("sound.wav"));
        assert!(!path.to_string_lossy().contains(".pac"));
    }

    #[test]
    fn root_and_nested_containers_become_directories() {
        let root = ArchiveRoot::new(base().join("game.pac"));
        let layout = OutputLayout::new(&root, &base(), &base()).unwrap();
        let root_record = VirtualFile::Container(Container::new(root.info().clone(), Payload::empty()));
        assert_eq!(layout.path_for(&root_record).unwrap(), base().join("game"));

        let chars = container(root.info(), "chars.pac");
        assert_eq!(layout.path_for(&chars).unwrap(), base().join("game").join("chars"));

        let ryu = leaf(chars.info(), "ryu.hip");
        assert_eq!(
            layout.path_for(&ryu).unwrap(),
            base().join("game").join("chars").join("ryu.hip")
        );
    }

    #[test]
    fn recursive_layout_mirrors_the_source_tree() {
        let source = base().join("data");
        let save = base().join("data_unpack");
        let root = ArchiveRoot::new(source.join("sub").join("game.pac"));
        let layout = OutputLayout::new(&root, &source, &save).unwrap();
        let path = layout.path_for(&leaf(root.info(), "a.bin")).unwrap();
        assert_eq!(path, save.join("sub").join("game").join("a.bin"));
    }

    #[test]
    fn bare_directory_root_gets_unpack_suffix() {
        let root = ArchiveRoot::new(base().join("folder"));
        let layout = OutputLayout::new(&root, &base(), &base()).unwrap();
        let path = layout.path_for(&leaf(root.info(), "a.bin")).unwrap();
        assert_eq!(path, base().join("folder_unpack").join("a.bin"));
    }

    #[test]
    fn question_marks_are_replaced() {
        let root = ArchiveRoot::new(base().join("game.pac"));
        let layout = OutputLayout::new(&root, &base(), &base()).unwrap();
        let path = layout.path_for(&leaf(root.info(), "what?.txt")).unwrap();
        assert_eq!(path, base().join("game").join("what_.txt"));
    }

    #[test]
    fn escaping_names_are_rejected() {
        let root = ArchiveRoot::new(base().join("game.pac"));
        let layout = OutputLayout::new(&root, &base(), &base()).unwrap();
        let record = leaf(root.info(), "../../../etc/passwd");
        assert!(matches!(layout.path_for(&record), Err(Error::PathEscape { .. })));
    }

    #[test]
    fn existing_files_go_through_the_guard() {
        let dir = tempfile::tempdir().unwrap();
        let root = ArchiveRoot::new(dir.path().join("game.pac"));
        let layout = OutputLayout::new(&root, dir.path(), dir.path()).unwrap();
        let info = EntryInfo::child_of(root.info(), "a.txt");
        let record = VirtualFile::Leaf(Leaf::new(info, Payload::from(b"new".to_vec())));
        let target = dir.path().join("game").join("a.txt");

        let mut guard = OverwriteGuard::new(ScriptedKeys::new("n"));
        assert_eq!(layout.materialize(&record, &mut guard).unwrap(), Outcome::Written(target.clone()));
        fs::write(&target, b"old").unwrap();
        assert_eq!(layout.materialize(&record, &mut guard).unwrap(), Outcome::Kept(target.clone()));
        assert_eq!(fs::read(&target).unwrap(), b"old");

        // empty files are overwritten without asking
        fs::write(&target, b"").unwrap();
        let mut guard = OverwriteGuard::new(ScriptedKeys::new(""));
        assert_eq!(layout.materialize(&record, &mut guard).unwrap(), Outcome::Written(target.clone()));
        assert_eq!(fs::read(&target).unwrap(), b"new");
    }
}

//! The two procedures, start to end.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use sorted_vec::SortedVec;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::options::{Flag, Options};
use crate::output::{absolute, OutputLayout, Outcome, UNPACK_SUFFIX};
use crate::overwrite::{KeySource, OverwriteGuard};
use crate::pac_write::PAC_EXTENSION;
use crate::procedure::{self, Procedure};
use crate::request::PackRequest;
use crate::walk::{self, DEFAULT_MAX_DEPTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackOptions {
    pub recursive: bool,
    pub max_depth: usize,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        UnpackOptions {
            recursive: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl UnpackOptions {
    pub fn from_options(options: &Options) -> Self {
        UnpackOptions {
            recursive: options.has(Flag::Recursive),
            max_depth: options
                .first_argument(Flag::MaxDepth)
                .and_then(|arg| arg.parse().ok())
                .unwrap_or(DEFAULT_MAX_DEPTH),
        }
    }
}

#[derive(Debug, Default)]
pub struct UnpackReport {
    /// Top-level containers that were opened.
    pub archives: usize,
    pub written: Vec<PathBuf>,
    pub directories: Vec<PathBuf>,
    pub kept: Vec<PathBuf>,
    /// Items left out, paths on disk or virtual paths inside an archive.
    pub skipped: Vec<String>,
}

impl UnpackReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Directory(path) => self.directories.push(path),
            Outcome::Written(path) => self.written.push(path),
            Outcome::Kept(path) => self.kept.push(path),
        }
    }

    fn skip(&mut self, item: String, err: &Error) {
        warn!("{}", err);
        self.skipped.push(item);
    }
}

#[derive(Debug)]
pub enum Report {
    Packed(PathBuf),
    Unpacked(UnpackReport),
}

/// Picks the procedure for the target of `options` and runs it.
pub fn run<C, K>(options: &Options, codec: &C, guard: &mut OverwriteGuard<K>) -> Result<Report>
where
    C: Codec + ?Sized,
    K: KeySource,
{
    let target = options.target().ok_or(Error::MissingTarget)?;
    let path = absolute(Path::new(target))?;
    let selection = procedure::select(&path, options.directive())?;

    match selection.procedure {
        Procedure::Pack => {
            let request = PackRequest::from_options(path, options);
            pack(codec, &request).map(Report::Packed)
        }
        Procedure::Unpack => {
            let unpack_options = UnpackOptions::from_options(options);
            unpack(codec, &path, selection.is_dir, &unpack_options, guard).map(Report::Unpacked)
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Writes the container for `request.source_directory` next to it as `<dir>.pac`.
pub fn pack<C: Codec + ?Sized>(codec: &C, request: &PackRequest) -> Result<PathBuf> {
    let source = &request.source_directory;
    if !source.is_dir() {
        return Err(Error::MissingDirectory(source.clone()));
    }
    let save_path = with_suffix(source, PAC_EXTENSION);
    info!("packing {} into {}", source.display(), save_path.display());
    debug!("{:?}", request);

    let bytes = codec.serialize(request)?;
    fs::write(&save_path, bytes).map_err(|source| Error::WriteFailed {
        path: save_path.clone(),
        source,
    })?;
    Ok(save_path)
}

/// Files directly inside `dir`, sorted.
fn files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(SortedVec::from_unsorted(files).to_vec())
}

/// Every file below `dir`: a directory's own files first, then each
/// subdirectory in turn, all sorted by path.
pub fn dir_search(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            } else {
                files.push(path);
            }
        }
        let (files, dirs) = (SortedVec::from_unsorted(files), SortedVec::from_unsorted(dirs));
        found.extend(files.iter().cloned());
        pending.extend(dirs.iter().rev().cloned());
    }

    Ok(found)
}

/// Unpacks `target`, a container or a directory of containers.
///
/// Items that can't be unpacked are logged and skipped, anything else
/// aborts the batch.
pub fn unpack<C, K>(
    codec: &C,
    target: &Path,
    is_dir: bool,
    options: &UnpackOptions,
    guard: &mut OverwriteGuard<K>,
) -> Result<UnpackReport>
where
    C: Codec + ?Sized,
    K: KeySource,
{
    let mut report = UnpackReport::default();

    let (mut base_directory, mut save_folder) = if options.recursive {
        (target.to_path_buf(), with_suffix(target, UNPACK_SUFFIX))
    } else {
        (PathBuf::new(), PathBuf::new())
    };

    let paths = if options.recursive && is_dir {
        dir_search(target)?
    } else if is_dir {
        files_in(target)?
    } else {
        vec![target.to_path_buf()]
    };

    for file in paths {
        if !file.is_file() {
            report.skip(file.display().to_string(), &Error::MissingFile(file.clone()));
            continue;
        }

        if !options.recursive {
            let parent = file.parent().map(Path::to_path_buf).unwrap_or_default();
            base_directory = parent.clone();
            save_folder = parent;
        }

        match unpack_archive(codec, &file, &base_directory, &save_folder, options, guard, &mut report) {
            Ok(()) => report.archives += 1,
            Err(err) if err.is_skippable() => report.skip(file.display().to_string(), &err),
            Err(err) => return Err(err),
        }
    }

    Ok(report)
}

fn unpack_archive<C, K>(
    codec: &C,
    file: &Path,
    base_directory: &Path,
    save_folder: &Path,
    options: &UnpackOptions,
    guard: &mut OverwriteGuard<K>,
    report: &mut UnpackReport,
) -> Result<()>
where
    C: Codec + ?Sized,
    K: KeySource,
{
    if !codec.validate(file) {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(Error::InvalidContainer(name));
    }
    let root = codec.open(file)?;
    let active = codec.activate(&root)?;
    info!("unpacking {}", file.display());

    let layout = OutputLayout::new(&root, base_directory, save_folder)?;
    report.record(layout.materialize(&active.record(), guard)?);

    let flat = walk::flatten(codec, active.container(), options.max_depth);
    for err in &flat.skipped {
        report.skipped.push(format!("{}: {}", root.name(), err));
    }

    for record in &flat.records {
        debug!("{}", record.info().virtual_path().join("/"));
        match layout.materialize(record, guard) {
            Ok(outcome) => report.record(outcome),
            Err(err) if err.is_skippable() => {
                report.skip(record.info().virtual_path().join("/"), &err)
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

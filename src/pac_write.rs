use std::convert::TryFrom;
use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use sorted_vec::SortedVec;

use crate::error::{Error, Result};
use crate::pac_nom::{
    align, entry_size, ALIGNMENT, EXTENDED_NAME_ID, HEADER_SIZE, MAGIC, MAX_NAME_LENGTH, NAME_ID,
};
use crate::request::{IdentifierMode, MinNameLength, PackRequest};

//The writing half of the PAC format, see pac_nom for the layout.

/// Extension given to subdirectories packed as nested containers.
pub const PAC_EXTENSION: &str = ".pac";

/// Name field width when the request asks for no particular length.
pub const DEFAULT_NAME_LENGTH: usize = 32;

/// Serializes `request.source_directory`. Subdirectories become nested
/// containers, entries are stored in sorted path order.
pub fn serialize(request: &PackRequest) -> Result<Vec<u8>> {
    serialize_dir(&request.source_directory, request)
}

fn serialize_dir(dir: &Path, request: &PackRequest) -> Result<Vec<u8>> {
    let paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<_>>>()?;
    let paths = SortedVec::from_unsorted(paths);

    let mut files = Vec::with_capacity(paths.len());
    for path in paths.iter() {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidName(path.clone()))?;
        if path.is_dir() {
            debug!("packing nested container {}", path.display());
            files.push((format!("{}{}", name, PAC_EXTENSION), serialize_dir(path, request)?));
        } else {
            files.push((name.to_string(), fs::read(path)?));
        }
    }
    encode(dir, &files, request)
}

fn name_field_length(longest: usize, min: Option<MinNameLength>) -> usize {
    let auto = align(longest + 1, 4);
    match min {
        None => DEFAULT_NAME_LENGTH.max(auto),
        Some(MinNameLength::Auto) => auto,
        Some(MinNameLength::Fixed(n)) => (n as usize).max(longest + 1),
    }
}

/// Short identifier of an entry name.
pub fn name_id(name: &str) -> u32 {
    let digest = md5::compute(name.to_lowercase().as_bytes());
    u32::from_le_bytes([digest.0[0], digest.0[1], digest.0[2], digest.0[3]])
}

/// Lays out `files` (name, bytes) as one container.
pub fn encode(source: &Path, files: &[(String, Vec<u8>)], request: &PackRequest) -> Result<Vec<u8>> {
    let mode = request.identifier_mode;
    if let Some(limit) = mode.max_name_chars() {
        if let Some((name, _)) = files.iter().find(|(name, _)| name.chars().count() > limit) {
            return Err(Error::NameTooLong {
                name: name.clone(),
                limit,
            });
        }
    }
    let params = match mode {
        IdentifierMode::None => 0,
        IdentifierMode::Short => NAME_ID,
        IdentifierMode::Extended => EXTENDED_NAME_ID,
    };
    let with_ids = mode != IdentifierMode::None;

    let longest = files.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let name_length = name_field_length(longest, request.min_name_length);
    if name_length > MAX_NAME_LENGTH as usize {
        return Err(Error::NameFieldTooLong {
            length: name_length,
            limit: MAX_NAME_LENGTH,
        });
    }
    let too_large = || Error::TooLarge(source.to_path_buf());
    let name_length = u32::try_from(name_length).map_err(|_| too_large())?;
    let entry_len = entry_size(name_length, with_ids);

    let data_start = align(HEADER_SIZE + files.len() * entry_len, ALIGNMENT);
    let mut offsets = Vec::with_capacity(files.len());
    let mut data_len = 0usize;
    for (_, bytes) in files {
        offsets.push(data_len);
        data_len += align(bytes.len(), ALIGNMENT);
    }
    let total_size = data_start + data_len;

    let u32_of = |value: usize| u32::try_from(value).map_err(|_| too_large());
    let order = request.byte_order;
    let mut buf = Vec::with_capacity(total_size);

    buf.extend_from_slice(MAGIC);
    order.put_u32(&mut buf, u32_of(data_start)?);
    order.put_u32(&mut buf, u32_of(total_size)?);
    order.put_u32(&mut buf, u32_of(files.len())?);
    order.put_u32(&mut buf, params);
    order.put_u32(&mut buf, name_length);
    buf.resize(HEADER_SIZE, 0);

    for (index, ((name, bytes), offset)) in files.iter().zip(offsets.iter()).enumerate() {
        let entry_start = buf.len();
        buf.extend_from_slice(name.as_bytes());
        buf.resize(entry_start + name_length as usize, 0);
        order.put_u32(&mut buf, u32_of(index)?);
        order.put_u32(&mut buf, u32_of(*offset)?);
        order.put_u32(&mut buf, u32_of(bytes.len())?);
        if with_ids {
            order.put_u32(&mut buf, name_id(name));
        }
        buf.resize(entry_start + entry_len, 0);
    }
    buf.resize(data_start, 0);

    for (_, bytes) in files {
        let start = buf.len();
        buf.extend_from_slice(bytes);
        buf.resize(start + align(bytes.len(), ALIGNMENT), 0);
    }

    debug_assert_eq!(buf.len(), total_size);
    Ok(buf)
}

//! Turns resolved options into a serialization request for the codec.
//! Malformed values fall back to defaults, nothing here fails.

use std::path::PathBuf;

use crate::options::{Flag, Options};

/// Name field length used when `--minnamelength` has no usable value.
pub const DEFAULT_MIN_NAME_LENGTH: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierMode {
    None,
    Short,
    Extended,
}

impl IdentifierMode {
    /// Longest entry name, in characters, the mode can represent.
    pub fn max_name_chars(self) -> Option<usize> {
        match self {
            IdentifierMode::None => None,
            IdentifierMode::Short => Some(32),
            IdentifierMode::Extended => Some(64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinNameLength {
    Auto,
    Fixed(u32),
}

impl MinNameLength {
    /// Numeric form handed to the codec, `0` lets it pick.
    pub fn value(self) -> u32 {
        match self {
            MinNameLength::Auto => 0,
            MinNameLength::Fixed(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("littleendian") {
            Some(ByteOrder::Little)
        } else if name.eq_ignore_ascii_case("bigendian") {
            Some(ByteOrder::Big)
        } else {
            None
        }
    }

    pub fn put_u32(self, buf: &mut Vec<u8>, value: u32) {
        match self {
            ByteOrder::Little => buf.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => buf.extend_from_slice(&value.to_be_bytes()),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::Little
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackRequest {
    pub source_directory: PathBuf,
    pub identifier_mode: IdentifierMode,
    /// `None` when no length constraint was asked for.
    pub min_name_length: Option<MinNameLength>,
    pub byte_order: ByteOrder,
}

impl PackRequest {
    pub fn new(source_directory: impl Into<PathBuf>) -> Self {
        PackRequest {
            source_directory: source_directory.into(),
            identifier_mode: IdentifierMode::None,
            min_name_length: None,
            byte_order: ByteOrder::Little,
        }
    }

    pub fn from_options(source_directory: impl Into<PathBuf>, options: &Options) -> Self {
        PackRequest {
            source_directory: source_directory.into(),
            identifier_mode: identifier_mode(options),
            min_name_length: min_name_length(options),
            byte_order: byte_order(options),
        }
    }
}

fn identifier_mode(options: &Options) -> IdentifierMode {
    if options.has(Flag::NameIdExt) {
        IdentifierMode::Extended
    } else if options.has(Flag::NameId) {
        IdentifierMode::Short
    } else {
        IdentifierMode::None
    }
}

fn min_name_length(options: &Options) -> Option<MinNameLength> {
    if !options.has(Flag::MinNameLength) {
        return None;
    }
    let length = match options.first_argument(Flag::MinNameLength) {
        Some(arg) if arg.eq_ignore_ascii_case("auto") => MinNameLength::Auto,
        Some(arg) => arg
            .parse()
            .map(MinNameLength::Fixed)
            .unwrap_or(MinNameLength::Fixed(DEFAULT_MIN_NAME_LENGTH)),
        None => MinNameLength::Fixed(DEFAULT_MIN_NAME_LENGTH),
    };
    Some(length)
}

fn byte_order(options: &Options) -> ByteOrder {
    options
        .first_argument(Flag::Endianness)
        .and_then(ByteOrder::from_name)
        .unwrap_or_default()
}

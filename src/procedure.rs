use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procedure {
    Pack = 0,
    Unpack = 1,
}

impl Procedure {
    /// Accepts `0`/`1` or a case-insensitive `pack`/`unpack`.
    pub fn from_directive(token: &str) -> Option<Self> {
        match token.parse::<u8>() {
            Ok(0) => Some(Procedure::Pack),
            Ok(1) => Some(Procedure::Unpack),
            Ok(_) => None,
            Err(_) if token.eq_ignore_ascii_case("pack") => Some(Procedure::Pack),
            Err(_) if token.eq_ignore_ascii_case("unpack") => Some(Procedure::Unpack),
            Err(_) => None,
        }
    }
}

/// A procedure and what the target turned out to be on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub procedure: Procedure,
    pub is_dir: bool,
}

/// Anything but a directory is unpacked; directories follow the directive and
/// default to packing.
pub fn select(path: &Path, directive: Option<Procedure>) -> Result<Selection> {
    let metadata = fs::metadata(path).map_err(|source| Error::PathUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(choose(metadata.is_dir(), directive))
}

fn choose(is_dir: bool, directive: Option<Procedure>) -> Selection {
    let procedure = if is_dir {
        directive.unwrap_or(Procedure::Pack)
    } else {
        Procedure::Unpack
    };
    Selection { procedure, is_dir }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives() {
        assert_eq!(Procedure::from_directive("0"), Some(Procedure::Pack));
        assert_eq!(Procedure::from_directive("1"), Some(Procedure::Unpack));
        assert_eq!(Procedure::from_directive("pAcK"), Some(Procedure::Pack));
        assert_eq!(Procedure::from_directive("Unpack"), Some(Procedure::Unpack));
        assert_eq!(Procedure::from_directive("2"), None);
        assert_eq!(Procedure::from_directive("extract"), None);
    }

    #[test]
    fn files_are_always_unpacked() {
        let selection = choose(false, Some(Procedure::Pack));
        assert_eq!(selection.procedure, Procedure::Unpack);
        assert!(!selection.is_dir);
    }

    #[test]
    fn directories_default_to_pack() {
        assert_eq!(choose(true, None).procedure, Procedure::Pack);
        assert_eq!(choose(true, Some(Procedure::Unpack)).procedure, Procedure::Unpack);
    }

    #[test]
    fn missing_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = select(&dir.path().join("nope"), None);
        assert!(matches!(result, Err(Error::PathUnavailable { .. })));

        let selection = select(dir.path(), None).unwrap();
        assert_eq!(selection.procedure, Procedure::Pack);
        assert!(selection.is_dir);
    }
}

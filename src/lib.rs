//! Packs directories into PAC containers and unpacks them again, containers
//! nested inside containers included.
//!
//! Unpacking walks the whole container tree (`walk`) and maps every entry to
//! a path below the save folder (`output`), asking before files are
//! overwritten (`overwrite`). Packing turns the command line into a
//! `PackRequest` for the codec.

pub mod codec;
pub mod driver;
pub mod error;
pub mod options;
pub mod output;
pub mod overwrite;
pub mod pac_nom;
pub mod pac_write;
pub mod procedure;
pub mod request;
pub mod vfs;
pub mod walk;

pub use codec::{Codec, PacCodec};
pub use driver::{pack, run, unpack, Report, UnpackOptions, UnpackReport};
pub use error::{Error, Result};
pub use options::{Flag, Options};
pub use overwrite::{ConsoleKeys, KeySource, OverwriteGuard, ScriptedKeys};
pub use request::{ByteOrder, IdentifierMode, MinNameLength, PackRequest};

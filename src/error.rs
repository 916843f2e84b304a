use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("please input the path of a folder")]
    MissingTarget,

    #[error("can't retrieve \"{path}\" file system attributes: {source}")]
    PathUnavailable { path: PathBuf, source: io::Error },

    #[error("the \"{0}\" directory does not exist")]
    MissingDirectory(PathBuf),

    #[error("the \"{0}\" file does not exist")]
    MissingFile(PathBuf),

    #[error("{0} is not a valid PAC file")]
    InvalidContainer(String),

    #[error("{0} has no extension")]
    NoExtension(String),

    #[error("container is corrupted: {0}")]
    Corrupted(String),

    #[error("container nesting deeper than {limit} levels at '{path}'")]
    DepthExceeded { path: String, limit: usize },

    #[error("entry '{entry}' resolves to '{resolved}' outside of the save folder")]
    PathEscape { entry: String, resolved: PathBuf },

    #[error("entry name '{name}' is longer than {limit} characters")]
    NameTooLong { name: String, limit: usize },

    #[error("name field of {length} bytes is over the {limit} byte limit")]
    NameFieldTooLong { length: usize, limit: u32 },

    #[error("file name {0:?} is not valid UTF-8")]
    InvalidName(PathBuf),

    #[error("'{0}' is too large for a PAC container")]
    TooLarge(PathBuf),

    #[error("failed to write '{path}': {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Errors that only concern the current item of an unpack batch.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Error::MissingFile(_)
                | Error::InvalidContainer(_)
                | Error::NoExtension(_)
                | Error::Corrupted(_)
                | Error::DepthExceeded { .. }
                | Error::PathEscape { .. }
        )
    }
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => Error::Corrupted("unexpected end of data".to_string()),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                Error::Corrupted(format!("{:?} with {} bytes left", e.code, e.input.len()))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

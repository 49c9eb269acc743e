use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    InvalidShape(String),
    NonDivisiblePatchSize { extent: usize, patch_size: usize },
    MissingAssignment { node: usize },
    Io(io::Error),
    Encoding(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidShape(msg) => write!(f, "Invalid input shape: {}", msg),
            Error::NonDivisiblePatchSize { extent, patch_size } => write!(
                f,
                "Spatial extent {} is not divisible by patch size {}",
                extent, patch_size
            ),
            Error::MissingAssignment { node } => {
                write!(f, "Partition does not assign a community to node {}", node)
            }
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Encoding(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

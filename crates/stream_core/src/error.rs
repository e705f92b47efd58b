use thiserror::Error;

/// Result alias used by every fallible stream operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure raised by a stream or creator operation.
///
/// Each variant carries a message naming the operation and the offending
/// argument. Validation errors are raised before any state is mutated.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A null, empty, or otherwise malformed argument.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// A seed failed validation for its generator.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),
    /// An attempt to mutate the protected default stream creator.
    #[error("invalid stream creator: {0}")]
    InvalidStreamCreator(String),
    /// A stream buffer could not be allocated.
    #[error("out of resources: {0}")]
    OutOfResources(String),
}

/// Status code shared by every operation, including success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    InvalidValue,
    InvalidSeed,
    InvalidStreamCreator,
    OutOfResources,
}

impl Error {
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidValue(_) => Status::InvalidValue,
            Error::InvalidSeed(_) => Status::InvalidSeed,
            Error::InvalidStreamCreator(_) => Status::InvalidStreamCreator,
            Error::OutOfResources(_) => Status::OutOfResources,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::InvalidValue(msg)
            | Error::InvalidSeed(msg)
            | Error::InvalidStreamCreator(msg)
            | Error::OutOfResources(msg) => msg,
        }
    }
}

impl Status {
    /// Status code of an operation outcome.
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(err) => err.status(),
        }
    }
}

/// Allocate an empty buffer able to hold `count` records without reallocating.
pub(crate) fn alloc_buffer<T>(count: usize, op: &str) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(count).map_err(|_| {
        Error::OutOfResources(format!("{op}(): could not allocate memory for {count} streams"))
    })?;
    Ok(buf)
}

//! Status taxonomy for the dataqueue engine.
//!
//! One variant per `ERROR_*` code; success is plain `Result::Ok`. Mirrors
//! `onyx-config::ConfigError` in shape: `thiserror::Error` derives the
//! `Display` impl, and the one variant that wraps an external failure
//! (`FsAccessFail`) carries the underlying `std::io::Error` as `#[source]`.

use std::io;

pub type Result<T> = std::result::Result<T, DataQError>;

#[derive(Debug, thiserror::Error)]
pub enum DataQError {
    #[error("invalid argument")]
    InvalidArg,

    #[error("invalid handle")]
    InvalidHandle,

    #[error("invalid seek position")]
    InvalidSeek,

    #[error("queue already exists")]
    QueueExists,

    #[error("queue does not exist")]
    QueueMissing,

    #[error("queue already open with different access/mode")]
    QueueOpened,

    #[error("queue has no compatible lock held")]
    QueueClosed,

    #[error("queue is empty")]
    QueueIsEmpty,

    #[error("queue is busy")]
    QueueIsBusy,

    #[error("queue is open read-only")]
    QueueReadOnly,

    #[error("queue is open write-only")]
    QueueWriteOnly,

    #[error("queue is not seekable")]
    QueueNotSeekable,

    #[error("filesystem access failed")]
    FsAccessFail(#[source] io::Error),

    #[error("no handle slots available")]
    HandleNotAvail,
}

impl From<io::Error> for DataQError {
    fn from(e: io::Error) -> Self {
        DataQError::FsAccessFail(e)
    }
}

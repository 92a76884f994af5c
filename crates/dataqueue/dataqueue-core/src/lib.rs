//! `dataqueue-core`: the persistent, file-backed FIFO queue engine.
//!
//! This crate is the "hard engineering" the specification calls out: the
//! on-disk layout, the ring-buffer index arithmetic, the multi-process
//! lock-file protocol, and the operation layer that stitches them together
//! into `Create`/`Destroy`/`Open`/`Close`/`Enqueue`/`Dequeue`/`Seek`/
//! `GetEntry`/`GetLength`. It never touches `std::fs` directly — every byte
//! moves through the [`dataqueue_fs::FileSystem`] adaptor, the external
//! collaborator the spec declares out of scope.
//!
//! Module layout mirrors the component table in spec §2: [`header`] and
//! [`lut`] are the on-disk record shapes, [`store`] is the whole-buffer
//! transfer discipline over them (§4.B), [`lock`] is the advisory lock-file
//! protocol (§4.C), [`handle`] is the process-local handle table (§4.D),
//! [`ring`] is the index arithmetic (§4.E), and [`engine`] is the public
//! operation layer (§4.F) that ties the rest together.

mod engine;
mod error;
mod handle;
mod header;
mod lock;
mod lut;
mod ring;
mod store;

pub use engine::{Engine, SeekType};
pub use error::{DataQError, Result};
pub use handle::{AccessMode, AccessType, HandleId};
pub use header::Flags;
pub use lut::CAP_MAX;

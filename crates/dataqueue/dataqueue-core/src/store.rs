//! Whole-buffer `.header`/`.lut` transfer helpers (spec §4.B): every
//! mutating operation reads both in full on entry and writes both back in
//! full on exit, routed entirely through the [`FileSystem`] adaptor.

use crate::error::{DataQError, Result};
use crate::header::Header;
use crate::lut::{LookupTable, Tag, tag_to_filename};
use dataqueue_fs::FileSystem;
use std::io;
use std::path::{Path, PathBuf};

pub const HEADER_FILE: &str = ".header";
pub const LUT_FILE: &str = ".lut";

pub fn queue_dir(base_dir: &Path, name: &str) -> PathBuf {
    base_dir.join(name)
}

pub fn header_path(dir: &Path) -> PathBuf {
    dir.join(HEADER_FILE)
}

pub fn lut_path(dir: &Path) -> PathBuf {
    dir.join(LUT_FILE)
}

pub fn payload_path(dir: &Path, tag: &Tag) -> Result<PathBuf> {
    let name = tag_to_filename(tag).map_err(|_| corrupt("malformed reference tag in .lut"))?;
    Ok(dir.join(name))
}

fn corrupt(what: &str) -> DataQError {
    DataQError::FsAccessFail(io::Error::new(io::ErrorKind::InvalidData, what))
}

pub fn read_header(fs: &dyn FileSystem, dir: &Path) -> Result<Header> {
    let bytes = fs.read_file(&header_path(dir))?;
    Header::from_bytes(&bytes).ok_or_else(|| corrupt("malformed .header"))
}

pub fn write_header(fs: &dyn FileSystem, dir: &Path, header: &Header) -> Result<()> {
    fs.write_file(&header_path(dir), &header.to_bytes())?;
    Ok(())
}

pub fn read_lut(fs: &dyn FileSystem, dir: &Path) -> Result<LookupTable> {
    let bytes = fs.read_file(&lut_path(dir))?;
    LookupTable::from_bytes(&bytes).ok_or_else(|| corrupt("malformed .lut"))
}

pub fn write_lut(fs: &dyn FileSystem, dir: &Path, lut: &LookupTable) -> Result<()> {
    fs.write_file(&lut_path(dir), &lut.to_bytes())?;
    Ok(())
}

pub fn directory_exists(fs: &dyn FileSystem, dir: &Path) -> bool {
    fs.dir_exists(dir)
}

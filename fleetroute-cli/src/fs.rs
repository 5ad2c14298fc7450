//! Ambient-authority access to plan requests and the run store path.

use std::io;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};

/// Open a plan request for reading.
pub(crate) fn open_request(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Whether `path` names a regular file rather than a directory.
pub(crate) fn is_regular_file(path: &Utf8Path) -> io::Result<bool> {
    open_request(path)?.metadata().map(|meta| meta.is_file())
}

/// Create every missing directory above the run store at `path`.
pub(crate) fn create_store_parent(path: &Utf8Path) -> io::Result<()> {
    path.parent()
        .filter(|parent| !parent.as_str().is_empty())
        .map_or(Ok(()), |parent| {
            fs_utf8::Dir::create_ambient_dir_all(parent, ambient_authority())
        })
}

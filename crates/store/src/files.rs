// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic JSON file primitives and advisory file locking.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use masc_core::RoomError;

/// RAII guard for an exclusive advisory lock on a sibling `.lock` file.
///
/// The guard releases on drop, so the lock is released on every exit path
/// including panics unwinding through the holder.
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Block until the exclusive lock on `<path>.lock` is held.
    pub fn acquire(path: &Path) -> Result<Self, RoomError> {
        let lock_path = lock_path(path);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// Sibling lock file path: `state.json` → `state.json.lock`.
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

/// Run `f` while holding the exclusive advisory lock for `path`.
pub fn with_file_lock<T>(
    path: &Path,
    f: impl FnOnce() -> Result<T, RoomError>,
) -> Result<T, RoomError> {
    let _guard = FileLock::acquire(path)?;
    f()
}

/// Read and parse a JSON document. Missing file → `Ok(None)`; parse
/// failure → `InvalidJson`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RoomError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| RoomError::InvalidJson(format!("{}: {e}", display_name(path))))?;
    Ok(Some(value))
}

/// Atomic rewrite: serialize to a temp file in the same directory, fsync,
/// then rename over the target.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), RoomError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".tmp.{}", std::process::id()));
    let tmp = path.with_file_name(name);

    let bytes = serde_json::to_vec_pretty(value)?;
    let mut file = File::create(&tmp)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Append one line to a log file, creating it on first use.
pub fn append_line(path: &Path, line: &str) -> Result<(), RoomError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

/// File name for error messages, never the full path (which may sit
/// outside what callers should see).
fn display_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! masc-store: durable room persistence.
//!
//! Every JSON document mutation goes through the same discipline: an
//! exclusive advisory file lock held across the read-modify-write window,
//! and an atomic rewrite (temp file, fsync, rename) for the write itself.

pub mod backend;
pub mod cache;
pub mod files;
pub mod fs;
pub mod paths;
pub mod room;

pub use backend::{EventStream, StorageBackend};
pub use cache::CacheEntry;
pub use files::{read_json, with_file_lock, write_json_atomic, FileLock};
pub use fs::FsBackend;
pub use paths::RoomPaths;
pub use room::{RoomStore, TaskArchive};

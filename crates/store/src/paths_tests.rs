// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use yare::parameterized;

use super::{encode_key, RoomPaths};

#[test]
fn layout_matches_contract() {
    let paths = RoomPaths::new("/work/room");
    assert_eq!(paths.state(), std::path::PathBuf::from("/work/room/.masc/state.json"));
    assert_eq!(paths.backlog(), std::path::PathBuf::from("/work/room/.masc/backlog.json"));
    assert_eq!(
        paths.agent("rust-brave-otter"),
        std::path::PathBuf::from("/work/room/.masc/agents/rust-brave-otter.json")
    );
    assert_eq!(
        paths.planning_context("task-007"),
        std::path::PathBuf::from("/work/room/planning/task-007/context.json")
    );
}

#[test]
fn message_paths_zero_pad_seq() {
    let paths = RoomPaths::new("/r");
    assert_eq!(
        paths.message(7, "ada"),
        std::path::PathBuf::from("/r/.masc/messages/000007_ada_broadcast.json")
    );
    assert_eq!(
        paths.message(1234567, "ada"),
        std::path::PathBuf::from("/r/.masc/messages/1234567_ada_broadcast.json")
    );
}

#[parameterized(
    traversal = { "../outside" },
    absolute = { "/etc/passwd" },
    sneaky = { "ok/../../gone" },
)]
fn join_validated_rejects_escapes(rel: &str) {
    let paths = RoomPaths::new("/r");
    assert!(paths.join_validated(rel).is_err());
}

#[test]
fn join_validated_accepts_room_relative() {
    let paths = RoomPaths::new("/r");
    assert_eq!(
        paths.join_validated("src/lib.rs").unwrap(),
        std::path::PathBuf::from("/r/src/lib.rs")
    );
}

#[test]
fn encode_key_is_filesystem_safe_and_injective_on_specials() {
    assert_eq!(encode_key("plain-key_1.x"), "plain-key_1.x");
    assert_eq!(encode_key("locks:src/main.rs"), "locks%3Asrc%2Fmain.rs");
    assert_ne!(encode_key("a/b"), encode_key("a:b"));
}

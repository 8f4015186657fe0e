// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use tempfile::tempdir;

use masc_core::{AgentRecord, AuditEvent, Message, MessageKind, RoomError, Task};

use super::RoomStore;

fn store() -> (tempfile::TempDir, RoomStore) {
    let dir = tempdir().unwrap();
    let store = RoomStore::new(dir.path());
    store.init("demo", Utc::now()).unwrap();
    (dir, store)
}

#[test]
fn init_twice_is_a_no_op() {
    let dir = tempdir().unwrap();
    let store = RoomStore::new(dir.path());

    assert!(!store.is_initialized());
    assert!(store.init("demo", Utc::now()).unwrap());
    assert!(store.is_initialized());

    store.update_state(|s| Ok(s.next_message_seq())).unwrap();
    assert!(!store.init("demo", Utc::now()).unwrap());
    // Second init preserved the mutated state
    assert_eq!(store.load_state().unwrap().message_seq, 1);
}

#[test]
fn load_state_before_init_is_not_initialized() {
    let dir = tempdir().unwrap();
    let store = RoomStore::new(dir.path());
    assert!(matches!(store.load_state(), Err(RoomError::NotInitialized)));
    assert!(matches!(store.load_backlog(), Err(RoomError::NotInitialized)));
}

#[test]
fn backlog_lock_and_save_round_trip() {
    let (_dir, store) = store();
    let guard = store.lock_backlog().unwrap();
    let mut backlog = store.load_backlog().unwrap();
    backlog.tasks.push(Task::builder().id("task-001").build());
    backlog.commit(Utc::now());
    store.save_backlog(&backlog).unwrap();
    drop(guard);

    let back = store.load_backlog().unwrap();
    assert_eq!(back.version, 1);
    assert_eq!(back.tasks.len(), 1);
}

#[test]
fn agent_records_crud() {
    let (_dir, store) = store();
    let now = Utc::now();
    let agent = AgentRecord::new("rust-keen-wren", "rust", now);

    assert!(store.load_agent("rust-keen-wren").unwrap().is_none());
    store.save_agent(&agent).unwrap();
    assert_eq!(store.load_agent("rust-keen-wren").unwrap().unwrap(), agent);

    store
        .update_agent("rust-keen-wren", |a| {
            a.current_task = Some("task-001".into());
            Ok(())
        })
        .unwrap();
    assert_eq!(
        store.load_agent("rust-keen-wren").unwrap().unwrap().current_task.as_deref(),
        Some("task-001")
    );

    let err = store.update_agent("ghost", |_| Ok(())).unwrap_err();
    assert!(matches!(err, RoomError::AgentNotFound(_)));

    assert!(store.remove_agent("rust-keen-wren").unwrap());
    assert!(!store.remove_agent("rust-keen-wren").unwrap());
}

#[test]
fn list_agents_sorted_by_name() {
    let (_dir, store) = store();
    let now = Utc::now();
    store.save_agent(&AgentRecord::new("zeta", "w", now)).unwrap();
    store.save_agent(&AgentRecord::new("alpha", "w", now)).unwrap();

    let names: Vec<String> =
        store.list_agents().unwrap().into_iter().map(|a| a.name).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[test]
fn messages_list_most_recent_first_with_filters() {
    let (_dir, store) = store();
    let now = Utc::now();
    for seq in 1..=5 {
        store
            .append_message(&Message::new(seq, "ada", MessageKind::Broadcast, "hi", None, now))
            .unwrap();
    }

    let recent = store.list_messages(0, 2).unwrap();
    assert_eq!(recent.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![5, 4]);

    let since = store.list_messages(3, 10).unwrap();
    assert_eq!(since.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![5, 4]);
}

#[test]
fn prune_messages_honors_keep_predicate() {
    let (_dir, store) = store();
    let now = Utc::now();
    store
        .append_message(&Message::new(1, "ada", MessageKind::Broadcast, "about task-002", None, now))
        .unwrap();
    store
        .append_message(&Message::new(2, "ada", MessageKind::Broadcast, "chatter", None, now))
        .unwrap();

    let removed = store.prune_messages(|m| m.content.contains("task-002")).unwrap();
    assert_eq!(removed, 1);
    let left = store.list_messages(0, 10).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].seq, 1);
}

#[test]
fn audit_append_and_tail() {
    let (_dir, store) = store();
    let now = Utc::now();
    for n in 0..4 {
        store
            .append_audit(&AuditEvent::new(now, "ada", "tool_call", true, Some(format!("t{n}"))))
            .unwrap();
    }
    let tail = store.read_audit(2).unwrap();
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].detail.as_deref(), Some("t3"));
    assert_eq!(tail[1].detail.as_deref(), Some("t2"));
}

#[test]
fn session_identity_round_trip() {
    let (_dir, store) = store();
    assert!(store.read_session_identity("sess-1").unwrap().is_none());
    store.write_session_identity("sess-1", "rust-keen-wren").unwrap();
    assert_eq!(
        store.read_session_identity("sess-1").unwrap().as_deref(),
        Some("rust-keen-wren")
    );
}

#[test]
fn archive_appends_and_reloads() {
    let (_dir, store) = store();
    store.append_archive(vec![Task::builder().id("task-001").build()]).unwrap();
    store.append_archive(vec![Task::builder().id("task-002").build()]).unwrap();
    let archive = store.load_archive().unwrap();
    let ids: Vec<&str> = archive.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["task-001", "task-002"]);
}

#[test]
fn pointer_files_round_trip() {
    let (_dir, store) = store();

    assert!(store.read_current_task().unwrap().is_none());
    store.write_current_task(Some("task-003")).unwrap();
    assert_eq!(store.read_current_task().unwrap().as_deref(), Some("task-003"));
    store.write_current_task(None).unwrap();
    assert!(store.read_current_task().unwrap().is_none());
    // Clearing twice is fine
    store.write_current_task(None).unwrap();

    store.write_current_room("demo").unwrap();
    assert_eq!(store.read_current_room().unwrap().as_deref(), Some("demo"));
}

#[test]
fn room_registry_registers_rooms() {
    let (dir, store) = store();
    store.register_room("demo", dir.path()).unwrap();
    let registry = store.load_registry().unwrap();
    assert_eq!(registry.rooms.get("demo").unwrap(), dir.path());
}

use std::{fs, path::Path, sync::Arc, time::Duration};

use parley_core::{
    config::get_config,
    reply::ReplyEngine,
    session::{ChatSession, ReplyDelivery, SendResult, SessionConfig, schedule_reply},
    store::TranscriptStore,
    transcript::TranscriptEntry,
};
use tempfile::tempdir;
use tokio::sync::Mutex;

fn session_at(path: &Path) -> ChatSession {
    ChatSession::new(SessionConfig {
        history_path: path.to_path_buf(),
        reply_delay: Duration::from_millis(5),
        ..Default::default()
    })
}

#[test]
fn test_reply_rules_through_default_config() {
    let dir = tempdir().unwrap();
    let config = get_config(Some(dir.path().join("parley.yml"))).unwrap();
    let engine = ReplyEngine::new(config.replies);

    assert_eq!(engine.reply("hello, thanks"), "Hello! How can I help you?");
    assert_eq!(
        engine.reply("Are you there?"),
        "That's a good question. I haven't learned that yet, but I tried."
    );
    let long = "a".repeat(85);
    assert_eq!(engine.reply(&long), format!("You said: {}...", "a".repeat(77)));
    let exact = "b".repeat(80);
    assert_eq!(engine.reply(&exact), format!("You said: {exact}"));
}

#[test]
fn test_history_survives_restart() {
    let dir = tempdir().unwrap();
    let history = dir.path().join("chat_history.txt");

    let rendered = {
        let mut session = session_at(&history);
        session.start(true);
        let SendResult::Sent { user_line, pending, .. } = session.send("hello", true) else {
            panic!("expected message to be sent");
        };
        let ReplyDelivery::Delivered { line, .. } = session.finalize_reply(pending.unwrap())
        else {
            panic!("expected delivery");
        };
        vec![user_line.render(), line.render()]
    };

    let mut session = session_at(&history);
    let result = session.start(true);

    assert_eq!(result.seeded_lines, 2);
    let raw: Vec<_> = session
        .transcript()
        .entries()
        .iter()
        .filter(|e| e.is_raw())
        .map(TranscriptEntry::render)
        .collect();
    assert_eq!(raw, rendered);
}

#[test]
fn test_import_leaves_backing_store_alone() {
    let dir = tempdir().unwrap();
    let history = dir.path().join("chat_history.txt");
    let outside = dir.path().join("friend.txt");
    fs::write(&outside, "You (10:00): from elsewhere\n").unwrap();

    let mut session = session_at(&history);
    session.start(true);
    session.import_history(&outside);

    let stored = TranscriptStore::new(&history).read_all().unwrap().unwrap();
    assert!(!stored.contains("from elsewhere"));
    assert!(
        session
            .transcript()
            .entries()
            .contains(&TranscriptEntry::Raw("You (10:00): from elsewhere".into()))
    );
}

#[test]
fn test_export_then_import_round_trip_display() {
    let dir = tempdir().unwrap();
    let mut session = session_at(&dir.path().join("chat_history.txt"));
    session.start(true);
    session.send("note one", false);
    session.send("note two", false);
    let target = dir.path().join("saved.txt");
    session.export_history(&target);
    let exported = session.transcript().render();

    session.clear_display();
    session.import_history(&target);

    let raw: Vec<_> = session
        .transcript()
        .entries()
        .iter()
        .filter(|e| e.is_raw())
        .map(TranscriptEntry::render)
        .collect();
    assert_eq!(raw.join("\n"), exported);
}

#[tokio::test]
async fn test_scheduled_reply_lands_in_log() {
    let dir = tempdir().unwrap();
    let history = dir.path().join("chat_history.txt");
    let session = Arc::new(Mutex::new(session_at(&history)));

    let (pending, delay) = {
        let mut guard = session.lock().await;
        guard.start(true);
        let SendResult::Sent { pending, .. } = guard.send("rahmat", true) else {
            panic!("expected message to be sent");
        };
        (pending.unwrap(), guard.reply_delay())
    };

    let delivery = schedule_reply(Arc::downgrade(&session), pending, delay)
        .await
        .unwrap();

    assert!(matches!(delivery, ReplyDelivery::Delivered { .. }));
    let stored = fs::read_to_string(&history).unwrap();
    let lines: Vec<_> = stored.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("Bot ("));
    assert!(lines[1].ends_with("You're welcome!"));
}

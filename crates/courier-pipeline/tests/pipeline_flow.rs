// End-to-end pipeline behaviour against scripted collaborators:
// admission, delivery, feedback placement and the failure notices.

mod common;

use std::sync::Arc;

use common::{courier, event, MockBackend, RecordingMessenger};
use courier_format::Block;
use courier_pipeline::EventOutcome;

#[tokio::test]
async fn answer_is_posted_into_the_thread() {
    let backend = Arc::new(MockBackend::default());
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend.clone(), messenger.clone());

    let outcome = courier.handle(event("ev-1", "how do I rotate the key?")).await;
    assert_eq!(
        outcome,
        EventOutcome::Answered {
            chunks_sent: 1,
            chunks_failed: 0
        }
    );

    let posts = messenger.posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].channel_id, "C042");
    // Top-level message: the reply lands in the thread it roots.
    assert_eq!(posts[0].thread_root, "1756100000.000200");
    assert!(posts[0].chunk.fallback.contains("reasonably detailed answer"));
}

#[tokio::test]
async fn duplicate_event_is_discarded_silently() {
    let backend = Arc::new(MockBackend::default());
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend.clone(), messenger.clone());

    let first = courier.handle(event("ev-1", "question?")).await;
    let second = courier.handle(event("ev-1", "question?")).await;

    assert!(matches!(first, EventOutcome::Answered { .. }));
    assert_eq!(second, EventOutcome::Duplicate);
    assert_eq!(messenger.posts.lock().unwrap().len(), 1);
    // The duplicate never reached the backend.
    assert_eq!(backend.chats.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn code_reply_is_delivered_as_separate_chunks() {
    let backend = Arc::new(MockBackend {
        reply: "Use this:\n```sh\nsystemctl restart courier\n```\nThen check the logs.".into(),
        ..MockBackend::default()
    });
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend, messenger.clone());

    courier.handle(event("ev-1", "how do I restart?")).await;

    let posts = messenger.posts.lock().unwrap();
    assert_eq!(posts.len(), 3);
    assert!(matches!(posts[0].chunk.blocks[0], Block::Rich { .. }));
    match &posts[1].chunk.blocks[0] {
        Block::Preformatted { content, language } => {
            assert_eq!(language, "sh");
            assert!(content.contains("systemctl restart courier"));
        }
        other => panic!("expected preformatted, got {other:?}"),
    }
    // Non-code chunks are numbered, the code chunk is not.
    assert_eq!(posts[0].chunk.sequence, Some((1, 2)));
    assert_eq!(posts[1].chunk.sequence, None);
    assert_eq!(posts[2].chunk.sequence, Some((2, 2)));
}

#[tokio::test]
async fn feedback_controls_on_last_chunk_only() {
    let backend = Arc::new(MockBackend {
        reply: "First part of the answer.\n```sh\nls\n```\nSecond part of the answer.".into(),
        ..MockBackend::default()
    });
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend, messenger.clone());

    courier.handle(event("ev-1", "question?")).await;

    let posts = messenger.posts.lock().unwrap();
    let with_feedback: Vec<_> = posts
        .iter()
        .filter(|p| p.chunk.feedback.is_some())
        .collect();
    assert_eq!(with_feedback.len(), 1);
    assert!(posts.last().unwrap().chunk.feedback.is_some());
}

#[tokio::test]
async fn filler_reply_gets_no_feedback_controls() {
    let backend = Arc::new(MockBackend {
        reply: "ok".into(),
        ..MockBackend::default()
    });
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend, messenger.clone());

    courier.handle(event("ev-1", "did it work?")).await;

    let posts = messenger.posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].chunk.feedback.is_none());
}

#[tokio::test]
async fn empty_reply_sends_nothing() {
    let backend = Arc::new(MockBackend {
        reply: "   \n  ".into(),
        ..MockBackend::default()
    });
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend, messenger.clone());

    let outcome = courier.handle(event("ev-1", "hello?")).await;
    assert_eq!(
        outcome,
        EventOutcome::Answered {
            chunks_sent: 0,
            chunks_failed: 0
        }
    );
    assert!(messenger.posts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn chat_failure_posts_generic_notice() {
    let backend = Arc::new(MockBackend {
        fail_chat: true,
        ..MockBackend::default()
    });
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend, messenger.clone());

    let outcome = courier.handle(event("ev-1", "question?")).await;
    assert_eq!(outcome, EventOutcome::Failed);

    let fallbacks = messenger.fallbacks();
    assert_eq!(fallbacks.len(), 1);
    assert!(fallbacks[0].contains("Something went wrong"));
    // No internals leak into the notice.
    assert!(!fallbacks[0].contains("500"));
}

#[tokio::test]
async fn thread_create_failure_posts_generic_notice() {
    let backend = Arc::new(MockBackend {
        fail_create: true,
        ..MockBackend::default()
    });
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend.clone(), messenger.clone());

    let outcome = courier.handle(event("ev-1", "question?")).await;
    assert_eq!(outcome, EventOutcome::Failed);
    assert_eq!(messenger.posts.lock().unwrap().len(), 1);
    // The chat call never happened.
    assert!(backend.chats.lock().unwrap().is_empty());
}

#[tokio::test]
async fn one_failed_chunk_does_not_abort_the_rest() {
    let backend = Arc::new(MockBackend {
        reply: "Part one.\n```sh\nls\n```\nPart two.".into(),
        ..MockBackend::default()
    });
    let messenger = Arc::new(RecordingMessenger::failing_first());
    let courier = courier(backend, messenger.clone());

    let outcome = courier.handle(event("ev-1", "question?")).await;
    assert_eq!(
        outcome,
        EventOutcome::Answered {
            chunks_sent: 2,
            chunks_failed: 1
        }
    );
    assert_eq!(messenger.posts.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn follow_up_reuses_the_same_remote_thread() {
    let backend = Arc::new(MockBackend::default());
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend.clone(), messenger.clone());

    courier.handle(event("ev-1", "first question")).await;
    courier.handle(event("ev-2", "follow-up question")).await;

    // Same thread root, so a single remote thread serves both turns.
    assert_eq!(backend.created.load(std::sync::atomic::Ordering::SeqCst), 1);
    let chats = backend.chats.lock().unwrap();
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0].thread_id, chats[1].thread_id);
}

#[tokio::test]
async fn workspace_marker_scopes_the_new_thread() {
    let backend = Arc::new(MockBackend::default());
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend.clone(), messenger.clone());

    courier
        .handle(event("ev-1", "#eng how is the deploy pipeline wired?"))
        .await;

    let chats = backend.chats.lock().unwrap();
    assert_eq!(chats[0].workspace, "eng");
    assert!(chats[0].thread_id.starts_with("eng-thread-"));
}

#[tokio::test]
async fn unknown_marker_falls_back_to_default_workspace() {
    let backend = Arc::new(MockBackend::default());
    let messenger = Arc::new(RecordingMessenger::default());
    let courier = courier(backend.clone(), messenger.clone());

    courier
        .handle(event("ev-1", "#nosuchspace where are the dashboards?"))
        .await;

    assert_eq!(backend.chats.lock().unwrap()[0].workspace, "default");
}

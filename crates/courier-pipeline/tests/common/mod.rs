#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use courier_core::{CourierConfig, InboundEvent};
use courier_format::Chunk;
use courier_pipeline::{CollaboratorError, Courier, LlmBackend, Messenger};

/// Scripted LLM backend: fixed workspace list, fixed reply, optional
/// failure injection and a delay on thread creation to widen race windows.
pub struct MockBackend {
    pub workspaces: Vec<String>,
    pub reply: String,
    pub fail_listing: bool,
    pub fail_create: bool,
    pub fail_chat: bool,
    pub create_delay: Duration,
    pub listings: AtomicUsize,
    pub created: AtomicUsize,
    pub chats: Mutex<Vec<ChatCall>>,
}

pub struct ChatCall {
    pub workspace: String,
    pub thread_id: String,
    pub text: String,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            workspaces: vec!["default".to_string(), "eng".to_string()],
            reply: "A reasonably detailed answer that is long enough to rate.".to_string(),
            fail_listing: false,
            fail_create: false,
            fail_chat: false,
            create_delay: Duration::ZERO,
            listings: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
            chats: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn list_workspaces(&self) -> Result<Vec<String>, CollaboratorError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(CollaboratorError::Unavailable("listing down".into()));
        }
        Ok(self.workspaces.clone())
    }

    async fn create_thread(&self, workspace: &str) -> Result<String, CollaboratorError> {
        if self.fail_create {
            return Err(CollaboratorError::Api("thread create rejected".into()));
        }
        tokio::time::sleep(self.create_delay).await;
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{workspace}-thread-{n}"))
    }

    async fn chat(
        &self,
        workspace: &str,
        thread_id: &str,
        text: &str,
    ) -> Result<String, CollaboratorError> {
        self.chats.lock().unwrap().push(ChatCall {
            workspace: workspace.to_string(),
            thread_id: thread_id.to_string(),
            text: text.to_string(),
        });
        if self.fail_chat {
            return Err(CollaboratorError::Api("backend 500".into()));
        }
        Ok(self.reply.clone())
    }
}

/// Messenger that records every delivered chunk. `fail_first` makes the
/// first post attempt fail once.
#[derive(Default)]
pub struct RecordingMessenger {
    pub posts: Mutex<Vec<Posted>>,
    pub fail_first: bool,
    attempts: AtomicUsize,
}

pub struct Posted {
    pub channel_id: String,
    pub thread_root: String,
    pub chunk: Chunk,
}

impl RecordingMessenger {
    pub fn failing_first() -> Self {
        Self {
            fail_first: true,
            ..Self::default()
        }
    }

    pub fn fallbacks(&self) -> Vec<String> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.chunk.fallback.clone())
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn post(
        &self,
        channel_id: &str,
        thread_root: &str,
        chunk: &Chunk,
    ) -> Result<String, CollaboratorError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_first && attempt == 0 {
            return Err(CollaboratorError::Api("rate limited".into()));
        }
        let mut posts = self.posts.lock().unwrap();
        posts.push(Posted {
            channel_id: channel_id.to_string(),
            thread_root: thread_root.to_string(),
            chunk: chunk.clone(),
        });
        Ok(format!("msg-{}", posts.len()))
    }

    async fn update(&self, _message_id: &str, _chunk: &Chunk) -> Result<(), CollaboratorError> {
        Ok(())
    }

    async fn delete(&self, _message_id: &str) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

pub fn event(event_id: &str, text: &str) -> InboundEvent {
    InboundEvent {
        event_id: event_id.to_string(),
        channel_id: "C042".to_string(),
        user_id: "U7".to_string(),
        text: text.to_string(),
        timestamp: "1756100000.000200".to_string(),
        thread_root: None,
    }
}

pub fn courier(backend: Arc<MockBackend>, messenger: Arc<RecordingMessenger>) -> Arc<Courier> {
    let db = courier_store::open_in_memory().expect("in-memory db");
    Courier::with_db(&CourierConfig::default(), db, backend, messenger)
}

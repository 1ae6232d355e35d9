//! Scripted gateway double for handler and classifier tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::completion::{CompletionError, CompletionGateway};

/// A gateway that replays canned answers and counts its calls.
pub struct MockGateway {
    replies: Mutex<Vec<String>>,
    failure: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockGateway {
    /// Always answer with the same text.
    pub fn replying(reply: &str) -> Self {
        Self {
            replies: Mutex::new(vec![reply.to_string()]),
            failure: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer with each reply in turn, repeating the last one when exhausted.
    pub fn with_replies(replies: &[&str]) -> Self {
        assert!(!replies.is_empty(), "at least one reply required");
        Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            failure: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with a connection error.
    pub fn failing(reason: &str) -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            failure: Some(reason.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer the scripted replies first, then fail once they run out.
    /// Useful for "classifier succeeds, handler fails" pipelines.
    pub fn replying_then_failing(replies: &[&str], reason: &str) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            failure: Some(reason.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of completed `complete` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent prompt sent, if any.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionGateway for MockGateway {
    async fn complete(
        &self,
        prompt: &str,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, CompletionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let replies = self.replies.lock().unwrap();
        if let Some(reason) = &self.failure {
            // Scripted replies are consumed first; everything after fails.
            if call >= replies.len() {
                return Err(CompletionError::ConnectionFailed {
                    endpoint: "mock".into(),
                    reason: reason.clone(),
                });
            }
            return Ok(replies[call].clone());
        }

        let index = call.min(replies.len() - 1);
        Ok(replies[index].clone())
    }
}

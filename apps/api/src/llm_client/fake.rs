//! In-process `CompletionService` for tests: records every request and answers
//! from a canned script instead of the network.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionRequest, CompletionService, LlmError};
use crate::llm_client::prompts::COVER_LETTER_WRITER_SYSTEM;

pub struct FakeLlm {
    resume: String,
    cover_letter: String,
    fail_with_status: Option<u16>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl FakeLlm {
    pub fn new(resume: &str, cover_letter: &str) -> Self {
        Self {
            resume: resume.to_string(),
            cover_letter: cover_letter.to_string(),
            fail_with_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if the API answered with `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::new("", "")
        }
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for FakeLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(status) = self.fail_with_status {
            return Err(LlmError::Api {
                status,
                message: "scripted failure".to_string(),
            });
        }

        let text = if request.system == COVER_LETTER_WRITER_SYSTEM {
            &self.cover_letter
        } else {
            &self.resume
        };
        Ok(text.trim().to_string())
    }
}

//! Scripted mock backend for gateway tests.

use super::{BackendError, GenerationParams, GenerativeBackend, ModelReply, PromptPart};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

enum Script {
    /// Always return the same text.
    AlwaysOk(String),
    /// Fail `remaining` times with a transient error, then return the text.
    FailThenSucceed { remaining: AtomicU32, text: String },
    /// Always fail with a transient error.
    AlwaysFail,
    /// Always fail with an API error of the given status.
    FailApi { status: u16, message: String },
}

/// Mock [`GenerativeBackend`] recording every attempt.
pub struct MockBackend {
    script: Script,
    calls: AtomicU32,
    last_parts: Mutex<Vec<PromptPart>>,
}

impl MockBackend {
    pub fn always_ok(text: &str) -> Self {
        Self::with_script(Script::AlwaysOk(text.to_string()))
    }

    pub fn fail_n_then_succeed(failures: u32, text: &str) -> Self {
        Self::with_script(Script::FailThenSucceed {
            remaining: AtomicU32::new(failures),
            text: text.to_string(),
        })
    }

    pub fn always_fail() -> Self {
        Self::with_script(Script::AlwaysFail)
    }

    pub fn fail_with_api(status: u16, message: &str) -> Self {
        Self::with_script(Script::FailApi {
            status,
            message: message.to_string(),
        })
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicU32::new(0),
            last_parts: Mutex::new(Vec::new()),
        }
    }

    /// Number of attempts the gateway actually issued.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt parts of the most recent attempt.
    pub fn last_parts(&self) -> Vec<PromptPart> {
        self.last_parts.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn generate(
        &self,
        parts: &[PromptPart],
        _params: &GenerationParams,
    ) -> Result<ModelReply, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_parts.lock().expect("mock lock poisoned") = parts.to_vec();

        match &self.script {
            Script::AlwaysOk(text) => Ok(ModelReply::Scalar { text: text.clone() }),
            Script::FailThenSucceed { remaining, text } => {
                let left = remaining.load(Ordering::SeqCst);
                if left > 0 {
                    remaining.store(left - 1, Ordering::SeqCst);
                    Err(BackendError::Network("scripted transient failure".to_string()))
                } else {
                    Ok(ModelReply::Scalar { text: text.clone() })
                }
            }
            Script::AlwaysFail => Err(BackendError::Network(
                "scripted transient failure".to_string(),
            )),
            Script::FailApi { status, message } => Err(BackendError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

//! # Offline Executor
//!
//! Rule-based responder that needs no network and no model weights. It backs
//! the `offline` fallback tier: answers are generic but always available.

use async_trait::async_trait;
use std::sync::Arc;

use crate::constants::TaskType;
use crate::registry::{ExecutorFactory, ExecutorRequest, TaskExecutor};

const EMERGENCY_GUIDANCE: &str = "If anyone is in immediate danger, contact local emergency services now. \
Move to a safe location, keep your phone charged, and write down names, times and places while they are fresh.";

#[derive(Debug, Default, Clone)]
pub struct OfflineExecutor;

impl OfflineExecutor {
    pub fn new() -> Self {
        Self
    }

    fn respond(request: &ExecutorRequest) -> String {
        match request.task_type {
            TaskType::Emergency => EMERGENCY_GUIDANCE.to_string(),
            TaskType::LegalAnalysis | TaskType::DocumentAnalysis => format!(
                "Detailed analysis is unavailable while offline. Your request has been kept: \"{}\". \
                 General guidance: keep copies of every document and note all deadlines.",
                summarize(&request.original)
            ),
            TaskType::FastResponse | TaskType::GeneralQuery => format!(
                "Offline mode: only basic answers are available right now. You asked: \"{}\".",
                summarize(&request.original)
            ),
            // Voice payloads pass through so the caller can fall back to on-device speech
            TaskType::VoiceRecognition | TaskType::TextToSpeech => request.payload.clone(),
        }
    }
}

/// Trim long payloads so offline answers stay short
fn summarize(payload: &str) -> String {
    const LIMIT: usize = 120;
    let trimmed = payload.trim();
    if trimmed.chars().count() <= LIMIT {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(LIMIT).collect();
        format!("{head}...")
    }
}

#[async_trait]
impl TaskExecutor for OfflineExecutor {
    async fn execute(&self, request: &ExecutorRequest) -> anyhow::Result<String> {
        Ok(Self::respond(request))
    }

    async fn probe(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Factory registered for executors of kind `offline`
#[derive(Debug, Default, Clone)]
pub struct OfflineFactory;

#[async_trait]
impl ExecutorFactory for OfflineFactory {
    async fn create(&self, _name: &str) -> anyhow::Result<Arc<dyn TaskExecutor>> {
        Ok(Arc::new(OfflineExecutor::new()))
    }
}

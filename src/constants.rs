//! # System Constants
//!
//! Closed enumerations shared by the router, the health manager and the
//! performance monitor, plus the well-known service names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;

/// Well-known service names
pub mod services {
    /// Health record tracking network reachability
    pub const NETWORK: &str = "network";
    /// Built-in rule-based executor kind
    pub const OFFLINE_KIND: &str = "offline";
}

/// Closed category of request used to select a preferred executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    LegalAnalysis,
    DocumentAnalysis,
    GeneralQuery,
    FastResponse,
    Emergency,
    VoiceRecognition,
    TextToSpeech,
}

impl TaskType {
    pub const ALL: [TaskType; 7] = [
        TaskType::LegalAnalysis,
        TaskType::DocumentAnalysis,
        TaskType::GeneralQuery,
        TaskType::FastResponse,
        TaskType::Emergency,
        TaskType::VoiceRecognition,
        TaskType::TextToSpeech,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::LegalAnalysis => "legal_analysis",
            TaskType::DocumentAnalysis => "document_analysis",
            TaskType::GeneralQuery => "general_query",
            TaskType::FastResponse => "fast_response",
            TaskType::Emergency => "emergency",
            TaskType::VoiceRecognition => "voice_recognition",
            TaskType::TextToSpeech => "text_to_speech",
        }
    }

    /// Voice payloads are audio handles or raw transcripts and must not be reshaped
    pub fn is_voice(&self) -> bool {
        matches!(self, TaskType::VoiceRecognition | TaskType::TextToSpeech)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .iter()
            .copied()
            .find(|task_type| task_type.as_str() == s)
            .ok_or_else(|| RelayError::NotFound(format!("task type '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide severity label. Ordered: `Normal < Degraded < Limited < EmergencyOnly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationLevel {
    Normal,
    Degraded,
    Limited,
    EmergencyOnly,
}

impl DegradationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradationLevel::Normal => "normal",
            DegradationLevel::Degraded => "degraded",
            DegradationLevel::Limited => "limited",
            DegradationLevel::EmergencyOnly => "emergency_only",
        }
    }

    /// Fallback tiers activated at this level
    pub fn active_fallbacks(&self) -> Vec<FallbackTier> {
        match self {
            DegradationLevel::Normal => vec![],
            DegradationLevel::Degraded => vec![FallbackTier::Secondary],
            DegradationLevel::Limited => vec![FallbackTier::Secondary, FallbackTier::Offline],
            DegradationLevel::EmergencyOnly => vec![FallbackTier::Emergency, FallbackTier::Offline],
        }
    }
}

impl fmt::Display for DegradationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named bundle of reduced capabilities activated once degradation crosses a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    Secondary,
    Offline,
    Emergency,
}

impl FallbackTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackTier::Secondary => "secondary",
            FallbackTier::Offline => "offline",
            FallbackTier::Emergency => "emergency",
        }
    }
}

/// Qualitative answer to "which class of service can handle this right now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTier {
    Primary,
    Secondary,
    Offline,
    Emergency,
}

impl ServiceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceTier::Primary => "primary",
            ServiceTier::Secondary => "secondary",
            ServiceTier::Offline => "offline",
            ServiceTier::Emergency => "emergency",
        }
    }
}

/// Overall label attached to each system health snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Excellent,
    Good,
    Degraded,
    Critical,
}

impl OverallHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallHealth::Excellent => "excellent",
            OverallHealth::Good => "good",
            OverallHealth::Degraded => "degraded",
            OverallHealth::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// Failure classification recorded with unsuccessful performance metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Timeout,
    ExecutorFailure,
    NotFound,
    Initialization,
    NoHealthyExecutor,
    Configuration,
    Internal,
}

//! # Routing Strategy
//!
//! Static preference table, capability-derived defaults, latency-first
//! reordering and per-task request shaping. Everything here is pure.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::RouterConfig;
use crate::constants::TaskType;
use crate::error::{RelayError, Result};
use crate::registry::ExecutorDescriptor;

/// Ordered executor preference per task type
#[derive(Debug, Clone, Default)]
pub struct StrategyTable {
    preferences: HashMap<TaskType, Vec<String>>,
}

impl StrategyTable {
    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        let mut preferences = HashMap::with_capacity(config.strategies.len());
        for (task_type, names) in &config.strategies {
            let task_type: TaskType = task_type.parse().map_err(|_| {
                RelayError::Configuration(format!(
                    "router.strategies references unknown task type '{task_type}'"
                ))
            })?;
            preferences.insert(task_type, names.clone());
        }
        Ok(Self { preferences })
    }

    pub fn configured(&self, task_type: TaskType) -> Option<&[String]> {
        self.preferences.get(&task_type).map(Vec::as_slice)
    }

    /// Table entry for `task_type`, or the executors declaring the capability
    /// ordered by reliability then latency
    pub fn preference_for(
        &self,
        task_type: TaskType,
        descriptors: &[ExecutorDescriptor],
    ) -> Vec<String> {
        if let Some(names) = self.configured(task_type) {
            return names.to_vec();
        }

        let mut capable: Vec<&ExecutorDescriptor> = descriptors
            .iter()
            .filter(|descriptor| descriptor.supports(task_type))
            .collect();
        capable.sort_by(|a, b| {
            b.reliability
                .partial_cmp(&a.reliability)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    a.avg_latency_ms
                        .partial_cmp(&b.avg_latency_ms)
                        .unwrap_or(Ordering::Equal)
                })
        });
        capable
            .into_iter()
            .map(|descriptor| descriptor.name.clone())
            .collect()
    }
}

/// Stable sort by current average latency. Unknown names keep their relative order at the end.
pub fn latency_first(names: &mut [String], descriptors: &[ExecutorDescriptor]) {
    let latency = |name: &str| {
        descriptors
            .iter()
            .find(|descriptor| descriptor.name == name)
            .map(|descriptor| descriptor.avg_latency_ms)
            .unwrap_or(f64::INFINITY)
    };
    names.sort_by(|a, b| {
        latency(a)
            .partial_cmp(&latency(b))
            .unwrap_or(Ordering::Equal)
    });
}

fn role_instruction(task_type: TaskType) -> Option<&'static str> {
    match task_type {
        TaskType::LegalAnalysis => Some(
            "You are a legal information assistant. Explain the relevant rights and procedures \
             clearly and note that this is general information, not legal advice.",
        ),
        TaskType::DocumentAnalysis => Some(
            "Review the following document. Summarize its key points and flag anything that \
             needs attention.",
        ),
        TaskType::GeneralQuery => Some("Answer the following question clearly and accurately."),
        TaskType::FastResponse => Some("Answer in one or two short sentences."),
        TaskType::Emergency => Some(
            "EMERGENCY. Lead with immediate, actionable safety guidance. Keep it short and calm.",
        ),
        TaskType::VoiceRecognition | TaskType::TextToSpeech => None,
    }
}

/// Prefix the role instruction for `task_type`. Voice payloads pass through unchanged.
pub fn shape_request(task_type: TaskType, request: &str) -> String {
    match role_instruction(task_type) {
        Some(instruction) => format!("{instruction}\n\n{request}"),
        None => request.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors() -> Vec<ExecutorDescriptor> {
        vec![
            ExecutorDescriptor::new("general", vec![TaskType::GeneralQuery], 1500)
                .with_reliability(0.9),
            ExecutorDescriptor::new("fast", vec![TaskType::GeneralQuery], 200)
                .with_reliability(0.9),
            ExecutorDescriptor::new("reasoning", vec![TaskType::GeneralQuery], 3000)
                .with_reliability(0.95),
            ExecutorDescriptor::new("speech", vec![TaskType::VoiceRecognition], 300),
        ]
    }

    #[test]
    fn test_configured_table_wins() {
        let table = StrategyTable::from_config(&RouterConfig::default()).unwrap();
        assert_eq!(
            table.preference_for(TaskType::FastResponse, &descriptors()),
            vec!["fast", "general", "offline"]
        );
    }

    #[test]
    fn test_capability_derived_preference() {
        let table = StrategyTable::default();
        assert_eq!(
            table.preference_for(TaskType::GeneralQuery, &descriptors()),
            vec!["reasoning", "fast", "general"]
        );
        assert!(table
            .preference_for(TaskType::Emergency, &descriptors())
            .is_empty());
    }

    #[test]
    fn test_unknown_task_type_in_table_is_rejected() {
        let mut config = RouterConfig::default();
        config
            .strategies
            .insert("astrology".to_string(), vec!["general".to_string()]);
        assert!(matches!(
            StrategyTable::from_config(&config),
            Err(RelayError::Configuration(_))
        ));
    }

    #[test]
    fn test_latency_first_is_stable() {
        let mut names = vec![
            "reasoning".to_string(),
            "ghost".to_string(),
            "general".to_string(),
            "fast".to_string(),
        ];
        latency_first(&mut names, &descriptors());
        assert_eq!(names, vec!["fast", "general", "reasoning", "ghost"]);
    }

    #[test]
    fn test_shaping() {
        let shaped = shape_request(TaskType::LegalAnalysis, "Can I record the stop?");
        assert!(shaped.starts_with("You are a legal information assistant."));
        assert!(shaped.ends_with("Can I record the stop?"));

        assert_eq!(
            shape_request(TaskType::VoiceRecognition, "raw-audio-ref"),
            "raw-audio-ref"
        );
        assert_eq!(shape_request(TaskType::TextToSpeech, "Stay calm."), "Stay calm.");
    }
}

//! # Performance Metrics
//!
//! One record per completed `orchestrate` call, kept in a bounded ring buffer.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::{ErrorCategory, TaskType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: u64,
    /// Executor that produced the terminal outcome
    pub executor: String,
    pub task_type: TaskType,
    pub success: bool,
    pub error_category: Option<ErrorCategory>,
}

impl PerformanceMetric {
    pub fn success(executor: impl Into<String>, task_type: TaskType, response_time_ms: u64) -> Self {
        Self {
            timestamp: Utc::now(),
            response_time_ms,
            executor: executor.into(),
            task_type,
            success: true,
            error_category: None,
        }
    }

    pub fn failure(
        executor: impl Into<String>,
        task_type: TaskType,
        response_time_ms: u64,
        category: ErrorCategory,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            response_time_ms,
            executor: executor.into(),
            task_type,
            success: false,
            error_category: Some(category),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Mutex-guarded ring buffer. Trimming happens on insert.
#[derive(Debug)]
pub struct MetricsBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<PerformanceMetric>>,
}

impl MetricsBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn push(&self, metric: PerformanceMetric) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(metric);
    }

    /// Metrics with `timestamp >= now - window`, oldest first
    pub fn window(&self, now: DateTime<Utc>, window: Duration) -> Vec<PerformanceMetric> {
        let cutoff = now - window;
        self.entries
            .lock()
            .iter()
            .filter(|metric| metric.timestamp >= cutoff && metric.timestamp <= now)
            .cloned()
            .collect()
    }

    /// Most recent `limit` metrics, oldest first
    pub fn recent(&self, limit: usize) -> Vec<PerformanceMetric> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_entries_are_dropped() {
        let buffer = MetricsBuffer::new(3);
        for latency in [10, 20, 30, 40] {
            buffer.push(PerformanceMetric::success("fast", TaskType::FastResponse, latency));
        }

        assert_eq!(buffer.len(), 3);
        let latencies: Vec<u64> = buffer.recent(10).iter().map(|m| m.response_time_ms).collect();
        assert_eq!(latencies, vec![20, 30, 40]);
        assert_eq!(buffer.recent(1)[0].response_time_ms, 40);
    }

    #[test]
    fn test_window_filters_by_timestamp() {
        let buffer = MetricsBuffer::new(10);
        let now = Utc::now();
        buffer.push(
            PerformanceMetric::success("general", TaskType::GeneralQuery, 100)
                .at(now - Duration::minutes(10)),
        );
        buffer.push(
            PerformanceMetric::failure(
                "general",
                TaskType::GeneralQuery,
                200,
                ErrorCategory::Timeout,
            )
            .at(now - Duration::minutes(1)),
        );

        let recent = buffer.window(now, Duration::minutes(5));
        assert_eq!(recent.len(), 1);
        assert!(!recent[0].success);
        assert_eq!(recent[0].error_category, Some(ErrorCategory::Timeout));
    }

    #[test]
    fn test_concurrent_writers() {
        let buffer = std::sync::Arc::new(MetricsBuffer::new(100));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let buffer = buffer.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        buffer.push(PerformanceMetric::success("fast", TaskType::FastResponse, 5));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(buffer.len(), 100);
    }
}

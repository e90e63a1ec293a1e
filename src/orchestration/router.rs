//! # Router
//!
//! Selects a primary executor and ordered fallbacks for a task, dispatches
//! under a deadline, absorbs one failure by trying the first fallback, and
//! reports exactly one metric per call that reached an executor.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::strategy::{latency_first, shape_request, StrategyTable};
use super::types::{OrchestrationContext, OrchestrationOutcome, RoutingDecision};
use crate::config::RouterConfig;
use crate::constants::{Priority, TaskType};
use crate::error::{RelayError, Result};
use crate::health::HealthManager;
use crate::logging::{log_error, log_routing_decision};
use crate::monitor::{PerformanceMetric, PerformanceMonitor};
use crate::registry::{ExecutorDescriptor, ExecutorRegistry, ExecutorRequest};

pub struct Router {
    config: RouterConfig,
    strategies: StrategyTable,
    registry: Arc<ExecutorRegistry>,
    health: Arc<HealthManager>,
    monitor: Arc<PerformanceMonitor>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("strategies", &self.strategies)
            .field("timeout_multiplier", &self.config.timeout_multiplier)
            .finish()
    }
}

impl Router {
    pub fn new(
        config: RouterConfig,
        registry: Arc<ExecutorRegistry>,
        health: Arc<HealthManager>,
        monitor: Arc<PerformanceMonitor>,
    ) -> Result<Self> {
        let strategies = StrategyTable::from_config(&config)?;
        Ok(Self {
            config,
            strategies,
            registry,
            health,
            monitor,
        })
    }

    /// Preference list for the task, filtered to eligible executors
    pub fn build_decision(&self, task_type: TaskType, priority: Priority) -> Result<RoutingDecision> {
        let descriptors = self.registry.descriptors();
        let mut candidates = self.strategies.preference_for(task_type, &descriptors);
        // An executor is tried at most once per call
        let mut listed = HashSet::new();
        candidates.retain(|name| listed.insert(name.clone()));
        let mut reasoning = match self.strategies.configured(task_type) {
            Some(_) => format!("strategy table for {task_type}"),
            None => format!("executors declaring {task_type}, by reliability"),
        };

        let latency_reason = if self.health.is_emergency_mode() {
            Some("emergency mode")
        } else if task_type == TaskType::Emergency {
            Some("emergency task")
        } else if priority == Priority::High {
            Some("high priority")
        } else {
            None
        };
        if let Some(reason) = latency_reason {
            latency_first(&mut candidates, &descriptors);
            reasoning.push_str(&format!("; lowest latency first ({reason})"));
        }

        let considered = candidates.len();
        let eligible: Vec<&ExecutorDescriptor> = candidates
            .iter()
            .filter_map(|name| descriptors.iter().find(|d| &d.name == name))
            .filter(|descriptor| self.is_eligible(descriptor))
            .collect();

        let Some((primary, rest)) = eligible.split_first() else {
            debug!(task_type = %task_type, considered, "No eligible executor");
            return Err(RelayError::NoHealthyExecutor {
                task_type: task_type.to_string(),
            });
        };

        let skipped = considered - eligible.len();
        if skipped > 0 {
            reasoning.push_str(&format!("; {skipped} skipped as unhealthy or unavailable"));
        }

        let decision = RoutingDecision {
            task_type,
            selected: primary.name.clone(),
            fallbacks: rest.iter().map(|d| d.name.clone()).collect(),
            reasoning,
            estimated_latency_ms: primary.avg_latency_ms,
            priority,
        };
        log_routing_decision(
            task_type.as_str(),
            priority.as_str(),
            &decision.selected,
            &decision.fallbacks,
            &decision.reasoning,
        );
        Ok(decision)
    }

    fn is_eligible(&self, descriptor: &ExecutorDescriptor) -> bool {
        self.health.is_service_healthy(&descriptor.name)
            && (descriptor.offline_capable || self.health.is_network_healthy())
    }

    /// Per-call deadline derived from configured, not observed, latency
    pub fn timeout_for(&self, descriptor: &ExecutorDescriptor) -> Duration {
        let scaled = (descriptor.configured_latency_ms as f64 * self.config.timeout_multiplier) as u64;
        Duration::from_millis(scaled.max(self.config.min_timeout_ms))
    }

    /// Route `request` to the best eligible executor.
    ///
    /// Fails with `NoHealthyExecutor` before any dispatch when nothing is
    /// eligible. A retryable primary failure is absorbed by the first fallback;
    /// when that fails too the error carries both causes.
    pub async fn orchestrate(
        &self,
        request: &str,
        task_type: TaskType,
        priority: Priority,
        context: Option<OrchestrationContext>,
    ) -> Result<OrchestrationOutcome> {
        let decision = self.build_decision(task_type, priority)?;
        let executor_request = ExecutorRequest::new(task_type, request)
            .with_shaped_payload(shape_request(task_type, request))
            .with_context(context.unwrap_or_default());

        let started = Instant::now();
        let result = match self.dispatch(&decision.selected, &executor_request).await {
            Ok(response) => Ok((decision.selected.clone(), response)),
            Err(primary) => match decision.first_fallback() {
                Some(fallback) if primary.is_retryable() => {
                    warn!(
                        primary = %decision.selected,
                        fallback = %fallback,
                        error = %primary,
                        "Primary executor failed, trying fallback"
                    );
                    match self.dispatch(fallback, &executor_request).await {
                        Ok(response) => Ok((fallback.to_string(), response)),
                        Err(fallback_error) => Err((
                            fallback.to_string(),
                            RelayError::OrchestrationFailed {
                                primary: Box::new(primary),
                                fallback: Box::new(fallback_error),
                            },
                        )),
                    }
                }
                _ => Err((decision.selected.clone(), primary)),
            },
        };
        let response_time = started.elapsed();
        let elapsed_ms = response_time.as_millis() as u64;

        match result {
            Ok((executor_used, response)) => {
                self.monitor.record_metrics(PerformanceMetric::success(
                    &executor_used,
                    task_type,
                    elapsed_ms,
                ));
                Ok(OrchestrationOutcome {
                    response,
                    executor_used,
                    response_time,
                    decision,
                })
            }
            Err((executor, error)) => {
                self.monitor.record_metrics(PerformanceMetric::failure(
                    &executor,
                    task_type,
                    elapsed_ms,
                    error.category(),
                ));
                log_error(
                    "router",
                    "orchestrate",
                    &error.to_string(),
                    Some(&format!("task_type={task_type} selected={}", decision.selected)),
                );
                Err(error)
            }
        }
    }

    /// One bounded attempt. Construction of a not-yet-resolved executor counts
    /// against the same deadline; on expiry the call future is dropped.
    async fn dispatch(&self, name: &str, request: &ExecutorRequest) -> Result<String> {
        let descriptor = self.registry.describe(name)?;
        let timeout = self.timeout_for(&descriptor);

        let call = async {
            let executor = self.registry.resolve(name).await?;
            executor
                .execute(request)
                .await
                .map_err(|source| RelayError::ExecutorFailure {
                    executor: name.to_string(),
                    source,
                })
        };

        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::Timeout {
                executor: name.to_string(),
                timeout,
            }),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

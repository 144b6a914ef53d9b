//! Execute graph use case - the layer-2 coordinator.
//!
//! Runs a validated execution graph group by group. Within a group all
//! runnable nodes are dispatched concurrently under a bounded in-flight
//! count; the coordinator waits for the whole group (barrier) before the
//! next group starts. A node failure never aborts its siblings; its direct
//! and transitive dependents are recorded as skipped instead of executed
//! against missing data.

use crate::ports::progress::PipelineProgress;
use crate::use_cases::strategies::{StrategyContext, StrategyRegistry};
use courier_domain::{ExecutionGraph, ExecutionResults, NodeResult, StrategyMethod};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Fatal coordinator errors. Both indicate a malformed graph or broken
/// configuration, not a runtime condition to route around.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("node {node} depends on {dependency}, which has no recorded result")]
    DependencyViolation { node: String, dependency: String },

    #[error("no strategy registered for method {0}")]
    StrategyNotFound(StrategyMethod),
}

/// Use case for executing an execution graph against the strategy registry.
pub struct ExecuteGraphUseCase {
    registry: StrategyRegistry,
    max_in_flight: usize,
}

impl ExecuteGraphUseCase {
    pub fn new(registry: StrategyRegistry, max_in_flight: usize) -> Self {
        Self {
            registry,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Execute all nodes in ascending `parallel_group` order.
    ///
    /// The returned map has one entry per node: successful, failed, or
    /// skipped-by-dependency. The graph must have passed validation; a
    /// dependency without a recorded result here is a bug upstream and
    /// aborts the request.
    pub async fn execute(
        &self,
        graph: &ExecutionGraph,
        user_id: &str,
        progress: &dyn PipelineProgress,
    ) -> Result<ExecutionResults, CoordinatorError> {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut results = ExecutionResults::new();

        for (group, nodes) in graph.parallel_groups() {
            debug!(group, nodes = nodes.len(), "starting parallel group");
            progress.on_group_start(group, nodes.len());

            let mut join_set: JoinSet<NodeResult> = JoinSet::new();
            for node in nodes {
                // Barrier invariant: every dependency already has an entry.
                let mut failed_dependency: Option<String> = None;
                for dependency in &node.depends_on {
                    match results.get(dependency) {
                        None => {
                            return Err(CoordinatorError::DependencyViolation {
                                node: node.id.clone(),
                                dependency: dependency.clone(),
                            });
                        }
                        Some(result) if !result.success => {
                            failed_dependency.get_or_insert_with(|| dependency.clone());
                        }
                        Some(_) => {}
                    }
                }

                if let Some(dependency) = failed_dependency {
                    warn!(node = %node.id, %dependency, "skipping node, dependency failed");
                    let skipped = NodeResult::skipped(&node.id, &dependency);
                    progress.on_node_complete(&skipped.node_id, false);
                    results.insert(skipped);
                    continue;
                }

                let strategy = self
                    .registry
                    .get(node.strategy.method)
                    .ok_or(CoordinatorError::StrategyNotFound(node.strategy.method))?;

                let dependencies: HashMap<String, NodeResult> = node
                    .depends_on
                    .iter()
                    .filter_map(|id| results.get(id).cloned())
                    .map(|r| (r.node_id.clone(), r))
                    .collect();
                let ctx = StrategyContext {
                    user_id: user_id.to_string(),
                    dependencies,
                };
                let node = node.clone();
                let semaphore = Arc::clone(&semaphore);

                join_set.spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return NodeResult::failure(&node.id, "executor shut down", 0);
                        }
                    };
                    match strategy.execute(&node, &ctx).await {
                        Ok(result) => result,
                        Err(e) => {
                            warn!(node = %node.id, "strategy failed: {e}");
                            NodeResult::failure(&node.id, e.to_string(), 0)
                        }
                    }
                });
            }

            // Barrier: the whole group finishes before the next one starts.
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(result) => {
                        progress.on_node_complete(&result.node_id, result.success);
                        debug!(
                            node = %result.node_id,
                            success = result.success,
                            tokens = result.tokens_used,
                            "node finished"
                        );
                        results.insert(result);
                    }
                    Err(e) => {
                        warn!("node task join error: {e}");
                    }
                }
            }

            results.groups_executed += 1;
        }

        info!(
            nodes = results.len(),
            groups = results.groups_executed,
            tokens = results.total_tokens(),
            "graph execution finished"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineParams;
    use crate::ports::progress::NoProgress;
    use crate::test_support::{StubCalendarReader, StubGateway, StubMailReader};
    use crate::use_cases::strategies::{Strategy, StrategyError};
    use async_trait::async_trait;
    use courier_domain::{
        Complexity, Domain, ExpectedCost, InformationNode, QueryClassification, QueryType,
        ResourceEstimate, StrategySpec, SynthesisInstructions,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Strategy double that records execution order and can be told to fail
    /// for specific node ids.
    struct RecordingStrategy {
        method: StrategyMethod,
        executed: Arc<Mutex<Vec<String>>>,
        failing: Vec<String>,
        in_flight: Arc<AtomicUsize>,
        max_observed: Arc<AtomicUsize>,
    }

    impl RecordingStrategy {
        fn new(method: StrategyMethod, executed: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                method,
                executed,
                failing: vec![],
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_observed: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing_for(mut self, ids: &[&str]) -> Self {
            self.failing = ids.iter().map(|s| s.to_string()).collect();
            self
        }
    }

    #[async_trait]
    impl Strategy for RecordingStrategy {
        fn method(&self) -> StrategyMethod {
            self.method
        }

        async fn execute(
            &self,
            node: &InformationNode,
            _ctx: &StrategyContext,
        ) -> Result<NodeResult, StrategyError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_observed.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.executed.lock().unwrap().push(node.id.clone());
            if self.failing.contains(&node.id) {
                Ok(NodeResult::failure(&node.id, "induced failure", 0))
            } else {
                Ok(NodeResult::success(&node.id, json!({"items": []}), 10))
            }
        }
    }

    fn node(id: &str, group: u32, deps: &[&str]) -> InformationNode {
        InformationNode {
            id: id.to_string(),
            description: format!("node {id}"),
            node_type: StrategyMethod::KeywordSearch,
            strategy: StrategySpec {
                method: StrategyMethod::KeywordSearch,
                params: json!({"keywords": ["x"]}),
            },
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            parallel_group: group,
            expected_cost: ExpectedCost::default(),
        }
    }

    fn graph(nodes: Vec<InformationNode>) -> ExecutionGraph {
        ExecutionGraph {
            query_classification: QueryClassification {
                query_type: QueryType::Lookup,
                complexity: Complexity::Simple,
                domains: vec![Domain::Email],
                reasoning: String::new(),
            },
            information_needs: nodes,
            synthesis_instructions: SynthesisInstructions::default(),
            resource_estimate: ResourceEstimate::default(),
        }
    }

    fn recording_use_case(
        executed: Arc<Mutex<Vec<String>>>,
        max_in_flight: usize,
    ) -> ExecuteGraphUseCase {
        let registry = StrategyRegistry::new().register(Arc::new(RecordingStrategy::new(
            StrategyMethod::KeywordSearch,
            executed,
        )));
        ExecuteGraphUseCase::new(registry, max_in_flight)
    }

    #[tokio::test]
    async fn test_groups_execute_in_ascending_order() {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let use_case = recording_use_case(Arc::clone(&executed), 8);
        let g = graph(vec![
            node("late", 3, &[]),
            node("a", 1, &[]),
            node("b", 1, &[]),
            node("mid", 2, &["a"]),
        ]);

        let results = use_case.execute(&g, "u1", &NoProgress).await.unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results.groups_executed, 3);

        let order = executed.lock().unwrap().clone();
        let position = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(position("mid") > position("a"));
        assert!(position("mid") > position("b"));
        assert!(position("late") > position("mid"));
    }

    #[tokio::test]
    async fn test_in_flight_bound_is_respected() {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let strategy = RecordingStrategy::new(StrategyMethod::KeywordSearch, Arc::clone(&executed));
        let max_observed = Arc::clone(&strategy.max_observed);
        let registry = StrategyRegistry::new().register(Arc::new(strategy));
        let use_case = ExecuteGraphUseCase::new(registry, 2);

        let nodes: Vec<InformationNode> = (0..6).map(|i| node(&format!("n{i}"), 1, &[])).collect();
        use_case.execute(&graph(nodes), "u1", &NoProgress).await.unwrap();

        assert!(
            max_observed.load(Ordering::SeqCst) <= 2,
            "observed {} concurrent nodes",
            max_observed.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn test_failure_isolated_from_siblings_and_dependents_skipped() {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let registry = StrategyRegistry::new().register(Arc::new(
            RecordingStrategy::new(StrategyMethod::KeywordSearch, Arc::clone(&executed))
                .failing_for(&["bad"]),
        ));
        let use_case = ExecuteGraphUseCase::new(registry, 4);

        let g = graph(vec![
            node("bad", 1, &[]),
            node("good", 1, &[]),
            node("child", 2, &["bad"]),
            node("grandchild", 3, &["child"]),
            node("unrelated", 2, &["good"]),
        ]);
        let results = use_case.execute(&g, "u1", &NoProgress).await.unwrap();

        assert!(results.get("good").unwrap().success);
        assert!(results.get("unrelated").unwrap().success);
        assert!(!results.get("bad").unwrap().success);

        let child = results.get("child").unwrap();
        assert!(child.is_skipped());
        assert_eq!(child.error.as_deref(), Some("skipped: dependency bad failed"));
        assert!(results.get("grandchild").unwrap().is_skipped());

        // Skipped nodes never executed.
        let order = executed.lock().unwrap().clone();
        assert!(!order.contains(&"child".to_string()));
        assert!(!order.contains(&"grandchild".to_string()));
    }

    #[tokio::test]
    async fn test_missing_strategy_is_fatal() {
        let use_case = ExecuteGraphUseCase::new(StrategyRegistry::new(), 4);
        let err = use_case
            .execute(&graph(vec![node("a", 1, &[])]), "u1", &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::StrategyNotFound(_)));
    }

    #[tokio::test]
    async fn test_tokens_accumulate_across_nodes() {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let use_case = recording_use_case(executed, 4);
        let g = graph(vec![node("a", 1, &[]), node("b", 1, &[])]);
        let results = use_case.execute(&g, "u1", &NoProgress).await.unwrap();
        assert_eq!(results.total_tokens(), 20);
    }

    #[tokio::test]
    async fn test_full_registry_runs_real_strategies() {
        let registry = StrategyRegistry::full(
            Arc::new(StubMailReader::with_items(vec![(
                "m1",
                "t1",
                "urgent: review",
                "please review today",
            )])),
            Arc::new(StubCalendarReader::default()),
            Arc::new(StubGateway::default()),
            &PipelineParams::default(),
        );
        let use_case = ExecuteGraphUseCase::new(registry, 4);
        let mut search = node("search", 1, &[]);
        search.strategy.params = json!({"keywords": ["urgent"]});
        let results = use_case
            .execute(&graph(vec![search]), "u1", &NoProgress)
            .await
            .unwrap();
        assert_eq!(results.get("search").unwrap().data["matched"], 1);
    }
}

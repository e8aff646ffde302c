// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::dag::{CacheSet, NodeId, TaskGraph};
use crate::engine::workers::Workers;
use crate::engine::{
    ExecutionPlan, ExecutionReport, FailureReason, RunOutcome, RuntimeOptions, Sample,
};
use crate::exec::TaskExecutor;
use crate::store::{ResultStore, StoredHandle};

/// Executes an [`ExecutionPlan`] node by node on the calling task.
///
/// Computation is strictly sequential in plan order. Persisting and
/// dropping cached results is overlapped with it by the background
/// [`Workers`], which are always drained before `run` returns.
pub struct PlanRunner<'g, E, S> {
    graph: &'g TaskGraph,
    executor: E,
    store: Arc<S>,
    options: RuntimeOptions,
}

impl<E, S> fmt::Debug for PlanRunner<'_, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanRunner")
            .field("nodes", &self.graph.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Per-run bookkeeping owned by the compute thread.
struct RunState<R> {
    resident: Vec<Option<R>>,
    resident_bytes: Vec<u64>,
    handles: Vec<Option<StoredHandle>>,
    remaining: Vec<usize>,
    current: u64,
    peak: u64,
    history: Vec<u64>,
    executed: Vec<NodeId>,
    samples: Vec<Sample>,
}

impl<'g, E, S> PlanRunner<'g, E, S>
where
    E: TaskExecutor,
    S: ResultStore<E::Output>,
{
    pub fn new(graph: &'g TaskGraph, executor: E, store: Arc<S>, options: RuntimeOptions) -> Self {
        Self {
            graph,
            executor,
            store,
            options,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run the whole plan.
    ///
    /// Never fails as a `Result`: a node that cannot run ends the schedule
    /// early and is reported in [`ExecutionReport::outcome`]. Background
    /// writes already queued at that point still complete.
    pub async fn run(&mut self, plan: &ExecutionPlan) -> ExecutionReport {
        let started = Instant::now();
        let n = self.graph.len();
        let workers = Workers::spawn(Arc::clone(&self.store), self.options);

        let mut state = RunState {
            resident: (0..n).map(|_| None).collect(),
            resident_bytes: vec![0; n],
            handles: vec![None; n],
            remaining: self.graph.nodes().map(|id| self.graph.out_degree(id)).collect(),
            current: 0,
            peak: 0,
            history: Vec::with_capacity(n),
            executed: Vec::with_capacity(n),
            samples: Vec::new(),
        };

        info!(
            nodes = n,
            cached = plan.cache_set().len(),
            write_behind = self.options.write_behind,
            async_release = self.options.async_release,
            "plan execution started"
        );

        let mut outcome = RunOutcome::Completed;
        for &node in plan.order() {
            if let Err(reason) = self.step(node, plan.cache_set(), &mut state, &workers) {
                warn!(node = %self.graph.name(node), ?reason, "node failed, aborting schedule");
                outcome = RunOutcome::Failed { node, reason };
                break;
            }
        }

        // Results still resident after a failure are dropped with `state`.
        let summary = workers.shutdown().await;
        let mut samples = state.samples;
        samples.extend(summary.samples);

        let report = ExecutionReport {
            outcome,
            executed: state.executed,
            peak_memory: state.peak,
            memory_history: state.history,
            elapsed: started.elapsed(),
            samples,
            persist_failures: summary.persist_failures,
            persisted_in_background: summary.persisted,
            released_in_background: summary.released,
        };

        info!(
            completed = report.is_completed(),
            executed = report.executed.len(),
            peak = report.peak_memory,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "plan execution finished"
        );
        report
    }

    fn step(
        &mut self,
        node: NodeId,
        cache_set: &CacheSet,
        state: &mut RunState<E::Output>,
        workers: &Workers<E::Output>,
    ) -> Result<(), FailureReason> {
        let graph = self.graph;
        let deps = graph.dependencies(node);

        // Load persisted inputs first, then borrow resident ones.
        let mut loaded: Vec<Option<E::Output>> = Vec::with_capacity(deps.len());
        for &dep in deps {
            if state.resident[dep.0].is_some() {
                loaded.push(None);
                continue;
            }
            let handle = state.handles[dep.0]
                .as_ref()
                .ok_or(FailureReason::MissingDependency { dependency: dep })?;
            let load_started = Instant::now();
            let value = self
                .store
                .load(handle)
                .map_err(|err| FailureReason::Load(format!("{err:#}")))?;
            state.samples.push(Sample::Loaded {
                node: dep,
                elapsed: load_started.elapsed(),
            });
            loaded.push(Some(value));
        }

        let inputs: Vec<&E::Output> = deps
            .iter()
            .zip(&loaded)
            .filter_map(|(dep, value)| value.as_ref().or(state.resident[dep.0].as_ref()))
            .collect();

        let output = self
            .executor
            .execute(node, graph.name(node), &inputs)
            .map_err(|err| FailureReason::Execution(format!("{err:#}")))?;
        drop(inputs);
        drop(loaded);

        let bytes = self.executor.size_of(&output);
        state.samples.push(Sample::ResultSize { node, bytes });
        state.executed.push(node);

        if cache_set.contains(node) {
            state.current += bytes;
            state.peak = state.peak.max(state.current);
            state.resident_bytes[node.0] = bytes;
            state.resident[node.0] = Some(output);
        } else {
            let persist_started = Instant::now();
            let handle = self
                .store
                .persist(node, &output)
                .map_err(|err| FailureReason::Persistence(format!("{err:#}")))?;
            state.samples.push(Sample::Persisted {
                node,
                elapsed: persist_started.elapsed(),
            });
            state.handles[node.0] = Some(handle);
        }
        state.history.push(state.current);

        for &dep in deps {
            state.remaining[dep.0] -= 1;
            if state.remaining[dep.0] > 0 {
                continue;
            }
            if let Some(result) = state.resident[dep.0].take() {
                state.current -= state.resident_bytes[dep.0];
                debug!(node = %graph.name(dep), resident = state.current, "releasing cached result");
                workers.release(dep, result);
            }
        }

        Ok(())
    }
}

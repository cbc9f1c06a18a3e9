//! The per-sample scheduling governor.
//!
//! One governor is created per sample and owns all of that sample's
//! scheduling state. It ticks at a fixed granularity; on each interval
//! boundary it queries the rate source for a budget, covers any pending
//! backfill window, and fans live work out to the generator workers
//! through the bounded dispatch queue. Queue discipline is offer-or-drop:
//! the governor never blocks on a full queue.

use crate::error::{ConstructionError, OfferError};
use crate::metrics::RunMetrics;
use crate::rate::RateSource;
use crate::registry::PluginRegistry;
use crate::stop::StopSignal;
use crate::work::{DispatchQueue, ResultQueue, WorkItem};
use chrono::{DateTime, Duration as TimeDelta, Utc};
use loadgen_core::{parse_offset, GenerationMode, Sample, SampleSpec, SizingPolicy};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// End-of-generation condition. A timestamp takes precedence over an
/// execution count when both are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCondition {
    /// Stop after this many rounds.
    Executions(u64),
    /// Stop once a round's window end reaches this instant.
    Timestamp(DateTime<Utc>),
}

/// Mutable scheduling state, owned exclusively by the governor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    /// Seconds until the next round.
    countdown: i64,
    /// Rounds executed so far.
    executions: u64,
    /// Terminal flag; once set the loop ends at the next tick boundary.
    stopping: bool,
    /// Whether the historical window has been covered.
    backfill_done: bool,
    /// Byte budget carried from a round too small to fit one record.
    leftover: i64,
}

/// Scheduling governor for one sample.
pub struct TimerGovernor {
    sample: Sample,
    rater: Box<dyn RateSource + Send>,
    policy: SizingPolicy,
    end: Option<EndCondition>,
    backfill: Option<TimeDelta>,
    dispatch: DispatchQueue,
    results: ResultQueue,
    stop: StopSignal,
    metrics: RunMetrics,
    granularity: Duration,
    record_size: Option<usize>,
    state: TimerState,
}

impl std::fmt::Debug for TimerGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerGovernor")
            .field("end", &self.end)
            .field("backfill", &self.backfill)
            .field("granularity", &self.granularity)
            .field("record_size", &self.record_size)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TimerGovernor {
    /// Build a governor, resolving plugins and parsing the end condition
    /// and backfill spec. Any failure here means the governor never runs.
    pub fn new(
        spec: SampleSpec,
        registry: &PluginRegistry,
        dispatch: DispatchQueue,
        results: ResultQueue,
        stop: StopSignal,
        metrics: RunMetrics,
        granularity: Duration,
    ) -> Result<Self, ConstructionError> {
        let rater = registry.rater(&spec.rater)?;
        let policy = registry.policy(&spec.policy)?;
        let end = resolve_end_condition(&spec)?;
        let backfill = match &spec.backfill {
            Some(value) => Some(parse_offset(value).map_err(|source| {
                ConstructionError::Backfill {
                    sample: spec.name.clone(),
                    value: value.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let sample = Sample::from_spec(spec)?;
        let record_size = sample.representative_record_size();
        let state = TimerState {
            countdown: 0,
            executions: 0,
            stopping: false,
            backfill_done: backfill.is_none(),
            leftover: 0,
        };

        Ok(Self {
            sample,
            rater,
            policy,
            end,
            backfill,
            dispatch,
            results,
            stop,
            metrics,
            granularity: granularity.max(Duration::from_secs(1)),
            record_size,
            state,
        })
    }

    /// Run until an end condition or a stop flag ends the loop.
    pub async fn start(mut self) {
        if self.sample.delay() > 0 {
            info!(
                sample = %self.sample.name(),
                delay = self.sample.delay(),
                "sample delayed, sleeping"
            );
            sleep(Duration::from_secs(self.sample.delay())).await;
        }

        info!(
            sample = %self.sample.name(),
            workers = self.sample.workers(),
            interval = self.sample.interval(),
            "governor started"
        );

        loop {
            // Stop flags are checked once per tick; an in-flight round
            // always completes before a stop is honored.
            if self.stop.is_stopped() || self.state.stopping {
                info!(sample = %self.sample.name(), "stop requested, ending generation");
                break;
            }

            if self.state.countdown > 0 {
                sleep(self.granularity).await;
                self.state.countdown -= self.granularity.as_secs() as i64;
                continue;
            }

            if self.execute_round(Utc::now()) {
                break;
            }
        }

        info!(
            sample = %self.sample.name(),
            executions = self.state.executions,
            "governor stopped"
        );
    }

    /// Execute one round at `now`. Returns true when the round tripped an
    /// end condition and the loop should terminate.
    fn execute_round(&mut self, now: DateTime<Utc>) -> bool {
        if self.sample.pool_is_empty() {
            match self.sample.reload() {
                Ok(()) => self.record_size = self.sample.representative_record_size(),
                Err(err) => {
                    warn!(sample = %self.sample.name(), error = %err, "sample reload failed");
                }
            }
        }

        let budget = self.rater.rate();

        let round_latest = if budget < 1 {
            info!(
                sample = %self.sample.name(),
                budget,
                "no data to generate this round"
            );
            self.sample.latest_time(now)
        } else if !self.state.backfill_done {
            self.run_backfill(now, budget)
        } else {
            self.run_live(now, budget)
        };

        self.state.countdown = self.sample.interval() as i64;
        self.state.executions += 1;
        self.metrics.add_round();

        match self.end {
            Some(EndCondition::Timestamp(end)) if round_latest >= end => {
                info!(
                    sample = %self.sample.name(),
                    end = %end,
                    "end time reached, ending generation"
                );
                self.state.stopping = true;
                true
            }
            Some(EndCondition::Executions(limit)) if self.state.executions >= limit => {
                info!(
                    sample = %self.sample.name(),
                    limit,
                    "end executions reached, ending generation"
                );
                self.state.stopping = true;
                true
            }
            _ => false,
        }
    }

    /// Cover the historical window in sub-intervals of the sample
    /// interval, one work item each. Runs at most once per governor.
    fn run_backfill(&mut self, now: DateTime<Utc>, budget: i64) -> DateTime<Utc> {
        let Some(offset) = self.backfill else {
            self.state.backfill_done = true;
            return now;
        };

        let step = TimeDelta::seconds(self.sample.interval() as i64);
        let mut earliest = now + offset;
        if earliest >= now {
            info!(sample = %self.sample.name(), "backfill window is empty, nothing to cover");
        }

        let mut produced = 0u64;
        while earliest < now {
            let latest = earliest + step;
            let item = self.build_work_item(budget, earliest, latest);
            match self.dispatch.offer(item) {
                Ok(()) => {
                    produced += 1;
                    self.metrics.add_backfill_item();
                }
                Err(OfferError::Full) => {
                    warn!(
                        sample = %self.sample.name(),
                        "dispatch queue full, skipping backfill sub-interval"
                    );
                }
                Err(err) => {
                    warn!(
                        sample = %self.sample.name(),
                        error = %err,
                        "failed to enqueue backfill work item"
                    );
                }
            }
            earliest = latest;
        }

        self.state.backfill_done = true;
        info!(sample = %self.sample.name(), produced, "backfill complete");
        now
    }

    /// Fan one live round out to the configured worker count.
    fn run_live(&mut self, now: DateTime<Utc>, budget: i64) -> DateTime<Utc> {
        let earliest = self.sample.earliest_time(now);
        let latest = self.sample.latest_time(now);

        let mut budget = budget;
        if self.sample.mode() == GenerationMode::Volume {
            budget += self.state.leftover;
            self.ensure_record_size();
            if let Some(record) = self.record_size {
                if budget > 0 && budget < record as i64 {
                    info!(
                        sample = %self.sample.name(),
                        budget,
                        record,
                        "budget below one record size, deferring to next round"
                    );
                    self.state.leftover = budget;
                    self.metrics.add_deferral();
                    return latest;
                }
            }
            self.state.leftover = 0;
        }

        debug!(
            sample = %self.sample.name(),
            budget,
            %earliest,
            %latest,
            "dispatching live round"
        );

        for worker in 0..self.sample.workers() {
            let item = self.build_work_item(budget, earliest, latest);
            match self.dispatch.offer(item) {
                Ok(()) => self.metrics.add_dispatched(),
                Err(OfferError::Full) => {
                    warn!(
                        sample = %self.sample.name(),
                        worker,
                        "dispatch queue full, skipping current generation"
                    );
                }
                Err(err) => {
                    error!(
                        sample = %self.sample.name(),
                        worker,
                        error = %err,
                        "failed to enqueue work item"
                    );
                    if self.state.stopping || self.stop.is_stopped() {
                        break;
                    }
                }
            }
        }

        latest
    }

    /// Estimate the representative record size, reloading the sample if
    /// needed. A load failure only skips the estimate for this round.
    fn ensure_record_size(&mut self) {
        if self.record_size.is_some() {
            return;
        }
        match self.sample.reload() {
            Ok(()) => self.record_size = self.sample.representative_record_size(),
            Err(err) => {
                warn!(
                    sample = %self.sample.name(),
                    error = %err,
                    "sample load failed, skipping record size estimate this round"
                );
            }
        }
    }

    /// Snapshot the sample's mutable state into a fresh work item. The
    /// token sequence is a deep copy; the pool is shared by reference.
    fn build_work_item(
        &self,
        budget: i64,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    ) -> WorkItem {
        WorkItem {
            sample: self.sample.name().to_string(),
            budget,
            earliest,
            latest,
            policy: self.policy,
            mode: self.sample.mode(),
            tokens: self.sample.tokens().to_vec(),
            pool: self.sample.pool(),
            results: self.results.clone(),
        }
    }

    pub fn executions(&self) -> u64 {
        self.state.executions
    }

    pub fn is_stopping(&self) -> bool {
        self.state.stopping
    }

    pub fn backfill_done(&self) -> bool {
        self.state.backfill_done
    }
}

fn resolve_end_condition(spec: &SampleSpec) -> Result<Option<EndCondition>, ConstructionError> {
    if let Some(value) = &spec.end_at {
        let ts = DateTime::parse_from_rfc3339(value).map_err(|err| {
            ConstructionError::EndCondition {
                sample: spec.name.clone(),
                value: value.clone(),
                reason: err.to_string(),
            }
        })?;
        return Ok(Some(EndCondition::Timestamp(ts.with_timezone(&Utc))));
    }
    Ok(spec.end_after_executions.map(EndCondition::Executions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::bounded;
    use loadgen_core::{EventBatch, LoadSchema, Replacement};
    use loadgen_generator::render_batch;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::sync::mpsc;

    struct Harness {
        governor: TimerGovernor,
        dispatch_rx: mpsc::Receiver<WorkItem>,
        #[allow(dead_code)]
        results_rx: mpsc::Receiver<EventBatch>,
        metrics: RunMetrics,
    }

    fn harness(yaml: &str) -> Harness {
        harness_with_capacity(yaml, 64)
    }

    fn harness_with_capacity(yaml: &str, capacity: usize) -> Harness {
        let spec = LoadSchema::from_yaml(yaml).unwrap().samples.remove(0);
        let metrics = RunMetrics::new();
        let (dispatch, dispatch_rx) = bounded("dispatch", capacity, metrics.dropped_handle());
        let (results, results_rx) = bounded("results", capacity, metrics.dropped_handle());
        let governor = TimerGovernor::new(
            spec,
            &PluginRegistry::with_defaults(),
            dispatch,
            results,
            StopSignal::standalone(),
            metrics.clone(),
            Duration::from_secs(1),
        )
        .unwrap();
        Harness {
            governor,
            dispatch_rx,
            results_rx,
            metrics,
        }
    }

    fn drain(rx: &mut mpsc::Receiver<WorkItem>) -> Vec<WorkItem> {
        let mut items = Vec::new();
        while let Ok(item) = rx.try_recv() {
            items.push(item);
        }
        items
    }

    #[test]
    fn test_backfill_covers_window_in_sub_intervals() {
        let mut h = harness(
            r#"
samples:
  - name: s
    interval: 10
    backfill: "-25s"
    rater: { count: 100 }
    lines: ["record"]
"#,
        );

        let now = Utc::now();
        assert!(!h.governor.backfill_done());
        let terminal = h.governor.execute_round(now);
        assert!(!terminal);
        assert!(h.governor.backfill_done());
        assert_eq!(h.governor.executions(), 1);

        let items = drain(&mut h.dispatch_rx);
        // ceil(25 / 10) = 3 contiguous sub-intervals.
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].earliest, now - TimeDelta::seconds(25));
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.latest - item.earliest, TimeDelta::seconds(10));
            assert_eq!(item.budget, 100);
            if i > 0 {
                assert_eq!(item.earliest, items[i - 1].latest);
            }
        }
        assert!(items[2].latest >= now);
        assert_eq!(h.metrics.snapshot().backfill_items, 3);
    }

    #[test]
    fn test_backfill_runs_exactly_once() {
        let mut h = harness(
            r#"
samples:
  - name: s
    interval: 10
    backfill: "-20s"
    rater: { count: 100 }
    lines: ["record"]
"#,
        );

        let now = Utc::now();
        h.governor.execute_round(now);
        assert_eq!(drain(&mut h.dispatch_rx).len(), 2);

        // Second round goes straight to the live branch.
        h.governor.execute_round(now);
        let items = drain(&mut h.dispatch_rx);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].earliest, now - TimeDelta::seconds(10));
        assert_eq!(items[0].latest, now);
        assert_eq!(h.metrics.snapshot().backfill_items, 2);
    }

    #[test]
    fn test_backfill_with_empty_window_completes_without_items() {
        let mut h = harness(
            r#"
samples:
  - name: s
    interval: 10
    backfill: "+5s"
    rater: { count: 100 }
    lines: ["record"]
"#,
        );

        h.governor.execute_round(Utc::now());
        assert!(h.governor.backfill_done());
        assert!(drain(&mut h.dispatch_rx).is_empty());
    }

    #[test]
    fn test_live_round_fans_out_independent_token_copies() {
        let mut h = harness(
            r#"
samples:
  - name: s
    interval: 10
    workers: 4
    rater: { count: 5 }
    lines: ["n=@@seq"]
    tokens:
      - pattern: "@@seq"
        type: counter
"#,
        );

        let now = Utc::now();
        h.governor.execute_round(now);

        let mut items = drain(&mut h.dispatch_rx);
        assert_eq!(items.len(), 4);
        assert_eq!(h.metrics.snapshot().items_dispatched, 4);

        // Mutating one copy's cursor must not leak into siblings or the
        // source sample.
        if let Replacement::Counter { next } = &mut items[0].tokens[0].replacement {
            *next = 99;
        }
        assert_eq!(
            items[1].tokens[0].replacement,
            Replacement::Counter { next: 0 }
        );
        assert_eq!(
            h.governor.sample.tokens()[0].replacement,
            Replacement::Counter { next: 0 }
        );

        // Rendering through two sibling copies yields the same sequence.
        let mut rng = StdRng::seed_from_u64(42);
        for item in &mut items[1..3] {
            let mut batch = EventBatch::new("s", item.earliest, item.latest);
            batch.push("n=@@seq".to_string());
            render_batch(&mut batch, &mut item.tokens, &mut rng);
            assert_eq!(batch.events, vec!["n=0"]);
        }
    }

    #[test]
    fn test_volume_round_defers_sub_record_budget() {
        let mut h = harness(
            r#"
samples:
  - name: s
    interval: 10
    mode: volume
    rater: { count: 1 }
    lines: ["xyz"]
"#,
        );

        // Record is 3 bytes; each round adds 1 to the carry.
        let now = Utc::now();
        assert!(!h.governor.execute_round(now));
        assert!(drain(&mut h.dispatch_rx).is_empty());
        assert_eq!(h.governor.state.leftover, 1);

        assert!(!h.governor.execute_round(now));
        assert!(drain(&mut h.dispatch_rx).is_empty());
        assert_eq!(h.governor.state.leftover, 2);

        // Third round: 1 + 2 carried = 3, enough for one record.
        assert!(!h.governor.execute_round(now));
        let items = drain(&mut h.dispatch_rx);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].budget, 3);
        assert_eq!(h.governor.state.leftover, 0);
        assert_eq!(h.metrics.snapshot().deferrals, 2);
    }

    #[test]
    fn test_sub_unit_budget_still_advances_round() {
        let mut h = harness(
            r#"
samples:
  - name: s
    interval: 10
    backfill: "-20s"
    rater: { count: 0 }
    lines: ["record"]
"#,
        );

        assert!(!h.governor.execute_round(Utc::now()));
        assert_eq!(h.governor.executions(), 1);
        assert!(drain(&mut h.dispatch_rx).is_empty());
        // A no-work round does not burn the backfill window.
        assert!(!h.governor.backfill_done());
    }

    #[test]
    fn test_end_after_executions() {
        let mut h = harness(
            r#"
samples:
  - name: s
    interval: 10
    end_after_executions: 3
    rater: { count: 5 }
    lines: ["record"]
"#,
        );

        let now = Utc::now();
        assert!(!h.governor.execute_round(now));
        assert!(!h.governor.execute_round(now));
        assert!(h.governor.execute_round(now));
        assert!(h.governor.is_stopping());
        assert_eq!(h.governor.executions(), 3);
    }

    #[test]
    fn test_end_timestamp_takes_precedence_over_count() {
        let mut h = harness(
            r#"
samples:
  - name: s
    interval: 10
    end_after_executions: 5
    end_at: "2020-01-01T00:00:00Z"
    rater: { count: 5 }
    lines: ["record"]
"#,
        );

        // The window end is far past the configured end timestamp, so the
        // first round is terminal regardless of the count limit.
        assert!(h.governor.execute_round(Utc::now()));
        assert!(h.governor.is_stopping());
        assert_eq!(h.governor.executions(), 1);
    }

    #[test]
    fn test_full_dispatch_queue_sheds_without_stopping() {
        let mut h = harness_with_capacity(
            r#"
samples:
  - name: s
    interval: 10
    workers: 4
    rater: { count: 5 }
    lines: ["record"]
"#,
            2,
        );

        assert!(!h.governor.execute_round(Utc::now()));
        assert_eq!(drain(&mut h.dispatch_rx).len(), 2);

        let snap = h.metrics.snapshot();
        assert_eq!(snap.items_dispatched, 2);
        assert_eq!(snap.items_dropped, 2);
        assert!(!h.governor.is_stopping());
    }

    #[test]
    fn test_construction_rejects_bad_end_timestamp() {
        let spec = LoadSchema::from_yaml(
            r#"
samples:
  - name: s
    interval: 10
    end_at: "tomorrow-ish"
    lines: ["record"]
"#,
        )
        .unwrap()
        .samples
        .remove(0);

        let metrics = RunMetrics::new();
        let (dispatch, _dispatch_rx) = bounded("dispatch", 8, metrics.dropped_handle());
        let (results, _results_rx) = bounded("results", 8, metrics.dropped_handle());
        let err = TimerGovernor::new(
            spec,
            &PluginRegistry::with_defaults(),
            dispatch,
            results,
            StopSignal::standalone(),
            metrics,
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ConstructionError::EndCondition { .. }));
    }

    #[test]
    fn test_construction_rejects_bad_backfill_spec() {
        let spec = LoadSchema::from_yaml(
            r#"
samples:
  - name: s
    interval: 10
    backfill: "-2fortnights"
    lines: ["record"]
"#,
        )
        .unwrap()
        .samples
        .remove(0);

        let metrics = RunMetrics::new();
        let (dispatch, _dispatch_rx) = bounded("dispatch", 8, metrics.dropped_handle());
        let (results, _results_rx) = bounded("results", 8, metrics.dropped_handle());
        let err = TimerGovernor::new(
            spec,
            &PluginRegistry::with_defaults(),
            dispatch,
            results,
            StopSignal::standalone(),
            metrics,
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ConstructionError::Backfill { .. }));
    }

    #[test]
    fn test_construction_rejects_unknown_plugins() {
        let spec = LoadSchema::from_yaml(
            r#"
samples:
  - name: s
    interval: 10
    policy: spiral
    lines: ["record"]
"#,
        )
        .unwrap()
        .samples
        .remove(0);

        let metrics = RunMetrics::new();
        let (dispatch, _dispatch_rx) = bounded("dispatch", 8, metrics.dropped_handle());
        let (results, _results_rx) = bounded("results", 8, metrics.dropped_handle());
        let err = TimerGovernor::new(
            spec,
            &PluginRegistry::with_defaults(),
            dispatch,
            results,
            StopSignal::standalone(),
            metrics,
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ConstructionError::UnknownPlugin { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_governor_fires_one_round_per_interval() {
        let h = harness(
            r#"
samples:
  - name: s
    interval: 3
    end_after_executions: 3
    rater: { count: 1 }
    lines: ["record"]
"#,
        );

        let start = tokio::time::Instant::now();
        h.governor.start().await;

        // Rounds at t=0, t=3, t=6; the third round is terminal.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert_eq!(h.metrics.snapshot().rounds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_stop_ends_loop_at_tick_boundary() {
        let h = harness(
            r#"
samples:
  - name: s
    interval: 60
    rater: { count: 1 }
    lines: ["record"]
"#,
        );

        let stop = h.governor.stop.clone();
        let handle = tokio::spawn(h.governor.start());

        tokio::time::sleep(Duration::from_secs(5)).await;
        stop.stop_local();
        handle.await.unwrap();

        assert_eq!(h.metrics.snapshot().rounds, 1);
    }
}

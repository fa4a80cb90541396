use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intent::Intent;

/// Running interaction counters, owned by the orchestrator and updated
/// through a single mutex-guarded write path so concurrent requests cannot
/// skew the totals.
#[derive(Default)]
pub struct StatsAggregator {
    inner: Mutex<StatsInner>,
}

#[derive(Default)]
struct StatsInner {
    total: u64,
    supported: u64,
    by_intent: BTreeMap<Intent, u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub supported: u64,
    pub support_rate: f64,
    pub intent_distribution: BTreeMap<String, u64>,
    pub last_updated: DateTime<Utc>,
}

impl StatsAggregator {
    pub fn record(&self, intent: Intent, supported: bool) {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.total += 1;
        if supported {
            inner.supported += 1;
        }
        *inner.by_intent.entry(intent).or_insert(0) += 1;
    }

    /// Folds a batch of previously recorded interactions into the counters.
    /// Used at startup to carry persisted history across restarts.
    pub fn preload(&self, intent: Intent, supported: bool, count: u64) {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.total += count;
        if supported {
            inner.supported += count;
        }
        *inner.by_intent.entry(intent).or_insert(0) += count;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        let support_rate = if inner.total == 0 {
            0.0
        } else {
            inner.supported as f64 / inner.total as f64
        };
        StatsSnapshot {
            total: inner.total,
            supported: inner.supported,
            support_rate,
            intent_distribution: inner
                .by_intent
                .iter()
                .map(|(intent, count)| (intent.as_str().to_string(), *count))
                .collect(),
            last_updated: Utc::now(),
        }
    }
}

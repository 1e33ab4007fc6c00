// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
// SPDX-FileContributor: Chris Campbell <c.campbell@mwam.com> https://github.com/c-campbell-mwam
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Condvar, Mutex, MutexGuard,
    },
    thread::{self, ThreadId},
};

use im::OrdSet;
use metrics::{describe_counter, describe_gauge, gauge, increment_counter, Unit};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    bindings::Bindings,
    error::SyntaxError,
    evaluation::Evaluation,
    hash::FnvHashMap,
    term::{Symbol, Term},
};

pub type ComputeFn<'a> = dyn FnMut() -> Result<Evaluation, SyntaxError> + 'a;

/// Memoisation table for application results.
///
/// Each application term maps to any number of `(dependencies, result)` entries. An entry matches
/// a lookup when every one of its dependencies is present with an equal value in the caller's
/// bindings, and none of the symbols that were unbound when it was computed have since been bound.
pub trait EvaluationCache: Send + Sync {
    fn get_or_compute(
        &self,
        term: &Term,
        bindings: &Bindings,
        compute: &mut ComputeFn<'_>,
    ) -> Result<Evaluation, SyntaxError>;
    fn clear(&self);
    /// Total number of stored entries across all terms
    fn len(&self) -> usize;
    fn metrics(&self) -> EvaluationCacheMetrics;
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct EvaluationCacheMetrics {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}
impl std::fmt::Display for EvaluationCacheMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} hits, {} misses, {} entries",
            self.hits, self.misses, self.entries
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CacheMetricNames {
    pub cache_hit_count: &'static str,
    pub cache_miss_count: &'static str,
    pub cache_entry_count: &'static str,
}
impl CacheMetricNames {
    fn init(self) -> Self {
        describe_counter!(
            self.cache_hit_count,
            Unit::Count,
            "Total number of evaluation cache hits"
        );
        describe_counter!(
            self.cache_miss_count,
            Unit::Count,
            "Total number of evaluation cache misses"
        );
        describe_gauge!(
            self.cache_entry_count,
            Unit::Count,
            "Number of results stored in the evaluation cache"
        );
        self
    }
}
impl Default for CacheMetricNames {
    fn default() -> Self {
        Self {
            cache_hit_count: "webscript_cache_hit_count",
            cache_miss_count: "webscript_cache_miss_count",
            cache_entry_count: "webscript_cache_entry_count",
        }
    }
}

/// Cache that never stores anything
#[derive(Default)]
pub struct NoopCache {
    misses: AtomicUsize,
}
impl EvaluationCache for NoopCache {
    fn get_or_compute(
        &self,
        _term: &Term,
        _bindings: &Bindings,
        compute: &mut ComputeFn<'_>,
    ) -> Result<Evaluation, SyntaxError> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        compute()
    }
    fn clear(&self) {}
    fn len(&self) -> usize {
        0
    }
    fn metrics(&self) -> EvaluationCacheMetrics {
        EvaluationCacheMetrics {
            hits: 0,
            misses: self.misses.load(Ordering::Relaxed),
            entries: 0,
        }
    }
}

struct CacheEntry {
    dependencies: Bindings,
    unbound_symbols: OrdSet<Symbol>,
    result: Term,
}
impl CacheEntry {
    fn is_satisfied_by(&self, bindings: &Bindings) -> bool {
        self.dependencies.is_satisfied_by(bindings)
            && self
                .unbound_symbols
                .iter()
                .all(|symbol| !bindings.contains(symbol))
    }
}

#[derive(Default)]
struct CacheState {
    entries: FnvHashMap<Term, Vec<CacheEntry>>,
    num_entries: usize,
    /// Thread currently computing each in-flight term
    in_flight: FnvHashMap<Term, ThreadId>,
    /// In-flight owner that each blocked thread is waiting for
    waiting: FnvHashMap<ThreadId, ThreadId>,
}
impl CacheState {
    fn lookup(&self, term: &Term, bindings: &Bindings) -> Option<&CacheEntry> {
        // Prefer the most specific match when several stored subsets are satisfied
        self.entries
            .get(term)?
            .iter()
            .filter(|entry| entry.is_satisfied_by(bindings))
            .max_by_key(|entry| entry.dependencies.len() + entry.unbound_symbols.len())
    }
    fn store(&mut self, term: &Term, entry: CacheEntry) -> bool {
        let entries = self.entries.entry(term.clone()).or_default();
        match entries.iter_mut().find(|existing| {
            existing.dependencies == entry.dependencies
                && existing.unbound_symbols == entry.unbound_symbols
        }) {
            Some(existing) => {
                existing.result = entry.result;
                false
            }
            None => {
                entries.push(entry);
                self.num_entries += 1;
                true
            }
        }
    }
    /// Whether `owner` is (transitively) waiting on `thread_id`
    fn is_waiting_on(&self, owner: ThreadId, thread_id: ThreadId) -> bool {
        let mut current = owner;
        for _ in 0..=self.waiting.len() {
            if current == thread_id {
                return true;
            }
            match self.waiting.get(&current) {
                Some(next) => current = *next,
                None => return false,
            }
        }
        true
    }
}

struct InFlightClaim<'a> {
    cache: &'a DependencyCache,
    term: &'a Term,
    thread_id: ThreadId,
}
impl<'a> Drop for InFlightClaim<'a> {
    fn drop(&mut self) {
        let mut state = self.cache.lock_state();
        if state.in_flight.get(self.term) == Some(&self.thread_id) {
            state.in_flight.remove(self.term);
        }
        drop(state);
        self.cache.released.notify_all();
    }
}

/// Thread-safe cache that computes each `(term, dependencies)` result at most once.
///
/// A thread that misses while another thread is computing the same term waits for that
/// computation to finish before computing its own result. The wait is skipped whenever the
/// in-flight computation is itself (directly or transitively) waiting on the current thread: the
/// term is then computed again locally rather than blocking. This covers a thread re-entering a
/// term it is already computing, as well as overlapping evaluations that nest the same terms in
/// opposite orders.
pub struct DependencyCache {
    state: Mutex<CacheState>,
    released: Condvar,
    hits: AtomicUsize,
    misses: AtomicUsize,
    metric_names: CacheMetricNames,
}
impl Default for DependencyCache {
    fn default() -> Self {
        Self::new(CacheMetricNames::default())
    }
}
impl DependencyCache {
    pub fn new(metric_names: CacheMetricNames) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            released: Condvar::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            metric_names: metric_names.init(),
        }
    }
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
    fn hit(&self, term: &Term, bindings: &Bindings, entry: CacheEntry) -> Evaluation {
        self.hits.fetch_add(1, Ordering::Relaxed);
        increment_counter!(self.metric_names.cache_hit_count);
        debug!(term = %term, "Evaluation cache hit");
        Evaluation::cache_hit(
            term.clone(),
            entry.result,
            bindings.clone(),
            entry.dependencies,
        )
        .with_unbound_symbols(entry.unbound_symbols)
    }
    fn compute_and_store(
        &self,
        term: &Term,
        compute: &mut ComputeFn<'_>,
    ) -> Result<Evaluation, SyntaxError> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        increment_counter!(self.metric_names.cache_miss_count);
        debug!(term = %term, "Evaluation cache miss");
        let evaluation = compute()?;
        let mut state = self.lock_state();
        let is_new_entry = state.store(
            term,
            CacheEntry {
                dependencies: evaluation.effective_dependencies().clone(),
                unbound_symbols: evaluation.unbound_symbols().clone(),
                result: evaluation.result().clone(),
            },
        );
        if is_new_entry {
            gauge!(self.metric_names.cache_entry_count, state.num_entries as f64);
        }
        Ok(evaluation)
    }
}
impl EvaluationCache for DependencyCache {
    fn get_or_compute(
        &self,
        term: &Term,
        bindings: &Bindings,
        compute: &mut ComputeFn<'_>,
    ) -> Result<Evaluation, SyntaxError> {
        let thread_id = thread::current().id();
        let mut state = self.lock_state();
        loop {
            let cached = state.lookup(term, bindings).map(|entry| CacheEntry {
                dependencies: entry.dependencies.clone(),
                unbound_symbols: entry.unbound_symbols.clone(),
                result: entry.result.clone(),
            });
            if let Some(entry) = cached {
                drop(state);
                return Ok(self.hit(term, bindings, entry));
            }
            match state.in_flight.get(term).copied() {
                None => {
                    state.in_flight.insert(term.clone(), thread_id);
                    drop(state);
                    let _claim = InFlightClaim {
                        cache: self,
                        term,
                        thread_id,
                    };
                    return self.compute_and_store(term, compute);
                }
                Some(owner) if state.is_waiting_on(owner, thread_id) => {
                    drop(state);
                    debug!(term = %term, "Computing in-flight term without waiting");
                    return self.compute_and_store(term, compute);
                }
                Some(owner) => {
                    state.waiting.insert(thread_id, owner);
                    state = self
                        .released
                        .wait(state)
                        .unwrap_or_else(|err| err.into_inner());
                    state.waiting.remove(&thread_id);
                }
            }
        }
    }
    fn clear(&self) {
        // In-flight claims are retained so that concurrent callers keep waiting on them
        let mut state = self.lock_state();
        state.entries.clear();
        state.num_entries = 0;
        gauge!(self.metric_names.cache_entry_count, 0.0);
    }
    fn len(&self) -> usize {
        self.lock_state().num_entries
    }
    fn metrics(&self) -> EvaluationCacheMetrics {
        EvaluationCacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

use super::types::{QueryContext, QueryHook, QueryResult};
use crate::statement::QueryType;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

fn kind_index(query_type: QueryType) -> usize {
    QueryType::ALL
        .iter()
        .position(|t| *t == query_type)
        .unwrap_or(0)
}

/// A hook that tracks statement statistics.
#[derive(Debug, Default)]
pub struct StatsHook {
    total_queries: AtomicU64,
    failed_queries: AtomicU64,
    total_duration_nanos: AtomicU64,
    per_kind: [AtomicU64; 8],
    other_count: AtomicU64,
    max_duration_nanos: AtomicU64,
    slowest_query: Mutex<Option<String>>,
}

/// Collected statement statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    /// Total number of statements executed.
    pub total_queries: u64,
    /// Total number of failed statements.
    pub failed_queries: u64,
    /// Total execution time.
    pub total_duration: Duration,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    pub replace_count: u64,
    pub create_count: u64,
    pub truncate_count: u64,
    pub drop_count: u64,
    /// Statements whose first keyword is not a known statement kind.
    pub other_count: u64,
    /// Slowest statement duration.
    pub max_duration: Duration,
    /// Slowest statement SQL.
    pub slowest_query: Option<String>,
}

impl QueryStats {
    /// Count for one statement kind.
    pub fn count_for(&self, query_type: QueryType) -> u64 {
        match query_type {
            QueryType::Select => self.select_count,
            QueryType::Insert => self.insert_count,
            QueryType::Update => self.update_count,
            QueryType::Delete => self.delete_count,
            QueryType::Replace => self.replace_count,
            QueryType::Create => self.create_count,
            QueryType::Truncate => self.truncate_count,
            QueryType::Drop => self.drop_count,
        }
    }
}

impl StatsHook {
    /// Create a new stats hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> QueryStats {
        let kind = |t: QueryType| self.per_kind[kind_index(t)].load(Ordering::Relaxed);
        QueryStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            select_count: kind(QueryType::Select),
            insert_count: kind(QueryType::Insert),
            update_count: kind(QueryType::Update),
            delete_count: kind(QueryType::Delete),
            replace_count: kind(QueryType::Replace),
            create_count: kind(QueryType::Create),
            truncate_count: kind(QueryType::Truncate),
            drop_count: kind(QueryType::Drop),
            other_count: self.other_count.load(Ordering::Relaxed),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            slowest_query: self
                .slowest_query
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.total_queries.store(0, Ordering::Relaxed);
        self.failed_queries.store(0, Ordering::Relaxed);
        self.total_duration_nanos.store(0, Ordering::Relaxed);
        for counter in &self.per_kind {
            counter.store(0, Ordering::Relaxed);
        }
        self.other_count.store(0, Ordering::Relaxed);
        self.max_duration_nanos.store(0, Ordering::Relaxed);
        *self
            .slowest_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl QueryHook for StatsHook {
    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let duration_nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        self.total_queries.fetch_add(1, Ordering::Relaxed);
        let prev_total = self
            .total_duration_nanos
            .fetch_add(duration_nanos, Ordering::Relaxed);
        if prev_total.checked_add(duration_nanos).is_none() {
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }

        match ctx.query_type {
            Some(t) => self.per_kind[kind_index(t)].fetch_add(1, Ordering::Relaxed),
            None => self.other_count.fetch_add(1, Ordering::Relaxed),
        };

        if result.is_error() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }

        // Only the thread that raises the max records its SQL.
        let mut current_max = self.max_duration_nanos.load(Ordering::Relaxed);
        while duration_nanos > current_max {
            match self.max_duration_nanos.compare_exchange_weak(
                current_max,
                duration_nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    *self
                        .slowest_query
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner) = Some(ctx.sql.clone());
                    break;
                }
                Err(actual) => current_max = actual,
            }
        }
    }
}

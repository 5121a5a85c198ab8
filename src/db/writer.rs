//! The batching writer worker: drains the event queue, accumulates
//! per-protocol batches, and flushes them on a size or time trigger using
//! textual multi-row inserts (see [`super::sql`]) rather than per-event
//! parameterized statements.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use sqlx::{Connection, PgConnection};
use tracing::{error, info};

use crate::core::error::DbError;
use crate::event::{Event, P1Trade, P2Swap};
use crate::metrics::Metrics;
use crate::queue::{EventQueue, PopResult, EMPTY_POLL_BACKOFF};

use super::sql::{build_pumpfun_insert, build_raydium_insert};

pub const BATCH_SIZE: usize = 100;
pub const FLUSH_INTERVAL_MS: u64 = 50;

pub struct BatchWriter {
    db_url: String,
    conn: Option<PgConnection>,
    p1_batch: Vec<P1Trade>,
    p2_batch: Vec<P2Swap>,
    last_flush: Instant,
    metrics: &'static Metrics,
}

impl BatchWriter {
    pub fn new(db_url: String, metrics: &'static Metrics) -> Self {
        Self {
            db_url,
            conn: None,
            p1_batch: Vec::with_capacity(BATCH_SIZE),
            p2_batch: Vec::with_capacity(BATCH_SIZE),
            last_flush: Instant::now(),
            metrics,
        }
    }

    /// Runs the writer loop on the calling thread until `running` is
    /// cleared, then performs one final drain. Intended to be called from
    /// inside a dedicated OS thread that owns its own single-threaded
    /// Tokio runtime.
    pub async fn run(mut self, queue: Arc<EventQueue>, running: Arc<AtomicBool>) {
        info!("writer worker starting");
        while running.load(Ordering::Relaxed) {
            match queue.pop_nonblocking() {
                PopResult::Item(event) => {
                    self.metrics.inc_events_total();
                    self.ingest(event).await;
                }
                PopResult::Empty => {
                    tokio::time::sleep(EMPTY_POLL_BACKOFF).await;
                }
                PopResult::Closed => {
                    break;
                }
            }
            self.maybe_flush_on_interval().await;
        }

        info!("writer worker draining final batches");
        self.flush_p1().await;
        self.flush_p2().await;
        self.conn = None;
        info!("writer worker stopped");
    }

    async fn ingest(&mut self, event: Event) {
        match event {
            Event::P1Trade(trade) => {
                self.metrics.inc_events_p1();
                self.p1_batch.push(trade);
                if self.p1_batch.len() >= BATCH_SIZE {
                    self.flush_p1().await;
                }
            }
            Event::P2Swap(swap) => {
                self.metrics.inc_events_p2();
                self.p2_batch.push(swap);
                if self.p2_batch.len() >= BATCH_SIZE {
                    self.flush_p2().await;
                }
            }
        }
    }

    async fn maybe_flush_on_interval(&mut self) {
        if self.last_flush.elapsed().as_millis() as u64 >= FLUSH_INTERVAL_MS {
            self.flush_p1().await;
            self.flush_p2().await;
            self.last_flush = Instant::now();
        }
    }

    async fn ensure_connection(&mut self) -> bool {
        if self.conn.is_some() {
            return true;
        }
        match PgConnection::connect(&self.db_url).await {
            Ok(conn) => {
                self.conn = Some(conn);
                self.metrics.inc_db_reconnects();
                info!("database connection established");
                true
            }
            Err(e) => {
                error!(error = %DbError::Connect(e), "database connection failed");
                false
            }
        }
    }

    async fn flush_p1(&mut self) {
        if self.p1_batch.is_empty() {
            return;
        }
        if !self.ensure_connection().await {
            return;
        }
        let Some(sql) = build_pumpfun_insert(&self.p1_batch) else {
            self.p1_batch.clear();
            return;
        };
        let row_count = self.p1_batch.len();
        let start = Instant::now();
        let conn = self.conn.as_mut().unwrap();
        match sqlx::query(&sql).execute(conn).await {
            Ok(_) => {
                let latency_us = start.elapsed().as_micros() as u64;
                self.metrics.inc_db_inserts_success_by(row_count as u64);
                self.metrics.inc_db_batches();
                self.metrics.add_db_latency_us(latency_us);
                self.p1_batch.clear();
            }
            Err(e) => {
                error!(error = %DbError::Command(e), "pumpfun_trades insert failed, dropping batch");
                self.metrics.inc_db_inserts_failed();
                self.p1_batch.clear();
                self.conn = None;
            }
        }
    }

    async fn flush_p2(&mut self) {
        if self.p2_batch.is_empty() {
            return;
        }
        if !self.ensure_connection().await {
            return;
        }
        let Some(sql) = build_raydium_insert(&self.p2_batch) else {
            self.p2_batch.clear();
            return;
        };
        let row_count = self.p2_batch.len();
        let start = Instant::now();
        let conn = self.conn.as_mut().unwrap();
        match sqlx::query(&sql).execute(conn).await {
            Ok(_) => {
                let latency_us = start.elapsed().as_micros() as u64;
                self.metrics.inc_db_inserts_success_by(row_count as u64);
                self.metrics.inc_db_batches();
                self.metrics.add_db_latency_us(latency_us);
                self.p2_batch.clear();
            }
            Err(e) => {
                error!(error = %DbError::Command(e), "raydium_swaps insert failed, dropping batch");
                self.metrics.inc_db_inserts_failed();
                self.p2_batch.clear();
                self.conn = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::P1Trade;

    fn sample_trade(slot: u64) -> P1Trade {
        P1Trade {
            mint: [0u8; 32],
            trader: [1u8; 32],
            creator: [2u8; 32],
            sol_amount: 1,
            token_amount: 2,
            is_buy: true,
            virtual_sol_reserves: 0,
            virtual_token_reserves: 0,
            real_sol_reserves: 0,
            real_token_reserves: 0,
            fee_basis_points: 0,
            fee_lamports: 0,
            creator_fee_basis_points: 0,
            creator_fee_lamports: 0,
            slot,
            timestamp: 0,
            signature: String::new(),
        }
    }

    /// An unreachable DB means every flush attempt fails at `ensure_connection`
    /// and returns before touching the batch counters: a connect failure
    /// retains the batch and bumps no failure counter, unlike a command
    /// failure.
    #[tokio::test(flavor = "current_thread")]
    async fn drains_queue_and_leaves_batch_counters_untouched_on_connect_failure() {
        let metrics: &'static Metrics = Box::leak(Box::new(Metrics::new()));
        let queue = Arc::new(EventQueue::new(16, metrics));
        for i in 0..5u64 {
            assert!(queue.push(Event::P1Trade(sample_trade(i))));
        }
        queue.close();

        let writer = BatchWriter::new(
            "postgres://127.0.0.1:1/does-not-exist".to_string(),
            metrics,
        );
        let running = Arc::new(AtomicBool::new(true));
        writer.run(queue, running).await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_total, 5);
        assert_eq!(snapshot.events_p1, 5);
        assert_eq!(snapshot.db_inserts_success, 0);
        assert_eq!(snapshot.db_inserts_failed, 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn empty_queue_close_is_a_clean_noop_drain() {
        let metrics: &'static Metrics = Box::leak(Box::new(Metrics::new()));
        let queue = Arc::new(EventQueue::new(16, metrics));
        queue.close();

        let writer = BatchWriter::new("postgres://127.0.0.1:1/does-not-exist".to_string(), metrics);
        let running = Arc::new(AtomicBool::new(true));
        writer.run(queue, running).await;

        assert_eq!(metrics.snapshot().events_total, 0);
    }
}

//! Long-lived gRPC subscription client.
//!
//! Maintains a session against the remote Geyser endpoint, re-establishing
//! it with bounded exponential backoff on any disconnect, and routes
//! qualifying transaction updates through the classifier and decoders onto
//! the event queue.

mod request;

pub use request::build_subscribe_request;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use yellowstone_grpc_client::{ClientTlsConfig, GeyserGrpcClient};
use yellowstone_grpc_proto::geyser::{subscribe_update::UpdateOneof, SubscribeUpdateTransaction};

use crate::classifier::{Detector, Protocol};
use crate::core::error::TransportError;
use crate::decode::preamble::decode_log_line;
use crate::decode::{p1, p2};
use crate::event::Event;
use crate::metrics::Metrics;
use crate::queue::EventQueue;

const MAX_BACKOFF_SECS: u64 = 32;

pub struct SubscriptionConfig {
    pub endpoint: String,
    pub authority: String,
    pub auth_token: Option<String>,
    pub resume_from_slot: Option<u64>,
}

pub struct SubscriptionClient {
    config: SubscriptionConfig,
    detector: Arc<Detector>,
    queue: Arc<EventQueue>,
    metrics: &'static Metrics,
    running: Arc<AtomicBool>,
}

impl SubscriptionClient {
    pub fn new(
        config: SubscriptionConfig,
        detector: Arc<Detector>,
        queue: Arc<EventQueue>,
        metrics: &'static Metrics,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            detector,
            queue,
            metrics,
            running,
        }
    }

    /// Runs the reconnect loop on the calling thread until `running` is
    /// cleared. Intended to be driven from a dedicated OS thread hosting its
    /// own single-threaded Tokio runtime (see `main.rs`).
    pub async fn run(self) {
        let mut backoff = 1u64;
        info!(endpoint = %self.config.endpoint, "subscription worker starting");

        while self.running.load(Ordering::Relaxed) {
            let mut handshake_ok = false;
            match self.run_session(&mut handshake_ok).await {
                Ok(()) => info!("subscription session ended cleanly"),
                Err(e) => error!(error = %e, "subscription session failed"),
            }

            if !self.running.load(Ordering::Relaxed) {
                break;
            }

            // The sleep always uses the backoff carried over from the previous
            // iteration's outcome; only the *next* retry benefits from a reset.
            info!(backoff_secs = backoff, "reconnecting after backoff");
            tokio::time::sleep(Duration::from_secs(backoff)).await;
            backoff = if handshake_ok {
                1
            } else {
                (backoff * 2).min(MAX_BACKOFF_SECS)
            };
        }

        info!("subscription worker stopped");
    }

    /// Runs a single session: connect, subscribe, receive until the stream
    /// ends or `running` is cleared. Sets `*handshake_ok` once the request
    /// has been sent successfully, so the caller can reset backoff even if
    /// the session later fails.
    async fn run_session(&self, handshake_ok: &mut bool) -> anyhow::Result<()> {
        if !self.detector.p1.enabled && !self.detector.p2.enabled {
            warn!("no protocol enabled; subscribing without account filters");
        }

        let mut builder = GeyserGrpcClient::build_from_shared(self.config.endpoint.clone())
            .map_err(|e| TransportError::Connect(e.into()))?
            .tls_config(ClientTlsConfig::new())
            .map_err(|e| TransportError::Connect(e.into()))?;
        if let Some(token) = &self.config.auth_token {
            builder = builder
                .x_token(Some(token.clone()))
                .map_err(|e| TransportError::Connect(e.into()))?;
        }
        let mut client = builder
            .connect()
            .await
            .map_err(|e| TransportError::Connect(e.into()))?;

        let (mut subscribe_tx, mut stream) = client
            .subscribe()
            .await
            .map_err(|e| TransportError::Subscribe(e.into()))?;

        let request = build_subscribe_request(&self.detector, self.config.resume_from_slot);
        subscribe_tx
            .send(request)
            .await
            .map_err(|e| TransportError::Subscribe(anyhow::anyhow!(e.to_string())))?;
        drop(subscribe_tx); // half-close: the single request has been sent

        *handshake_ok = true;

        while self.running.load(Ordering::Relaxed) {
            let Some(message) = stream.next().await else {
                break;
            };
            let update = message.map_err(TransportError::Stream)?;
            if let Some(UpdateOneof::Transaction(tx_update)) = update.update_oneof {
                self.handle_transaction(tx_update);
            }
        }
        Ok(())
    }

    /// The classifier+decoder path for a single transaction update: extract
    /// account keys, log messages, signature and slot; classify; decode the
    /// first matching log line; enqueue on success.
    fn handle_transaction(&self, tx_update: SubscribeUpdateTransaction) {
        let slot = tx_update.slot;
        let Some(info) = tx_update.transaction else {
            return;
        };
        let Some(tx) = info.transaction.as_ref() else {
            return;
        };
        let Some(message) = tx.message.as_ref() else {
            return;
        };
        let Some(meta) = info.meta.as_ref() else {
            return;
        };

        let accounts: Vec<&[u8]> = message
            .account_keys
            .iter()
            .map(|k| k.as_slice())
            .collect();

        let Some(protocol) = self.detector.classify(&accounts) else {
            return;
        };

        let signature = bs58::encode(&info.signature).into_string();

        let event = meta.log_messages.iter().find_map(|line| {
            let payload = decode_log_line(line).ok()?;
            match protocol {
                Protocol::P1 => p1::decode(&payload).ok().map(|mut trade| {
                    trade.slot = slot;
                    trade.signature = signature.clone();
                    Event::P1Trade(trade)
                }),
                Protocol::P2 => p2::decode(&payload).ok().map(|mut swap| {
                    swap.slot = slot;
                    swap.signature = signature.clone();
                    Event::P2Swap(swap)
                }),
            }
        });

        let Some(event) = event else {
            return;
        };

        if let Err(e) = self.queue.push_checked(event) {
            warn!(error = %e, "event queue closed, dropping event");
            self.metrics.inc_events_dropped();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ProtocolPattern;
    use crate::metrics::Metrics;
    use crate::queue::{EventQueue, PopResult};

    fn p1_pattern() -> ProtocolPattern {
        ProtocolPattern {
            program_id: [7u8; 32],
            enabled: true,
        }
    }

    fn p1_layout() -> Vec<u8> {
        let mut buf = vec![0u8; crate::decode::p1::LAYOUT_LEN];
        buf[48] = 1; // is_buy
        buf[32..40].copy_from_slice(&42u64.to_le_bytes()); // sol_amount
        buf[40..48].copy_from_slice(&1337u64.to_le_bytes()); // token_amount
        buf
    }

    fn client(queue: Arc<EventQueue>, metrics: &'static Metrics) -> SubscriptionClient {
        let detector = Arc::new(Detector::new(
            p1_pattern(),
            ProtocolPattern {
                program_id: [0u8; 32],
                enabled: false,
            },
        ));
        SubscriptionClient::new(
            SubscriptionConfig {
                endpoint: "example.invalid:443".to_string(),
                authority: "example.invalid".to_string(),
                auth_token: None,
                resume_from_slot: None,
            },
            detector,
            queue,
            metrics,
            Arc::new(AtomicBool::new(true)),
        )
    }

    /// Builds a minimal `SubscribeUpdateTransaction` with one account key
    /// matching the configured P1 program id and one log line carrying a
    /// decodable P1 payload.
    fn sample_tx_update(program_id: [u8; 32]) -> SubscribeUpdateTransaction {
        use base64::Engine;
        use yellowstone_grpc_proto::geyser::{
            SubscribeUpdateTransactionInfo, TransactionStatusMeta,
        };
        use yellowstone_grpc_proto::prelude::{Message, Transaction};

        let encoded = base64::engine::general_purpose::STANDARD.encode(p1_layout());
        let log_line = format!("Program data: {encoded}");

        SubscribeUpdateTransaction {
            transaction: Some(SubscribeUpdateTransactionInfo {
                signature: vec![9u8; 64],
                is_vote: false,
                transaction: Some(Transaction {
                    signatures: vec![],
                    message: Some(Message {
                        header: None,
                        account_keys: vec![program_id.to_vec()],
                        recent_blockhash: vec![],
                        instructions: vec![],
                        versioned: false,
                        address_table_lookups: vec![],
                    }),
                }),
                meta: Some(TransactionStatusMeta {
                    log_messages: vec![log_line],
                    ..Default::default()
                }),
                index: 0,
            }),
            slot: 555,
        }
    }

    #[test]
    fn matching_transaction_enqueues_one_event() {
        let metrics: &'static Metrics = Box::leak(Box::new(Metrics::new()));
        let queue = Arc::new(EventQueue::new(8, metrics));
        let c = client(queue.clone(), metrics);

        c.handle_transaction(sample_tx_update([7u8; 32]));

        match queue.pop_nonblocking() {
            PopResult::Item(Event::P1Trade(t)) => {
                assert_eq!(t.slot, 555);
                assert_eq!(t.sol_amount, 42);
                assert!(t.is_buy);
            }
            _ => panic!("expected a P1Trade item, got a different result"),
        }
    }

    #[test]
    fn non_matching_account_is_dropped() {
        let metrics: &'static Metrics = Box::leak(Box::new(Metrics::new()));
        let queue = Arc::new(EventQueue::new(8, metrics));
        let c = client(queue.clone(), metrics);

        c.handle_transaction(sample_tx_update([1u8; 32]));

        assert_eq!(queue.size(), 0);
    }
}

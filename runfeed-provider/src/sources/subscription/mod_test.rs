use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;

use super::*;
use crate::stream;

/// A subscription serving canned messages and recording pulls and acknowledgements.
#[derive(Default)]
struct FakeSubscription {
    pending: Mutex<VecDeque<ReceivedMessage>>,
    /// The max of each pull which returned messages.
    pulls: Mutex<Vec<usize>>,
    acked: Mutex<Vec<String>>,
    nacked: Mutex<Vec<String>>,
}

impl FakeSubscription {
    fn with_messages(messages: Vec<ReceivedMessage>) -> Arc<Self> {
        let fake = Self::default();
        if let Ok(mut pending) = fake.pending.lock() {
            pending.extend(messages);
        }
        Arc::new(fake)
    }

    fn pulls(&self) -> Vec<usize> {
        self.pulls.lock().map(|pulls| pulls.clone()).unwrap_or_default()
    }

    fn acked(&self) -> Vec<String> {
        self.acked.lock().map(|ids| ids.clone()).unwrap_or_default()
    }

    fn nacked(&self) -> Vec<String> {
        self.nacked.lock().map(|ids| ids.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Subscription for FakeSubscription {
    async fn pull(&self, max: usize) -> Result<Vec<ReceivedMessage>> {
        let received: Vec<ReceivedMessage> = match self.pending.lock() {
            Ok(mut pending) => {
                let len = pending.len().min(max);
                pending.drain(..len).collect()
            }
            Err(_) => vec![],
        };
        if !received.is_empty() {
            if let Ok(mut pulls) = self.pulls.lock() {
                pulls.push(max);
            }
        }
        Ok(received)
    }

    async fn ack(&self, ack_id: &str) -> Result<()> {
        if let Ok(mut ids) = self.acked.lock() {
            ids.push(ack_id.to_string());
        }
        Ok(())
    }

    async fn nack(&self, ack_id: &str) -> Result<()> {
        if let Ok(mut ids) = self.nacked.lock() {
            ids.push(ack_id.to_string());
        }
        Ok(())
    }
}

fn log_entry(ack_id: &str, data: &str) -> ReceivedMessage {
    ReceivedMessage {
        ack_id: ack_id.into(),
        message_id: format!("msg-{}", ack_id),
        data: data.as_bytes().to_vec(),
    }
}

#[test]
fn pipeline_job_id_reads_resource_label() -> Result<()> {
    let job_id = pipeline_job_id(br#"{"labels":{"other":"x"},"resource":{"labels":{"pipeline_job_id":"job-1"}}}"#)?;
    assert!(job_id == "job-1", "unexpected job id, got {}, expected {}", job_id, "job-1");
    Ok(())
}

#[test]
fn pipeline_job_id_rejects_malformed_entries() {
    let cases: Vec<&[u8]> = vec![b"not json", br#"{"resource":{"labels":{}}}"#, br#"{"resource":{"labels":{"pipeline_job_id":""}}}"#, b""];
    for data in cases {
        let res = pipeline_job_id(data);
        assert!(res.is_err(), "expected {:?} to be rejected", String::from_utf8_lossy(data));
    }
}

#[tokio::test]
async fn malformed_messages_are_nacked_and_valid_ones_emitted() -> Result<()> {
    let fake = FakeSubscription::with_messages(vec![
        log_entry("bad", "{"),
        log_entry("good", r#"{"resource":{"labels":{"pipeline_job_id":"job-2"}}}"#),
    ]);
    let (tx, mut rx) = stream::channel();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = SubscriptionSource::new(fake.clone(), Duration::from_millis(10), tx, shutdown_rx).spawn();

    let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await?.context("expected a message")?;
    assert!(
        matches!(&msg.payload, RawEvent::PipelineJob(job_id) if job_id == "job-2"),
        "unexpected payload, got {:?}",
        msg.payload
    );
    assert!(fake.nacked() == vec!["bad".to_string()], "expected malformed message to be nacked, got {:?}", fake.nacked());

    msg.complete(Outcome::Success).await;
    assert!(fake.acked() == vec!["good".to_string()], "expected message to be acked, got {:?}", fake.acked());

    let _ = shutdown_tx.send(());
    handle.await??;
    Ok(())
}

#[tokio::test]
async fn failed_messages_are_nacked() -> Result<()> {
    let fake = FakeSubscription::with_messages(vec![
        log_entry("first", r#"{"resource":{"labels":{"pipeline_job_id":"job-3"}}}"#),
        log_entry("second", r#"{"resource":{"labels":{"pipeline_job_id":"job-4"}}}"#),
    ]);
    let (tx, mut rx) = stream::channel();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = SubscriptionSource::new(fake.clone(), Duration::from_millis(10), tx, shutdown_rx).spawn();

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await?.context("expected a message")?;
    first.complete(Outcome::RecoverableFailure).await;
    let second = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await?.context("expected a message")?;
    second.complete(Outcome::UnrecoverableFailure).await;

    let nacked = fake.nacked();
    assert!(nacked == vec!["first".to_string(), "second".to_string()], "unexpected nacked ids, got {:?}", nacked);
    assert!(fake.acked().is_empty(), "expected no acked ids, got {:?}", fake.acked());

    let _ = shutdown_tx.send(());
    handle.await??;
    Ok(())
}

#[tokio::test]
async fn messages_are_pulled_one_at_a_time() -> Result<()> {
    let fake = FakeSubscription::with_messages(vec![
        log_entry("first", r#"{"resource":{"labels":{"pipeline_job_id":"job-5"}}}"#),
        log_entry("second", r#"{"resource":{"labels":{"pipeline_job_id":"job-6"}}}"#),
        log_entry("third", r#"{"resource":{"labels":{"pipeline_job_id":"job-7"}}}"#),
    ]);
    let (tx, mut rx) = stream::channel();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = SubscriptionSource::new(fake.clone(), Duration::from_millis(10), tx, shutdown_rx).spawn();

    for expected in ["job-5", "job-6", "job-7"] {
        let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await?.context("expected a message")?;
        assert!(
            matches!(&msg.payload, RawEvent::PipelineJob(job_id) if job_id == expected),
            "unexpected payload, got {:?}, expected {}",
            msg.payload,
            expected
        );
        msg.complete(Outcome::Success).await;
    }

    let pulls = fake.pulls();
    assert!(pulls == vec![1, 1, 1], "expected one message per pull, got {:?}", pulls);
    assert!(fake.acked().len() == 3, "expected every message to be acked, got {:?}", fake.acked());

    let _ = shutdown_tx.send(());
    handle.await??;
    Ok(())
}

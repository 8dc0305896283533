//! Pipeline stage worker implementations

use super::messages::{BuildMessage, EmbedJob};
use super::Result;
use crate::embeddings::{Embedder, EmbeddingError};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;

/// Feed jobs to the workers, then close the channel
pub fn feed_worker(jobs: Vec<EmbedJob>, tx: Sender<EmbedJob>) -> Result<()> {
    for job in jobs {
        if tx.send(job).is_err() {
            break; // Workers gone, stop feeding
        }
    }
    Ok(())
}

/// Embed worker
///
/// Answers each job with `Embedded` or `Error` until the job channel closes.
pub fn embed_worker(
    rx: Receiver<EmbedJob>,
    tx: Sender<BuildMessage>,
    embedder: Arc<dyn Embedder>,
) -> Result<()> {
    for EmbedJob { offset, texts } in rx {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let reply = match embedder.embed_batch(&refs) {
            Ok(embeddings) if embeddings.len() == texts.len() => {
                log::debug!("Embedded {} chunks at offset {}", texts.len(), offset);
                BuildMessage::Embedded { offset, embeddings }
            }
            Ok(embeddings) => BuildMessage::Error {
                offset,
                error: EmbeddingError::Provider(format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                )),
            },
            Err(error) => BuildMessage::Error { offset, error },
        };

        if tx.send(reply).is_err() {
            break; // Collector dropped, stop processing
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{HashingEmbedder, MockEmbedder};
    use crossbeam_channel::bounded;

    fn job(offset: usize, texts: &[&str]) -> EmbedJob {
        EmbedJob {
            offset,
            texts: texts.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_embed_worker_answers_jobs() {
        let (in_tx, in_rx) = bounded(10);
        let (out_tx, out_rx) = bounded(10);
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(8).unwrap());

        in_tx.send(job(4, &["alpha", "beta"])).unwrap();
        drop(in_tx);

        let handle = std::thread::spawn(move || embed_worker(in_rx, out_tx, embedder));

        match out_rx.recv().unwrap() {
            BuildMessage::Embedded { offset, embeddings } => {
                assert_eq!(offset, 4);
                assert_eq!(embeddings.len(), 2);
                assert_eq!(embeddings[0].len(), 8);
            }
            other => panic!("Wrong message type: {:?}", other),
        }
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_embed_worker_reports_short_batches() {
        let (in_tx, in_rx) = bounded(10);
        let (out_tx, out_rx) = bounded(10);
        let mut mock = MockEmbedder::new();
        mock.expect_embed_batch().returning(|_| Ok(vec![vec![1.0]]));
        let embedder: Arc<dyn Embedder> = Arc::new(mock);

        in_tx.send(job(0, &["a", "b"])).unwrap();
        drop(in_tx);

        embed_worker(in_rx, out_tx, embedder).unwrap();

        assert!(matches!(
            out_rx.recv().unwrap(),
            BuildMessage::Error { offset: 0, .. }
        ));
    }

    #[test]
    fn test_embed_worker_exits_when_jobs_close() {
        let (in_tx, in_rx) = bounded::<EmbedJob>(10);
        let (out_tx, out_rx) = bounded(10);
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(8).unwrap());
        drop(in_tx);

        embed_worker(in_rx, out_tx, embedder).unwrap();

        assert!(out_rx.recv().is_err());
    }

    #[test]
    fn test_feed_worker_sends_all_jobs() {
        let (tx, rx) = bounded(10);

        feed_worker(vec![job(0, &["a"]), job(1, &["b"])], tx).unwrap();

        let offsets: Vec<usize> = rx.iter().map(|job| job.offset).collect();
        assert_eq!(offsets, vec![0, 1]);
    }
}

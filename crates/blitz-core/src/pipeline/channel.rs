//! Bounded channels for backpressure between the dispatcher and its consumer.

use tokio::sync::mpsc;

use crate::config::PipelineConfig;

/// Create a bounded channel pair with the configured buffer size.
///
/// When the buffer is full, finished jobs wait before reporting, which in
/// turn holds their concurrency permit and stalls new jobs.
pub fn bounded_channel<T>(config: &PipelineConfig) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(config.buffer_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    #[tokio::test]
    async fn test_bounded_channel() {
        let config = PipelineConfig { buffer_size: 10 };

        let (tx, mut rx) = bounded_channel::<i32>(&config);

        tx.send(42).await.unwrap();
        let received = rx.recv().await;

        assert_eq!(received, Some(42));
    }

    #[tokio::test]
    async fn test_full_channel_applies_backpressure() {
        let config = PipelineConfig { buffer_size: 1 };
        let (tx, mut rx) = bounded_channel::<i32>(&config);

        tx.send(1).await.unwrap();
        assert!(tx.try_send(2).is_err());

        assert_eq!(rx.recv().await, Some(1));
        assert!(tx.try_send(2).is_ok());
    }
}

use std::fmt;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api;
use crate::domain::ProgressSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLabel {
    Downloading,
    Finalizing,
}

impl fmt::Display for ProgressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressLabel::Downloading => f.write_str("Downloading..."),
            ProgressLabel::Finalizing => f.write_str("Finalizing..."),
        }
    }
}

/// Percentage shown to the user. It only ever ratchets upward within a
/// session, so late or regressive samples never move the bar backwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressDisplay {
    percent: f64,
}

impl ProgressDisplay {
    pub fn apply(&mut self, sample: ProgressSample) -> Self {
        self.percent = self.percent.max(sample.percent());
        *self
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn rounded(&self) -> u8 {
        self.percent.round() as u8
    }

    pub fn label(&self) -> ProgressLabel {
        if self.percent >= ProgressSample::COMPLETE {
            ProgressLabel::Finalizing
        } else {
            ProgressLabel::Downloading
        }
    }
}

/// An open server-push progress channel.
///
/// Samples come out in arrival order, each exactly once. The subscription
/// closes itself after a sample of 100, on the first transport error, or
/// when [`close`](Self::close) is called or its cancel token fires. Once
/// closed it stays closed. Dropping it closes it as well.
pub struct ProgressSubscription {
    samples: BoxStream<'static, api::Result<ProgressSample>>,
    cancel: CancellationToken,
    closed: bool,
}

impl ProgressSubscription {
    pub fn new(
        samples: BoxStream<'static, api::Result<ProgressSample>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            samples,
            cancel,
            closed: false,
        }
    }

    /// Token that stops this subscription from elsewhere, e.g. on reset.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed || self.cancel.is_cancelled()
    }

    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.cancel.cancel();
            debug!("progress subscription closed");
        }
    }

    pub async fn next(&mut self) -> Option<ProgressSample> {
        if self.is_closed() {
            self.close();
            return None;
        }

        let cancel = self.cancel.clone();
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            item = self.samples.next() => item,
        };

        match item {
            Some(Ok(sample)) => {
                if sample.is_complete() {
                    self.close();
                }
                Some(sample)
            }
            Some(Err(e)) => {
                debug!(error = %e, "progress transport error");
                self.close();
                None
            }
            None => {
                self.close();
                None
            }
        }
    }

    pub fn into_stream(self) -> BoxStream<'static, ProgressSample> {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|sample| (sample, subscription))
        })
        .boxed()
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(percent: f64) -> ProgressSample {
        ProgressSample::new(percent).unwrap()
    }

    fn subscription_of(
        items: Vec<api::Result<ProgressSample>>,
    ) -> (ProgressSubscription, CancellationToken) {
        let token = CancellationToken::new();
        let stream = futures::stream::iter(items).chain(futures::stream::pending());
        (
            ProgressSubscription::new(stream.boxed(), token.clone()),
            token,
        )
    }

    #[test]
    fn test_display_ratchets() {
        let mut display = ProgressDisplay::default();
        let shown: Vec<f64> = [5.0, 40.0, 35.0, 40.0, 12.0, 90.0]
            .into_iter()
            .map(|p| display.apply(sample(p)).percent())
            .collect();
        assert_eq!(shown, [5.0, 40.0, 40.0, 40.0, 40.0, 90.0]);
        assert!(shown.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_display_label_switches_at_hundred() {
        let mut display = ProgressDisplay::default();
        display.apply(sample(99.6));
        assert_eq!(display.label(), ProgressLabel::Downloading);
        assert_eq!(display.rounded(), 100);
        display.apply(sample(100.0));
        assert_eq!(display.label(), ProgressLabel::Finalizing);
        assert_eq!(display.label().to_string(), "Finalizing...");
    }

    #[tokio::test]
    async fn test_closes_after_hundred() {
        let (subscription, token) = subscription_of(
            [0.0, 25.0, 60.0, 100.0, 40.0]
                .into_iter()
                .map(|p| Ok(sample(p)))
                .collect(),
        );

        let received: Vec<f64> = subscription
            .into_stream()
            .map(ProgressSample::percent)
            .collect()
            .await;

        assert_eq!(received, [0.0, 25.0, 60.0, 100.0]);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_transport_error_closes_silently() {
        let (mut subscription, token) = subscription_of(vec![
            Ok(sample(10.0)),
            Err(api::ApiError::ApiError("connection reset".to_string())),
            Ok(sample(20.0)),
        ]);

        assert_eq!(subscription.next().await, Some(sample(10.0)));
        assert_eq!(subscription.next().await, None);
        assert!(subscription.is_closed());
        assert!(token.is_cancelled());
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_external_cancel_stops_pending_subscription() {
        let (mut subscription, token) = subscription_of(vec![Ok(sample(10.0))]);
        assert_eq!(subscription.next().await, Some(sample(10.0)));

        let stopper = subscription.cancel_token();
        tokio::spawn(async move { stopper.cancel() });

        assert_eq!(subscription.next().await, None);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let (subscription, token) = subscription_of(Vec::new());
        drop(subscription);
        assert!(token.is_cancelled());
    }
}

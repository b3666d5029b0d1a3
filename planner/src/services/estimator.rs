//! Leg time/distance estimation for a whole stop list.
//!
//! The full route goes to the provider as one multi-waypoint request. If
//! that fails, every leg is requested separately and in parallel, and the
//! answers are put back in stop order. Legs that still have no answer get
//! the fallback estimate, tagged as such.

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::directions::{DirectionsProvider, FallbackTable};
use super::planning::PlanError;
use crate::types::Leg;

pub struct LegEstimator {
    provider: Box<dyn DirectionsProvider>,
    fallback: FallbackTable,
}

impl LegEstimator {
    pub fn new(provider: Box<dyn DirectionsProvider>, fallback: FallbackTable) -> Self {
        Self { provider, fallback }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Estimate every leg of the route through `addresses`. Returns
    /// `addresses.len() - 1` legs, in order.
    pub async fn estimate(
        &self,
        addresses: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Leg>, PlanError> {
        if addresses.len() < 2 {
            return Ok(Vec::new());
        }
        let expected = addresses.len() - 1;

        let batched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PlanError::Cancelled),
            result = self.provider.route_legs(addresses) => result,
        };

        match batched {
            Ok(measurements) if measurements.len() == expected => {
                debug!(
                    "{} measured {} legs in one request",
                    self.provider.name(),
                    expected
                );
                return Ok(measurements
                    .into_iter()
                    .map(|m| Leg::measured(m.duration_seconds, m.distance_meters))
                    .collect());
            }
            Ok(measurements) => warn!(
                "{} returned {} legs for {} stops, retrying per leg",
                self.provider.name(),
                measurements.len(),
                addresses.len()
            ),
            Err(e) => debug!(
                "Batched directions request failed: {}, retrying per leg",
                e
            ),
        }

        let requests = addresses.windows(2).map(|pair| self.provider.route_legs(pair));
        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PlanError::Cancelled),
            results = join_all(requests) => results,
        };

        let legs = addresses
            .windows(2)
            .zip(results)
            .map(|(pair, result)| match result {
                Ok(measurements) if measurements.len() == 1 => {
                    let m = measurements[0];
                    Leg::measured(m.duration_seconds, m.distance_meters)
                }
                Ok(_) => {
                    warn!(
                        "Unexpected leg count from {} to {}, using fallback estimate",
                        pair[0], pair[1]
                    );
                    self.fallback.lookup(&pair[0], &pair[1])
                }
                Err(e) => {
                    warn!(
                        "No directions from {} to {} ({}), using fallback estimate",
                        pair[0], pair[1], e
                    );
                    self.fallback.lookup(&pair[0], &pair[1])
                }
            })
            .collect();

        Ok(legs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::directions::{LegMeasurement, UnavailableDirections};
    use crate::types::EstimateSource;
    use anyhow::Result;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Measures every leg as 10 minutes / 10 km; optionally refuses
    /// multi-leg requests or specific origins. Records request sizes.
    #[derive(Default)]
    struct FakeDirections {
        reject_batches: bool,
        failing_origin: Option<String>,
        calls: Arc<Mutex<Vec<usize>>>,
    }

    #[async_trait]
    impl DirectionsProvider for FakeDirections {
        async fn route_legs(&self, waypoints: &[String]) -> Result<Vec<LegMeasurement>> {
            self.calls.lock().push(waypoints.len());
            if self.reject_batches && waypoints.len() > 2 {
                anyhow::bail!("MAX_WAYPOINTS_EXCEEDED");
            }
            if let Some(origin) = &self.failing_origin {
                if waypoints.len() == 2 && &waypoints[0] == origin {
                    anyhow::bail!("ZERO_RESULTS");
                }
                if waypoints.len() > 2 {
                    anyhow::bail!("ZERO_RESULTS");
                }
            }
            Ok(waypoints
                .windows(2)
                .map(|_| LegMeasurement { duration_seconds: 600, distance_meters: 10_000 })
                .collect())
        }

        fn name(&self) -> &str {
            "Fake"
        }
    }

    /// Never answers; used to exercise cancellation.
    struct HangingDirections;

    #[async_trait]
    impl DirectionsProvider for HangingDirections {
        async fn route_legs(&self, _waypoints: &[String]) -> Result<Vec<LegMeasurement>> {
            futures::future::pending::<()>().await;
            unreachable!()
        }

        fn name(&self) -> &str {
            "Hanging"
        }
    }

    fn addresses(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_batched_request_used_when_it_succeeds() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let provider = FakeDirections { calls: calls.clone(), ..Default::default() };
        let estimator = LegEstimator::new(Box::new(provider), FallbackTable::default());

        let legs = estimator
            .estimate(&addresses(&["Chennai", "Erode", "Salem", "Chennai"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(legs.len(), 3);
        assert!(legs.iter().all(|l| l.source == EstimateSource::Directions));
        assert_eq!(*calls.lock(), vec![4]);
    }

    #[tokio::test]
    async fn test_per_leg_retry_when_batch_rejected() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let provider = FakeDirections {
            reject_batches: true,
            calls: calls.clone(),
            ..Default::default()
        };
        let estimator = LegEstimator::new(Box::new(provider), FallbackTable::default());

        let legs = estimator
            .estimate(&addresses(&["Chennai", "Erode", "Salem", "Chennai"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(legs.len(), 3);
        assert!(legs.iter().all(|l| !l.is_estimated()));
        assert_eq!(*calls.lock(), vec![4, 2, 2, 2]);
    }

    #[tokio::test]
    async fn test_single_failed_leg_takes_fallback_in_place() {
        let provider = FakeDirections {
            failing_origin: Some("Chennai".to_string()),
            ..Default::default()
        };
        let estimator = LegEstimator::new(Box::new(provider), FallbackTable::default());

        let legs = estimator
            .estimate(&addresses(&["Chennai", "Erode", "Salem"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(legs[0], Leg::fallback(360, 400));
        assert_eq!(legs[1], Leg::measured(600, 10_000));
    }

    #[tokio::test]
    async fn test_unavailable_provider_uses_fallbacks_everywhere() {
        let estimator = LegEstimator::new(Box::new(UnavailableDirections), FallbackTable::default());

        let legs = estimator
            .estimate(
                &addresses(&["Salem", "Bengaluru, India", "Chennai, India", "Salem"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(legs, vec![
            Leg::fallback(60, 40),
            Leg::fallback(330, 350),
            Leg::fallback(60, 40),
        ]);
    }

    #[tokio::test]
    async fn test_fewer_than_two_addresses() {
        let estimator = LegEstimator::new(Box::new(HangingDirections), FallbackTable::default());
        let legs = estimator.estimate(&addresses(&["Chennai"]), &CancellationToken::new()).await.unwrap();
        assert!(legs.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_estimate_returns_cancelled() {
        let estimator = LegEstimator::new(Box::new(HangingDirections), FallbackTable::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = estimator.estimate(&addresses(&["Chennai", "Erode"]), &cancel).await;
        assert!(matches!(result, Err(PlanError::Cancelled)));
    }

    #[test]
    fn test_provider_name() {
        let estimator = LegEstimator::new(Box::new(UnavailableDirections), FallbackTable::default());
        assert_eq!(estimator.provider_name(), "Unavailable");
    }
}

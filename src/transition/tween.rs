//! Frame driver shared by the built-in transitions.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval};

/// One frame at 60 Hz.
pub(crate) const FRAME: Duration = Duration::from_millis(16);

/// Calls `step` with normalized time once per frame until `duration` has
/// elapsed. The final call always receives exactly `1.0`; a zero duration
/// snaps straight to it without yielding.
pub(crate) async fn animate(duration: Duration, mut step: impl FnMut(f32)) {
    if duration.is_zero() {
        step(1.0);
        return;
    }

    let start = Instant::now();
    let total = duration.as_secs_f32();
    let mut ticker = interval(FRAME);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let t = (start.elapsed().as_secs_f32() / total).min(1.0);
        step(t);
        if t >= 1.0 {
            break;
        }
    }
}

pub(crate) fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_animate_ends_at_one() {
        let mut samples = Vec::new();
        animate(Duration::from_millis(100), |t| samples.push(t)).await;
        assert_eq!(samples.last().copied(), Some(1.0));
        assert!(samples.windows(2).all(|w| w[0] <= w[1]));
        assert!(samples.len() > 2);
    }

    #[tokio::test]
    async fn test_zero_duration_snaps() {
        let mut samples = Vec::new();
        animate(Duration::ZERO, |t| samples.push(t)).await;
        assert_eq!(samples, vec![1.0]);
    }
}

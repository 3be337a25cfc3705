use lazy_static::lazy_static;
use prometheus::{
    opts, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

lazy_static! {
    // 전역 메트릭. 기본 레지스트리에 자동 등록하지 않고
    // register_custom_metrics 에서 서버가 가진 레지스트리에 등록한다.

    /// Total number of rooms created via /create.
    pub static ref ROOMS_CREATED_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("rooms_created_total", "Total number of rooms created")).unwrap();

    /// Draw engine invocations (preview and room draws).
    pub static ref DRAWS_TOTAL: IntCounterVec =
        IntCounterVec::new(Opts::new("draws_total", "Total draw requests by kind"), &["kind"]).unwrap();

    /// Proposals returned to clients.
    pub static ref DRAW_PROPOSALS_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("draw_proposals_total", "Total proposals produced by the draw engine")).unwrap();

    /// Draws that ran out of attempts and returned fewer proposals than requested.
    pub static ref DRAW_ATTEMPTS_EXHAUSTED_TOTAL: IntCounter =
        IntCounter::with_opts(opts!(
            "draw_attempts_exhausted_total",
            "Draws that returned partial results after exhausting the attempt budget"
        ))
        .unwrap();

    /// Attempts spent per draw call.
    pub static ref DRAW_ATTEMPTS: Histogram =
        Histogram::with_opts(HistogramOpts::new(
            "draw_attempts",
            "Attempts spent by the draw engine per call"
        ).buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 200.0, 500.0])).unwrap();

    /// Room events fanned out, by event kind (one per publish, not per subscriber).
    pub static ref EVENTS_PUBLISHED_TOTAL: IntCounterVec =
        IntCounterVec::new(
            Opts::new("events_published_total", "Room events published by kind"),
            &["kind"],
        )
        .unwrap();

    /// Deliveries dropped because the subscriber queue was already closed.
    pub static ref EVENTS_DROPPED_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("events_dropped_total", "Room event deliveries dropped")).unwrap();

    /// Live event-stream subscribers across all rooms.
    pub static ref ACTIVE_ROOM_SUBSCRIBERS: IntGauge =
        IntGauge::with_opts(opts!("active_room_subscribers", "Number of live room event subscribers")).unwrap();

    /// Room store read/write failures.
    pub static ref STORE_FAILURES_TOTAL: IntCounterVec =
        IntCounterVec::new(
            Opts::new("store_failures_total", "Room store failures by operation"),
            &["op"],
        )
        .unwrap();
}

/// Registers all custom metrics defined in this crate to the given registry.
///
/// Call once per registry during startup. Registering the same registry twice
/// returns `AlreadyReg`.
pub fn register_custom_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(ROOMS_CREATED_TOTAL.clone()))?;
    registry.register(Box::new(DRAWS_TOTAL.clone()))?;
    registry.register(Box::new(DRAW_PROPOSALS_TOTAL.clone()))?;
    registry.register(Box::new(DRAW_ATTEMPTS_EXHAUSTED_TOTAL.clone()))?;
    registry.register(Box::new(DRAW_ATTEMPTS.clone()))?;
    registry.register(Box::new(EVENTS_PUBLISHED_TOTAL.clone()))?;
    registry.register(Box::new(EVENTS_DROPPED_TOTAL.clone()))?;
    registry.register(Box::new(ACTIVE_ROOM_SUBSCRIBERS.clone()))?;
    registry.register(Box::new(STORE_FAILURES_TOTAL.clone()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_once_per_registry() {
        let registry = Registry::new();
        register_custom_metrics(&registry).unwrap();
        assert!(register_custom_metrics(&registry).is_err());

        // 다른 레지스트리에는 다시 등록할 수 있다.
        register_custom_metrics(&Registry::new()).unwrap();
    }
}

use deck_core::DrawOutcome;

pub struct MetricsCtx;

impl Default for MetricsCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCtx {
    pub fn new() -> Self {
        Self
    }

    pub fn inc_room_created(&self) {
        metrics::ROOMS_CREATED_TOTAL.inc();
    }

    /// kind: "preview" (`/api/draw`) 또는 "room" (`/api/room/{id}/draw`).
    pub fn record_draw(&self, kind: &str, outcome: &DrawOutcome) {
        metrics::DRAWS_TOTAL.with_label_values(&[kind]).inc();
        metrics::DRAW_PROPOSALS_TOTAL.inc_by(outcome.proposals.len() as u64);
        metrics::DRAW_ATTEMPTS.observe(outcome.attempts as f64);
        if outcome.exhausted {
            metrics::DRAW_ATTEMPTS_EXHAUSTED_TOTAL.inc();
        }
    }

    pub fn inc_event_published(&self, kind: &str) {
        metrics::EVENTS_PUBLISHED_TOTAL
            .with_label_values(&[kind])
            .inc();
    }

    pub fn inc_events_dropped(&self, count: usize) {
        metrics::EVENTS_DROPPED_TOTAL.inc_by(count as u64);
    }

    pub fn inc_subscribers(&self) {
        metrics::ACTIVE_ROOM_SUBSCRIBERS.inc();
    }

    pub fn dec_subscribers(&self) {
        metrics::ACTIVE_ROOM_SUBSCRIBERS.dec();
    }

    pub fn inc_store_failure(&self, op: &str) {
        metrics::STORE_FAILURES_TOTAL.with_label_values(&[op]).inc();
    }
}

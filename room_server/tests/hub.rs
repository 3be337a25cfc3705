use std::sync::Arc;
use std::time::Duration;

use deck_core::Proposal;
use room_server::hub::{Frame, RoomEventHub};
use room_server::metrics::MetricsCtx;
use room_server::protocol::RoomEvent;
use room_server::store::RoomEnvelope;
use serde_json::json;
use tokio_test::{assert_pending, assert_ready_eq, task};
use tokio_util::sync::CancellationToken;

const ROOM: &str = "AB12CD";

fn hub() -> Arc<RoomEventHub> {
    Arc::new(RoomEventHub::new(
        Arc::new(MetricsCtx::new()),
        CancellationToken::new(),
    ))
}

fn chosen(index: usize) -> RoomEvent {
    RoomEvent::DrawChosen {
        index,
        proposal: Proposal {
            elements: Vec::new(),
            alea: None,
        },
    }
}

#[tokio::test]
async fn late_subscriber_gets_snapshot_then_only_later_events() {
    let hub = hub();
    let mut early = hub.subscribe(ROOM, None);

    hub.publish(ROOM, chosen(0));

    let mut late = hub.subscribe(ROOM, None);
    // 저장소를 읽는 사이에 발행된 이벤트도 스냅샷 뒤에 남아 있어야 한다.
    hub.publish(ROOM, chosen(1));
    let mut envelope = RoomEnvelope::new(ROOM, "Lynx");
    envelope.meta.insert("round".into(), json!(1));
    late.deliver_snapshot(envelope.clone());

    for i in 2..=3 {
        hub.publish(ROOM, chosen(i));
    }

    let idle = Duration::from_secs(60);
    assert_eq!(late.next_frame(idle).await, Frame::Event(RoomEvent::state_sync(envelope)));
    for i in 1..=3 {
        assert_eq!(late.next_frame(idle).await, Frame::Event(chosen(i)));
    }

    for i in 0..=3 {
        assert_eq!(early.next_frame(idle).await, Frame::Event(chosen(i)));
    }
}

#[tokio::test]
async fn waiting_stream_wakes_on_publish() {
    let hub = hub();
    let mut sub = hub.subscribe(ROOM, None);

    {
        let mut next = task::spawn(sub.next_frame(Duration::from_secs(60)));
        assert_pending!(next.poll());

        hub.publish(ROOM, chosen(7));
        assert!(next.is_woken());
        assert_ready_eq!(next.poll(), Frame::Event(chosen(7)));
    }

    assert!(sub.try_next_event().is_none());
}

#[tokio::test]
async fn dropped_subscriber_does_not_block_others() {
    let hub = hub();
    let mut alive = hub.subscribe(ROOM, None);
    let gone = hub.subscribe(ROOM, None);
    drop(gone);

    assert_eq!(hub.publish(ROOM, chosen(1)), 1);
    assert_eq!(alive.try_next_event(), Some(chosen(1)));
    assert_eq!(hub.subscriber_count(ROOM), 1);
}

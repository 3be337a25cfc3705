use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::RoomEventHub;
use crate::protocol::RoomEvent;
use crate::store::RoomEnvelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionPhase {
    /// 등록됨. 스냅샷이 있으면 아직 전달 전이다.
    Subscribed,
    SnapshotDelivered,
    Streaming,
    Closed,
}

#[derive(Debug, PartialEq)]
pub enum Frame {
    Event(RoomEvent),
    /// `idle` 동안 이벤트가 없었다.
    Keepalive,
    Closed,
}

enum Wake {
    Shutdown,
    Received(Option<RoomEvent>),
    Idle,
}

/// 구독 하나의 수신 쪽. drop 되면 허브에서 빠진다.
pub struct Subscription {
    hub: Arc<RoomEventHub>,
    room_id: String,
    id: u64,
    receiver: mpsc::UnboundedReceiver<RoomEvent>,
    shutdown: CancellationToken,
    phase: SubscriptionPhase,
    snapshot: Option<RoomEvent>,
}

impl Subscription {
    pub(super) fn new(
        hub: Arc<RoomEventHub>,
        room_id: String,
        id: u64,
        receiver: mpsc::UnboundedReceiver<RoomEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            hub,
            room_id,
            id,
            receiver,
            shutdown,
            phase: SubscriptionPhase::Subscribed,
            snapshot: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn phase(&self) -> SubscriptionPhase {
        self.phase
    }

    /// 저장된 방 상태를 첫 이벤트로 예약한다. 큐에 먼저 쌓인 이벤트보다 앞선다.
    pub fn deliver_snapshot(&mut self, envelope: RoomEnvelope) {
        if self.phase == SubscriptionPhase::Closed {
            return;
        }
        self.snapshot = Some(RoomEvent::state_sync(envelope));
    }

    /// 다음 이벤트를 기다린다. `idle` 이 지나면 `Frame::Keepalive`.
    pub async fn next_frame(&mut self, idle: Duration) -> Frame {
        if self.phase == SubscriptionPhase::Closed {
            return Frame::Closed;
        }
        if let Some(snapshot) = self.snapshot.take() {
            self.phase = SubscriptionPhase::SnapshotDelivered;
            return Frame::Event(snapshot);
        }

        let wake = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Wake::Shutdown,
            received = tokio::time::timeout(idle, self.receiver.recv()) => match received {
                Ok(event) => Wake::Received(event),
                Err(_) => Wake::Idle,
            },
        };

        match wake {
            Wake::Received(Some(event)) => {
                self.advance();
                Frame::Event(event)
            }
            Wake::Idle => Frame::Keepalive,
            Wake::Shutdown | Wake::Received(None) => {
                self.close();
                Frame::Closed
            }
        }
    }

    /// 큐에 이미 들어 있는 이벤트만 꺼낸다. 기다리지 않는다.
    pub fn try_next_event(&mut self) -> Option<RoomEvent> {
        if self.phase == SubscriptionPhase::Closed {
            return None;
        }
        if let Some(snapshot) = self.snapshot.take() {
            self.phase = SubscriptionPhase::SnapshotDelivered;
            return Some(snapshot);
        }
        let event = self.receiver.try_recv().ok()?;
        self.advance();
        Some(event)
    }

    fn advance(&mut self) {
        self.phase = SubscriptionPhase::Streaming;
    }

    pub fn close(&mut self) {
        if self.phase == SubscriptionPhase::Closed {
            return;
        }
        self.phase = SubscriptionPhase::Closed;
        self.snapshot = None;
        self.receiver.close();
        self.hub.unsubscribe(&self.room_id, self.id);
        debug!("Subscription {} on room {} closed", self.id, self.room_id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

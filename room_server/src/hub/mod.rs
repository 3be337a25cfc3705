use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::metrics::MetricsCtx;
use crate::protocol::{PresenceEntry, RoomEvent};

pub mod subscription;

pub use subscription::{Frame, Subscription, SubscriptionPhase};

struct Subscriber {
    id: u64,
    sender: mpsc::UnboundedSender<RoomEvent>,
    client: Option<PresenceEntry>,
}

/// 방별 라이브 구독자 목록과 fan-out.
///
/// 레지스트리 락은 목록을 복사하거나 항목을 넣고 뺄 때만 잡는다.
/// 전송과 저장소 I/O 는 락 밖에서 한다.
pub struct RoomEventHub {
    rooms: Mutex<HashMap<String, Vec<Subscriber>>>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
    metrics: Arc<MetricsCtx>,
}

impl RoomEventHub {
    pub fn new(metrics: Arc<MetricsCtx>, shutdown: CancellationToken) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            shutdown,
            metrics,
        }
    }

    /// 구독을 등록한다. 등록 이후 발행되는 이벤트는 모두 이 구독의 큐에 쌓인다.
    ///
    /// 스냅샷은 등록이 끝난 뒤 저장소에서 읽어 `Subscription::deliver_snapshot` 으로 넘긴다.
    /// 읽는 사이에 발행된 이벤트는 큐에 남아 스냅샷 뒤에 전달된다.
    pub fn subscribe(
        self: &Arc<Self>,
        room_id: &str,
        client: Option<PresenceEntry>,
    ) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let announces = client.is_some();
        let presence = {
            let mut rooms = self.rooms.lock();
            let subscribers = rooms.entry(room_id.to_string()).or_default();
            subscribers.push(Subscriber { id, sender, client });
            announces.then(|| presence_of(subscribers))
        };
        self.metrics.inc_subscribers();
        debug!("Subscriber {} joined room {}", id, room_id);

        if let Some(clients) = presence {
            self.publish(room_id, RoomEvent::Presence { clients });
        }

        Subscription::new(
            Arc::clone(self),
            room_id.to_string(),
            id,
            receiver,
            self.shutdown.child_token(),
        )
    }

    /// 현재 구독자에게 이벤트를 보낸다. 닫힌 큐는 조용히 정리한다.
    ///
    /// 전달에 성공한 구독자 수를 돌려준다.
    pub fn publish(&self, room_id: &str, event: RoomEvent) -> usize {
        let targets: Vec<(u64, mpsc::UnboundedSender<RoomEvent>)> = {
            let rooms = self.rooms.lock();
            match rooms.get(room_id) {
                Some(subscribers) => subscribers
                    .iter()
                    .map(|s| (s.id, s.sender.clone()))
                    .collect(),
                None => Vec::new(),
            }
        };
        self.metrics.inc_event_published(event.kind().as_str());

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, sender) in targets {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(id);
            }
        }

        if !closed.is_empty() {
            debug!(
                "Dropping {} closed subscriber(s) from room {}",
                closed.len(),
                room_id
            );
            self.metrics.inc_events_dropped(closed.len());
            if let Some(clients) = self.prune(room_id, &closed) {
                self.publish(room_id, RoomEvent::Presence { clients });
            }
        }

        delivered
    }

    /// 닫힌 구독자를 뺀다. 빠진 쪽에 client 가 있었으면 새 presence 목록을 돌려준다.
    fn prune(&self, room_id: &str, closed: &[u64]) -> Option<Vec<PresenceEntry>> {
        let mut rooms = self.rooms.lock();
        let subscribers = rooms.get_mut(room_id)?;
        let mut pruned_client = false;
        let before = subscribers.len();
        subscribers.retain(|s| {
            let keep = !closed.contains(&s.id);
            if !keep && s.client.is_some() {
                pruned_client = true;
            }
            keep
        });
        for _ in subscribers.len()..before {
            self.metrics.dec_subscribers();
        }
        if subscribers.is_empty() {
            rooms.remove(room_id);
            return None;
        }
        pruned_client.then(|| presence_of(subscribers))
    }

    /// 구독 해제. 이미 빠진 구독자면 아무것도 하지 않는다.
    pub fn unsubscribe(&self, room_id: &str, subscriber_id: u64) {
        let presence = {
            let mut rooms = self.rooms.lock();
            let Some(subscribers) = rooms.get_mut(room_id) else {
                return;
            };
            let Some(pos) = subscribers.iter().position(|s| s.id == subscriber_id) else {
                return;
            };
            let removed = subscribers.remove(pos);
            let presence = removed.client.is_some().then(|| presence_of(subscribers));
            if subscribers.is_empty() {
                rooms.remove(room_id);
            }
            presence
        };
        self.metrics.dec_subscribers();
        debug!("Subscriber {} left room {}", subscriber_id, room_id);

        if let Some(clients) = presence {
            self.publish(room_id, RoomEvent::Presence { clients });
        }
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.rooms.lock().get(room_id).map_or(0, Vec::len)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn presence(&self, room_id: &str) -> Vec<PresenceEntry> {
        self.rooms
            .lock()
            .get(room_id)
            .map(|subscribers| presence_of(subscribers))
            .unwrap_or_default()
    }

    /// 모든 스트림을 닫는다. 이후 `next_frame` 은 `Frame::Closed` 를 돌려준다.
    pub fn shutdown(&self) {
        info!("Room event hub shutting down");
        self.shutdown.cancel();
    }
}

/// client id 가 같은 탭이 여럿이면 한 번만 센다.
fn presence_of(subscribers: &[Subscriber]) -> Vec<PresenceEntry> {
    let mut clients: Vec<PresenceEntry> = Vec::new();
    for entry in subscribers.iter().filter_map(|s| s.client.as_ref()) {
        if !clients.iter().any(|c| c.client == entry.client) {
            clients.push(entry.clone());
        }
    }
    clients
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::Proposal;

    fn hub() -> Arc<RoomEventHub> {
        Arc::new(RoomEventHub::new(
            Arc::new(MetricsCtx::new()),
            CancellationToken::new(),
        ))
    }

    fn draws_updated() -> RoomEvent {
        RoomEvent::DrawsUpdated {
            proposals: Vec::<Proposal>::new(),
        }
    }

    fn entry(client: &str, name: &str) -> PresenceEntry {
        PresenceEntry {
            client: client.into(),
            name: name.into(),
        }
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let hub = hub();
        assert_eq!(hub.publish("EMPTY", draws_updated()), 0);
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn drop_deregisters_subscription() {
        let hub = hub();
        let first = hub.subscribe("AB12CD", None);
        let second = hub.subscribe("AB12CD", None);
        assert_eq!(hub.subscriber_count("AB12CD"), 2);

        drop(first);
        assert_eq!(hub.subscriber_count("AB12CD"), 1);
        assert_eq!(hub.publish("AB12CD", draws_updated()), 1);

        drop(second);
        assert_eq!(hub.subscriber_count("AB12CD"), 0);
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn rooms_are_isolated() {
        let hub = hub();
        let mut a = hub.subscribe("ROOMA", None);
        let mut b = hub.subscribe("ROOMB", None);

        hub.publish("ROOMA", draws_updated());
        assert!(a.try_next_event().is_some());
        assert!(b.try_next_event().is_none());
    }

    #[test]
    fn presence_tracks_named_clients() {
        let hub = hub();
        let mut watcher = hub.subscribe("AB12CD", None);
        let ana = hub.subscribe("AB12CD", Some(entry("c1", "Ana")));
        let _ana_tab = hub.subscribe("AB12CD", Some(entry("c1", "Ana")));
        let _bo = hub.subscribe("AB12CD", Some(entry("c2", "Bo")));

        assert_eq!(
            hub.presence("AB12CD"),
            vec![entry("c1", "Ana"), entry("c2", "Bo")]
        );

        drop(ana);
        // 같은 client 의 다른 탭이 남아 있으므로 Ana 는 계속 보인다.
        assert_eq!(hub.presence("AB12CD").len(), 2);

        let mut last = None;
        while let Some(event) = watcher.try_next_event() {
            last = Some(event);
        }
        assert_eq!(
            last,
            Some(RoomEvent::Presence {
                clients: vec![entry("c1", "Ana"), entry("c2", "Bo")]
            })
        );
    }

    #[test]
    fn pruning_a_named_client_republishes_presence() {
        let hub = hub();
        let mut watcher = hub.subscribe("AB12CD", Some(entry("c1", "Ana")));

        // 수신 쪽은 닫혔지만 아직 목록에서 빠지지 않은 구독자.
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        hub.metrics.inc_subscribers();
        hub.rooms
            .lock()
            .get_mut("AB12CD")
            .unwrap()
            .push(Subscriber {
                id: 99,
                sender,
                client: Some(entry("c9", "Zoe")),
            });
        assert_eq!(hub.presence("AB12CD").len(), 2);
        while watcher.try_next_event().is_some() {}

        assert_eq!(hub.publish("AB12CD", draws_updated()), 1);
        assert_eq!(hub.subscriber_count("AB12CD"), 1);
        assert_eq!(watcher.try_next_event(), Some(draws_updated()));
        assert_eq!(
            watcher.try_next_event(),
            Some(RoomEvent::Presence {
                clients: vec![entry("c1", "Ana")]
            })
        );
        assert!(watcher.try_next_event().is_none());
    }
}

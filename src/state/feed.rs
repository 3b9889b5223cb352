use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::feed::ChangeEvent;

/// Per-room broadcast hubs carrying row change notifications.
///
/// Hubs are created by the first subscriber of a room and pruned once the last one leaves.
/// Publishing to a room nobody watches is a no-op.
pub struct RoomFeeds {
    hubs: DashMap<String, broadcast::Sender<ChangeEvent>>,
    capacity: usize,
}

impl RoomFeeds {
    /// Build an empty registry; every hub buffers up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity,
        }
    }

    /// Register a new subscriber on the room's hub, creating it if needed.
    pub fn subscribe(&self, room_code: &str) -> broadcast::Receiver<ChangeEvent> {
        self.hubs
            .entry(room_code.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send an event to the current subscribers of its room, ignoring delivery errors.
    pub fn publish(&self, event: ChangeEvent) {
        if let Some(hub) = self.hubs.get(&event.room_code) {
            let _ = hub.send(event);
        }
    }

    /// Drop the room's hub when it has no subscriber left.
    pub fn release(&self, room_code: &str) {
        self.hubs
            .remove_if(room_code, |_, sender| sender.receiver_count() == 0);
    }

    /// Number of rooms currently holding a hub.
    pub fn watched_rooms(&self) -> usize {
        self.hubs.len()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::dto::feed::ChangeKind;

    #[tokio::test]
    async fn events_stay_in_their_room() {
        let feeds = RoomFeeds::new(8);
        let mut pizza = feeds.subscribe("PIZZA");
        let mut sushi = feeds.subscribe("SUSHI");

        let event = ChangeEvent::participant(ChangeKind::Insert, "PIZZA", Uuid::new_v4());
        feeds.publish(event.clone());

        assert_eq!(pizza.recv().await.expect("pizza event"), event);
        assert!(sushi.try_recv().is_err());
    }

    #[test]
    fn release_prunes_idle_hubs_only() {
        let feeds = RoomFeeds::new(8);
        let first = feeds.subscribe("ABCDE");
        let second = feeds.subscribe("ABCDE");
        assert_eq!(feeds.watched_rooms(), 1);

        drop(first);
        feeds.release("ABCDE");
        assert_eq!(feeds.watched_rooms(), 1);

        drop(second);
        feeds.release("ABCDE");
        assert_eq!(feeds.watched_rooms(), 0);
    }

    #[test]
    fn publishing_without_subscribers_is_a_no_op() {
        let feeds = RoomFeeds::new(8);
        feeds.publish(ChangeEvent::race(ChangeKind::Update, "ZZZZZ", Uuid::new_v4()));
        assert_eq!(feeds.watched_rooms(), 0);
    }
}

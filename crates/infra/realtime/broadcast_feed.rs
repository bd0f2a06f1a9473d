use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::broadcast;
use tracing::debug;

use crate::realtime::change_feed::{ChangeEvent, ChangeFeed, ChangeSubscription, ChannelSpec};

type Registry = Arc<Mutex<HashMap<u64, String>>>;

/// In-process change feed. Writers publish after their transaction commits; every
/// subscriber sees events in commit order.
pub struct BroadcastChangeFeed {
    /// Guards the commit counter and the send together, so ids reach subscribers in order.
    sender: Mutex<(u64, broadcast::Sender<ChangeEvent>)>,
    next_subscription: AtomicU64,
    registry: Registry,
}

struct Registration {
    id: u64,
    registry: Registry,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            if let Some(channel) = registry.remove(&self.id) {
                debug!(%channel, subscription_id = self.id, "realtime: unsubscribed");
            }
        }
    }
}

impl BroadcastChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Mutex::new((0, sender)),
            next_subscription: AtomicU64::new(0),
            registry: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl ChangeFeed for BroadcastChangeFeed {
    fn subscribe(&self, spec: ChannelSpec) -> ChangeSubscription {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst) + 1;
        let receiver = match self.sender.lock() {
            Ok(guard) => guard.1.subscribe(),
            Err(poisoned) => poisoned.into_inner().1.subscribe(),
        };

        if let Ok(mut registry) = self.registry.lock() {
            registry.insert(id, spec.name.clone());
        }
        debug!(channel = %spec.name, subscription_id = id, "realtime: subscribed");

        ChangeSubscription::new(
            spec,
            receiver,
            Registration {
                id,
                registry: Arc::clone(&self.registry),
            },
        )
    }

    fn publish(&self, mut event: ChangeEvent) -> u64 {
        let mut guard = match self.sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (last_commit, sender) = &mut *guard;
        *last_commit += 1;
        let commit_id = *last_commit;
        event.commit_id = commit_id;

        // No receivers is not an error: nobody is watching.
        let delivered = sender.send(event).unwrap_or(0);
        drop(guard);
        debug!(commit_id, delivered, "realtime: published change");

        commit_id
    }

    fn active_subscriptions(&self) -> usize {
        self.registry.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn active_channels(&self) -> Vec<String> {
        let mut channels = self
            .registry
            .lock()
            .map(|r| r.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        channels.sort();
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::change_feed::{ChangeFilter, Notification};
    use serde_json::json;

    #[tokio::test]
    async fn subscribers_only_see_their_channel() {
        let feed = BroadcastChangeFeed::new(16);
        let mut room_a = feed.subscribe(
            ChannelSpec::new("room:a")
                .with(ChangeFilter::table("stream_chat_messages").eq("stream_id", "a")),
        );

        feed.publish(
            ChangeEvent::insert("stream_chat_messages", &json!({ "id": 1, "stream_id": "b" }))
                .unwrap(),
        );
        let second = feed.publish(
            ChangeEvent::insert("stream_chat_messages", &json!({ "id": 2, "stream_id": "a" }))
                .unwrap(),
        );

        match room_a.recv().await {
            Some(Notification::Change(event)) => {
                assert_eq!(event.commit_id, second);
                assert_eq!(event.column("id"), Some(&json!(2)));
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[test]
    fn dropping_a_subscription_unregisters_it() {
        let feed = BroadcastChangeFeed::new(16);
        let first = feed.subscribe(ChannelSpec::new("a"));
        let _second = feed.subscribe(ChannelSpec::new("b"));
        assert_eq!(feed.active_subscriptions(), 2);

        drop(first);

        assert_eq!(feed.active_channels(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn slow_subscribers_are_told_they_missed_events() {
        let feed = BroadcastChangeFeed::new(1);
        let mut subscription =
            feed.subscribe(ChannelSpec::new("all").with(ChangeFilter::table("videos")));

        for id in 0..3 {
            feed.publish(ChangeEvent::insert("videos", &json!({ "id": id })).unwrap());
        }

        assert!(matches!(
            subscription.recv().await,
            Some(Notification::Missed(_))
        ));
    }

    #[test]
    fn commit_ids_increase() {
        let feed = BroadcastChangeFeed::new(4);
        let a = feed.publish(ChangeEvent::insert("videos", &json!({})).unwrap());
        let b = feed.publish(ChangeEvent::insert("videos", &json!({})).unwrap());
        assert!(b > a);
    }

    #[tokio::test]
    async fn concurrent_publishers_deliver_in_commit_order() {
        let feed = Arc::new(BroadcastChangeFeed::new(1024));
        let mut subscription =
            feed.subscribe(ChannelSpec::new("all").with(ChangeFilter::table("videos")));

        let writers: Vec<_> = (0..4)
            .map(|writer| {
                let feed = Arc::clone(&feed);
                std::thread::spawn(move || {
                    for n in 0..50 {
                        feed.publish(
                            ChangeEvent::insert("videos", &json!({ "writer": writer, "n": n }))
                                .unwrap(),
                        );
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let mut previous = 0;
        for _ in 0..200 {
            match subscription.recv().await {
                Some(Notification::Change(event)) => {
                    assert!(event.commit_id > previous, "{} after {}", event.commit_id, previous);
                    previous = event.commit_id;
                }
                other => panic!("unexpected notification: {other:?}"),
            }
        }
        assert_eq!(previous, 200);
    }
}

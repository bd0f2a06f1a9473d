use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{sync::mpsc, task::JoinHandle};

use super::event_log::{EventLog, Keyed};

pub const GIFT_OVERLAY_LIFETIME: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayDelta<T: Keyed> {
    Shown(T),
    Hidden(T::Key),
}

struct OverlayInner<T: Keyed> {
    items: EventLog<T>,
    timers: HashMap<T::Key, JoinHandle<()>>,
}

/// Transient items that remove themselves after a fixed lifetime.
pub struct EphemeralOverlay<T: Keyed> {
    lifetime: Duration,
    inner: Arc<Mutex<OverlayInner<T>>>,
    sink: mpsc::UnboundedSender<OverlayDelta<T>>,
}

impl<T> EphemeralOverlay<T>
where
    T: Keyed + Clone + Send + 'static,
{
    pub fn new(lifetime: Duration, sink: mpsc::UnboundedSender<OverlayDelta<T>>) -> Self {
        Self {
            lifetime,
            inner: Arc::new(Mutex::new(OverlayInner {
                items: EventLog::new(),
                timers: HashMap::new(),
            })),
            sink,
        }
    }

    /// Shows `item` and schedules its removal. An item already on screen is left alone.
    pub fn show(&self, item: T) -> bool {
        let key = item.key();
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if inner.items.contains(&key) {
            return false;
        }

        inner.items.upsert(item.clone());
        let _ = self.sink.send(OverlayDelta::Shown(item));

        let lifetime = self.lifetime;
        let weak = Arc::downgrade(&self.inner);
        let sink = self.sink.clone();
        let timer_key = key.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(lifetime).await;
            if let Some(inner) = weak.upgrade() {
                expire(&inner, &sink, &timer_key);
            }
        });
        inner.timers.insert(key, timer);

        true
    }

    /// Removes the item early. Unknown or already expired ids are a no-op.
    pub fn dismiss(&self, key: &T::Key) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if let Some(timer) = inner.timers.remove(key) {
            timer.abort();
        }
        if inner.items.remove(key).is_some() {
            let _ = self.sink.send(OverlayDelta::Hidden(key.clone()));
            return true;
        }
        false
    }

    pub fn visible(&self) -> Vec<T> {
        self.inner
            .lock()
            .map(|inner| inner.items.snapshot())
            .unwrap_or_default()
    }
}

fn expire<T: Keyed>(
    inner: &Mutex<OverlayInner<T>>,
    sink: &mpsc::UnboundedSender<OverlayDelta<T>>,
    key: &T::Key,
) {
    let Ok(mut inner) = inner.lock() else {
        return;
    };
    inner.timers.remove(key);
    if inner.items.remove(key).is_some() {
        let _ = sink.send(OverlayDelta::Hidden(key.clone()));
    }
}

impl<T: Keyed> Drop for EphemeralOverlay<T> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            for (_, timer) in inner.timers.drain() {
                timer.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Burst {
        id: u32,
    }

    impl Keyed for Burst {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    #[tokio::test(start_paused = true)]
    async fn items_disappear_after_their_lifetime() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let overlay = EphemeralOverlay::new(GIFT_OVERLAY_LIFETIME, tx);

        assert!(overlay.show(Burst { id: 1 }));
        assert_eq!(rx.recv().await, Some(OverlayDelta::Shown(Burst { id: 1 })));

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(overlay.visible(), vec![Burst { id: 1 }]);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(overlay.visible().is_empty());
        assert_eq!(rx.recv().await, Some(OverlayDelta::Hidden(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_before_expiry_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let overlay = EphemeralOverlay::new(GIFT_OVERLAY_LIFETIME, tx);
        overlay.show(Burst { id: 7 });
        rx.recv().await;

        assert!(overlay.dismiss(&7));
        assert!(!overlay.dismiss(&7));
        assert_eq!(rx.recv().await, Some(OverlayDelta::Hidden(7)));

        tokio::time::sleep(GIFT_OVERLAY_LIFETIME * 2).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_event_ids_are_shown_once() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let overlay = EphemeralOverlay::new(GIFT_OVERLAY_LIFETIME, tx);

        assert!(overlay.show(Burst { id: 3 }));
        assert!(!overlay.show(Burst { id: 3 }));
        assert_eq!(overlay.visible().len(), 1);
    }
}

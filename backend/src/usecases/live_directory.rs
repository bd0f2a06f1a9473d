use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use crates::{
    domain::{entities::live_streams::LiveStreamEntity, repositories::live_streams::LiveStreamRepository},
    realtime::{
        change_feed::{ChangeEvent, ChangeFilter, ChannelSpec},
        scoped_view::{ScopeSource, ViewUpdate},
    },
};

/// The list of streams on air. Any change to `live_streams` can move a stream in or out of
/// the list or reorder it, so every notification refetches.
pub struct LiveDirectorySource<L>
where
    L: LiveStreamRepository + Send + Sync + 'static,
{
    live_stream_repository: Arc<L>,
}

impl<L> LiveDirectorySource<L>
where
    L: LiveStreamRepository + Send + Sync + 'static,
{
    pub fn new(live_stream_repository: Arc<L>) -> Self {
        Self {
            live_stream_repository,
        }
    }
}

#[async_trait]
impl<L> ScopeSource for LiveDirectorySource<L>
where
    L: LiveStreamRepository + Send + Sync + 'static,
{
    type Scope = ();
    type Item = LiveStreamEntity;

    async fn load(&self, _scope: &()) -> Result<Vec<LiveStreamEntity>> {
        self.live_stream_repository.list_live().await
    }

    fn channel(&self, _scope: &()) -> ChannelSpec {
        ChannelSpec::new("live_directory").with(ChangeFilter::table("live_streams"))
    }

    async fn on_change(&self, _scope: &(), _event: &ChangeEvent) -> Result<ViewUpdate<LiveStreamEntity>> {
        Ok(ViewUpdate::Reload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::{
        domain::repositories::live_streams::MockLiveStreamRepository,
        infra::realtime::broadcast_feed::BroadcastChangeFeed,
        realtime::{
            change_feed::ChangeFeed,
            scoped_view::{ScopedView, ViewDelta},
        },
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn live(viewer_count: i32) -> LiveStreamEntity {
        let now = Utc::now();
        LiveStreamEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "On air".to_string(),
            description: None,
            thumbnail_url: None,
            is_live: true,
            viewer_count,
            gift_total: 0,
            started_at: Some(now),
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn any_stream_change_reloads_the_directory() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let mut streams = MockLiveStreamRepository::new();
        streams.expect_list_live().returning(move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            let rows = if call == 0 { vec![] } else { vec![live(12)] };
            Box::pin(async move { Ok(rows) })
        });

        let feed = Arc::new(BroadcastChangeFeed::new(16));
        let (tx, mut rx) = mpsc::channel(8);
        let mut view = ScopedView::new(
            Arc::new(LiveDirectorySource::new(Arc::new(streams))),
            Arc::clone(&feed) as Arc<dyn ChangeFeed>,
            tx,
        );
        view.switch_scope(()).await.unwrap();
        assert_eq!(rx.recv().await, Some(ViewDelta::Reset(vec![])));

        feed.publish(ChangeEvent::update("live_streams", &json!({ "id": Uuid::new_v4() })).unwrap());

        let Some(ViewDelta::Reset(rows)) = rx.recv().await else {
            panic!("expected a reload");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}

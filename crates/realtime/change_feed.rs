use anyhow::Result;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One committed row change. `commit_id` is assigned by the feed on publish and is
/// strictly increasing across the whole feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub commit_id: u64,
    pub table: String,
    pub kind: ChangeKind,
    pub new: Option<Value>,
    pub old: Option<Value>,
}

impl ChangeEvent {
    pub fn insert(table: &str, row: &impl Serialize) -> Result<Self> {
        Ok(Self {
            commit_id: 0,
            table: table.to_string(),
            kind: ChangeKind::Insert,
            new: Some(serde_json::to_value(row)?),
            old: None,
        })
    }

    pub fn update(table: &str, row: &impl Serialize) -> Result<Self> {
        Ok(Self {
            commit_id: 0,
            table: table.to_string(),
            kind: ChangeKind::Update,
            new: Some(serde_json::to_value(row)?),
            old: None,
        })
    }

    /// Update carrying both row images, for subscribers that react to a column transition.
    pub fn update_from(table: &str, old: &impl Serialize, new: &impl Serialize) -> Result<Self> {
        Ok(Self {
            commit_id: 0,
            table: table.to_string(),
            kind: ChangeKind::Update,
            new: Some(serde_json::to_value(new)?),
            old: Some(serde_json::to_value(old)?),
        })
    }

    pub fn delete(table: &str, row: &impl Serialize) -> Result<Self> {
        Ok(Self {
            commit_id: 0,
            table: table.to_string(),
            kind: ChangeKind::Delete,
            new: None,
            old: Some(serde_json::to_value(row)?),
        })
    }

    /// Column value from the new row image, falling back to the old one for deletes.
    pub fn column(&self, column: &str) -> Option<&Value> {
        self.new
            .as_ref()
            .and_then(|row| row.get(column))
            .or_else(|| self.old.as_ref().and_then(|row| row.get(column)))
    }

    pub fn new_row<T: DeserializeOwned>(&self) -> Result<T> {
        let row = self
            .new
            .clone()
            .ok_or_else(|| anyhow::anyhow!("{} {:?} event carries no new row", self.table, self.kind))?;
        Ok(serde_json::from_value(row)?)
    }

    pub fn old_row<T: DeserializeOwned>(&self) -> Result<T> {
        let row = self
            .old
            .clone()
            .ok_or_else(|| anyhow::anyhow!("{} {:?} event carries no old row", self.table, self.kind))?;
        Ok(serde_json::from_value(row)?)
    }
}

/// Table + event + single-column equality, the shape the hosted realtime service accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeFilter {
    pub table: String,
    pub kind: Option<ChangeKind>,
    pub column_eq: Option<(String, Value)>,
}

impl ChangeFilter {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            kind: None,
            column_eq: None,
        }
    }

    pub fn on(mut self, kind: ChangeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.column_eq = Some((column.to_string(), value.into()));
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if self.table != event.table {
            return false;
        }
        if self.kind.is_some_and(|kind| kind != event.kind) {
            return false;
        }
        match &self.column_eq {
            Some((column, expected)) => event.column(column) == Some(expected),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub name: String,
    pub filters: Vec<ChangeFilter>,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
        }
    }

    pub fn with(mut self, filter: ChangeFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// A channel receives an event when any of its filters accepts it.
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.filters.iter().any(|filter| filter.matches(event))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Change(ChangeEvent),
    /// The subscriber fell behind and `n` events were dropped; the view must refetch.
    Missed(u64),
}

/// A live subscription. Dropping it unsubscribes.
pub struct ChangeSubscription {
    spec: ChannelSpec,
    receiver: broadcast::Receiver<ChangeEvent>,
    _registration: Box<dyn Send + Sync>,
}

impl ChangeSubscription {
    pub fn new(
        spec: ChannelSpec,
        receiver: broadcast::Receiver<ChangeEvent>,
        registration: impl Send + Sync + 'static,
    ) -> Self {
        Self {
            spec,
            receiver,
            _registration: Box::new(registration),
        }
    }

    pub fn channel(&self) -> &str {
        &self.spec.name
    }

    /// Next notification for this channel. `None` once the feed is gone.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.spec.matches(&event) => {
                    return Some(Notification::Change(event));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(channel = %self.spec.name, skipped, "realtime: subscription lagged");
                    return Some(Notification::Missed(skipped));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, spec: ChannelSpec) -> ChangeSubscription;

    /// Stamps the event with the next commit id, fans it out and returns that id.
    fn publish(&self, event: ChangeEvent) -> u64;

    fn active_subscriptions(&self) -> usize;

    /// Channel names of the live subscriptions, sorted.
    fn active_channels(&self) -> Vec<String>;
}

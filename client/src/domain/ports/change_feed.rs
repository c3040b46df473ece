//! Change feed port
//!
//! Push delivery of row changes over a persistent connection. A subscription
//! is an owned resource: the connection stays open until the handle is closed
//! or dropped.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::entities::{PostId, PostPatch};
use crate::error::DomainError;

/// Tables the client listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeTable {
    Posts,
    Likes,
}

impl ChangeTable {
    pub fn name(&self) -> &'static str {
        match self {
            ChangeTable::Posts => "posts",
            ChangeTable::Likes => "likes",
        }
    }
}

impl std::str::FromStr for ChangeTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(ChangeTable::Posts),
            "likes" => Ok(ChangeTable::Likes),
            _ => Err(format!("Unsubscribed table: {}", s)),
        }
    }
}

/// A row change pushed by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A post row was inserted; only the id is trusted, the full row is refetched
    PostInserted(PostId),
    PostUpdated(PostPatch),
    PostDeleted(PostId),
    /// Any insert or delete on the likes table
    LikesChanged,
}

type CloseFn = Box<dyn FnOnce() + Send>;

/// Closes the underlying connection when closed or dropped
pub struct SubscriptionHandle {
    on_close: Option<CloseFn>,
}

impl SubscriptionHandle {
    pub fn new(on_close: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_close: Some(Box::new(on_close)),
        }
    }

    pub fn close(mut self) {
        self.run_close();
    }

    fn run_close(&mut self) {
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.run_close();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("open", &self.on_close.is_some())
            .finish()
    }
}

/// An open change subscription
#[derive(Debug)]
pub struct Subscription {
    handle: SubscriptionHandle,
    events: mpsc::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn new(events: mpsc::Receiver<ChangeEvent>, handle: SubscriptionHandle) -> Self {
        Self { handle, events }
    }

    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Separate the close handle from the event stream so they can be owned
    /// by different tasks
    pub fn split(self) -> (SubscriptionHandle, mpsc::Receiver<ChangeEvent>) {
        (self.handle, self.events)
    }

    pub fn close(self) {
        self.handle.close();
    }
}

/// Opens change subscriptions
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Subscribe to inserts, updates and deletes on `tables` under `topic`
    async fn subscribe(
        &self,
        topic: &str,
        tables: &[ChangeTable],
    ) -> Result<Subscription, DomainError>;
}

//! Conversation handles.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::models::options::AskOptions;

/// A multi-turn conversation.
///
/// Cheap to clone; clones share state, so a follow-up asked through any
/// clone continues the same server-side thread. The server-side thread
/// reference (`backend_uuid`) is captured from the first exchange and
/// attached to every subsequent ask.
#[derive(Debug, Clone)]
pub struct Conversation {
    inner: Arc<ConversationInner>,
}

#[derive(Debug)]
struct ConversationInner {
    id: Uuid,
    defaults: Option<AskOptions>,
    backend_uuid: Mutex<Option<String>>,
}

impl Conversation {
    pub(crate) fn new(defaults: Option<AskOptions>) -> Self {
        Self {
            inner: Arc::new(ConversationInner {
                id: Uuid::new_v4(),
                defaults,
                backend_uuid: Mutex::new(None),
            }),
        }
    }

    /// Client-side identifier, useful for correlating logs.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Server-side thread reference, `None` until the first exchange
    /// completes its first update.
    pub fn backend_uuid(&self) -> Option<String> {
        self.inner
            .backend_uuid
            .lock()
            .map(|g| g.clone())
            .unwrap_or(None)
    }

    /// Whether this conversation has had at least one exchange.
    pub fn has_history(&self) -> bool {
        self.backend_uuid().is_some()
    }

    /// Options applied to asks on this conversation, when set at creation.
    pub(crate) fn defaults(&self) -> Option<&AskOptions> {
        self.inner.defaults.as_ref()
    }

    /// Record the thread reference from a stream update. First writer
    /// wins; the upstream repeats the same value on later updates.
    pub(crate) fn record_backend_uuid(&self, uuid: &str) {
        if let Ok(mut guard) = self.inner.backend_uuid.lock() {
            if guard.is_none() {
                *guard = Some(uuid.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_thread_reference() {
        let conversation = Conversation::new(None);
        let clone = conversation.clone();
        assert!(!clone.has_history());

        conversation.record_backend_uuid("uuid-1");
        assert_eq!(clone.backend_uuid().as_deref(), Some("uuid-1"));
    }

    #[test]
    fn first_recorded_uuid_wins() {
        let conversation = Conversation::new(None);
        conversation.record_backend_uuid("first");
        conversation.record_backend_uuid("second");
        assert_eq!(conversation.backend_uuid().as_deref(), Some("first"));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(Conversation::new(None).id(), Conversation::new(None).id());
    }
}

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use indexmap::IndexMap;

use super::tag::{Tag, TagList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Who changed the tag list. The named listener is skipped on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Listener(ListenerId),
    Host,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsChanged {
    pub origin: ChangeOrigin,
    pub revision: u64,
}

/// Receiving end of a listener registration.
#[derive(Debug)]
pub struct TagSubscription {
    id: ListenerId,
    events: Receiver<TagsChanged>,
}

impl TagSubscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn origin(&self) -> ChangeOrigin {
        ChangeOrigin::Listener(self.id)
    }

    /// Drains queued events and returns the newest one.
    pub fn drain(&self) -> Option<TagsChanged> {
        let mut latest = None;
        loop {
            match self.events.try_recv() {
                Ok(event) => latest = Some(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        latest
    }

    pub fn has_pending(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Form data shared by the POI editing screens: the tag list plus the
/// listeners interested in changes to it.
#[derive(Debug, Default)]
pub struct EditPoiData {
    tags: TagList,
    listeners: IndexMap<ListenerId, Sender<TagsChanged>>,
    next_listener: u64,
    revision: u64,
}

impl EditPoiData {
    pub fn new(tags: TagList) -> Self {
        Self {
            tags,
            ..Self::default()
        }
    }

    pub fn tags(&self) -> &TagList {
        &self.tags
    }

    /// Direct access for callers that notify on their own terms.
    pub fn tags_mut(&mut self) -> &mut TagList {
        &mut self.tags
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn add_listener(&mut self) -> TagSubscription {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        let (tx, rx) = unbounded();
        self.listeners.insert(id, tx);
        tracing::debug!(listener = id.0, "registered tag listener");
        TagSubscription { id, events: rx }
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let removed = self.listeners.shift_remove(&id).is_some();
        if removed {
            tracing::debug!(listener = id.0, "removed tag listener");
        }
        removed
    }

    /// Bumps the revision and tells every listener except `origin`.
    /// Returns the number of listeners reached.
    pub fn notify_tags_changed(&mut self, origin: ChangeOrigin) -> usize {
        self.revision += 1;
        let event = TagsChanged {
            origin,
            revision: self.revision,
        };
        let mut delivered = 0;
        self.listeners.retain(|id, tx| {
            if ChangeOrigin::Listener(*id) == origin {
                return true;
            }
            match tx.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    tracing::debug!(listener = id.0, "dropping disconnected tag listener");
                    false
                }
            }
        });
        delivered
    }

    /// Applies `f` to the tag list, then notifies everyone but `origin`.
    pub fn update_tags<F, T>(&mut self, origin: ChangeOrigin, f: F) -> T
    where
        F: FnOnce(&mut TagList) -> T,
    {
        let result = f(&mut self.tags);
        self.notify_tags_changed(origin);
        result
    }

    pub fn replace_tags<I>(&mut self, tags: I)
    where
        I: IntoIterator<Item = Tag>,
    {
        self.update_tags(ChangeOrigin::Host, |list| list.replace_all(tags));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn notify_skips_origin_listener() {
        let mut data = EditPoiData::default();
        let first = data.add_listener();
        let second = data.add_listener();

        data.update_tags(first.origin(), |tags| tags.push(Tag::new("name", "Cafe")));

        assert_eq!(data.tags().len(), 1);
        assert!(first.drain().is_none());
        assert_matches!(
            second.drain(),
            Some(TagsChanged { origin: ChangeOrigin::Listener(id), revision: 1 }) if id == first.id()
        );
    }

    #[test]
    fn removed_listener_receives_nothing() {
        let mut data = EditPoiData::default();
        let sub = data.add_listener();
        assert!(data.remove_listener(sub.id()));
        assert_eq!(data.notify_tags_changed(ChangeOrigin::Host), 0);
        assert!(sub.drain().is_none());
        assert!(!data.remove_listener(sub.id()));
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let mut data = EditPoiData::default();
        let kept = data.add_listener();
        drop(data.add_listener());
        assert_eq!(data.listener_count(), 2);

        assert_eq!(data.notify_tags_changed(ChangeOrigin::Host), 1);
        assert_eq!(data.listener_count(), 1);
        assert!(kept.has_pending());
    }

    #[test]
    fn drain_returns_latest_revision() {
        let mut data = EditPoiData::default();
        let sub = data.add_listener();
        data.replace_tags([Tag::new("a", "1")]);
        data.replace_tags([Tag::new("a", "2")]);
        let event = sub.drain().expect("event");
        assert_eq!(event.revision, 2);
        assert_eq!(data.revision(), 2);
        assert!(!sub.has_pending());
    }
}

//! An ordered, duplicate-free mapping from keys to observers.

use crate::common::ObserverId;
use slotmap::SlotMap;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Holds every registered observer once, plus the per-key subscription order.
///
/// `O` is usually a trait object such as `dyn TopicObserver`. Observers are
/// identified by the address of their shared allocation, so registering a
/// clone of the same `Arc` is recognised as the same observer.
pub struct Registry<K, O: ?Sized> {
    observers: SlotMap<ObserverId, Arc<O>>,
    subscriptions: HashMap<K, Vec<ObserverId>>,
}

impl<K, O> Registry<K, O>
where
    K: Copy + Eq + Hash,
    O: ?Sized,
{
    pub fn new() -> Self {
        Self {
            observers: SlotMap::with_key(),
            subscriptions: HashMap::new(),
        }
    }

    /// Subscribes `observer` under `key`.
    ///
    /// Returns the observer's id and whether the subscription is new. A repeated
    /// subscription changes nothing and keeps the original position.
    pub fn insert(&mut self, key: K, observer: Arc<O>) -> (ObserverId, bool) {
        let id = match self.find(&observer) {
            Some(id) => id,
            None => self.observers.insert(observer),
        };
        let ids = self.subscriptions.entry(key).or_default();
        if ids.contains(&id) {
            (id, false)
        } else {
            ids.push(id);
            (id, true)
        }
    }

    /// Unsubscribes `id` from `key`. Returns `true` if it was subscribed.
    ///
    /// An observer left without any subscription is released.
    pub fn remove(&mut self, key: K, id: ObserverId) -> bool {
        let Some(ids) = self.subscriptions.get_mut(&key) else {
            return false;
        };
        let Some(position) = ids.iter().position(|candidate| *candidate == id) else {
            return false;
        };
        ids.remove(position);
        if ids.is_empty() {
            self.subscriptions.remove(&key);
        }
        if !self.is_subscribed_anywhere(id) {
            self.observers.remove(id);
        }
        true
    }

    /// Unsubscribes `id` from every key. Returns the keys it was removed from.
    pub fn remove_everywhere(&mut self, id: ObserverId) -> Vec<K> {
        let keys: Vec<K> = self
            .subscriptions
            .iter()
            .filter(|(_, ids)| ids.contains(&id))
            .map(|(key, _)| *key)
            .collect();
        for key in &keys {
            self.remove(*key, id);
        }
        keys
    }

    /// The id of an already registered observer, if any.
    pub fn find(&self, observer: &Arc<O>) -> Option<ObserverId> {
        self.observers
            .iter()
            .find(|(_, existing)| same_observer(existing, observer))
            .map(|(id, _)| id)
    }

    pub fn contains(&self, key: K, id: ObserverId) -> bool {
        self.subscriptions
            .get(&key)
            .is_some_and(|ids| ids.contains(&id))
    }

    /// The observers subscribed under `key`, in subscription order.
    pub fn subscribers(&self, key: K) -> impl Iterator<Item = (ObserverId, &Arc<O>)> + '_ {
        self.subscriptions
            .get(&key)
            .into_iter()
            .flatten()
            .filter_map(|id| self.observers.get(*id).map(|observer| (*id, observer)))
    }

    /// Number of subscriptions under `key`.
    pub fn count(&self, key: K) -> usize {
        self.subscriptions.get(&key).map_or(0, Vec::len)
    }

    /// Number of distinct observers across all keys.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    fn is_subscribed_anywhere(&self, id: ObserverId) -> bool {
        self.subscriptions.values().any(|ids| ids.contains(&id))
    }
}

impl<K, O> Default for Registry<K, O>
where
    K: Copy + Eq + Hash,
    O: ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

// Compares data addresses only; vtable pointers of the same type may differ
// between codegen units.
fn same_observer<O: ?Sized>(a: &Arc<O>, b: &Arc<O>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Topic;
    use std::fmt::Debug;

    trait Named: Debug + Send + Sync {
        fn name(&self) -> &str;
    }

    #[derive(Debug)]
    struct Probe(&'static str);

    impl Named for Probe {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn probe(name: &'static str) -> Arc<dyn Named> {
        Arc::new(Probe(name))
    }

    fn names(registry: &Registry<Topic, dyn Named>, topic: Topic) -> Vec<&str> {
        registry.subscribers(topic).map(|(_, o)| o.name()).collect()
    }

    #[test]
    fn duplicate_registration_is_a_no_op() {
        let mut registry = Registry::new();
        let a = probe("a");
        let (first, added) = registry.insert(Topic::Second, a.clone());
        assert!(added);
        let (second, added) = registry.insert(Topic::Second, a.clone());
        assert!(!added);
        assert_eq!(first, second);
        assert_eq!(registry.count(Topic::Second), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut registry = Registry::new();
        let (a, b, c) = (probe("a"), probe("b"), probe("c"));
        registry.insert(Topic::Minute, b.clone());
        registry.insert(Topic::Minute, a.clone());
        registry.insert(Topic::Minute, c.clone());
        registry.insert(Topic::Minute, a);
        assert_eq!(names(&registry, Topic::Minute), vec!["b", "a", "c"]);
    }

    #[test]
    fn one_observer_keeps_one_id_across_topics() {
        let mut registry = Registry::new();
        let a = probe("a");
        let ids: Vec<_> = Topic::ALL
            .into_iter()
            .map(|topic| registry.insert(topic, a.clone()).0)
            .collect();
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_is_scoped_to_the_topic() {
        let mut registry = Registry::new();
        let a = probe("a");
        let (id, _) = registry.insert(Topic::Second, a.clone());
        registry.insert(Topic::Minute, a);

        assert!(registry.remove(Topic::Second, id));
        assert!(!registry.contains(Topic::Second, id));
        assert!(registry.contains(Topic::Minute, id));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(Topic::Minute, id));
        assert!(registry.is_empty());
    }

    #[test]
    fn removing_unknown_entries_is_a_no_op() {
        let mut registry: Registry<Topic, dyn Named> = Registry::new();
        let (id, _) = registry.insert(Topic::Second, probe("a"));
        assert!(!registry.remove(Topic::Punctually, id));
        assert!(registry.remove(Topic::Second, id));
        assert!(!registry.remove(Topic::Second, id));
        assert_eq!(names(&registry, Topic::Second), Vec::<&str>::new());
    }

    #[test]
    fn released_ids_are_not_reused() {
        let mut registry = Registry::new();
        let (old, _) = registry.insert(Topic::Second, probe("a"));
        registry.remove(Topic::Second, old);
        let (new, _) = registry.insert(Topic::Second, probe("b"));
        assert_ne!(old, new);
        assert!(!registry.remove(Topic::Second, old));
        assert_eq!(names(&registry, Topic::Second), vec!["b"]);
    }

    #[test]
    fn remove_everywhere_clears_all_topics() {
        let mut registry = Registry::new();
        let (a, b) = (probe("a"), probe("b"));
        let (id, _) = registry.insert(Topic::Second, a.clone());
        registry.insert(Topic::Punctually, a);
        registry.insert(Topic::Second, b);

        let mut removed = registry.remove_everywhere(id);
        removed.sort();
        assert_eq!(removed, vec![Topic::Second, Topic::Punctually]);
        assert_eq!(names(&registry, Topic::Second), vec!["b"]);
        assert_eq!(registry.len(), 1);
    }
}

//! Watch stream adapter
//!
//! `kube::runtime::watcher` reports the current state of objects, not
//! transitions. [`EventTranslator`] remembers the last state of every object
//! so updates can be presented to the predicate as old/new pairs, and
//! [`filter_events`] keeps only the events the predicate accepts.

use futures::{Stream, StreamExt};
use kube::runtime::watcher;
use std::collections::{HashMap, HashSet};

use crate::object::ClusterObject;
use crate::predicate::{EventPredicate, ObjectEvent};

/// Turns watcher events into create/update/delete events
#[derive(Debug)]
pub struct EventTranslator<K> {
    /// Last seen state, by uid (or namespace/name for uid-less objects)
    seen: HashMap<String, K>,
    /// Keys listed since the last `Init`, while a relist is in progress
    relisted: Option<HashSet<String>>,
}

impl<K> Default for EventTranslator<K> {
    fn default() -> Self {
        Self {
            seen: HashMap::new(),
            relisted: None,
        }
    }
}

impl<K: ClusterObject + Clone> EventTranslator<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently known
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Translate one watcher event.
    ///
    /// A relist (`Init` .. `InitDone`) produces updates for known objects
    /// and deletes for objects that vanished while the watch was down.
    pub fn translate(&mut self, event: watcher::Event<K>) -> Vec<ObjectEvent<K>> {
        match event {
            watcher::Event::Init => {
                self.relisted = Some(HashSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(obj) => {
                if let Some(relisted) = self.relisted.as_mut() {
                    relisted.insert(object_key(&obj));
                }
                vec![self.apply(obj)]
            }
            watcher::Event::InitDone => {
                let Some(relisted) = self.relisted.take() else {
                    return Vec::new();
                };
                let vanished: Vec<String> = self
                    .seen
                    .keys()
                    .filter(|key| !relisted.contains(*key))
                    .cloned()
                    .collect();
                vanished
                    .into_iter()
                    .filter_map(|key| self.seen.remove(&key))
                    .map(ObjectEvent::Delete)
                    .collect()
            }
            watcher::Event::Apply(obj) => vec![self.apply(obj)],
            watcher::Event::Delete(obj) => {
                self.seen.remove(&object_key(&obj));
                vec![ObjectEvent::Delete(obj)]
            }
        }
    }

    fn apply(&mut self, obj: K) -> ObjectEvent<K> {
        match self.seen.insert(object_key(&obj), obj.clone()) {
            Some(old) => ObjectEvent::Update { old, new: obj },
            None => ObjectEvent::Create(obj),
        }
    }
}

fn object_key(obj: &dyn ClusterObject) -> String {
    match obj.metadata().uid.as_deref() {
        Some(uid) if !uid.is_empty() => uid.to_string(),
        _ => format!("{}/{}", obj.namespace(), obj.name()),
    }
}

/// Keep only the events that must reconcile the composite resource.
///
/// Watch errors are passed through untouched.
pub fn filter_events<K, S>(
    stream: S,
    predicate: EventPredicate,
) -> impl Stream<Item = Result<ObjectEvent<K>, watcher::Error>>
where
    K: ClusterObject + Clone,
    S: Stream<Item = Result<watcher::Event<K>, watcher::Error>>,
{
    let mut translator = EventTranslator::new();

    stream.flat_map(move |item| {
        let events: Vec<Result<ObjectEvent<K>, watcher::Error>> = match item {
            Ok(event) => translator
                .translate(event)
                .into_iter()
                .filter(|event| predicate.evaluate(event))
                .map(Ok)
                .collect(),
            Err(e) => vec![Err(e)],
        };
        futures::stream::iter(events)
    })
}

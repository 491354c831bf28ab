use std::collections::HashMap;

use serde_json::Value;

/// Returned by `bind`, used to `unbind` a single handler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerKey(u64);

type Handler = Box<dyn FnMut(&Value)>;

/// Local publish/subscribe keyed by event name.
///
/// Handlers run synchronously inside `trigger`, in bind order.
#[derive(Default)]
pub struct Events {
    handlers: HashMap<String, Vec<(HandlerKey, Handler)>>,
    next_key: u64,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<F>(&mut self, event: &str, handler: F) -> HandlerKey
    where
        F: FnMut(&Value) + 'static,
    {
        let key = HandlerKey(self.next_key);
        self.next_key += 1;
        self.handlers
            .entry(event.to_string())
            .or_default()
            .push((key, Box::new(handler)));
        key
    }

    pub fn unbind(&mut self, event: &str, key: HandlerKey) -> bool {
        let Some(list) = self.handlers.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(handler_key, _)| *handler_key != key);
        let removed = list.len() != before;
        if list.is_empty() {
            self.handlers.remove(event);
        }
        removed
    }

    pub fn has_handlers(&self, event: &str) -> bool {
        self.handlers
            .get(event)
            .is_some_and(|list| !list.is_empty())
    }

    /// Run every handler bound to `event`, returning how many ran
    pub fn trigger(&mut self, event: &str, data: &Value) -> usize {
        let Some(list) = self.handlers.get_mut(event) else {
            return 0;
        };
        for (_, handler) in list.iter_mut() {
            handler(data);
        }
        list.len()
    }
}

/// Anything exposing an `Events` registry gets `bind`/`unbind`/`trigger`
pub trait Evented {
    fn events_mut(&mut self) -> &mut Events;

    fn bind<F>(&mut self, event: &str, handler: F) -> HandlerKey
    where
        F: FnMut(&Value) + 'static,
        Self: Sized,
    {
        self.events_mut().bind(event, handler)
    }

    fn unbind(&mut self, event: &str, key: HandlerKey) -> bool {
        self.events_mut().unbind(event, key)
    }

    fn trigger(&mut self, event: &str, data: &Value) -> usize {
        self.events_mut().trigger(event, data)
    }
}

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

/// The "target window" half of a messenger: something that can carry a
/// serialized message to another window.
pub trait WindowPort {
    /// `Err` carries why the target window refused the message
    fn post_message(&mut self, message: &str, target_origin: &str) -> Result<(), String>;
}

/// A message as it arrives at the receiving window
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostedMessage {
    pub data: String,
    pub origin: String,
    pub target_origin: String,
}

/// A one-directional in-memory port. Posting appends to a shared queue which
/// the other side drains; the sender's origin is stamped on every message,
/// the way a browser stamps `MessageEvent.origin`.
///
/// Clones share the queue and whether the target window is closed.
#[derive(Clone, Debug)]
pub struct QueuePort {
    origin: String,
    queue: Rc<RefCell<VecDeque<PostedMessage>>>,
    closed: Rc<Cell<bool>>,
}

impl QueuePort {
    pub fn new(origin: &str, queue: Rc<RefCell<VecDeque<PostedMessage>>>) -> Self {
        Self::with_closed_flag(origin, queue, Rc::new(Cell::new(false)))
    }

    /// A port whose target window is closed once `closed` is set
    pub fn with_closed_flag(
        origin: &str,
        queue: Rc<RefCell<VecDeque<PostedMessage>>>,
        closed: Rc<Cell<bool>>,
    ) -> Self {
        Self {
            origin: origin.to_string(),
            queue,
            closed,
        }
    }

    /// The target window went away; every later post is refused
    pub fn close(&self) {
        self.closed.set(true);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl WindowPort for QueuePort {
    fn post_message(&mut self, message: &str, target_origin: &str) -> Result<(), String> {
        if self.closed.get() {
            return Err("target window is closed".to_string());
        }
        self.queue.borrow_mut().push_back(PostedMessage {
            data: message.to_string(),
            origin: self.origin.clone(),
            target_origin: target_origin.to_string(),
        });
        Ok(())
    }
}

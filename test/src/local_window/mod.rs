/// In-memory window messaging for E2E testing
/// Carries posted messages between a pane window and a preview window
/// without a browser, stamping each with its sender's origin

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use livesync_shared::{PostedMessage, QueuePort};

pub const PANE_URL: &str = "https://example.org/wp-admin/customize.php";
pub const PREVIEW_URL: &str = "https://example.org/";

type Inbox = Rc<RefCell<VecDeque<PostedMessage>>>;

/// Pair of connected windows. Whatever the pane posts lands in the
/// preview's inbox and the other way round.
pub struct LocalWindowPair {
    pane_origin: String,
    preview_origin: String,
    pane_inbox: Inbox,
    preview_inbox: Inbox,
}

impl LocalWindowPair {
    pub fn new() -> Self {
        Self::with_origins(PANE_URL, PREVIEW_URL)
    }

    pub fn with_origins(pane_url: &str, preview_url: &str) -> Self {
        Self {
            pane_origin: origin_of(pane_url),
            preview_origin: origin_of(preview_url),
            pane_inbox: Rc::new(RefCell::new(VecDeque::new())),
            preview_inbox: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Port the pane posts to the preview through
    pub fn pane_port(&self) -> Box<QueuePort> {
        Box::new(QueuePort::new(&self.pane_origin, self.preview_inbox.clone()))
    }

    /// Port the preview posts to the pane through
    pub fn preview_port(&self) -> Box<QueuePort> {
        Box::new(QueuePort::new(&self.preview_origin, self.pane_inbox.clone()))
    }

    /// Port for a third window posting into the pane's inbox from `origin`
    pub fn foreign_port(&self, origin: &str) -> Box<QueuePort> {
        Box::new(QueuePort::new(origin, self.pane_inbox.clone()))
    }

    pub fn take_for_pane(&self) -> Vec<PostedMessage> {
        self.pane_inbox.borrow_mut().drain(..).collect()
    }

    pub fn take_for_preview(&self) -> Vec<PostedMessage> {
        self.preview_inbox.borrow_mut().drain(..).collect()
    }

    /// Inject a raw message into the pane's inbox as if `origin` posted it
    pub fn post_to_pane(&self, data: &str, origin: &str) {
        self.pane_inbox.borrow_mut().push_back(PostedMessage {
            data: data.to_string(),
            origin: origin.to_string(),
            target_origin: self.pane_origin.clone(),
        });
    }

    /// Inject a raw message into the preview's inbox as if `origin` posted it
    pub fn post_to_preview(&self, data: &str, origin: &str) {
        self.preview_inbox.borrow_mut().push_back(PostedMessage {
            data: data.to_string(),
            origin: origin.to_string(),
            target_origin: self.preview_origin.clone(),
        });
    }

    /// Names of the events waiting in the pane's inbox, without taking them
    pub fn pending_for_pane(&self) -> Vec<String> {
        event_names(&self.pane_inbox)
    }

    pub fn pending_for_preview(&self) -> Vec<String> {
        event_names(&self.preview_inbox)
    }

    pub fn is_idle(&self) -> bool {
        self.pane_inbox.borrow().is_empty() && self.preview_inbox.borrow().is_empty()
    }
}

impl Default for LocalWindowPair {
    fn default() -> Self {
        Self::new()
    }
}

fn event_names(inbox: &Inbox) -> Vec<String> {
    inbox
        .borrow()
        .iter()
        .filter_map(|message| serde_json::from_str::<serde_json::Value>(&message.data).ok())
        .filter_map(|value| value.get("event")?.as_str().map(str::to_string))
        .collect()
}

// scheme://host[:port] of an absolute URL
fn origin_of(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority = rest.split('/').next().unwrap_or(rest);
    format!("{}://{}", scheme, authority)
}

use log::{trace, warn};
use serde::Serialize;
use serde_json::Value;
use url::{Origin, Url};

use crate::{
    events::{Evented, Events},
    messenger::{envelope::Envelope, error::MessengerError, port::WindowPort},
    types::ChannelId,
};

/// Sending half of the messaging capability
pub trait Messaging {
    fn send_value(&mut self, event: &str, data: Value) -> Result<(), MessengerError>;
}

/// Bidirectional, typed messaging between two windows.
///
/// Outgoing events are wrapped in an `Envelope` tagged with the channel id and
/// posted to the target window. Incoming raw messages are accepted only when
/// both their origin and channel id match; everything else is dropped without
/// complaint.
pub struct Messenger {
    channel: Option<ChannelId>,
    remote_origin: Origin,
    target_origin: String,
    port: Box<dyn WindowPort>,
    events: Events,
}

impl Messenger {
    /// `remote_url` is the URL of the window on the other end. Its origin is
    /// the only origin messages are accepted from and posted to.
    pub fn new(
        remote_url: &str,
        channel: Option<ChannelId>,
        port: Box<dyn WindowPort>,
    ) -> Result<Self, MessengerError> {
        let url = Url::parse(remote_url).map_err(|err| MessengerError::InvalidRemoteUrl {
            url: remote_url.to_string(),
            reason: err.to_string(),
        })?;
        let remote_origin = url.origin();
        if !remote_origin.is_tuple() {
            return Err(MessengerError::OpaqueOrigin {
                url: remote_url.to_string(),
            });
        }
        let target_origin = remote_origin.ascii_serialization();

        Ok(Self {
            channel,
            remote_origin,
            target_origin,
            port,
            events: Events::new(),
        })
    }

    pub fn channel(&self) -> Option<&ChannelId> {
        self.channel.as_ref()
    }

    pub fn origin(&self) -> &Origin {
        &self.remote_origin
    }

    /// Post `event` to the other window. Delivery is not acknowledged.
    pub fn send<T: Serialize + ?Sized>(&mut self, event: &str, data: &T) -> Result<(), MessengerError> {
        let data = serde_json::to_value(data).map_err(|err| MessengerError::SerializationFailed {
            event: event.to_string(),
            reason: err.to_string(),
        })?;
        self.send_value(event, data)
    }

    /// Filter one raw incoming message. Accepted envelopes are dispatched to
    /// local handlers and returned; rejected ones yield `None`.
    pub fn receive(&mut self, raw: &str, origin: &str) -> Option<Envelope> {
        if !self.accepts_origin(origin) {
            trace!("dropping message from untrusted origin {:?}", origin);
            return None;
        }

        let Some(envelope) = Envelope::parse(raw) else {
            trace!("dropping message that is not an envelope");
            return None;
        };

        if !envelope.matches_channel(self.channel.as_ref()) {
            trace!(
                "dropping message for channel {:?} (expecting {:?})",
                envelope.id,
                self.channel
            );
            return None;
        }

        trace!("received event {:?}", envelope.event);
        self.events.trigger(&envelope.event, &envelope.data);
        Some(envelope)
    }

    fn accepts_origin(&self, origin: &str) -> bool {
        match Url::parse(origin) {
            Ok(url) => url.origin() == self.remote_origin,
            Err(_) => false,
        }
    }
}

impl Messaging for Messenger {
    fn send_value(&mut self, event: &str, data: Value) -> Result<(), MessengerError> {
        let envelope = Envelope::new(self.channel.clone(), event, data);
        let message = envelope
            .to_json()
            .map_err(|err| MessengerError::SerializationFailed {
                event: event.to_string(),
                reason: err.to_string(),
            })?;

        trace!("sending event {:?}", event);
        self.port
            .post_message(&message, &self.target_origin)
            .map_err(|reason| {
                warn!("failed to post event {:?}: {}", event, reason);
                MessengerError::PostFailed {
                    event: event.to_string(),
                    reason,
                }
            })
    }
}

impl Evented for Messenger {
    fn events_mut(&mut self) -> &mut Events {
        &mut self.events
    }
}

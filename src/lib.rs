//! Organizer-side client for the Haaflah event platform.
//!
//! The remote API owns persistence and validation; this crate loads an
//! event's registrations, lets an operator search, select and check in
//! participants, and keeps the local roster consistent with what the API
//! accepted.

use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    oneshot,
};

pub mod core;
pub mod error;
pub mod integrations;

/// Reply-to handle carried inside an actor request.
pub struct Rto<T> {
    tx: oneshot::Sender<anyhow::Result<T>>,
}

impl<T> Rto<T> {
    pub fn new() -> (Self, oneshot::Receiver<anyhow::Result<T>>) {
        let (tx, rx) = oneshot::channel();
        (Rto { tx }, rx)
    }

    /// Send the result back to the requester. A requester that stopped
    /// waiting is not an error.
    pub fn reply(self, value: anyhow::Result<T>) {
        let _ = self.tx.send(value);
    }
}

/// Sending half of an actor's request queue.
pub struct ActorRef<T> {
    tx: UnboundedSender<T>,
}

impl<T> Clone for ActorRef<T> {
    fn clone(&self) -> Self {
        ActorRef {
            tx: self.tx.clone(),
        }
    }
}

impl<T> ActorRef<T> {
    pub fn new() -> (Self, UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ActorRef { tx }, rx)
    }

    pub fn send(&self, msg: T) -> anyhow::Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| anyhow::anyhow!("Actor is no longer running"))
    }
}

/// Wait for an actor's reply, treating a dropped reply handle as an error.
pub async fn await_reply<T>(rx: oneshot::Receiver<anyhow::Result<T>>) -> anyhow::Result<T> {
    rx.await
        .unwrap_or_else(|_| Err(anyhow::anyhow!("Actor dropped the request")))
}

/// Send a request to an actor and wait for its reply.
///
/// `send_message!(actor, Request, Variant, args...)` builds
/// `Request::Variant(args..., rto)`.
#[macro_export]
macro_rules! send_message {
    ($actor:expr, $request:ident, $variant:ident $(, $arg:expr)* $(,)?) => {{
        let (rto, rx) = $crate::Rto::new();
        match $actor.send($request::$variant($($arg,)* rto)) {
            Ok(()) => $crate::await_reply(rx).await,
            Err(e) => Err(e),
        }
    }};
}

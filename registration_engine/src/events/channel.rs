//! Simple stateless pub-sub event plumbing.
//!
//! Handlers receive only the event itself, never internal engine state, and each event is handled on its own
//! spawned task. Producers are cheap clones of the channel sender; when the last producer is dropped the handler
//! loop drains and shuts down.
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Dropping the internal sender lets the recv loop end once every subscriber is gone
        drop(self.sender);
        let in_flight = Arc::new(AtomicI64::new(0));
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            in_flight.fetch_add(1, Ordering::SeqCst);
            let counter = Arc::clone(&in_flight);
            tokio::spawn(async move {
                (handler)(ev).await;
                counter.fetch_sub(1, Ordering::Relaxed);
                trace!("📬️ Event handled");
            });
        }
        while in_flight.load(Ordering::SeqCst) > 0 {
            debug!("📬️ Waiting for in-flight event handlers to complete");
            tokio::time::sleep(tokio::time::Duration::from_millis(1000)).await;
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}

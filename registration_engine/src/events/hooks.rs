use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PaymentConfirmedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_confirmed_producer: Vec<EventProducer<PaymentConfirmedEvent>>,
}

pub struct EventHandlers {
    pub on_payment_confirmed: Option<EventHandler<PaymentConfirmedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_confirmed = hooks.on_payment_confirmed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_confirmed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_confirmed {
            result.payment_confirmed_producer.push(handler.subscribe());
        }
        result
    }

    /// Detach the handler loops. Hook failures are the hook's own problem; nothing here reports back to the
    /// request that emitted the event.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_confirmed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_confirmed: Option<Handler<PaymentConfirmedEvent>>,
}

impl EventHooks {
    pub fn on_payment_confirmed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentConfirmedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_confirmed = Some(Arc::new(f));
        self
    }
}

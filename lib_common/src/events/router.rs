//! # Handler Router
//!
//! Wires handlers between topics: every event arriving on a handler's input
//! topic is passed to it, and the events it returns are published to its
//! output topic. A handler error or panic is logged and the event dropped;
//! the route keeps running. All routes stop on the shutdown signal.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::events::bus::EventBus;
use crate::events::error::BusError;
use crate::events::event::Event;

/// Processes one event, producing zero or more events for the output topic.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handles `event`.
    async fn handle(&self, event: Event) -> anyhow::Result<Vec<Event>>;
}

/// Adapts an async closure into a [`Handler`].
pub struct FnHandler<F>(F);

/// Wraps `f` so it can be registered on a [`Router`].
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<Event>>> + Send,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<Event>>> + Send,
{
    async fn handle(&self, event: Event) -> anyhow::Result<Vec<Event>> {
        (self.0)(event).await
    }
}

struct Route {
    name: String,
    input: String,
    output: Option<String>,
    handler: Arc<dyn Handler>,
}

/// # Router
pub struct Router<B: EventBus + ?Sized> {
    bus: Arc<B>,
    routes: Vec<Route>,
}

impl<B: EventBus + ?Sized + 'static> Router<B> {
    /// Creates a router on `bus`.
    pub fn new(bus: Arc<B>) -> Self {
        Self {
            bus,
            routes: Vec::new(),
        }
    }

    /// Registers a handler that republishes its output to `output`.
    pub fn add_handler<H>(&mut self, name: &str, input: &str, output: &str, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.routes.push(Route {
            name: name.to_string(),
            input: input.to_string(),
            output: Some(output.to_string()),
            handler: Arc::new(handler),
        });
        self
    }

    /// Registers a terminal handler; anything it returns is discarded.
    pub fn add_consumer<H>(&mut self, name: &str, input: &str, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.routes.push(Route {
            name: name.to_string(),
            input: input.to_string(),
            output: None,
            handler: Arc::new(handler),
        });
        self
    }

    /// Subscribes every route, then processes events until `shutdown` fires
    /// or all subscriptions end. Fails only if a subscription cannot be opened.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), BusError> {
        let mut tasks = Vec::with_capacity(self.routes.len());

        for route in self.routes {
            let mut subscription = self.bus.subscribe(&route.input).await?;
            log::info!("Handler '{}' subscribed to '{}'", route.name, route.input);

            let bus = Arc::clone(&self.bus);
            let mut stop = shutdown.resubscribe();

            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = stop.recv() => {
                            log::info!("Handler '{}' shutting down", route.name);
                            break;
                        }
                        next = subscription.next() => match next {
                            Some(event) => dispatch(bus.as_ref(), &route, event).await,
                            None => {
                                log::warn!("Input '{}' of handler '{}' closed", route.input, route.name);
                                break;
                            }
                        }
                    }
                }
            }));
        }

        for task in tasks {
            if let Err(e) = task.await {
                log::error!("Router task failed: {}", e);
            }
        }
        Ok(())
    }
}

/// Runs the handler in its own task so a panic is contained, then publishes
/// its output.
async fn dispatch<B: EventBus + ?Sized>(bus: &B, route: &Route, event: Event) {
    let id = event.id;
    let handler = Arc::clone(&route.handler);
    let outcome = tokio::spawn(async move { handler.handle(event).await }).await;

    let produced = match outcome {
        Ok(Ok(produced)) => produced,
        Ok(Err(e)) => {
            log::error!("Handler '{}' failed on event {}: {:#}", route.name, id, e);
            return;
        }
        Err(e) => {
            log::error!("Handler '{}' panicked on event {}: {}", route.name, id, e);
            return;
        }
    };

    let Some(output) = &route.output else {
        return;
    };
    for event in produced {
        if let Err(e) = bus.publish(output, &event).await {
            log::error!("Handler '{}' could not publish to '{}': {}", route.name, output, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::bus::LocalBus;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    fn number(n: i64) -> Event {
        Event::json("Generic", 1, &json!({ "n": n })).unwrap()
    }

    fn value_of(event: &Event) -> i64 {
        event.decode_json::<serde_json::Value>().unwrap()["n"].as_i64().unwrap()
    }

    async fn start(router: Router<LocalBus>) -> (broadcast::Sender<()>, tokio::task::JoinHandle<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(async move {
            router.run(shutdown_rx).await.unwrap();
        });
        // Let the router open its subscriptions.
        tokio::time::sleep(Duration::from_millis(50)).await;
        (shutdown_tx, handle)
    }

    #[tokio::test]
    async fn test_handler_output_is_republished() {
        let bus = Arc::new(LocalBus::default());
        let mut out = bus.subscribe("doubled").await.unwrap();

        let mut router = Router::new(Arc::clone(&bus));
        router.add_handler(
            "doubler",
            "numbers",
            "doubled",
            handler_fn(|event: Event| async move { Ok(vec![number(value_of(&event) * 2)]) }),
        );
        let (shutdown, handle) = start(router).await;

        bus.publish("numbers", &number(21)).await.unwrap();
        let got = timeout(Duration::from_secs(1), out.next()).await.unwrap().unwrap();
        assert_eq!(value_of(&got), 42);

        shutdown.send(()).unwrap();
        timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_empty_output_publishes_nothing() {
        let bus = Arc::new(LocalBus::default());
        let mut out = bus.subscribe("evens").await.unwrap();

        let mut router = Router::new(Arc::clone(&bus));
        router.add_handler(
            "even-filter",
            "numbers",
            "evens",
            handler_fn(|event: Event| async move {
                if value_of(&event) % 2 == 0 {
                    Ok(vec![event])
                } else {
                    Ok(vec![])
                }
            }),
        );
        let (shutdown, _handle) = start(router).await;

        bus.publish("numbers", &number(1)).await.unwrap();
        bus.publish("numbers", &number(4)).await.unwrap();
        let got = timeout(Duration::from_secs(1), out.next()).await.unwrap().unwrap();
        assert_eq!(value_of(&got), 4);
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_errors_and_panics_do_not_stop_the_route() {
        let bus = Arc::new(LocalBus::default());
        let mut out = bus.subscribe("ok").await.unwrap();

        let mut router = Router::new(Arc::clone(&bus));
        router.add_handler(
            "fragile",
            "numbers",
            "ok",
            handler_fn(|event: Event| async move {
                match value_of(&event) {
                    1 => Err(anyhow::anyhow!("bad input")),
                    2 => panic!("handler blew up"),
                    _ => Ok(vec![event]),
                }
            }),
        );
        let (shutdown, _handle) = start(router).await;

        for n in [1, 2, 3] {
            bus.publish("numbers", &number(n)).await.unwrap();
        }
        let got = timeout(Duration::from_secs(1), out.next()).await.unwrap().unwrap();
        assert_eq!(value_of(&got), 3);
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_consumer_output_is_discarded() {
        let bus = Arc::new(LocalBus::default());
        let seen = Arc::new(std::sync::atomic::AtomicI64::new(0));
        let counter = Arc::clone(&seen);

        let mut router = Router::new(Arc::clone(&bus));
        router.add_consumer(
            "sink",
            "numbers",
            handler_fn(move |event: Event| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(value_of(&event), std::sync::atomic::Ordering::SeqCst);
                    Ok(vec![event])
                }
            }),
        );
        let (shutdown, handle) = start(router).await;

        bus.publish("numbers", &number(5)).await.unwrap();
        bus.publish("numbers", &number(6)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 11);

        shutdown.send(()).unwrap();
        timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }
}

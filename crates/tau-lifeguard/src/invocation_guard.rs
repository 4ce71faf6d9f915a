use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;

use crate::error_fingerprint::FailureRecord;
use crate::event_context::InvocationContext;
use crate::issue_reconciler::{report_failure, ReportOutcome};
use crate::report_loop_guard::should_skip_handler;
use crate::report_options::ReportOptions;
use crate::ticket_store::TicketStore;

/// Event name that matches every delivery.
pub const WILDCARD_EVENT: &str = "*";

pub type EventHandlerFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;
pub type EventHandler<T> =
    Arc<dyn Fn(Arc<InvocationContext>) -> EventHandlerFuture<T> + Send + Sync>;

/// Box an async closure as an [`EventHandler`]. Any receiver the handler
/// needs is captured by the closure and travels with it unchanged.
pub fn event_handler<T, F, Fut>(handler: F) -> EventHandler<T>
where
    F: Fn(Arc<InvocationContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Arc::new(move |context| -> EventHandlerFuture<T> { Box::pin(handler(context)) })
}

/// Trait contract for anything handlers can be registered on.
pub trait HandlerRegistry<T> {
    fn on(&mut self, event: &str, handler: EventHandler<T>);
}

impl<T, R> HandlerRegistry<T> for &mut R
where
    R: HandlerRegistry<T> + ?Sized,
{
    fn on(&mut self, event: &str, handler: EventHandler<T>) {
        (**self).on(event, handler);
    }
}

#[derive(Clone)]
/// Reports failing handlers as deduplicated issues.
///
/// The report options are fixed at construction and shared read-only by
/// every invocation this guard wraps.
pub struct Lifeguard {
    store: Arc<dyn TicketStore>,
    options: Arc<ReportOptions>,
}

impl Lifeguard {
    pub fn new(store: Arc<dyn TicketStore>, options: ReportOptions) -> Self {
        Self {
            store,
            options: Arc::new(options),
        }
    }

    /// Run `handler` for `context`. A failure is reported and then returned
    /// unchanged; a failure to report is logged and never replaces it.
    pub async fn invoke<T, F, Fut>(&self, context: Arc<InvocationContext>, handler: F) -> Result<T>
    where
        F: FnOnce(Arc<InvocationContext>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match handler(Arc::clone(&context)).await {
            Ok(value) => Ok(value),
            Err(error) => {
                self.report(&context, &error).await;
                Err(error)
            }
        }
    }

    /// Wrap a single handler. Events about an issue carrying the report label
    /// resolve to `T::default()` without running the handler.
    pub fn guard_handler<T>(&self, handler: EventHandler<T>) -> EventHandler<T>
    where
        T: Default + Send + 'static,
    {
        let guard = self.clone();
        Arc::new(move |context| -> EventHandlerFuture<T> {
            let guard = guard.clone();
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                if should_skip_handler(&context.event, &guard.options) {
                    tracing::debug!(
                        event = context.event.name.as_str(),
                        "skipping handler for event on a report issue"
                    );
                    return Ok(T::default());
                }
                guard.invoke(context, |context| handler(context)).await
            })
        })
    }

    /// Wrap a registry so every handler registered through it is guarded.
    pub fn guard_app<R>(&self, registry: R) -> GuardedRegistry<R> {
        GuardedRegistry {
            inner: registry,
            guard: self.clone(),
        }
    }

    async fn report(&self, context: &InvocationContext, error: &anyhow::Error) {
        let failure = FailureRecord::from(error);
        match report_failure(self.store.as_ref(), context, &failure, &self.options).await {
            Ok(ReportOutcome::SkippedLoop { .. }) => {}
            Ok(outcome) => {
                tracing::debug!(
                    event = context.event.name.as_str(),
                    outcome = ?outcome,
                    "handler failure reported"
                );
            }
            Err(report_error) => {
                tracing::warn!(
                    event = context.event.name.as_str(),
                    repo = context.repo.as_slug().as_str(),
                    error = ?report_error,
                    "failed to report handler failure"
                );
            }
        }
    }
}

/// A registry whose `on` guards each handler before delegating.
pub struct GuardedRegistry<R> {
    inner: R,
    guard: Lifeguard,
}

impl<T, R> HandlerRegistry<T> for GuardedRegistry<R>
where
    T: Default + Send + 'static,
    R: HandlerRegistry<T>,
{
    fn on(&mut self, event: &str, handler: EventHandler<T>) {
        let guarded = self.guard.guard_handler(handler);
        self.inner.on(event, guarded);
    }
}

/// Minimal in-process event dispatcher.
pub struct EventApp<T> {
    handlers: Vec<(String, EventHandler<T>)>,
}

impl<T> Default for EventApp<T> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<T> EventApp<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Run every handler subscribed to the context's event in registration
    /// order. The first failure stops dispatch and is returned as is.
    pub async fn emit(&self, context: Arc<InvocationContext>) -> Result<Vec<T>> {
        let mut outputs = Vec::new();
        for (_, handler) in self
            .handlers
            .iter()
            .filter(|(event, _)| event_matches(event, &context.event.name))
        {
            outputs.push(handler(Arc::clone(&context)).await?);
        }
        Ok(outputs)
    }
}

impl<T> HandlerRegistry<T> for EventApp<T> {
    fn on(&mut self, event: &str, handler: EventHandler<T>) {
        self.handlers.push((event.trim().to_string(), handler));
    }
}

// `issues` subscribes to `issues.opened`, `issues.closed`, ...
fn event_matches(subscription: &str, event_name: &str) -> bool {
    subscription == WILDCARD_EVENT
        || subscription == event_name
        || event_name
            .strip_prefix(subscription)
            .is_some_and(|rest| rest.starts_with('.'))
}

// Panic containment around the handler

use crate::renderer::Renderer;
use async_trait::async_trait;
use futures_util::FutureExt;
use portico_core::{Error, HttpRequest, HttpResponse, Middleware, Next};
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::sync::Once;

thread_local! {
    /// Backtrace of the most recent panic on this thread, taken by the hook
    /// before unwinding starts.
    static PANIC_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Chain a panic hook that records the backtrace at the point of the panic.
/// The previously installed hook still runs.
fn install_backtrace_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture().to_string();
            PANIC_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(backtrace));
            previous(info);
        }));
    });
}

/// Backtrace recorded for the panic just caught on this thread
fn take_panic_backtrace() -> Option<String> {
    PANIC_BACKTRACE.with(|slot| slot.borrow_mut().take())
}

/// Innermost middleware. A handler that panics or returns an error is
/// answered with the failure page instead of unwinding into the server.
pub struct RecoverMiddleware {
    renderer: Renderer,
}

impl RecoverMiddleware {
    pub fn new(renderer: Renderer) -> Self {
        install_backtrace_hook();
        Self { renderer }
    }
}

#[async_trait]
impl Middleware for RecoverMiddleware {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        let ctx = req.context.clone();
        take_panic_backtrace();

        match AssertUnwindSafe(next(req)).catch_unwind().await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Ok(self.renderer.fail(
                &ctx,
                &err,
                None,
                &[("msg", "handler returned error")],
            )),
            Err(payload) => {
                // catch_unwind returns on the thread that panicked, within
                // the same poll, so the hook's slot is still ours.
                let backtrace = take_panic_backtrace()
                    .unwrap_or_else(|| Backtrace::force_capture().to_string());
                let err = Error::Panic {
                    message: panic_message(payload.as_ref()),
                    backtrace: backtrace.clone(),
                };
                Ok(self.renderer.fail(
                    &ctx,
                    &err,
                    None,
                    &[("msg", "recover panic"), ("debug_stack", backtrace.as_str())],
                ))
            }
        }
    }
}

/// Text of a panic payload, when it carries one
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! Panic recovery middleware.
//!
//! Wraps the rest of the chain in `catch_unwind`. A panic raised by any later
//! entry is logged together with the backtrace captured where it was raised,
//! then turned into `fail(500, "Internal Server Error")`. The backtrace never
//! reaches the client.
//!
//! A process-wide panic hook records backtraces for panics raised inside a
//! recovery scope and defers to the previous hook for every other panic.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use axum::http::StatusCode;

use crate::http::context::Context;

thread_local! {
    /// Nesting depth of recovery scopes on this thread.
    static RECOVERY_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if RECOVERY_DEPTH.with(Cell::get) > 0 {
                LAST_TRACE.with(|trace| *trace.borrow_mut() = Some(Backtrace::force_capture()));
            } else {
                previous(info);
            }
        }));
    });
}

/// Decrements the recovery depth even if the scope unwinds.
struct ScopeGuard;

impl ScopeGuard {
    fn enter() -> Self {
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get() + 1));
        ScopeGuard
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Convert panics in downstream handlers into a 500 error page.
pub fn recovery() -> impl Fn(&mut Context) + Send + Sync + 'static {
    install_hook();

    |c: &mut Context| {
        let outcome = {
            let _scope = ScopeGuard::enter();
            panic::catch_unwind(AssertUnwindSafe(|| c.next()))
        };

        if let Err(payload) = outcome {
            let trace = LAST_TRACE
                .with(|trace| trace.borrow_mut().take())
                .map(|bt| bt.to_string())
                .unwrap_or_default();
            tracing::error!(
                request_id = c.request().request_id().unwrap_or("-"),
                path = c.path(),
                panic = %panic_message(payload.as_ref()),
                backtrace = %trace,
                "Handler panicked"
            );
            c.fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::HandlerFunc;
    use crate::http::render::Templates;
    use crate::http::request::Request;
    use axum::http::Method;
    use std::sync::{Arc, Mutex};

    fn run(handlers: Vec<HandlerFunc>) -> Context {
        let request = Request::new(Method::GET, "/panic".parse().unwrap());
        let mut ctx = Context::new(request, Arc::new(Templates::new()));
        ctx.set_handlers(handlers);
        ctx.next();
        ctx
    }

    #[test]
    fn test_panic_becomes_500() {
        let ctx = run(vec![
            Arc::new(recovery()),
            Arc::new(|c: &mut Context| {
                let names = vec!["xxx".to_string()];
                let index = names.len() + 99;
                c.string(StatusCode::OK, &names[index]);
            }),
        ]);

        assert_eq!(ctx.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = String::from_utf8_lossy(ctx.response().body()).into_owned();
        assert!(body.contains("Internal Server Error"));
        assert!(!body.contains("index out of bounds"));
    }

    #[test]
    fn test_outer_after_code_still_runs() {
        let seen = Arc::new(Mutex::new(None));
        let outer: HandlerFunc = {
            let seen = Arc::clone(&seen);
            Arc::new(move |c: &mut Context| {
                c.next();
                *seen.lock().unwrap() = Some(c.status_code());
            })
        };
        run(vec![
            outer,
            Arc::new(recovery()),
            Arc::new(|_: &mut Context| panic!("boom")),
        ]);

        assert_eq!(*seen.lock().unwrap(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_no_panic_passes_through() {
        let ctx = run(vec![
            Arc::new(recovery()),
            Arc::new(|c: &mut Context| c.string(StatusCode::OK, "fine")),
        ]);
        assert_eq!(ctx.status_code(), StatusCode::OK);
        assert_eq!(ctx.response().body(), b"fine");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}

//! Panic isolation for handler chains.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use http_types::StatusCode;

use crate::context::{BoxFut, Context, Handle};

/// Catches panics and uncaught errors from downstream handlers, logs them
/// with a backtrace, and short-circuits the chain with a plain 500.
///
/// With `Recovery` installed a faulting handler spoils its own request
/// only; the connection task and the process keep running.
#[derive(Debug, Default)]
pub struct Recovery;

impl Handle for Recovery {
    fn call<'a>(&'a self, c: &'a mut Context) -> BoxFut<'a> {
        Box::pin(async move {
            match AssertUnwindSafe(c.next()).catch_unwind().await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => {
                    log::error!("handler error: {}\n{}", err, Backtrace::force_capture());
                    c.fail(StatusCode::InternalServerError, "Internal Server Error")
                }
                Err(panic) => {
                    log::error!(
                        "recovered: {}\n{}",
                        panic_message(&panic),
                        Backtrace::force_capture()
                    );
                    c.fail(StatusCode::InternalServerError, "Internal Server Error")
                }
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_str_and_string_payloads() {
        let a: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*a), "boom");

        let b: Box<dyn Any + Send> = Box::new("boom".to_string());
        assert_eq!(panic_message(&*b), "boom");

        let c: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(panic_message(&*c), "non-string panic payload");
    }
}

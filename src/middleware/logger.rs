//! Request logging.

use std::time::Instant;

use crate::context::{BoxFut, Context, Handle};

/// Logs one line per request with the committed status and the elapsed
/// time, after the rest of the chain has finished.
///
/// Install it before anything else so the measurement wraps the whole
/// chain: `app.with(Logger);`
#[derive(Debug, Default)]
pub struct Logger;

impl Handle for Logger {
    fn call<'a>(&'a self, c: &'a mut Context) -> BoxFut<'a> {
        Box::pin(async move {
            let start = Instant::now();
            let result = c.next().await;
            match &result {
                Ok(()) => log::info!(
                    "[{}] {} {} in {:?}",
                    c.status(),
                    c.method(),
                    c.path(),
                    start.elapsed()
                ),
                Err(err) => log::error!(
                    "[{}] {} {} in {:?}: {}",
                    err.status(),
                    c.method(),
                    c.path(),
                    start.elapsed(),
                    err
                ),
            }
            result
        })
    }
}

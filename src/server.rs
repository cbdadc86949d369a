//! TCP accept loop wiring the application to async-h1.

use std::io;
use std::sync::Arc;

use async_std::net::{TcpListener, TcpStream};
use async_std::task;
use futures::StreamExt;

use crate::gust::Application;

/// Bind `addr` and serve connections until the listener errors out.
///
/// Each connection runs on its own task, so one slow or faulting client
/// never stalls the others.
pub(crate) async fn serve(app: Application, addr: String) -> io::Result<()> {
    let listener = TcpListener::bind(addr.as_str()).await?;
    log::info!("listening on http://{}", listener.local_addr()?);

    let app = Arc::new(app);
    let mut incoming = listener.incoming();
    while let Some(stream) = incoming.next().await {
        match stream {
            Ok(stream) => {
                let app = app.clone();
                task::spawn(async move { accept(app, stream).await });
            }
            Err(err) => log::error!("failed to accept connection: {}", err),
        }
    }
    Ok(())
}

/// Serve one connection. Protocol errors end the connection, not the
/// process.
async fn accept(app: Arc<Application>, stream: TcpStream) {
    let endpoint = |request| {
        let app = app.clone();
        async move { Ok(app.respond(request).await) }
    };
    if let Err(err) = async_h1::accept(stream, endpoint).await {
        log::error!("connection error: {}", err);
    }
}

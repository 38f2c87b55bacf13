//! HTTP server implementation.

use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use super::service::UpdateService;
use crate::error::Result;
use crate::ratelimit::AdmissionControl;
use crate::updates::UpdateSource;

/// HTTP server for the update feed.
pub struct HttpServer<A: ?Sized, S: ?Sized> {
    /// Address to bind to
    addr: SocketAddr,
    /// Request handler shared by every connection
    service: UpdateService<A, S>,
}

impl<A, S> HttpServer<A, S>
where
    A: AdmissionControl + ?Sized + 'static,
    S: UpdateSource + ?Sized + 'static,
{
    /// Create a new HTTP server.
    pub fn new(addr: SocketAddr, admission: Arc<A>, source: Arc<S>) -> Self {
        Self {
            addr,
            service: UpdateService::new(admission, source),
        }
    }

    /// Bind the configured address and serve until `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_listener(listener, signal).await
    }

    /// Serve connections from an already bound listener until `signal`
    /// resolves.
    ///
    /// Connections accepted before the signal are left to finish on their own.
    pub async fn serve_listener<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        info!(addr = %listener.local_addr()?, "Starting HTTP server for update feed");

        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    let service = self.service.clone();
                    tokio::spawn(async move {
                        let svc = service_fn(move |req: Request<Incoming>| {
                            let service = service.clone();
                            async move { Ok::<_, Infallible>(service.handle(req, peer).await) }
                        });

                        let builder = ConnBuilder::new(TokioExecutor::new());
                        if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                            debug!(%peer, error = %e, "Connection closed with error");
                        }
                    });
                }
            }
        }

        info!("HTTP server stopped");
        Ok(())
    }
}

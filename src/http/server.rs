use crate::app::App;
use crate::error::{Error, Result};
use crate::http::{Request, Response};
use hyper::service::{make_service_fn, service_fn};
use hyper::Server as HyperServer;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct Server {
    app: Arc<App>,
}

impl Server {
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }

    pub async fn serve(self, addr: &str) -> Result<()> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::config(format!("Invalid address '{}': {}", addr, e)))?;

        log::info!("Base server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};

                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(sig) => sig,
                    Err(e) => {
                        log::error!("Failed to install SIGTERM handler: {}", e);
                        return;
                    }
                };

                let mut sigint = match signal(SignalKind::interrupt()) {
                    Ok(sig) => sig,
                    Err(e) => {
                        log::error!("Failed to install SIGINT handler: {}", e);
                        return;
                    }
                };

                tokio::select! {
                    _ = sigterm.recv() => log::info!("Received SIGTERM, shutting down"),
                    _ = sigint.recv() => log::info!("Received SIGINT, shutting down"),
                }
            }

            #[cfg(not(unix))]
            {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                log::info!("Received Ctrl+C, shutting down");
            }

            let _ = shutdown_tx.send(());
        });

        let make_svc = make_service_fn(move |_conn| {
            let app = Arc::clone(&self.app);
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let app = Arc::clone(&app);
                    async move {
                        let response = match Request::from_hyper(req).await {
                            Ok(request) => app.handle(request).await,
                            Err(e) => {
                                log::error!("Failed to read request: {}", e);
                                Response::internal_error()
                            }
                        };
                        Ok::<_, Infallible>(response.into_hyper())
                    }
                }))
            }
        });

        let server = HyperServer::bind(&addr)
            .serve(make_svc)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });

        if let Err(e) = server.await {
            log::error!("Server error: {}", e);
            return Err(Error::Http(e));
        }

        log::info!("Server stopped");
        Ok(())
    }
}

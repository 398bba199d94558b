//! Connection loop
//!
//! One tokio task per accepted connection, each served by hyper's http1
//! implementation with [`routes::handle`] as the service. A maintenance
//! task purges expired sessions while the server runs.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use boudoir_lib::Marketplace;
use boudoir_lib::store::Database;
use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::routes;

/// Interval between expired-session sweeps.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Opens the configured database and builds the marketplace service on it.
pub async fn open_marketplace(config: &ServerConfig) -> Result<Marketplace, ServerError> {
    let db = if config.in_memory() {
        Database::open_in_memory().await?
    } else {
        Database::open(&config.db_path).await?
    };
    let db = db.with_retry(config.retry_policy());
    log::info!("Opened database {}", config.db_path.display());
    Ok(Marketplace::new(db, config.marketplace_config()))
}

/// A bound, not yet running, API server.
pub struct Server {
    listener: TcpListener,
    market: Marketplace,
}

impl Server {
    /// Binds `addr`. Port 0 picks an ephemeral port, see [`local_addr`](Self::local_addr).
    pub async fn bind(addr: SocketAddr, market: Marketplace) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, market })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        if let Ok(addr) = self.listener.local_addr() {
            log::info!("Listening on http://{}", addr);
        }
        tokio::spawn(maintenance(self.market.clone(), shutdown.clone()));

        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => {
                    log::info!("Server shutting down");
                    return;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        log::warn!("Accept failed: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                },
            };

            let market = self.market.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let market = market.clone();
                    async move { Ok::<_, Infallible>(routes::handle(market, req).await) }
                });

                // Clients dropping the connection early is routine
                if let Err(e) = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await {
                    log::debug!("Connection from {} ended with error: {}", peer, e);
                }
            });
        }
    }
}

async fn maintenance(market: Marketplace, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = interval.tick() => {}
        }
        match market.db().sessions().purge_expired().await {
            Ok(0) => {}
            Ok(n) => log::info!("Purged {} expired session(s)", n),
            Err(e) => log::warn!("Session purge failed: {}", e),
        }
    }
}

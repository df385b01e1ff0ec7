use crate::console::model::ReceivedAlert;
use anyhow::Context;
use safetrackcore::alert::RelayRequest;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
};
use warp::{http::StatusCode, Filter};

type SharedAlerts = Arc<RwLock<Vec<ReceivedAlert>>>;

/// Local stand-in for the relay backend: accepts alerts on
/// `POST /api/send-emergency` and lists them on `GET /api/alerts`.
#[derive(Clone)]
pub struct RelaySink {
    received: SharedAlerts,
    reject: bool,
}

impl RelaySink {
    /// With `reject` set every alert is answered with 503, for failure drills.
    pub fn new(reject: bool) -> Self {
        Self {
            received: Arc::new(RwLock::new(Vec::new())),
            reject,
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone + Send + Sync + 'static
    {
        let state = self.received.clone();
        let state_filter = warp::any().map(move || state.clone());
        let reject = self.reject;

        let send_route = warp::path!("api" / "send-emergency")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter.clone())
            .map(move |request: RelayRequest, state: SharedAlerts| {
                if reject {
                    println!("[RELAY] rejecting alert (drill)");
                    return warp::reply::with_status(
                        warp::reply::json(&json!({"status": "unavailable"})),
                        StatusCode::SERVICE_UNAVAILABLE,
                    );
                }

                let alert = ReceivedAlert::now(request);
                let recipients = alert.recipient_count();
                println!(
                    "[RELAY] alert at {},{} for {} recipients: {}",
                    alert.request.coords.lat,
                    alert.request.coords.lon,
                    recipients,
                    alert.request.message
                );
                if let Ok(mut guard) = state.write() {
                    guard.push(alert);
                }
                warp::reply::with_status(
                    warp::reply::json(&json!({"status": "queued", "recipients": recipients})),
                    StatusCode::OK,
                )
            });

        let list_route = warp::path!("api" / "alerts")
            .and(warp::get())
            .and(state_filter)
            .map(|state: SharedAlerts| {
                let alerts = state.read().map(|g| g.clone()).unwrap_or_default();
                warp::reply::json(&alerts)
            });

        send_route.or(list_route)
    }

    /// Serves on `addr` in the background and returns the bound address.
    #[cfg(test)]
    pub fn spawn(&self, addr: SocketAddr) -> anyhow::Result<SocketAddr> {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding relay sink on {}", addr))?;
        tokio::spawn(server);
        Ok(bound)
    }

    /// Serves on `addr` until Ctrl+C.
    pub async fn run(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(addr, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .with_context(|| format!("binding relay sink on {}", addr))?;
        println!("[RELAY] listening on http://{} (Ctrl+C to stop)", bound);
        server.await;
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<ReceivedAlert> {
        self.received
            .read()
            .map(|g| g.clone())
            .unwrap_or_default()
    }
}

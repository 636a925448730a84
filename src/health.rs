//! Liveness endpoint. Any method on any path answers 200 with a fixed body; it reports only
//! that the process is up, never dispatch health.

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;

pub const LIVENESS_BODY: &str = "ok";

async fn alive() -> &'static str {
    LIVENESS_BODY
}

pub fn router() -> Router {
    Router::new().fallback(alive)
}

pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await
}

/// Serves the liveness router on `listener` until `shutdown` flips to true.
pub async fn serve(listener: TcpListener, mut shutdown: watch::Receiver<bool>) {
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    tracing::info!("[HEALTH] liveness endpoint listening on {local}");
    let stop = async move {
        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }
    };
    if let Err(err) = axum::serve(listener, router())
        .with_graceful_shutdown(stop)
        .await
    {
        tracing::error!("[HEALTH] liveness server exited: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_any_path_answers_ok() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = watch::channel(false);
        let server = tokio::spawn(serve(listener, stop_rx));

        let client = reqwest::Client::new();
        for path in ["/", "/healthz", "/some/deep/path?x=1"] {
            let resp = client
                .get(format!("http://{addr}{path}"))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);
            assert_eq!(resp.text().await.unwrap(), LIVENESS_BODY);
        }
        let resp = client
            .post(format!("http://{addr}/anything"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        stop_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .expect("server should stop after shutdown")
            .unwrap();
    }
}

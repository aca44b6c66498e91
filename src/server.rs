use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rusqlite::Connection;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::db;
use crate::sync::{AddressList, SyncReceipt};

#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        AppState {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/add_addresses", post(add_addresses))
        .route("/get_addresses", get(get_addresses))
        .route("/clear_addresses", post(clear_addresses))
        // Browser-side callers post from another origin.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    info!("Collector listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct StoredAddresses {
    addresses: Vec<String>,
}

async fn add_addresses(
    State(state): State<AppState>,
    Json(body): Json<AddressList>,
) -> ApiResult<SyncReceipt> {
    let added = with_conn(&state, |conn| db::insert_addresses(conn, &body.addresses))?;
    info!(received = body.addresses.len(), added, "Stored addresses");
    Ok(Json(SyncReceipt {
        status: "success".into(),
        message: format!("Added {} addresses", added),
    }))
}

async fn get_addresses(State(state): State<AppState>) -> ApiResult<StoredAddresses> {
    let rows = with_conn(&state, db::fetch_addresses)?;
    Ok(Json(StoredAddresses {
        addresses: rows.into_iter().map(|r| r.address).collect(),
    }))
}

async fn clear_addresses(State(state): State<AppState>) -> ApiResult<SyncReceipt> {
    let removed = with_conn(&state, db::clear_addresses)?;
    info!(removed, "Cleared addresses");
    Ok(Json(SyncReceipt {
        status: "success".into(),
        message: "All addresses cleared".into(),
    }))
}

fn with_conn<T>(
    state: &AppState,
    f: impl FnOnce(&Connection) -> anyhow::Result<T>,
) -> Result<T, (StatusCode, String)> {
    let conn = state
        .conn
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "store lock poisoned".to_string()))?;
    f(&conn).map_err(|e| {
        error!("Store error: {:#}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::sync::SyncClient;

    fn state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        AppState::new(conn)
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn add_then_get_then_clear() {
        let app = router(state());

        let (status, body) = call(
            app.clone(),
            "POST",
            "/add_addresses",
            Some(r#"{"addresses":["1 Elm Rd, Troy, NY 12180","1 Elm Rd, Troy, NY 12180","2 Oak Ave, Reno, NV 89501"]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Added 2 addresses");

        let (_, body) = call(app.clone(), "GET", "/get_addresses", None).await;
        assert_eq!(
            body["addresses"],
            serde_json::json!(["1 Elm Rd, Troy, NY 12180", "2 Oak Ave, Reno, NV 89501"])
        );

        let (_, body) = call(app.clone(), "POST", "/clear_addresses", None).await;
        assert_eq!(body["message"], "All addresses cleared");

        let (_, body) = call(app, "GET", "/get_addresses", None).await;
        assert_eq!(body["addresses"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let (status, _) = call(router(state()), "POST", "/add_addresses", Some(r#"{"addr":[]}"#)).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn sync_client_round_trip() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = state();
        tokio::spawn(serve(listener, shared.clone()));

        let client = SyncClient::new(&format!("http://{}", addr));
        let addresses = vec!["9 Elm Ct, Troy, NY 12180".to_string()];
        let receipt = client.push(&addresses).await.unwrap();
        assert_eq!(receipt.message, "Added 1 addresses");

        let receipt = client.push(&addresses).await.unwrap();
        assert_eq!(receipt.message, "Added 0 addresses");

        let conn = shared.conn.lock().unwrap();
        assert_eq!(db::fetch_addresses(&conn).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wrong_path_maps_to_status_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, state()));

        let client = SyncClient::new(&format!("http://{}/missing", addr));
        let err = client.push(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::CollectorStatus { status } if status == StatusCode::NOT_FOUND
        ));
    }
}

//! HTTP/WebSocket server for the consultation desk
//!
//! Browsers drive consultations through the command proxy, fetch exports from
//! the download routes and follow replies over the events socket.

mod auth;
mod downloads;
mod events;
mod proxy;
pub mod routes;
pub mod state;

pub use auth::{generate_auth_token, AuthLayer};
pub use events::{ClientMessage, EventBroadcaster, ServerEvent};
pub use proxy::{invoke_handler, InvokeRequest, InvokeResponse};
pub use state::ServerAppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue,
    },
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Version information for the server
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo {
    name: String,
    version: String,
}

/// Build the CORS layer; an empty origin list allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    // Explicit headers instead of Any: browsers reject wildcard headers with Authorization
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(allowed)
    }
}

/// Assemble the router with auth and CORS layers
pub fn build_router(state: ServerAppState, cors_origins: &[String]) -> Router {
    // Layer order: cors (outer) -> auth -> handler
    // This ensures CORS preflight requests are handled before auth check
    Router::new()
        .route("/api/invoke", post(proxy::invoke_handler))
        .route(
            "/api/consultations/:id/export.json",
            get(downloads::consultation_json_handler),
        )
        .route(
            "/api/consultations/:id/export.pdf",
            get(downloads::consultation_pdf_handler),
        )
        .route(
            "/api/admin/sessions/:id/export.json",
            get(downloads::admin_session_handler),
        )
        .route("/ws/events", get(events::ws_handler))
        .route("/health", get(health_handler))
        .route("/api/version", get(version_handler))
        .route("/", get(index_handler))
        .layer(AuthLayer::new(state.auth_token.clone()))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Run the HTTP/WebSocket server until shutdown is requested
pub async fn run_server(
    port: u16,
    bind: &str,
    state: ServerAppState,
    cors_origins: &[String],
) -> Result<(), String> {
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let cors_display = if cors_origins.is_empty() {
        "*".to_string()
    } else {
        cors_origins.join(", ")
    };
    let store_status = if state.store.is_some() {
        "Configured"
    } else {
        "Not configured (saving disabled)"
    };

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Consult Desk Server                          ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║                                                               ║");
    println!("║  Server URL: http://{}:{:<24}  ║", bind, port);
    println!("║                                                               ║");
    println!("║  Auth Token: {}  ║", state.auth_token);
    println!("║                                                               ║");
    println!("║  CORS Origins: {:<45}║", cors_display);
    println!("║  Store: {:<52}║", store_status);
    println!("║                                                               ║");
    println!("║  Endpoints:                                                   ║");
    println!("║    POST /api/invoke                - Command proxy           ║");
    println!("║    GET  /api/consultations/:id/... - JSON/PDF exports        ║");
    println!("║    GET  /api/admin/sessions/:id/.. - Stored session export   ║");
    println!("║    GET  /ws/events?session=:id     - WebSocket events        ║");
    println!("║    GET  /health                    - Health check            ║");
    println!("║                                                               ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let shutdown_state = state.shutdown_state.clone();
    let app = build_router(state, cors_origins);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on http://{}", addr);

    // Create shutdown signal that waits for the shutdown state flag
    let shutdown_signal = async move {
        loop {
            if shutdown_state.is_shutdown_requested() {
                log::info!("Shutdown signal received, stopping server...");
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Version endpoint
async fn version_handler() -> Json<VersionInfo> {
    Json(VersionInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Index handler - shows connection instructions
async fn index_handler() -> axum::response::Html<&'static str> {
    axum::response::Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Consult Desk Server</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 600px;
            margin: 50px auto;
            padding: 20px;
            background: #f8fafc;
            color: #1e293b;
        }
        h1 { color: #16a34a; }
        code {
            background: #e2e8f0;
            padding: 2px 6px;
            border-radius: 4px;
            font-family: 'Monaco', 'Consolas', monospace;
        }
        .endpoint {
            background: #e2e8f0;
            padding: 10px;
            border-radius: 8px;
            margin: 10px 0;
        }
    </style>
</head>
<body>
    <h1>Consult Desk Server</h1>
    <p>The consultation server is running. Connect from the browser UI with your auth token.</p>
    <h2>Endpoints</h2>
    <div class="endpoint">
        <strong>POST /api/invoke</strong><br>
        Command proxy - send <code>{"cmd": "start_consultation", "args": {"tool": "risk"}}</code>
        with <code>Authorization: Bearer &lt;token&gt;</code>
    </div>
    <div class="endpoint">
        <strong>GET /api/consultations/:id/export.json</strong> and <strong>export.pdf</strong><br>
        Download the assessment of an open consultation
    </div>
    <div class="endpoint">
        <strong>GET /ws/events?session=:id&amp;token=&lt;token&gt;</strong><br>
        WebSocket for turns, summary updates and embedded question answers
    </div>
    <div class="endpoint">
        <strong>GET /health</strong><br>
        Health check endpoint
    </div>
</body>
</html>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsultConfig;
    use crate::shutdown::ShutdownState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = ServerAppState::from_config(
            "secret".to_string(),
            ConsultConfig::default(),
            ShutdownState::new(),
        )
        .unwrap();
        build_router(state, &[])
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invoke_requires_token() {
        let body = r#"{"cmd":"list_tools"}"#;

        let rejected = app()
            .oneshot(
                Request::post("/api/invoke")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

        let accepted = app()
            .oneshot(
                Request::post("/api/invoke")
                    .header(CONTENT_TYPE, "application/json")
                    .header(AUTHORIZATION, "Bearer secret")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(accepted.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_download_unknown_consultation() {
        let response = app()
            .oneshot(
                Request::get("/api/consultations/missing/export.json")
                    .header(AUTHORIZATION, "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

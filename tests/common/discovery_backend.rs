use std::{sync::Arc, time::Duration};

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};
use url::Url;

pub struct DiscoveryBackend {
    /// Authority whose discovery document answers immediately.
    pub authority: Url,
    /// Authority whose discovery document never arrives in time.
    pub slow_authority: Url,
    pub server_jh: JoinHandle<()>,
}

impl DiscoveryBackend {
    pub fn token_endpoint(&self) -> String {
        format!("{}/connect/token", self.authority.as_str().trim_end_matches('/'))
    }
}

/// Serves discovery documents on a random local port.
pub async fn start_discovery_backend() -> DiscoveryBackend {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("TcpListener");
    let address = listener.local_addr().expect("local address");

    let authority = Url::parse(&format!("http://{address}/realms/test")).expect("authority");
    let slow_authority =
        Url::parse(&format!("http://{address}/realms/slow")).expect("slow authority");

    let router = Router::new()
        .route("/realms/test/.well-known/openid-configuration", get(discovery))
        .route("/realms/slow/.well-known/openid-configuration", get(slow_discovery))
        .with_state(Arc::new(authority.clone()));

    let server_jh = tokio::spawn(async move {
        tracing::info!("Serving discovery backend...");
        axum::serve(listener, router.into_make_service())
            .await
            .expect("Server to start successfully");
        tracing::info!("Discovery backend stopped!");
    });

    DiscoveryBackend {
        authority,
        slow_authority,
        server_jh,
    }
}

async fn discovery(State(authority): State<Arc<Url>>) -> Json<Value> {
    let issuer = authority.as_str().trim_end_matches('/');
    Json(json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/connect/authorize"),
        "token_endpoint": format!("{issuer}/connect/token"),
        "jwks_uri": format!("{issuer}/connect/certs"),
        "claims_parameter_supported": true,
        "token_endpoint_auth_methods_supported": ["client_secret_basic", "client_secret_jwt"],
        "token_endpoint_auth_signing_alg_values_supported": ["HS256"],
    }))
}

async fn slow_discovery(state: State<Arc<Url>>) -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(30)).await;
    discovery(state).await
}

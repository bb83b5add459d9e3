//! Latchkey Gate
//!
//! Bearer 토큰으로 보호되는 라우트와 운영자 발급 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod middleware;
mod state;

use config::Config;
use middleware::ClaimsGuard;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lk_gate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("Starting Gate with config: {:?}", config);

    // 앱 상태 초기화 (키 로드 실패 시 종료)
    let state = Arc::new(AppState::new(&config)?);

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Gate listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 라우터 생성
fn create_router(state: Arc<AppState>) -> Router {
    let threshold = state.config.permission_threshold;

    let mut app: Router<Arc<AppState>> = Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        .route("/api/test", get(handlers::health::hello))
        // Claims protected
        .merge(
            Router::new()
                .route("/api/claims", get(handlers::claims::show_claims))
                .route_layer(from_fn_with_state(
                    ClaimsGuard::new(state.clone(), threshold),
                    middleware::claims_gate,
                )),
        )
        .merge(
            Router::new()
                .route("/api/admin/claims", get(handlers::claims::show_claims))
                .route_layer(from_fn_with_state(
                    ClaimsGuard::new(state.clone(), threshold.saturating_add(1)),
                    middleware::claims_gate,
                )),
        );

    if state.envelope_gate.is_some() {
        app = app.merge(
            Router::new()
                .route("/api/secure/ping", get(handlers::secure::ping))
                .route_layer(from_fn_with_state(state.clone(), middleware::envelope_gate)),
        );
    }

    if state.config.operator_token.is_some() {
        app = app.route("/internal/tokens/issue", post(handlers::issue::issue_token));
        if state.envelope_gate.is_some() {
            app = app.route(
                "/internal/envelopes/issue",
                post(handlers::issue::issue_envelope),
            );
        }
    }

    app.fallback(handlers::not_found)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::request_id))
        // State
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use lk_core::auth::{ClaimsCodec, IssuerDefaults, TokenIssuer};
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};
    use serde_json::{json, Map, Value};
    use std::collections::HashMap;
    use tower::ServiceExt;

    const OPERATOR: &str = "op-secret";

    fn config(extra: &[(&str, &str)]) -> Config {
        let mut vars: HashMap<String, String> = [
            ("JWT_KEY", "test-key"),
            ("APP_NAME", "APP"),
            ("LK_OPERATOR_TOKEN", OPERATOR),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        Config::from_lookup(|name| vars.get(name).cloned()).unwrap()
    }

    fn app(config: &Config) -> Router {
        create_router(Arc::new(AppState::new(config).unwrap()))
    }

    fn rsa_config() -> Config {
        let key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let pem = key.to_pkcs8_pem(LineEnding::LF).unwrap();
        config(&[("RSA_PRIVATE_KEY", pem.as_str()), ("AES_KEY", "aes-secret")])
    }

    /// 유예 구간이 이미 지난 토큰
    fn token(claims: Value) -> String {
        let issuer = TokenIssuer::new(
            ClaimsCodec::new("test-key"),
            IssuerDefaults::for_app("APP", "http://localhost"),
        );
        let now = chrono::Utc::now().timestamp();
        let custom: Map<String, Value> = claims.as_object().cloned().unwrap();
        issuer.issue_at(custom, Some(3600), now - 120).unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_with(uri: &str, header: Option<(&str, String)>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_hello() {
        let config = config(&[]);

        let (status, body) = send(app(&config), get_with("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));

        let (status, body) = send(app(&config), get_with("/api/test", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["body"], "Hello World!");
    }

    #[tokio::test]
    async fn test_fallback() {
        let (status, body) = send(app(&config(&[])), get_with("/nope", None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 404);
        assert_eq!(
            body["error"]["message"],
            "The page is invalid, please try again."
        );
    }

    #[tokio::test]
    async fn test_missing_token() {
        let (status, body) = send(app(&config(&[])), get_with("/api/claims", None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], 401);
        assert_eq!(body["error"]["message"], "Token not provided.");
        assert_eq!(body["error"]["details"]["reason"], "TOKEN_MISSING");
        assert!(body["error"]["details"]["requestId"].is_string());
    }

    #[tokio::test]
    async fn test_inbound_request_id_is_propagated() {
        let req = get_with("/api/claims", Some(("x-request-id", "edge-1234".to_string())));
        let response = app(&config(&[])).oneshot(req).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "edge-1234");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["details"]["requestId"], "edge-1234");

        let req = get_with("/api/claims", Some(("x-request-id", "  ".to_string())));
        let (_, body) = send(app(&config(&[])), req).await;
        let generated = body["error"]["details"]["requestId"].as_str().unwrap();
        assert_eq!(generated.len(), 36);
    }

    #[tokio::test]
    async fn test_admitted_claims() {
        let token = token(json!({"permission": 2, "team": "ops"}));
        let req = get_with("/api/claims", Some(("authorization", format!("Bearer {}", token))));

        let (status, body) = send(app(&config(&[])), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["body"]["team"], "ops");
        assert_eq!(body["meta"]["permission"], 2);
    }

    #[tokio::test]
    async fn test_query_and_cookie_tokens() {
        let token = token(json!({"permission": 2}));
        let config = config(&[]);

        let req = get_with(&format!("/api/claims?token={}", token), None);
        let (status, _) = send(app(&config), req).await;
        assert_eq!(status, StatusCode::OK);

        let req = get_with("/api/claims", Some(("cookie", format!("a=b; token={}", token))));
        let (status, _) = send(app(&config), req).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_insufficient_permission() {
        let token = token(json!({"permission": 1}));
        let req = get_with("/api/claims", Some(("authorization", format!("Bearer {}", token))));

        let (status, body) = send(app(&config(&[])), req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "Insufficient permissions.");
    }

    #[tokio::test]
    async fn test_admin_route_requires_higher_permission() {
        let config = config(&[]);

        let token2 = token(json!({"permission": 2}));
        let req = get_with("/api/admin/claims", Some(("authorization", format!("Bearer {}", token2))));
        let (status, _) = send(app(&config), req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let token3 = token(json!({"permission": "3"}));
        let req = get_with("/api/admin/claims", Some(("authorization", format!("Bearer {}", token3))));
        let (status, _) = send(app(&config), req).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_fresh_token_is_in_grace_window() {
        let config = config(&[]);
        let req = Request::builder()
            .method("POST")
            .uri("/internal/tokens/issue")
            .header("authorization", format!("Bearer {}", OPERATOR))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"claims": {"permission": 2}}"#))
            .unwrap();

        let (status, body) = send(app(&config), req).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["data"]["body"]["token"].as_str().unwrap().to_string();

        let req = get_with("/api/claims", Some(("authorization", format!("Bearer {}", token))));
        let (status, body) = send(app(&config), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Invalid or expired token.");
    }

    #[tokio::test]
    async fn test_issue_requires_operator() {
        let config = config(&[]);
        let issue = |auth: Option<(&'static str, &'static str)>| {
            let mut builder = Request::builder()
                .method("POST")
                .uri("/internal/tokens/issue")
                .header("content-type", "application/json");
            if let Some((name, value)) = auth {
                builder = builder.header(name, value);
            }
            builder.body(Body::from("{}")).unwrap()
        };

        let (status, body) = send(app(&config), issue(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "operator auth required");

        let (status, _) = send(app(&config), issue(Some(("authorization", "Bearer wrong")))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(app(&config), issue(Some(("x-operator-token", OPERATOR)))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_issue_rejects_bad_ttl() {
        let config = config(&[]);
        for (ttl, expected) in [
            ("0", StatusCode::BAD_REQUEST),
            ("30", StatusCode::BAD_REQUEST),
            ("9223372036854775807", StatusCode::BAD_REQUEST),
        ] {
            let req = Request::builder()
                .method("POST")
                .uri("/internal/tokens/issue")
                .header("x-operator-token", OPERATOR)
                .header("content-type", "application/json")
                .body(Body::from(format!(r#"{{"claims": {{}}, "ttl": {}}}"#, ttl)))
                .unwrap();

            let (status, body) = send(app(&config), req).await;
            assert_eq!(status, expected);
            assert_eq!(body["error"]["code"], 400);
        }
    }

    #[tokio::test]
    async fn test_issuance_disabled_without_operator_token() {
        let config = config(&[("LK_OPERATOR_TOKEN", "")]);
        let req = Request::builder()
            .method("POST")
            .uri("/internal/tokens/issue")
            .body(Body::from("{}"))
            .unwrap();

        let (status, _) = send(app(&config), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_envelope_routes() {
        let config = rsa_config();
        let app = app(&config);

        let req = Request::builder()
            .method("POST")
            .uri("/internal/envelopes/issue")
            .header("x-operator-token", OPERATOR)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        let envelope = body["data"]["body"]["token"].as_str().unwrap().to_string();

        let req = get_with("/api/secure/ping", Some(("authorization", format!("Bearer {}", envelope))));
        let (status, body) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["body"]["fingerprint"].as_str().map(str::len), Some(64));

        let (status, _) = send(app.clone(), get_with("/api/secure/ping", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_envelope_from_foreign_key_is_forbidden() {
        let foreign = rsa_config();
        let foreign_state = AppState::new(&foreign).unwrap();
        let envelope = foreign_state
            .envelope_gate
            .as_ref()
            .unwrap()
            .envelope()
            .seal()
            .unwrap();

        let req = get_with("/api/secure/ping", Some(("authorization", format!("Bearer {}", envelope))));
        let (status, body) = send(app(&rsa_config()), req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "Invalid token.");
    }

    #[tokio::test]
    async fn test_envelope_routes_absent_without_rsa() {
        let (status, _) = send(app(&config(&[])), get_with("/api/secure/ping", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_key_fails_startup() {
        let config = config(&[("RSA_PRIVATE_KEY", "garbage"), ("AES_KEY", "k")]);
        assert!(AppState::new(&config).is_err());

        let config = config_with_cipher();
        assert!(AppState::new(&config).is_err());
    }

    fn config_with_cipher() -> Config {
        let key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let pem = key.to_pkcs8_pem(LineEnding::LF).unwrap();
        config(&[
            ("RSA_PRIVATE_KEY", pem.as_str()),
            ("AES_KEY", "k"),
            ("AES_CIPHER", "des-cbc"),
        ])
    }
}

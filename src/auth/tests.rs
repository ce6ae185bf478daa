//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - Google OAuth start and callback, including state checks
//! - Session cookies accepted by protected routes
//! - Logout and dev-mode bypass

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::chat::ChatStore;
    use crate::common::AppState;
    use crate::test_support::{bearer, identity, test_app, StubProvider, GOOD_CODE};

    async fn app_state() -> (AppState, Arc<crate::chat::SqliteChatStore>) {
        let app = test_app(StubProvider::replying("ok", 1), 50).await;
        (app.state, app.store)
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// `name=value` pair from a Set-Cookie header value
    fn cookie_pair(set_cookie: &str) -> String {
        set_cookie.split(';').next().unwrap_or_default().to_string()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ============================================================================
    // Model Tests
    // ============================================================================

    #[test]
    fn test_claims_structure() {
        let claims = models::Claims {
            sub: "U_TEST0001".to_string(),
            exp: 1234567890,
        };

        assert_eq!(claims.sub, "U_TEST0001");
        assert_eq!(claims.exp, 1234567890);
    }

    #[test]
    fn test_user_serializes_profile_fields() {
        let user = models::User {
            id: "U_TEST0001".to_string(),
            google_id: "google-123".to_string(),
            email: "test@example.com".to_string(),
            name: "Test User".to_string(),
            picture: None,
            plan: "trial".to_string(),
            created_at: Some("2024-01-01 00:00:00".to_string()),
            updated_at: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["plan"], "trial");
        assert!(json["picture"].is_null());
    }

    // ============================================================================
    // OAuth Flow Tests
    // ============================================================================

    #[tokio::test]
    async fn test_oauth_start_sets_state_cookie() {
        let (state, _) = app_state().await;
        let router = crate::build_router(state);

        let response = router.oneshot(get("/auth/google", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let cookies = set_cookies(&response);
        let state_cookie = cookies
            .iter()
            .find(|c| c.starts_with("oauth_state="))
            .expect("oauth_state cookie");
        let state_value = cookie_pair(state_cookie)["oauth_state=".len()..].to_string();
        assert_eq!(state_value.len(), 24);

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.ends_with(&format!("state={}", state_value)));
    }

    #[tokio::test]
    async fn test_callback_rejects_mismatched_state() {
        let (state, store) = app_state().await;
        let router = crate::build_router(state);

        let response = router
            .oneshot(get(
                &format!("/auth/callback?code={}&state=forged", GOOD_CODE),
                Some("oauth_state=expected"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid state");
        assert!(store.find_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_callback_without_state_cookie_is_rejected() {
        let (state, _) = app_state().await;
        let router = crate::build_router(state);

        let response = router
            .oneshot(get(
                &format!("/auth/callback?code={}&state=abc", GOOD_CODE),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_callback_provider_error_param() {
        let (state, _) = app_state().await;
        let router = crate::build_router(state);

        let response = router
            .oneshot(get(
                "/auth/callback?error=access_denied&state=abc",
                Some("oauth_state=abc"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_callback_starts_session_usable_by_me() {
        let (state, _) = app_state().await;

        let response = crate::build_router(state.clone())
            .oneshot(get(
                &format!("/auth/callback?code={}&state=abc", GOOD_CODE),
                Some("oauth_state=abc"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION].to_str().unwrap(),
            "http://app.test/chat"
        );

        let cookies = set_cookies(&response);
        let session = cookies
            .iter()
            .find(|c| c.starts_with("session="))
            .expect("session cookie");
        assert!(session.contains("HttpOnly"));
        assert!(cookies
            .iter()
            .any(|c| c.starts_with("oauth_state=;") && c.contains("Max-Age=0")));

        let response = crate::build_router(state)
            .oneshot(get("/api/me", Some(&cookie_pair(session))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["plan"], "trial");
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["google_id"], "google-42");
    }

    #[tokio::test]
    async fn test_callback_with_rejected_code() {
        let (state, _) = app_state().await;
        let router = crate::build_router(state);

        let response = router
            .oneshot(get(
                "/auth/callback?code=stale&state=abc",
                Some("oauth_state=abc"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // ============================================================================
    // Session Tests
    // ============================================================================

    #[tokio::test]
    async fn test_me_rejects_invalid_token() {
        let (state, _) = app_state().await;
        let router = crate::build_router(state);

        let response = router
            .oneshot(get("/api/me", Some("session=not-a-jwt")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_rejects_token_for_unknown_user() {
        let (state, _) = app_state().await;
        let router = crate::build_router(state);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/me")
                    .header(header::AUTHORIZATION, bearer("U_GONE0000"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_session_cookie() {
        let (state, store) = app_state().await;
        let user = store
            .upsert_user(&identity("google-7", "lee@example.com"))
            .await
            .unwrap();
        let router = crate::build_router(state);

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .header(header::AUTHORIZATION, bearer(&user.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("session=;") && c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn test_logout_redirect_clears_cookie() {
        let (state, _) = app_state().await;
        let router = crate::build_router(state);

        let response = router.oneshot(get("/logout", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION].to_str().unwrap(),
            "http://app.test/"
        );
        assert!(set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("session=;")));
    }

    #[tokio::test]
    async fn test_dev_user_bypasses_authentication() {
        let (mut state, store) = app_state().await;
        let dev_user = store
            .upsert_user(&identity("dev-mode-user", "dev@test.com"))
            .await
            .unwrap();
        state.dev_user = Some(dev_user);
        let router = crate::build_router(state);

        let response = router.oneshot(get("/api/me", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["user"]["email"], "dev@test.com");
    }
}

use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::RequireAdmin;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

/// Identity of the signed-in back-office user
pub async fn get_me(admin: RequireAdmin) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: admin.user_id,
        email: admin.email.clone(),
        roles: admin.roles.clone(),
    })
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::{bearer_token, test_app};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    const USER_ID: &str = "5f0c3a8e-2b1d-4c6e-9a7f-1e2d3c4b5a69";

    async fn get(uri: &str, token: String) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, token)
            .body(Body::empty())
            .unwrap();

        let resp = test_app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn admin_sees_own_identity() {
        let (status, body) = get("/api/me", bearer_token(USER_ID, Some("admin"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], USER_ID);
        assert_eq!(body["email"], "kantoor@renobouw.be");
        assert_eq!(body["roles"], serde_json::json!(["authenticated", "admin"]));
    }

    #[tokio::test]
    async fn signed_in_visitor_is_forbidden() {
        let (status, body) = get("/api/me", bearer_token(USER_ID, None)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn dashboard_stats_are_admin_only() {
        let (status, body) = get("/api/admin/stats", bearer_token(USER_ID, Some("editor"))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn tampered_signature_is_unauthorized() {
        let token = bearer_token(USER_ID, Some("admin"));
        let tampered = format!("{}x", token);
        let (status, body) = get("/api/me", tampered).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}

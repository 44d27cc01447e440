use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use entragate_azure::{GroupDirectory, IdentityResolver, PipelineRunner, SubscriptionCatalog};
use entragate_workflow::ElevationScheduler;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_app(
    resolver: Arc<dyn IdentityResolver>,
    directory: Arc<dyn GroupDirectory>,
    subscriptions: Arc<dyn SubscriptionCatalog>,
    elevation: Arc<ElevationScheduler>,
    pipeline: Arc<dyn PipelineRunner>,
) -> Router {
    let state = AppState {
        resolver,
        directory,
        subscriptions,
        elevation,
        pipeline,
    };

    Router::new()
        // Health
        .route("/health", get(handlers::health))
        // Subscription vending
        .route("/azure/subscription", post(handlers::subscription))
        // Standing permissions
        .route("/azure/permissions/assign", post(handlers::permissions_assign))
        .route("/azure/permissions/revoke", post(handlers::permissions_revoke))
        // Time-boxed elevations
        .route("/azure/privilege/elevations", post(handlers::privilege_elevations))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::FixedOffset;
    use entragate_azure::{
        InMemoryDirectory, InMemoryScheduler, InMemorySubscriptions, LocalPipeline,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    struct Fixture {
        directory: Arc<InMemoryDirectory>,
        subscriptions: Arc<InMemorySubscriptions>,
        scheduler: Arc<InMemoryScheduler>,
        pipeline: Arc<LocalPipeline>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                directory: Arc::new(InMemoryDirectory::new()),
                subscriptions: Arc::new(InMemorySubscriptions::new()),
                scheduler: Arc::new(InMemoryScheduler::new()),
                pipeline: Arc::new(LocalPipeline::new()),
            }
        }

        fn app(&self) -> Router {
            let offset = FixedOffset::east_opt(9 * 3600).unwrap();
            build_app(
                self.directory.clone(),
                self.directory.clone(),
                self.subscriptions.clone(),
                Arc::new(ElevationScheduler::new(self.scheduler.clone(), offset)),
                self.pipeline.clone(),
            )
        }
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_returns_200() {
        let fx = Fixture::new();
        let resp = fx
            .app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn subscription_request_triggers_pipeline() {
        let fx = Fixture::new();
        let (status, body) = post_json(
            fx.app(),
            "/azure/subscription",
            json!({
                "ProjectName": "demo",
                "Environment": "dev",
                "Email": "owner@example.com",
                "VNetType": "public",
                "ManagementGroups": "Sandbox",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Message"], "Azure subscription request accepted");

        let runs = fx.pipeline.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].project_name, "demo");
        assert_eq!(runs[0].branch, "refs/heads/main");
    }

    #[tokio::test]
    async fn subscription_request_honors_branch_override() {
        let fx = Fixture::new();
        let (status, _) = post_json(
            fx.app(),
            "/azure/subscription",
            json!({
                "ProjectName": "demo",
                "Environment": "prd",
                "Email": "owner@example.com",
                "VNetType": "private",
                "ManagementGroups": "Confidential",
                "branch": "refs/heads/release",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fx.pipeline.runs()[0].branch, "refs/heads/release");
    }

    #[tokio::test]
    async fn subscription_request_rejects_bad_environment() {
        let fx = Fixture::new();
        let (status, body) = post_json(
            fx.app(),
            "/azure/subscription",
            json!({
                "ProjectName": "demo",
                "Environment": "qa",
                "Email": "owner@example.com",
                "VNetType": "public",
                "ManagementGroups": "Sandbox",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["Message"], "Validation error or missing parameters");
        assert!(fx.pipeline.runs().is_empty());
    }

    #[tokio::test]
    async fn subscription_request_rejects_bad_project_name() {
        let fx = Fixture::new();
        let (status, _) = post_json(
            fx.app(),
            "/azure/subscription",
            json!({
                "ProjectName": "demo project",
                "Environment": "dev",
                "Email": "owner@example.com",
                "VNetType": "public",
                "ManagementGroups": "Sandbox",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assign_adds_identity_to_derived_group() {
        let fx = Fixture::new();
        let user = fx.directory.add_user("a@x.com", "u-1").await;
        let group = fx
            .directory
            .add_group("azure-demo-dev-group-developer", "g-1")
            .await;

        let (status, body) = post_json(
            fx.app(),
            "/azure/permissions/assign",
            json!({
                "SubscriptionName": "subs-demo-dev",
                "Permission": "developer",
                "Emails": ["a@x.com"],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Message"], "Permission assign request accepted");
        assert_eq!(fx.directory.members_of(&group).await, vec![user]);
    }

    #[tokio::test]
    async fn revoke_removes_identity_from_group() {
        let fx = Fixture::new();
        let user = fx.directory.add_user("a@x.com", "u-1").await;
        let group = fx
            .directory
            .add_group("azure-demo-dev-group-admin", "g-1")
            .await;
        fx.directory.add_member(&group, &user).await.unwrap();

        let (status, body) = post_json(
            fx.app(),
            "/azure/permissions/revoke",
            json!({
                "SubscriptionName": "subs-demo-dev",
                "Permission": "admin",
                "Emails": ["a@x.com"],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Message"], "Permission revoke request accepted");
        assert!(fx.directory.members_of(&group).await.is_empty());
    }

    #[tokio::test]
    async fn assign_unknown_user_returns_400_without_mutation() {
        let fx = Fixture::new();
        let group = fx
            .directory
            .add_group("azure-demo-dev-group-developer", "g-1")
            .await;

        let (status, body) = post_json(
            fx.app(),
            "/azure/permissions/assign",
            json!({
                "SubscriptionName": "subs-demo-dev",
                "Permission": "developer",
                "Emails": ["nobody@x.com"],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["Message"], "Validation error or missing parameters");
        assert!(fx.directory.members_of(&group).await.is_empty());
    }

    #[tokio::test]
    async fn assign_rejects_unknown_permission() {
        let fx = Fixture::new();
        let (status, _) = post_json(
            fx.app(),
            "/azure/permissions/assign",
            json!({
                "SubscriptionName": "subs-demo-dev",
                "Permission": "superuser",
                "Emails": ["a@x.com"],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assign_rejects_empty_email_list() {
        let fx = Fixture::new();
        let (status, _) = post_json(
            fx.app(),
            "/azure/permissions/assign",
            json!({
                "SubscriptionName": "subs-demo-dev",
                "Permission": "developer",
                "Emails": [],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_returns_400() {
        let fx = Fixture::new();
        let resp = fx
            .app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/azure/permissions/assign")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn elevation_schedules_owner_window() {
        let fx = Fixture::new();
        fx.directory.add_user("a@x.com", "u-1").await;
        fx.subscriptions.add("subs-demo-dev", "sub-guid-1").await;

        let (status, body) = post_json(
            fx.app(),
            "/azure/privilege/elevations",
            json!({
                "ProjectName": "demo",
                "Environment": "dev",
                "AssignRole": "owner",
                "Email": "a@x.com",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Message"], "Privilege elevations request accepted");

        let submitted = fx.scheduler.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(
            submitted[0].scope,
            "/providers/Microsoft.Subscription/subscriptions/sub-guid-1/"
        );
        assert_eq!((submitted[0].end - submitted[0].start).num_minutes(), 120);
    }

    #[tokio::test]
    async fn elevation_honors_subscription_name_override() {
        let fx = Fixture::new();
        fx.directory.add_user("a@x.com", "u-1").await;
        fx.subscriptions.add("subs-shared-prd", "sub-guid-9").await;

        let (status, _) = post_json(
            fx.app(),
            "/azure/privilege/elevations",
            json!({
                "ProjectName": "demo",
                "Environment": "dev",
                "AssignRole": "contributor",
                "Email": "a@x.com",
                "SubscriptionName": "subs-shared-prd",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let submitted = fx.scheduler.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!((submitted[0].end - submitted[0].start).num_minutes(), 480);
        assert!(submitted[0].scope.contains("sub-guid-9"));
    }

    #[tokio::test]
    async fn elevation_unknown_subscription_never_reaches_scheduler() {
        let fx = Fixture::new();
        fx.directory.add_user("a@x.com", "u-1").await;

        let (status, body) = post_json(
            fx.app(),
            "/azure/privilege/elevations",
            json!({
                "ProjectName": "demo",
                "Environment": "dev",
                "AssignRole": "owner",
                "Email": "a@x.com",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["Message"], "Validation error or missing parameters");
        assert!(fx.scheduler.submitted().is_empty());
    }
}

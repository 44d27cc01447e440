use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use entragate_domain::SubscriptionId;

use crate::error::AzureError;
use crate::http::{http_client, send_with_retry};
use crate::service::{RoleScheduler, ScheduleRequest, SubscriptionCatalog};
use crate::token::TokenProvider;

const DEFAULT_MANAGEMENT_BASE: &str = "https://management.azure.com";

const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";
const SCHEDULE_REQUESTS_API_VERSION: &str = "2020-10-01";

/// Azure Resource Manager client for subscription enumeration and PIM
/// role-assignment schedule requests.
pub struct ArmClient {
    client: reqwest::Client,
    token:  Box<dyn TokenProvider>,
    base:   String,
}

impl ArmClient {
    pub fn new(token: Box<dyn TokenProvider>) -> Self {
        Self {
            client: http_client(),
            token,
            base: DEFAULT_MANAGEMENT_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base(token: Box<dyn TokenProvider>, base: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            token,
            base: base.into(),
        }
    }

    async fn get(&self, url: &str) -> Result<(reqwest::StatusCode, Value), AzureError> {
        let token = self.token.token().await?;
        debug!(url, "ARM GET");
        let resp = send_with_retry(self.client.get(url).bearer_auth(&token))
            .await
            .map_err(|e| AzureError::Downstream(format!("GET {}: {}", url, e)))?;
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    fn parse_arm_error(body: &Value) -> String {
        let err = body
            .get("error")
            .or_else(|| body.get("Error"))
            .unwrap_or(body);
        let code = err["code"].as_str().unwrap_or("Unknown");
        let message = err["message"].as_str().unwrap_or("unknown error");
        format!("{}: {}", code, message)
    }
}

// ── SubscriptionCatalog ───────────────────────────────────────────────────────

#[async_trait]
impl SubscriptionCatalog for ArmClient {
    async fn subscription_id_by_name(
        &self,
        display_name: &str,
    ) -> Result<SubscriptionId, AzureError> {
        let mut next = Some(format!(
            "{}/subscriptions?api-version={}",
            self.base, SUBSCRIPTIONS_API_VERSION
        ));

        while let Some(url) = next {
            let (status, body) = self.get(&url).await?;
            if !status.is_success() {
                return Err(AzureError::Downstream(format!(
                    "list subscriptions: status {}: {}",
                    status.as_u16(),
                    Self::parse_arm_error(&body)
                )));
            }

            if let Some(entries) = body["value"].as_array() {
                for entry in entries {
                    if entry["displayName"].as_str() == Some(display_name) {
                        let id = entry["subscriptionId"].as_str().ok_or_else(|| {
                            AzureError::Internal(format!(
                                "subscription '{}': no subscriptionId in response",
                                display_name
                            ))
                        })?;
                        return Ok(SubscriptionId::new(id));
                    }
                }
            }
            next = body["nextLink"].as_str().map(String::from);
        }

        Err(AzureError::NotFound("Subscription is not found".to_string()))
    }
}

// ── RoleScheduler ─────────────────────────────────────────────────────────────

#[async_trait]
impl RoleScheduler for ArmClient {
    async fn submit(&self, request: &ScheduleRequest) -> Result<(), AzureError> {
        let token = self.token.token().await?;
        let url = format!(
            "{}{}providers/Microsoft.Authorization/roleAssignmentScheduleRequests/{}?api-version={}",
            self.base, request.scope, request.request_id, SCHEDULE_REQUESTS_API_VERSION,
        );
        let body = json!({
            "properties": {
                "principalId": request.principal_id.as_str(),
                "roleDefinitionId": request.role_definition_id,
                "requestType": "AdminAssign",
                "scheduleInfo": {
                    "startDateTime": request.start.to_rfc3339(),
                    "expiration": {
                        "type": "AfterDateTime",
                        "endDateTime": request.end.to_rfc3339(),
                    },
                },
            },
        });

        debug!(
            request_id = %request.request_id,
            principal = %request.principal_id,
            scope = %request.scope,
            "ARM PUT roleAssignmentScheduleRequests"
        );
        let resp = send_with_retry(self.client.put(&url).bearer_auth(&token).json(&body))
            .await
            .map_err(|e| AzureError::Downstream(format!("PUT {}: {}", url, e)))?;
        let status = resp.status();
        if status.is_success() {
            info!(request_id = %request.request_id, "PIM schedule request accepted");
            return Ok(());
        }

        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Err(AzureError::Downstream(format!(
            "PIM schedule request rejected: status {}: {}",
            status.as_u16(),
            Self::parse_arm_error(&body)
        )))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::StaticToken;
    use chrono::{FixedOffset, TimeZone};
    use entragate_domain::UserId;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ArmClient {
        ArmClient::with_base(Box::new(StaticToken("fake-token".into())), server.uri())
    }

    fn subs_page(entries: Value) -> Value {
        json!({ "value": entries })
    }

    #[tokio::test]
    async fn subscription_lookup_matches_display_name_exactly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(subs_page(json!([
                { "subscriptionId": "sub-1", "displayName": "subs-demo-dev" },
                { "subscriptionId": "sub-2", "displayName": "subs-demo-prd" },
            ]))))
            .mount(&server)
            .await;

        let id = client(&server)
            .subscription_id_by_name("subs-demo-dev")
            .await
            .unwrap();
        assert_eq!(id.as_str(), "sub-1");
    }

    #[tokio::test]
    async fn subscription_lookup_is_case_sensitive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(subs_page(json!([
                { "subscriptionId": "sub-1", "displayName": "Subs-Demo-Dev" },
            ]))))
            .mount(&server)
            .await;

        let err = client(&server)
            .subscription_id_by_name("subs-demo-dev")
            .await
            .unwrap_err();
        assert!(matches!(err, AzureError::NotFound(_)), "got: {}", err);
        assert_eq!(err.to_string(), "Subscription is not found");
    }

    #[tokio::test]
    async fn subscription_lookup_follows_next_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [ { "subscriptionId": "sub-1", "displayName": "other" } ],
                "nextLink": format!("{}/subscriptions-page-2", server.uri()),
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/subscriptions-page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(subs_page(json!([
                { "subscriptionId": "sub-9", "displayName": "subs-x-prd" },
            ]))))
            .mount(&server)
            .await;

        let id = client(&server)
            .subscription_id_by_name("subs-x-prd")
            .await
            .unwrap();
        assert_eq!(id.as_str(), "sub-9");
    }

    fn schedule_request() -> ScheduleRequest {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let start = jst.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        ScheduleRequest {
            scope: "/providers/Microsoft.Subscription/subscriptions/sub-1/".to_string(),
            role_definition_id:
                "/subscriptions/sub-1/providers/Microsoft.Authorization/roleDefinitions/8e3af657-a8ff-443c-a75c-2fe8c4bcb635"
                    .to_string(),
            principal_id: UserId::new("user-guid-1"),
            request_id: Uuid::new_v4(),
            start,
            end: start + chrono::Duration::minutes(120),
        }
    }

    #[tokio::test]
    async fn submit_puts_admin_assign_with_window() {
        let server = MockServer::start().await;
        let req = schedule_request();
        Mock::given(method("PUT"))
            .and(path(format!(
                "/providers/Microsoft.Subscription/subscriptions/sub-1/providers/Microsoft.Authorization/roleAssignmentScheduleRequests/{}",
                req.request_id
            )))
            .and(body_partial_json(json!({
                "properties": {
                    "principalId": "user-guid-1",
                    "requestType": "AdminAssign",
                    "scheduleInfo": {
                        "startDateTime": req.start.to_rfc3339(),
                        "expiration": {
                            "type": "AfterDateTime",
                            "endDateTime": req.end.to_rfc3339(),
                        },
                    },
                },
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "name": req.request_id,
            })))
            .mount(&server)
            .await;

        client(&server).submit(&req).await.unwrap();
    }

    #[tokio::test]
    async fn submit_rejection_is_downstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path_regex(r".*/roleAssignmentScheduleRequests/.*"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": {
                    "code": "RoleAssignmentRequestExists",
                    "message": "There is already an active assignment for this principal."
                }
            })))
            .mount(&server)
            .await;

        let err = client(&server).submit(&schedule_request()).await.unwrap_err();
        assert!(matches!(err, AzureError::Downstream(_)), "got: {}", err);
        assert!(err.to_string().contains("RoleAssignmentRequestExists"));
    }

    #[test]
    fn parse_arm_error_standard() {
        let body = json!({
            "error": { "code": "ResourceNotFound", "message": "The resource was not found" }
        });
        let msg = ArmClient::parse_arm_error(&body);
        assert!(msg.contains("ResourceNotFound"), "got: {}", msg);
    }

    #[test]
    fn parse_arm_error_missing_fields_gives_fallback() {
        let body = json!({ "error": {} });
        assert_eq!(ArmClient::parse_arm_error(&body), "Unknown: unknown error");
    }
}

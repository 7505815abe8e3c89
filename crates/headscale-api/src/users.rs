//! User operations.

use crate::client::HeadscaleClient;
use crate::models::{CreateUserRequest, User, UserConfig, UserEnvelope, UserList};
use crate::{Result, UserOutcome};
use headscale_core::classify::{execute, ErrorBody, Policy, Request, Rule, Signal};
use headscale_core::{Error, Outcome, RawResponse, Status};
use reqwest::StatusCode;
use tracing::warn;

const USERS_PATH: &str = "user";

const LOOKUP_RULES: &[Rule] = &[
    Rule::report(Signal::Unauthorized, Status::Error, Error::Unauthorized),
    Rule::resolve(Signal::UserAlreadyExists, Status::Exists),
];

const GET_POLICY: Policy = Policy {
    success: Status::Exists,
    rules: LOOKUP_RULES,
    unmatched: Status::Error,
};

const CREATE_POLICY: Policy = Policy {
    success: Status::Created,
    rules: LOOKUP_RULES,
    unmatched: Status::Error,
};

const DELETE_POLICY: Policy = Policy {
    success: Status::Deleted,
    rules: &[
        Rule::report(Signal::Unauthorized, Status::Error, Error::Unauthorized),
        Rule::report(Signal::UserNotFound, Status::Unknown, Error::UserNotFound),
    ],
    unmatched: Status::Error,
};

impl HeadscaleClient {
    /// List every user known to the control plane.
    ///
    /// # Errors
    ///
    /// Transport and decode failures are returned as-is. A rejected API key is
    /// returned as [`Error::Unauthorized`]. Any other status than 200 is
    /// returned as [`Error::Unclassified`] with the raw body.
    pub async fn list_users(&self) -> Result<Vec<UserConfig>> {
        let response = self.transport().get(USERS_PATH).await?;
        if response.status() == StatusCode::INTERNAL_SERVER_ERROR
            && ErrorBody::parse(response.body()).reports(Signal::Unauthorized)
        {
            return Err(Error::Unauthorized);
        }
        if response.status() != StatusCode::OK {
            warn!(
                http_status = response.status().as_u16(),
                "unexpected status listing users"
            );
            return Err(response.into_unclassified());
        }
        Ok(response.json::<UserList>()?.into_users())
    }

    /// Look up a user by name. Resolves to [`Status::Exists`] with the user
    /// on success.
    pub async fn get_user(&self, name: &str) -> UserOutcome {
        let path = match user_path(name) {
            Ok(path) => path,
            Err(err) => return Outcome::failed(err),
        };
        execute(self.transport(), Request::Get(&path), &GET_POLICY, decode_user).await
    }

    /// Create a user. Creating a name that already exists resolves to
    /// [`Status::Exists`] without an error.
    pub async fn create_user(&self, name: &str) -> UserOutcome {
        if let Err(err) = validate_name(name) {
            return Outcome::failed(err);
        }
        let body = match serde_json::to_value(CreateUserRequest {
            name: name.to_string(),
        }) {
            Ok(body) => body,
            Err(err) => return Outcome::failed(err.into()),
        };
        execute(
            self.transport(),
            Request::Post(USERS_PATH, &body),
            &CREATE_POLICY,
            decode_user,
        )
        .await
    }

    /// Delete a user. A missing user resolves to [`Status::Unknown`] with
    /// [`Error::UserNotFound`]. Never carries a payload.
    pub async fn delete_user(&self, name: &str) -> UserOutcome {
        let path = match user_path(name) {
            Ok(path) => path,
            Err(err) => return Outcome::failed(err),
        };
        execute::<User, _>(self.transport(), Request::Delete(&path), &DELETE_POLICY, |_| {
            Ok(None)
        })
        .await
    }
}

fn decode_user(response: &RawResponse) -> Result<Option<UserConfig>> {
    response
        .json::<UserEnvelope>()
        .map(|envelope| Some(envelope.user))
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::ValidationError("user name must not be empty".to_string()));
    }
    if name == "." || name == ".." {
        return Err(Error::ValidationError(format!(
            "user name `{name}` is not a valid path segment"
        )));
    }
    if name.contains('/') {
        return Err(Error::ValidationError(format!(
            "user name `{name}` must not contain `/`"
        )));
    }
    Ok(())
}

fn user_path(name: &str) -> Result<String> {
    validate_name(name)?;
    Ok(format!("{USERS_PATH}/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use headscale_core::Transport;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    mockall::mock! {
        pub Upstream {}

        #[async_trait]
        impl Transport for Upstream {
            async fn get(&self, path: &str) -> Result<RawResponse>;
            async fn post(&self, path: &str, body: &Value) -> Result<RawResponse>;
            async fn delete(&self, path: &str) -> Result<RawResponse>;
        }
    }

    fn test_client(server: &MockServer) -> HeadscaleClient {
        HeadscaleClient::new(server.uri(), "test-key").unwrap()
    }

    fn user_json(id: &str, name: &str) -> Value {
        json!({"id": id, "name": name, "createdAt": "2024-02-03T04:05:06Z"})
    }

    #[tokio::test]
    async fn list_users_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [user_json("1", "alice"), user_json("2", "bob")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let users = test_client(&server).list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].name, "bob");
        assert_eq!(users[1].id, 2);
    }

    #[tokio::test]
    async fn list_users_non_200_surfaces_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database is locked"))
            .mount(&server)
            .await;

        let err = test_client(&server).list_users().await.unwrap_err();
        assert_eq!(
            err,
            Error::Unclassified {
                status: 500,
                body: "database is locked".to_string()
            }
        );
    }

    #[tokio::test]
    async fn list_users_rejected_key_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = test_client(&server).list_users().await.unwrap_err();
        assert_eq!(err, Error::Unauthorized);
    }

    #[tokio::test]
    async fn get_user_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user/alice"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"user": user_json("7", "alice")})),
            )
            .mount(&server)
            .await;

        let outcome = test_client(&server).get_user("alice").await;
        assert_eq!(outcome.status(), Status::Exists);
        assert_eq!(outcome.payload().map(|user| user.id), Some(7));
        assert!(outcome.error().is_none());
    }

    #[tokio::test]
    async fn get_user_already_exists_body_is_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user/alice"))
            .respond_with(ResponseTemplate::new(500).set_body_string("User already exists"))
            .mount(&server)
            .await;

        let outcome = test_client(&server).get_user("alice").await;
        assert_eq!(outcome.status(), Status::Exists);
        assert!(outcome.error().is_none());
        assert!(outcome.payload().is_none());
    }

    #[tokio::test]
    async fn get_user_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user/alice"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let outcome = test_client(&server).get_user("alice").await;
        assert_eq!(outcome.status(), Status::Error);
        assert_eq!(outcome.error(), Some(&Error::Unauthorized));
        assert!(outcome.payload().is_none());
    }

    #[tokio::test]
    async fn get_user_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"user\": 3}"))
            .mount(&server)
            .await;

        let outcome = test_client(&server).get_user("alice").await;
        assert_eq!(outcome.status(), Status::Error);
        assert!(matches!(outcome.error(), Some(Error::Decode(_))));
        assert!(outcome.payload().is_none());
    }

    #[tokio::test]
    async fn create_user_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/user"))
            .and(body_json(json!({"name": "bar"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"user": user_json("3", "bar")})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = test_client(&server).create_user("bar").await;
        assert_eq!(outcome.status(), Status::Created);
        assert_eq!(outcome.into_payload().unwrap().name, "bar");
    }

    #[tokio::test]
    async fn create_user_already_exists_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/user"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "code": 2,
                "message": "failed to create user: User already exists",
                "details": []
            })))
            .mount(&server)
            .await;

        let outcome = test_client(&server).create_user("bar").await;
        assert_eq!(outcome.status(), Status::Exists);
        assert!(outcome.error().is_none());
        assert!(outcome.payload().is_none());
    }

    #[tokio::test]
    async fn create_user_unclassified_keeps_raw_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/user"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid name"))
            .mount(&server)
            .await;

        let outcome = test_client(&server).create_user("Bad Name").await;
        assert_eq!(outcome.status(), Status::Error);
        assert!(!outcome.is_confirmed());
        assert_eq!(
            outcome.error(),
            Some(&Error::Unclassified {
                status: 400,
                body: "invalid name".to_string()
            })
        );
    }

    #[tokio::test]
    async fn delete_user_deleted() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/user/bar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = test_client(&server).delete_user("bar").await;
        assert_eq!(outcome.status(), Status::Deleted);
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn delete_missing_user_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/user/baz"))
            .respond_with(ResponseTemplate::new(500).set_body_string("User not found"))
            .mount(&server)
            .await;

        let outcome = test_client(&server).delete_user("baz").await;
        assert_eq!(outcome.status(), Status::Unknown);
        assert_eq!(outcome.error(), Some(&Error::UserNotFound));
    }

    #[tokio::test]
    async fn delete_user_structured_reason() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/user/baz"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "code": 5,
                "message": "no such record",
                "reason": "USER_NOT_FOUND"
            })))
            .mount(&server)
            .await;

        let outcome = test_client(&server).delete_user("baz").await;
        assert_eq!(outcome.status(), Status::Unknown);
        assert_eq!(outcome.error(), Some(&Error::UserNotFound));
    }

    #[tokio::test]
    async fn invalid_names_never_reach_the_transport() {
        let transport = MockUpstream::new();
        let client = HeadscaleClient::with_transport(Arc::new(transport));

        let outcome = client.get_user("").await;
        assert_eq!(outcome.status(), Status::Error);
        assert!(matches!(outcome.error(), Some(Error::ValidationError(_))));

        for name in ["a/b", ".", ".."] {
            let outcome = client.delete_user(name).await;
            assert_eq!(outcome.status(), Status::Error);
            assert!(matches!(outcome.error(), Some(Error::ValidationError(_))));

            let outcome = client.get_user(name).await;
            assert!(matches!(outcome.error(), Some(Error::ValidationError(_))));

            let outcome = client.create_user(name).await;
            assert!(matches!(outcome.error(), Some(Error::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn transport_failure_is_error_status() {
        let mut transport = MockUpstream::new();
        transport
            .expect_post()
            .times(1)
            .returning(|_, _| Err(Error::Timeout("deadline elapsed".to_string())));

        let client = HeadscaleClient::with_transport(Arc::new(transport));
        let outcome = client.create_user("bar").await;
        assert_eq!(outcome.status(), Status::Error);
        assert!(outcome.error().is_some_and(Error::is_transport));
    }

    #[tokio::test]
    async fn list_users_propagates_transport_failure() {
        let mut transport = MockUpstream::new();
        transport
            .expect_get()
            .withf(|path| path == "user")
            .times(1)
            .returning(|_| Err(Error::Transport("connection refused".to_string())));

        let client = HeadscaleClient::with_transport(Arc::new(transport));
        let err = client.list_users().await.unwrap_err();
        assert!(err.is_transport());
    }
}

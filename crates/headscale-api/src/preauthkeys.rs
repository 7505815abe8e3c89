//! Pre-auth key operations.

use crate::client::HeadscaleClient;
use crate::models::{CreatePreAuthKeyRequest, PreAuthKeyConfig, PreAuthKeyEnvelope};
use crate::PreAuthKeyOutcome;
use headscale_core::classify::{execute, Policy, Request, Rule, Signal};
use headscale_core::{Error, Outcome, Status};
use tracing::debug;

const PRE_AUTH_KEY_PATH: &str = "preauthkey";

// A user-not-found here is a hard failure, unlike on delete.
const CREATE_POLICY: Policy = Policy {
    success: Status::Created,
    rules: &[
        Rule::report(Signal::Unauthorized, Status::Error, Error::Unauthorized),
        Rule::report(Signal::UserNotFound, Status::Error, Error::UserNotFound),
    ],
    unmatched: Status::Unknown,
};

impl HeadscaleClient {
    /// Create a pre-auth key for an existing user.
    ///
    /// The key payload is only present when the status is
    /// [`Status::Created`].
    pub async fn create_pre_auth_key(&self, config: &PreAuthKeyConfig) -> PreAuthKeyOutcome {
        let request = CreatePreAuthKeyRequest::from_config(config);
        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(err) => return Outcome::failed(err.into()),
        };

        debug!(
            user = %request.user,
            reusable = request.reusable,
            ephemeral = request.ephemeral,
            tags = request.acl_tags.as_ref().map_or(0, Vec::len),
            "creating pre-auth key"
        );

        execute(
            self.transport(),
            Request::Post(PRE_AUTH_KEY_PATH, &body),
            &CREATE_POLICY,
            |response| {
                response
                    .json::<PreAuthKeyEnvelope>()
                    .map(|envelope| Some(envelope.pre_auth_key))
            },
        )
        .await
    }
}

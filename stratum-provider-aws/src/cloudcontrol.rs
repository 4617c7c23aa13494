//! Cloud Control API resources
//!
//! `cloudcontrol.resource` manages any CloudFormation resource type through
//! Cloud Control. Every mutation returns a request token; the request is then
//! polled until it settles.
//!
//! Remote identifiers have the form `TypeName|PrimaryIdentifier`, e.g.
//! `AWS::Logs::LogGroup|app-logs`.

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_cloudcontrol::Client as CloudControlClient;
use aws_sdk_cloudcontrol::types::ProgressEvent;
use log::{debug, info};
use serde::Serialize;
use stratum_core::provider::{ErrorKind, ProviderError, ProviderResult};
use stratum_core::resource::{Resource, ResourceId, State, Value};
use stratum_core::timeouts::Timeouts;
use stratum_core::waiter::{
    FetchError, Observation, RefreshResult, StateChangeConf, WaitError, WaitFailure,
};
use tokio_util::sync::CancellationToken;

use crate::convert::{json_to_value, patch_document, value_to_json};
use crate::error::{AwsError, classify_sdk_error};

pub const RESOURCE_TYPE: &str = "cloudcontrol.resource";

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_FAILED: &str = "FAILED";
pub const STATUS_CANCEL_IN_PROGRESS: &str = "CANCEL_IN_PROGRESS";
pub const STATUS_CANCEL_COMPLETE: &str = "CANCEL_COMPLETE";

/// State attribute holding the properties declared at the last apply
pub const DECLARED_ATTRIBUTE: &str = "desired_state";

/// Poll interval of request status checks
pub const REQUEST_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Snapshot of one Cloud Control request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestProgress {
    pub request_token: String,
    pub type_name: Option<String>,
    pub identifier: Option<String>,
    pub operation: Option<String>,
    pub operation_status: String,
    pub status_message: Option<String>,
    pub error_code: Option<String>,
}

/// Wait configuration for a Cloud Control request
pub fn request_conf(request_token: &str, timeout: Duration) -> StateChangeConf {
    StateChangeConf::new(format!("Cloud Control request {}", request_token))
        .pending([STATUS_PENDING, STATUS_IN_PROGRESS, STATUS_CANCEL_IN_PROGRESS])
        .target([STATUS_SUCCESS])
        .failure([STATUS_FAILED, STATUS_CANCEL_COMPLETE])
        .poll_interval(REQUEST_POLL_INTERVAL)
        .timeout(timeout)
}

/// Turn a progress event into a poller observation
pub fn observe(event: &ProgressEvent) -> RefreshResult<RequestProgress> {
    let status = event
        .operation_status()
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| STATUS_PENDING.to_string());

    let progress = RequestProgress {
        request_token: event.request_token().unwrap_or_default().to_string(),
        type_name: event.type_name().map(str::to_string),
        identifier: event.identifier().map(str::to_string),
        operation: event.operation().map(|o| o.as_str().to_string()),
        operation_status: status.clone(),
        status_message: event.status_message().map(str::to_string),
        error_code: event.error_code().map(|c| c.as_str().to_string()),
    };

    let detail = match (&progress.error_code, &progress.status_message) {
        (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
        (None, Some(message)) => Some(message.clone()),
        (Some(code), None) => Some(code.clone()),
        (None, None) => None,
    };

    Ok(Observation::new(progress, status).with_detail(detail))
}

/// Split `TypeName|PrimaryIdentifier`
pub fn split_identifier(identifier: &str) -> ProviderResult<(&str, &str)> {
    identifier
        .split_once('|')
        .filter(|(type_name, primary)| !type_name.is_empty() && !primary.is_empty())
        .ok_or_else(|| {
            ProviderError::new(format!(
                "Invalid Cloud Control identifier '{}': expected TypeName|PrimaryIdentifier",
                identifier
            ))
            .with_kind(ErrorKind::InvalidConfig)
        })
}

pub fn join_identifier(type_name: &str, primary: &str) -> String {
    format!("{}|{}", type_name, primary)
}

/// Cloud Control client bound to the provider's cancellation token
pub struct CloudControl {
    client: CloudControlClient,
    cancel: CancellationToken,
}

impl CloudControl {
    pub fn new(client: CloudControlClient, cancel: CancellationToken) -> Self {
        Self { client, cancel }
    }

    // =========================================================================
    // Cloud Control API Methods
    // =========================================================================

    /// Get resource properties; `None` if the resource does not exist
    pub async fn get(
        &self,
        type_name: &str,
        identifier: &str,
    ) -> Result<Option<serde_json::Value>, AwsError> {
        let result = self
            .client
            .get_resource()
            .type_name(type_name)
            .identifier(identifier)
            .send()
            .await
            .map_err(classify_sdk_error);

        match result {
            Ok(response) => {
                let Some(props_str) = response
                    .resource_description()
                    .and_then(|desc| desc.properties())
                else {
                    return Ok(None);
                };
                let props = serde_json::from_str(props_str).map_err(|e| AwsError::Sdk {
                    code: None,
                    message: format!("Invalid resource properties: {}", e),
                })?;
                Ok(Some(props))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a resource and wait for the request; returns the settled request
    pub async fn create(
        &self,
        type_name: &str,
        desired_state: &serde_json::Value,
        timeout: Duration,
    ) -> ProviderResult<RequestProgress> {
        let output = self
            .client
            .create_resource()
            .type_name(type_name)
            .desired_state(desired_state.to_string())
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let request_token = output
            .progress_event()
            .and_then(|p| p.request_token())
            .ok_or_else(|| ProviderError::new("No request token returned"))?;

        info!("Creating {} (request {})", type_name, request_token);
        Ok(self.wait_for_request(request_token, timeout).await?)
    }

    /// Apply JSON Patch operations to a resource
    pub async fn update(
        &self,
        type_name: &str,
        identifier: &str,
        patch_ops: &[serde_json::Value],
        timeout: Duration,
    ) -> ProviderResult<()> {
        if patch_ops.is_empty() {
            return Ok(());
        }

        let document = serde_json::to_string(patch_ops)
            .map_err(|e| ProviderError::new(format!("Failed to build patch: {}", e)))?;

        let output = self
            .client
            .update_resource()
            .type_name(type_name)
            .identifier(identifier)
            .patch_document(document)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        if let Some(request_token) = output.progress_event().and_then(|p| p.request_token()) {
            info!("Updating {} {} (request {})", type_name, identifier, request_token);
            self.wait_for_request(request_token, timeout).await?;
        }

        Ok(())
    }

    /// Delete a resource; an already-deleted resource is not an error
    pub async fn delete(
        &self,
        type_name: &str,
        identifier: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let result = self
            .client
            .delete_resource()
            .type_name(type_name)
            .identifier(identifier)
            .send()
            .await
            .map_err(classify_sdk_error);

        let output = match result {
            Ok(output) => output,
            Err(e) if e.is_not_found() => {
                debug!("{} {} already deleted", type_name, identifier);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(request_token) = output.progress_event().and_then(|p| p.request_token()) {
            info!("Deleting {} {} (request {})", type_name, identifier, request_token);
            self.wait_for_request(request_token, timeout).await?;
        }

        Ok(())
    }

    /// Poll a request token until the request settles
    ///
    /// On failure the error carries the last progress event observed.
    pub async fn wait_for_request(
        &self,
        request_token: &str,
        timeout: Duration,
    ) -> Result<RequestProgress, WaitFailure<RequestProgress>> {
        let conf = request_conf(request_token, timeout);
        let client = self.client.clone();
        let token = request_token.to_string();

        let settled = conf
            .wait_for_state(&self.cancel, || {
                let client = client.clone();
                let token = token.clone();
                async move {
                    let output = client
                        .get_resource_request_status()
                        .request_token(token)
                        .send()
                        .await
                        .map_err(classify_sdk_error)?;
                    let event = output
                        .progress_event()
                        .ok_or_else(|| FetchError::other("response carries no progress event"))?;
                    observe(event)
                }
            })
            .await?;

        settled.ok_or_else(|| {
            let error = WaitError::NotFound {
                resource: conf.resource().to_string(),
                checks: 0,
                last_error: "request no longer exists".to_string(),
            };
            WaitFailure::new(error, None)
        })
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };
        let (type_name, primary) =
            split_identifier(identifier).map_err(|e| e.for_resource(id.clone()))?;

        let props = self
            .get(type_name, primary)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        let Some(props) = props else {
            return Ok(State::not_found(id.clone()));
        };

        let mut attributes = HashMap::new();
        attributes.insert("type_name".to_string(), Value::from(type_name));
        if let Some(properties) = json_to_value(&props) {
            attributes.insert("properties".to_string(), properties);
        }

        Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
    }

    pub async fn create_resource(
        &self,
        resource: &Resource,
        timeouts: &Timeouts,
    ) -> ProviderResult<State> {
        let id = &resource.id;
        let (type_name, desired) = desired_state(resource)?;

        let progress = self
            .create(type_name, &value_to_json(&Value::Map(desired.clone())), timeouts.create)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        let primary = progress.identifier.ok_or_else(|| {
            ProviderError::new("Request succeeded without a resource identifier")
                .for_resource(id.clone())
        })?;
        let identifier = join_identifier(type_name, &primary);

        let state = self.read_resource(id, Some(&identifier)).await?;
        Ok(with_declared(state, desired))
    }

    /// Patch the resource from its last known state `from` to `to`
    pub async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
        timeouts: &Timeouts,
    ) -> ProviderResult<State> {
        let (type_name, primary) =
            split_identifier(identifier).map_err(|e| e.for_resource(id.clone()))?;
        let (_, desired) = desired_state(to)?;

        let patch = patch_document(
            from.attributes.get("properties").and_then(Value::as_map),
            from.attributes.get(DECLARED_ATTRIBUTE).and_then(Value::as_map),
            desired,
        );
        self.update(type_name, primary, &patch, timeouts.update)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        let state = self.read_resource(id, Some(identifier)).await?;
        Ok(with_declared(state, desired))
    }

    pub async fn delete_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        timeouts: &Timeouts,
    ) -> ProviderResult<()> {
        let (type_name, primary) =
            split_identifier(identifier).map_err(|e| e.for_resource(id.clone()))?;

        self.delete(type_name, primary, timeouts.delete)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }
}

/// Record the declared properties, so the next update can tell which ones were dropped
fn with_declared(mut state: State, desired: &HashMap<String, Value>) -> State {
    if state.exists {
        state
            .attributes
            .insert(DECLARED_ATTRIBUTE.to_string(), Value::Map(desired.clone()));
    }
    state
}

/// `type_name` and `desired_state` attributes of a declared resource
fn desired_state(resource: &Resource) -> ProviderResult<(&str, &HashMap<String, Value>)> {
    let type_name = resource.get_str("type_name").ok_or_else(|| {
        ProviderError::new("Attribute 'type_name' is required")
            .with_kind(ErrorKind::InvalidConfig)
            .for_resource(resource.id.clone())
    })?;
    let desired = resource.get_map(DECLARED_ATTRIBUTE).ok_or_else(|| {
        ProviderError::new("Attribute 'desired_state' must be a map")
            .with_kind(ErrorKind::InvalidConfig)
            .for_resource(resource.id.clone())
    })?;
    Ok((type_name, desired))
}

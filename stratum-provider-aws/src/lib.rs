//! Stratum AWS Provider
//!
//! ## Module Structure
//!
//! - `cloudcontrol` - Generic Cloud Control resources and request waiting
//! - `comprehend` - Comprehend entity recognizers (training waiters, VPC ENI lock)
//! - `guardduty` - GuardDuty member detector features (per-detector lock)
//! - `config` - Provider block configuration
//! - `convert` - Attribute value <-> JSON conversion
//! - `error` - AWS error classification
//! - `resources` - Resource type definitions and default timeouts

pub mod cloudcontrol;
pub mod comprehend;
pub mod config;
pub mod convert;
pub mod error;
pub mod guardduty;
pub mod resources;

pub use config::{ProviderConfig, normalize_region};
pub use error::AwsError;

use std::collections::HashMap;
use std::sync::Arc;

use aws_config::SdkConfig;
use aws_sdk_cloudcontrol::Client as CloudControlClient;
use aws_sdk_comprehend::Client as ComprehendClient;
use aws_sdk_guardduty::Client as GuardDutyClient;
use log::debug;
use stratum_core::KeyedMutex;
use stratum_core::provider::{
    BoxFuture, ErrorKind, Provider, ProviderError, ProviderResult, ResourceType,
};
use stratum_core::resource::{Resource, ResourceId, State, Value};
use stratum_core::timeouts::Timeouts;
use tokio_util::sync::CancellationToken;

use cloudcontrol::CloudControl;
use comprehend::{EntityRecognizers, entity_recognizer};
use guardduty::{MemberDetectorFeatures, member_detector_feature};

/// AWS Provider
///
/// Owns the SDK clients, the lock registry shared by every resource of the
/// process, and the root cancellation token of all waits.
pub struct AwsProvider {
    config: ProviderConfig,
    cloudcontrol: CloudControl,
    recognizers: EntityRecognizers<ComprehendClient>,
    member_features: MemberDetectorFeatures<GuardDutyClient>,
    locks: Arc<KeyedMutex>,
    cancel: CancellationToken,
}

impl AwsProvider {
    /// Create a provider, loading credentials and settings from the environment
    pub async fn new(config: &ProviderConfig) -> Self {
        let sdk_config = config.load_sdk_config().await;
        Self::from_sdk_config(config, &sdk_config)
    }

    /// Create a provider from the attributes of a provider block
    pub async fn from_attributes(attributes: &HashMap<String, Value>) -> ProviderResult<Self> {
        let config = ProviderConfig::from_attributes(attributes)?;
        Ok(Self::new(&config).await)
    }

    pub fn from_sdk_config(config: &ProviderConfig, sdk_config: &SdkConfig) -> Self {
        let locks = Arc::new(KeyedMutex::new());
        let cancel = CancellationToken::new();

        Self {
            config: config.clone(),
            cloudcontrol: CloudControl::new(CloudControlClient::new(sdk_config), cancel.clone()),
            recognizers: EntityRecognizers::new(
                Arc::new(ComprehendClient::new(sdk_config)),
                locks.clone(),
                cancel.clone(),
            ),
            member_features: MemberDetectorFeatures::new(
                Arc::new(GuardDutyClient::new(sdk_config)),
                locks.clone(),
                cancel.clone(),
            ),
            locks,
            cancel,
        }
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    /// Token that cancels every wait in progress; cancelling it is permanent
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn locks(&self) -> &Arc<KeyedMutex> {
        &self.locks
    }

    pub fn cloudcontrol(&self) -> &CloudControl {
        &self.cloudcontrol
    }

    pub fn entity_recognizers(&self) -> &EntityRecognizers<ComprehendClient> {
        &self.recognizers
    }

    /// Time budgets for a resource: type defaults, then the provider's
    /// `default_timeout`, then the resource's own `timeouts` block
    pub fn timeouts(
        &self,
        id: &ResourceId,
        attributes: &HashMap<String, Value>,
    ) -> ProviderResult<Timeouts> {
        let resource_type = resources::find(&id.resource_type).ok_or_else(|| unknown_type(id))?;
        let defaults = match self.config.default_timeout {
            Some(timeout) => Timeouts::uniform(timeout),
            None => resource_type.timeouts(),
        };
        defaults
            .merge_attributes(attributes)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))
    }

    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        match id.resource_type.as_str() {
            cloudcontrol::RESOURCE_TYPE => self.cloudcontrol.read_resource(id, identifier).await,
            entity_recognizer::RESOURCE_TYPE => self.recognizers.read(id, identifier).await,
            member_detector_feature::RESOURCE_TYPE => {
                self.member_features.read(id, identifier).await
            }
            _ => Err(unknown_type(id)),
        }
    }

    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let timeouts = self.timeouts(id, &resource.attributes)?;
        debug!("Creating {} (timeout {:?})", id, timeouts.create);

        match id.resource_type.as_str() {
            cloudcontrol::RESOURCE_TYPE => {
                self.cloudcontrol.create_resource(resource, &timeouts).await
            }
            entity_recognizer::RESOURCE_TYPE => self.recognizers.create(resource, &timeouts).await,
            member_detector_feature::RESOURCE_TYPE => {
                self.member_features.put(resource, timeouts.create).await
            }
            _ => Err(unknown_type(id)),
        }
    }

    pub async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let timeouts = self.timeouts(id, &to.attributes)?;

        match id.resource_type.as_str() {
            cloudcontrol::RESOURCE_TYPE => {
                self.cloudcontrol
                    .update_resource(id, identifier, from, to, &timeouts)
                    .await
            }
            entity_recognizer::RESOURCE_TYPE => self.recognizers.update(id),
            member_detector_feature::RESOURCE_TYPE => {
                self.member_features.put(to, timeouts.update).await
            }
            _ => Err(unknown_type(id)),
        }
    }

    pub async fn delete_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        state: &State,
    ) -> ProviderResult<()> {
        let timeouts = self.timeouts(id, &state.attributes)?;

        match id.resource_type.as_str() {
            cloudcontrol::RESOURCE_TYPE => {
                self.cloudcontrol
                    .delete_resource(id, identifier, &timeouts)
                    .await
            }
            entity_recognizer::RESOURCE_TYPE => {
                self.recognizers
                    .delete(id, identifier, state, &timeouts)
                    .await
            }
            member_detector_feature::RESOURCE_TYPE => self.member_features.delete(id, identifier),
            _ => Err(unknown_type(id)),
        }
    }
}

fn unknown_type(id: &ResourceId) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
        .with_kind(ErrorKind::InvalidConfig)
        .for_resource(id.clone())
}

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&id, &identifier, &from, &to).await })
    }

    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        state: &State,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let state = state.clone();
        Box::pin(async move { self.delete_resource(&id, &identifier, &state).await })
    }
}

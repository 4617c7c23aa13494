//! guardduty.member_detector_feature
//!
//! UpdateMemberDetectors rewrites the feature set of a member account while
//! GuardDuty offers no concurrency control of its own, so concurrent updates
//! for the same detector are serialized on the detector ID.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use stratum_core::provider::{ErrorKind, ProviderError, ProviderResult};
use stratum_core::resource::{Resource, ResourceId, State, Value};
use stratum_core::waiter::{Observation, StateChangeConf};
use stratum_core::{FetchError, KeyedMutex};
use tokio_util::sync::CancellationToken;

use super::api::{GuardDutyApi, MemberFeature};

pub const RESOURCE_TYPE: &str = "guardduty.member_detector_feature";

pub const STATUS_ENABLED: &str = "ENABLED";
pub const STATUS_DISABLED: &str = "DISABLED";

pub const FEATURE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Declared feature setting of one member account
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSpec {
    pub detector_id: String,
    pub account_id: String,
    pub name: String,
    pub status: String,
}

impl FeatureSpec {
    pub fn from_resource(resource: &Resource) -> ProviderResult<Self> {
        let required = |key: &str| {
            resource.get_str(key).map(str::to_string).ok_or_else(|| {
                ProviderError::new(format!("Attribute '{}' is required", key))
                    .with_kind(ErrorKind::InvalidConfig)
                    .for_resource(resource.id.clone())
            })
        };

        let spec = Self {
            detector_id: required("detector_id")?,
            account_id: required("account_id")?,
            name: required("name")?,
            status: required("status")?,
        };

        if spec.status != STATUS_ENABLED && spec.status != STATUS_DISABLED {
            return Err(ProviderError::new(format!(
                "Attribute 'status' must be {} or {}, got '{}'",
                STATUS_ENABLED, STATUS_DISABLED, spec.status
            ))
            .with_kind(ErrorKind::InvalidConfig)
            .for_resource(resource.id.clone()));
        }

        Ok(spec)
    }
}

/// Build `detector_id,account_id,feature_name`
pub fn join_identifier(detector_id: &str, account_id: &str, name: &str) -> String {
    format!("{},{},{}", detector_id, account_id, name)
}

/// Split `detector_id,account_id,feature_name`
pub fn parse_identifier(identifier: &str) -> ProviderResult<(&str, &str, &str)> {
    let parts: Vec<&str> = identifier.split(',').collect();
    match parts.as_slice() {
        [detector_id, account_id, name]
            if !detector_id.is_empty() && !account_id.is_empty() && !name.is_empty() =>
        {
            Ok((*detector_id, *account_id, *name))
        }
        _ => Err(ProviderError::new(format!(
            "Invalid identifier '{}': expected detector_id,account_id,feature_name",
            identifier
        ))
        .with_kind(ErrorKind::InvalidConfig)),
    }
}

/// Wait until the member reports `status` for the feature
pub fn status_conf(spec: &FeatureSpec, timeout: Duration) -> StateChangeConf {
    let opposite = if spec.status == STATUS_ENABLED {
        STATUS_DISABLED
    } else {
        STATUS_ENABLED
    };
    StateChangeConf::new(format!(
        "GuardDuty detector {} member {} feature {}",
        spec.detector_id, spec.account_id, spec.name
    ))
    .pending([opposite])
    .target([spec.status.as_str()])
    .poll_interval(FEATURE_POLL_INTERVAL)
    .timeout(timeout)
}

/// Member detector feature operations
pub struct MemberDetectorFeatures<A: ?Sized> {
    api: Arc<A>,
    locks: Arc<KeyedMutex>,
    cancel: CancellationToken,
}

impl<A: GuardDutyApi + ?Sized> MemberDetectorFeatures<A> {
    pub fn new(api: Arc<A>, locks: Arc<KeyedMutex>, cancel: CancellationToken) -> Self {
        Self { api, locks, cancel }
    }

    /// Create and update: set the feature status, then wait for it to apply
    pub async fn put(&self, resource: &Resource, timeout: Duration) -> ProviderResult<State> {
        let id = &resource.id;
        let spec = FeatureSpec::from_resource(resource)?;

        {
            let _detector = self.locks.lock(&spec.detector_id).await;
            let unprocessed = self
                .api
                .update_member_feature(&spec.detector_id, &spec.account_id, &spec.name, &spec.status)
                .await
                .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

            if !unprocessed.is_empty() {
                let reasons: Vec<String> = unprocessed
                    .iter()
                    .map(|u| format!("{}: {}", u.account_id, u.reason))
                    .collect();
                return Err(ProviderError::new(format!(
                    "Member accounts were not processed: {}",
                    reasons.join("; ")
                ))
                .with_kind(ErrorKind::RemoteFailure)
                .for_resource(id.clone()));
            }
        }
        info!(
            "Set GuardDuty feature {} to {} for member {}",
            spec.name, spec.status, spec.account_id
        );

        let api = &*self.api;
        let target = &spec;
        let feature = status_conf(&spec, timeout)
            .wait_for_state(&self.cancel, move || async move {
                let feature = api
                    .get_member_feature(&target.detector_id, &target.account_id, &target.name)
                    .await?;
                let status = feature.status.clone();
                Ok::<_, FetchError>(Observation::new(feature, status))
            })
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        match feature {
            Some(feature) => Ok(to_state(id, feature)),
            None => Err(ProviderError::new("Feature disappeared while waiting")
                .with_kind(ErrorKind::NotFound)
                .for_resource(id.clone())),
        }
    }

    pub async fn read(&self, id: &ResourceId, identifier: Option<&str>) -> ProviderResult<State> {
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };
        let (detector_id, account_id, name) =
            parse_identifier(identifier).map_err(|e| e.for_resource(id.clone()))?;

        match self.api.get_member_feature(detector_id, account_id, name).await {
            Ok(feature) => Ok(to_state(id, feature)),
            Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
            Err(e) => Err(ProviderError::from(e).for_resource(id.clone())),
        }
    }

    /// Removing the resource leaves the member's feature setting untouched
    pub fn delete(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        info!(
            "Removing {} ({}) from state; the member feature setting is left as is",
            id, identifier
        );
        Ok(())
    }
}

fn to_state(id: &ResourceId, feature: MemberFeature) -> State {
    let identifier = join_identifier(&feature.detector_id, &feature.account_id, &feature.name);
    let mut attributes = HashMap::new();
    attributes.insert("detector_id".to_string(), Value::from(feature.detector_id));
    attributes.insert("account_id".to_string(), Value::from(feature.account_id));
    attributes.insert("name".to_string(), Value::from(feature.name));
    attributes.insert("status".to_string(), Value::from(feature.status));
    State::existing(id.clone(), attributes).with_identifier(identifier)
}

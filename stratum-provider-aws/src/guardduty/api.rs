//! GuardDuty API surface used by the member detector feature resource

use aws_sdk_guardduty::Client as GuardDutyClient;
use aws_sdk_guardduty::types::{
    MemberDataSourceConfiguration, MemberFeaturesConfiguration, UnprocessedAccount,
};
use stratum_core::provider::BoxFuture;

use crate::error::{AwsError, classify_sdk_error};

/// One protection plan feature of a member account's detector
#[derive(Debug, Clone, PartialEq)]
pub struct MemberFeature {
    pub detector_id: String,
    pub account_id: String,
    pub name: String,
    pub status: String,
}

/// Account the service did not process, with the reason it gave
#[derive(Debug, Clone, PartialEq)]
pub struct Unprocessed {
    pub account_id: String,
    pub reason: String,
}

pub trait GuardDutyApi: Send + Sync {
    /// Set one feature of one member account; returns the accounts left unprocessed
    fn update_member_feature(
        &self,
        detector_id: &str,
        account_id: &str,
        feature: &str,
        status: &str,
    ) -> BoxFuture<'_, Result<Vec<Unprocessed>, AwsError>>;

    /// Current setting of one feature of one member account
    fn get_member_feature(
        &self,
        detector_id: &str,
        account_id: &str,
        feature: &str,
    ) -> BoxFuture<'_, Result<MemberFeature, AwsError>>;
}

impl GuardDutyApi for GuardDutyClient {
    fn update_member_feature(
        &self,
        detector_id: &str,
        account_id: &str,
        feature: &str,
        status: &str,
    ) -> BoxFuture<'_, Result<Vec<Unprocessed>, AwsError>> {
        let detector_id = detector_id.to_string();
        let account_id = account_id.to_string();
        let configuration = MemberFeaturesConfiguration::builder()
            .name(feature.into())
            .status(status.into())
            .build();

        Box::pin(async move {
            let output = self
                .update_member_detectors()
                .detector_id(detector_id)
                .account_ids(account_id)
                .features(configuration)
                .send()
                .await
                .map_err(classify_sdk_error)?;

            Ok(unprocessed(output.unprocessed_accounts()))
        })
    }

    fn get_member_feature(
        &self,
        detector_id: &str,
        account_id: &str,
        feature: &str,
    ) -> BoxFuture<'_, Result<MemberFeature, AwsError>> {
        let detector_id = detector_id.to_string();
        let account_id = account_id.to_string();
        let feature = feature.to_string();

        Box::pin(async move {
            let output = self
                .get_member_detectors()
                .detector_id(&detector_id)
                .account_ids(&account_id)
                .send()
                .await
                .map_err(classify_sdk_error)?;

            let status = feature_status(
                output.member_data_source_configurations(),
                &account_id,
                &feature,
            )
            .ok_or_else(|| {
                AwsError::not_found(format!(
                    "feature {} of member {} (detector {})",
                    feature, account_id, detector_id
                ))
            })?;

            Ok(MemberFeature {
                detector_id,
                account_id,
                name: feature,
                status,
            })
        })
    }
}

fn unprocessed(accounts: &[UnprocessedAccount]) -> Vec<Unprocessed> {
    accounts
        .iter()
        .map(|u| Unprocessed {
            account_id: u.account_id().unwrap_or_default().to_string(),
            reason: u.result().unwrap_or_default().to_string(),
        })
        .collect()
}

/// Status of `feature` in the configuration of `account_id`, if reported
fn feature_status(
    configurations: &[MemberDataSourceConfiguration],
    account_id: &str,
    feature: &str,
) -> Option<String> {
    configurations
        .iter()
        .filter(|m| m.account_id() == Some(account_id))
        .flat_map(|m| m.features())
        .find(|f| f.name().map(|n| n.as_str()) == Some(feature))
        .and_then(|f| f.status())
        .map(|s| s.as_str().to_string())
}

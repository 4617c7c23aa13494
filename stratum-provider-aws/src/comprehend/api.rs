//! Comprehend API surface used by the entity recognizer resource
//!
//! The resource logic talks to [`ComprehendApi`] instead of the SDK client so
//! the waiting and locking behavior can be exercised without network access.

use std::collections::HashMap;

use aws_sdk_comprehend::Client as ComprehendClient;
use aws_sdk_comprehend::types::{
    EntityRecognizerAnnotations, EntityRecognizerDocuments, EntityRecognizerEntityList,
    EntityRecognizerInputDataConfig, EntityTypesListItem, LanguageCode, Tag,
};
use stratum_core::provider::BoxFuture;

use crate::error::{AwsError, classify_sdk_error};

/// VPC placement of training and inference jobs
#[derive(Debug, Clone, PartialEq)]
pub struct VpcConfig {
    pub security_group_ids: Vec<String>,
    pub subnets: Vec<String>,
}

/// Observed state of an entity recognizer
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecognizer {
    pub arn: String,
    pub status: String,
    /// Service message, set when training failed or stopped
    pub message: Option<String>,
    pub language_code: Option<String>,
    pub version_name: Option<String>,
    pub data_access_role_arn: Option<String>,
    pub vpc_config: Option<VpcConfig>,
}

/// Parameters of CreateEntityRecognizer
#[derive(Debug, Clone, PartialEq)]
pub struct CreateEntityRecognizer {
    pub name: String,
    pub data_access_role_arn: String,
    pub language_code: String,
    pub entity_types: Vec<String>,
    pub documents_s3_uri: String,
    pub entity_list_s3_uri: Option<String>,
    pub annotations_s3_uri: Option<String>,
    pub version_name: Option<String>,
    pub volume_kms_key_id: Option<String>,
    pub model_kms_key_id: Option<String>,
    pub vpc_config: Option<VpcConfig>,
    pub tags: HashMap<String, String>,
}

pub trait ComprehendApi: Send + Sync {
    fn describe_recognizer(&self, arn: &str) -> BoxFuture<'_, Result<EntityRecognizer, AwsError>>;

    /// Returns the ARN of the new recognizer
    fn create_recognizer(
        &self,
        input: &CreateEntityRecognizer,
    ) -> BoxFuture<'_, Result<String, AwsError>>;

    fn stop_training(&self, arn: &str) -> BoxFuture<'_, Result<(), AwsError>>;

    fn delete_recognizer(&self, arn: &str) -> BoxFuture<'_, Result<(), AwsError>>;
}

fn invalid_input(err: impl std::fmt::Display) -> AwsError {
    AwsError::InvalidInput(err.to_string())
}

impl ComprehendApi for ComprehendClient {
    fn describe_recognizer(&self, arn: &str) -> BoxFuture<'_, Result<EntityRecognizer, AwsError>> {
        let arn = arn.to_string();
        Box::pin(async move {
            let output = self
                .describe_entity_recognizer()
                .entity_recognizer_arn(&arn)
                .send()
                .await
                .map_err(classify_sdk_error)?;

            let props = output
                .entity_recognizer_properties()
                .ok_or_else(|| AwsError::not_found(format!("entity recognizer {}", arn)))?;

            Ok(EntityRecognizer {
                arn: props.entity_recognizer_arn().unwrap_or(arn.as_str()).to_string(),
                status: props
                    .status()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                message: props.message().map(str::to_string),
                language_code: props.language_code().map(|l| l.as_str().to_string()),
                version_name: props.version_name().map(str::to_string),
                data_access_role_arn: props.data_access_role_arn().map(str::to_string),
                vpc_config: props.vpc_config().map(|vpc| VpcConfig {
                    security_group_ids: vpc.security_group_ids().to_vec(),
                    subnets: vpc.subnets().to_vec(),
                }),
            })
        })
    }

    fn create_recognizer(
        &self,
        input: &CreateEntityRecognizer,
    ) -> BoxFuture<'_, Result<String, AwsError>> {
        let input = input.clone();
        Box::pin(async move {
            let entity_types = input
                .entity_types
                .iter()
                .map(|t| EntityTypesListItem::builder().r#type(t).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(invalid_input)?;

            let documents = EntityRecognizerDocuments::builder()
                .s3_uri(&input.documents_s3_uri)
                .build()
                .map_err(invalid_input)?;

            let entity_list = input
                .entity_list_s3_uri
                .as_deref()
                .map(|uri| EntityRecognizerEntityList::builder().s3_uri(uri).build())
                .transpose()
                .map_err(invalid_input)?;

            let annotations = input
                .annotations_s3_uri
                .as_deref()
                .map(|uri| EntityRecognizerAnnotations::builder().s3_uri(uri).build())
                .transpose()
                .map_err(invalid_input)?;

            let input_data_config = EntityRecognizerInputDataConfig::builder()
                .set_entity_types(Some(entity_types))
                .documents(documents)
                .set_entity_list(entity_list)
                .set_annotations(annotations)
                .build()
                .map_err(invalid_input)?;

            let vpc_config = input
                .vpc_config
                .as_ref()
                .map(|vpc| {
                    aws_sdk_comprehend::types::VpcConfig::builder()
                        .set_security_group_ids(Some(vpc.security_group_ids.clone()))
                        .set_subnets(Some(vpc.subnets.clone()))
                        .build()
                })
                .transpose()
                .map_err(invalid_input)?;

            let mut tag_keys: Vec<&String> = input.tags.keys().collect();
            tag_keys.sort();
            let tags = tag_keys
                .into_iter()
                .map(|key| Tag::builder().key(key).value(&input.tags[key]).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(invalid_input)?;

            let output = self
                .create_entity_recognizer()
                .recognizer_name(&input.name)
                .data_access_role_arn(&input.data_access_role_arn)
                .language_code(LanguageCode::from(input.language_code.as_str()))
                .input_data_config(input_data_config)
                .set_version_name(input.version_name.clone())
                .set_volume_kms_key_id(input.volume_kms_key_id.clone())
                .set_model_kms_key_id(input.model_kms_key_id.clone())
                .set_vpc_config(vpc_config)
                .set_tags(if tags.is_empty() { None } else { Some(tags) })
                .send()
                .await
                .map_err(classify_sdk_error)?;

            output
                .entity_recognizer_arn()
                .map(str::to_string)
                .ok_or_else(|| AwsError::Sdk {
                    code: None,
                    message: "CreateEntityRecognizer returned no ARN".to_string(),
                })
        })
    }

    fn stop_training(&self, arn: &str) -> BoxFuture<'_, Result<(), AwsError>> {
        let arn = arn.to_string();
        Box::pin(async move {
            self.stop_training_entity_recognizer()
                .entity_recognizer_arn(arn)
                .send()
                .await
                .map_err(classify_sdk_error)?;
            Ok(())
        })
    }

    fn delete_recognizer(&self, arn: &str) -> BoxFuture<'_, Result<(), AwsError>> {
        let arn = arn.to_string();
        Box::pin(async move {
            self.delete_entity_recognizer()
                .entity_recognizer_arn(arn)
                .send()
                .await
                .map_err(classify_sdk_error)?;
            Ok(())
        })
    }
}

//! comprehend.entity_recognizer
//!
//! Training starts as soon as the recognizer is created and may take hours.
//! Recognizers placed in a VPC get elastic network interfaces attached when
//! training starts; creating several at once exhausts the ENI attachment rate,
//! so creation holds the process-wide [`VPC_ENI_LOCK_KEY`] until the new
//! recognizer has left `SUBMITTED`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use stratum_core::provider::{ErrorKind, ProviderError, ProviderResult};
use stratum_core::resource::{Resource, ResourceId, State, Value};
use stratum_core::timeouts::Timeouts;
use stratum_core::waiter::{Observation, StateChangeConf, WaitFailure};
use stratum_core::{FetchError, KeyedMutex};
use tokio_util::sync::CancellationToken;

use super::api::{ComprehendApi, CreateEntityRecognizer, EntityRecognizer, VpcConfig};

pub const RESOURCE_TYPE: &str = "comprehend.entity_recognizer";

/// Lock shared by every VPC-attached model of the process
pub const VPC_ENI_LOCK_KEY: &str = "comprehend-model-vpc-eni";

pub const STATUS_SUBMITTED: &str = "SUBMITTED";
pub const STATUS_TRAINING: &str = "TRAINING";
pub const STATUS_DELETING: &str = "DELETING";
pub const STATUS_STOP_REQUESTED: &str = "STOP_REQUESTED";
pub const STATUS_STOPPED: &str = "STOPPED";
pub const STATUS_IN_ERROR: &str = "IN_ERROR";
pub const STATUS_TRAINED: &str = "TRAINED";
pub const STATUS_TRAINED_WITH_WARNING: &str = "TRAINED_WITH_WARNING";

/// Poll timing of the recognizer waiters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitSettings {
    /// Interval of the started, stopped and deleted waiters
    pub poll_interval: Duration,
    /// Wait before the first training check
    pub training_delay: Duration,
    pub training_poll_interval: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            training_delay: Duration::from_secs(60),
            training_poll_interval: Duration::from_secs(60),
        }
    }
}

fn label(arn: &str) -> String {
    format!("entity recognizer {}", arn)
}

/// Wait for training to start (the recognizer leaves `SUBMITTED`)
pub fn started_conf(arn: &str, timeout: Duration, settings: &WaitSettings) -> StateChangeConf {
    StateChangeConf::new(label(arn))
        .pending([STATUS_SUBMITTED])
        .target([STATUS_TRAINING, STATUS_TRAINED, STATUS_TRAINED_WITH_WARNING])
        .failure([STATUS_IN_ERROR])
        .poll_interval(settings.poll_interval)
        .timeout(timeout)
}

/// Wait for training to finish
pub fn created_conf(arn: &str, timeout: Duration, settings: &WaitSettings) -> StateChangeConf {
    StateChangeConf::new(label(arn))
        .pending([STATUS_SUBMITTED, STATUS_TRAINING])
        .target([STATUS_TRAINED, STATUS_TRAINED_WITH_WARNING])
        .failure([STATUS_IN_ERROR, STATUS_STOPPED])
        .delay(settings.training_delay)
        .poll_interval(settings.training_poll_interval)
        .timeout(timeout)
}

/// Wait for a stop request to settle; training may also finish first
pub fn stopped_conf(arn: &str, timeout: Duration, settings: &WaitSettings) -> StateChangeConf {
    StateChangeConf::new(label(arn))
        .pending([STATUS_STOP_REQUESTED, STATUS_TRAINING])
        .target([STATUS_STOPPED, STATUS_TRAINED, STATUS_TRAINED_WITH_WARNING])
        .failure([STATUS_IN_ERROR])
        .poll_interval(settings.poll_interval)
        .timeout(timeout)
}

/// Wait until the recognizer no longer exists
pub fn deleted_conf(arn: &str, timeout: Duration, settings: &WaitSettings) -> StateChangeConf {
    StateChangeConf::new(label(arn))
        .pending([STATUS_DELETING, STATUS_IN_ERROR])
        .target_absent()
        .not_found_checks(0)
        .poll_interval(settings.poll_interval)
        .timeout(timeout)
}

fn observe(recognizer: EntityRecognizer) -> Observation<EntityRecognizer> {
    let status = recognizer.status.clone();
    let detail = recognizer.message.clone();
    Observation::new(recognizer, status).with_detail(detail)
}

/// Entity recognizer operations
pub struct EntityRecognizers<A: ?Sized> {
    api: Arc<A>,
    locks: Arc<KeyedMutex>,
    cancel: CancellationToken,
    settings: WaitSettings,
}

impl<A: ComprehendApi + ?Sized> EntityRecognizers<A> {
    pub fn new(api: Arc<A>, locks: Arc<KeyedMutex>, cancel: CancellationToken) -> Self {
        Self {
            api,
            locks,
            cancel,
            settings: WaitSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: WaitSettings) -> Self {
        self.settings = settings;
        self
    }

    async fn wait(
        &self,
        conf: StateChangeConf,
        arn: &str,
    ) -> Result<Option<EntityRecognizer>, WaitFailure<EntityRecognizer>> {
        let api = &*self.api;
        conf.wait_for_state(&self.cancel, move || async move {
            let recognizer = api.describe_recognizer(arn).await?;
            Ok::<_, FetchError>(observe(recognizer))
        })
        .await
    }

    /// Wait until the recognizer leaves `SUBMITTED`
    pub async fn wait_started(&self, arn: &str, timeout: Duration) -> ProviderResult<EntityRecognizer> {
        let conf = started_conf(arn, timeout, &self.settings);
        settled(self.wait(conf, arn).await?, arn)
    }

    /// Wait until training has finished
    pub async fn wait_trained(&self, arn: &str, timeout: Duration) -> ProviderResult<EntityRecognizer> {
        let conf = created_conf(arn, timeout, &self.settings);
        settled(self.wait(conf, arn).await?, arn)
    }

    pub async fn wait_stopped(&self, arn: &str, timeout: Duration) -> ProviderResult<EntityRecognizer> {
        let conf = stopped_conf(arn, timeout, &self.settings);
        settled(self.wait(conf, arn).await?, arn)
    }

    pub async fn wait_deleted(&self, arn: &str, timeout: Duration) -> ProviderResult<()> {
        let conf = deleted_conf(arn, timeout, &self.settings);
        self.wait(conf, arn).await?;
        Ok(())
    }

    pub async fn read(&self, id: &ResourceId, identifier: Option<&str>) -> ProviderResult<State> {
        let Some(arn) = identifier else {
            return Ok(State::not_found(id.clone()));
        };

        match self.api.describe_recognizer(arn).await {
            Ok(recognizer) => Ok(to_state(id, recognizer)),
            Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
            Err(e) => Err(ProviderError::from(e).for_resource(id.clone())),
        }
    }

    pub async fn create(&self, resource: &Resource, timeouts: &Timeouts) -> ProviderResult<State> {
        let id = &resource.id;
        let input = create_input(resource)?;

        let mut eni_guard = self
            .locks
            .lock_if(input.vpc_config.is_some(), VPC_ENI_LOCK_KEY)
            .await;

        let arn = self
            .api
            .create_recognizer(&input)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        info!("Created entity recognizer {}", arn);

        if eni_guard.is_held() {
            self.wait_started(&arn, timeouts.create)
                .await
                .map_err(|e| e.for_resource(id.clone()))?;
            eni_guard.release();
        }

        let recognizer = self
            .wait_trained(&arn, timeouts.create)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        Ok(to_state(id, recognizer))
    }

    /// Every attribute forces a new recognizer (or a new version)
    pub fn update(&self, id: &ResourceId) -> ProviderResult<State> {
        Err(ProviderError::new(
            "Entity recognizers cannot be updated in place; create a new version instead",
        )
        .with_kind(ErrorKind::InvalidConfig)
        .for_resource(id.clone()))
    }

    /// Stop training if it is still running, then delete and wait for removal
    pub async fn delete(
        &self,
        id: &ResourceId,
        arn: &str,
        state: &State,
        timeouts: &Timeouts,
    ) -> ProviderResult<()> {
        let in_vpc = state.attributes.contains_key("vpc_config");
        let _eni_guard = self.locks.lock_if(in_vpc, VPC_ENI_LOCK_KEY).await;

        let current = match self.api.describe_recognizer(arn).await {
            Ok(recognizer) => recognizer,
            Err(e) if e.is_not_found() => {
                debug!("Entity recognizer {} already deleted", arn);
                return Ok(());
            }
            Err(e) => return Err(ProviderError::from(e).for_resource(id.clone())),
        };

        let status = current.status.as_str();
        if matches!(status, STATUS_SUBMITTED | STATUS_TRAINING | STATUS_STOP_REQUESTED) {
            if status != STATUS_STOP_REQUESTED {
                info!("Stopping training of entity recognizer {}", arn);
                self.api
                    .stop_training(arn)
                    .await
                    .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
            }
            self.wait_stopped(arn, timeouts.delete)
                .await
                .map_err(|e| e.for_resource(id.clone()))?;
        }

        match self.api.delete_recognizer(arn).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(ProviderError::from(e).for_resource(id.clone())),
        }
        info!("Deleting entity recognizer {}", arn);

        self.wait_deleted(arn, timeouts.delete)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }
}

fn settled(recognizer: Option<EntityRecognizer>, arn: &str) -> ProviderResult<EntityRecognizer> {
    recognizer.ok_or_else(|| {
        ProviderError::new(format!("{} no longer exists", label(arn))).with_kind(ErrorKind::NotFound)
    })
}

fn to_state(id: &ResourceId, recognizer: EntityRecognizer) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("arn".to_string(), Value::from(recognizer.arn.as_str()));
    attributes.insert("status".to_string(), Value::from(recognizer.status));

    let extra = [
        ("message", recognizer.message),
        ("language_code", recognizer.language_code),
        ("version_name", recognizer.version_name),
        ("data_access_role_arn", recognizer.data_access_role_arn),
    ];
    for (key, value) in extra {
        if let Some(value) = value {
            attributes.insert(key.to_string(), Value::from(value));
        }
    }

    if let Some(vpc) = recognizer.vpc_config {
        let mut map = HashMap::new();
        map.insert(
            "security_group_ids".to_string(),
            Value::List(vpc.security_group_ids.into_iter().map(Value::from).collect()),
        );
        map.insert(
            "subnets".to_string(),
            Value::List(vpc.subnets.into_iter().map(Value::from).collect()),
        );
        attributes.insert("vpc_config".to_string(), Value::Map(map));
    }

    State::existing(id.clone(), attributes).with_identifier(recognizer.arn)
}

fn required<'a>(resource: &'a Resource, key: &str) -> ProviderResult<&'a str> {
    resource.get_str(key).ok_or_else(|| {
        ProviderError::new(format!("Attribute '{}' is required", key))
            .with_kind(ErrorKind::InvalidConfig)
            .for_resource(resource.id.clone())
    })
}

fn optional(resource: &Resource, key: &str) -> Option<String> {
    resource.get_str(key).map(str::to_string)
}

/// Build CreateEntityRecognizer parameters from declared attributes
pub fn create_input(resource: &Resource) -> ProviderResult<CreateEntityRecognizer> {
    let invalid = |message: &str| {
        ProviderError::new(message)
            .with_kind(ErrorKind::InvalidConfig)
            .for_resource(resource.id.clone())
    };

    let entity_types = resource
        .attributes
        .get("entity_types")
        .map(Value::string_list)
        .unwrap_or_default();
    if entity_types.is_empty() {
        return Err(invalid("Attribute 'entity_types' must list at least one entity type"));
    }

    let vpc_config = match resource.get_map("vpc_config") {
        Some(vpc) => {
            let list = |key: &str| vpc.get(key).map(Value::string_list).unwrap_or_default();
            let config = VpcConfig {
                security_group_ids: list("security_group_ids"),
                subnets: list("subnets"),
            };
            if config.security_group_ids.is_empty() || config.subnets.is_empty() {
                return Err(invalid(
                    "Attribute 'vpc_config' needs both security_group_ids and subnets",
                ));
            }
            Some(config)
        }
        None => None,
    };

    let tags = resource
        .get_map("tags")
        .map(|tags| {
            tags.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(CreateEntityRecognizer {
        name: resource
            .get_str("name")
            .unwrap_or(&resource.id.name)
            .to_string(),
        data_access_role_arn: required(resource, "data_access_role_arn")?.to_string(),
        language_code: required(resource, "language_code")?.to_string(),
        entity_types,
        documents_s3_uri: required(resource, "documents_s3_uri")?.to_string(),
        entity_list_s3_uri: optional(resource, "entity_list_s3_uri"),
        annotations_s3_uri: optional(resource, "annotations_s3_uri"),
        version_name: optional(resource, "version_name"),
        volume_kms_key_id: optional(resource, "volume_kms_key_id"),
        model_kms_key_id: optional(resource, "model_kms_key_id"),
        vpc_config,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AwsError;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use stratum_core::provider::BoxFuture;

    const ARN: &str = "arn:aws:comprehend:us-east-1:123456789012:entity-recognizer/people";

    /// Describe replays `statuses` (None = not found), repeating the last one
    struct MockComprehend {
        statuses: Mutex<VecDeque<Option<&'static str>>>,
        vpc_config: Option<VpcConfig>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl MockComprehend {
        fn scripted(statuses: Vec<Option<&'static str>>) -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(statuses.into()),
                vpc_config: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn describes(&self) -> usize {
            self.calls().iter().filter(|c| **c == "describe").count()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl ComprehendApi for MockComprehend {
        fn describe_recognizer(&self, arn: &str) -> BoxFuture<'_, Result<EntityRecognizer, AwsError>> {
            self.record("describe");
            let mut statuses = self.statuses.lock().unwrap();
            let next = if statuses.len() > 1 {
                statuses.pop_front().flatten()
            } else {
                statuses.front().copied().flatten()
            };
            let result = match next {
                Some(status) => Ok(EntityRecognizer {
                    arn: arn.to_string(),
                    status: status.to_string(),
                    message: (status == STATUS_IN_ERROR)
                        .then(|| "Insufficient annotations for PERSON".to_string()),
                    language_code: Some("en".to_string()),
                    version_name: None,
                    data_access_role_arn: None,
                    vpc_config: self.vpc_config.clone(),
                }),
                None => Err(AwsError::not_found(format!("Resource {} not found", arn))),
            };
            Box::pin(std::future::ready(result))
        }

        fn create_recognizer(
            &self,
            _input: &CreateEntityRecognizer,
        ) -> BoxFuture<'_, Result<String, AwsError>> {
            self.record("create");
            Box::pin(std::future::ready(Ok(ARN.to_string())))
        }

        fn stop_training(&self, _arn: &str) -> BoxFuture<'_, Result<(), AwsError>> {
            self.record("stop");
            Box::pin(std::future::ready(Ok(())))
        }

        fn delete_recognizer(&self, _arn: &str) -> BoxFuture<'_, Result<(), AwsError>> {
            self.record("delete");
            Box::pin(std::future::ready(Ok(())))
        }
    }

    fn recognizers(api: Arc<MockComprehend>, locks: Arc<KeyedMutex>) -> EntityRecognizers<MockComprehend> {
        EntityRecognizers::new(api, locks, CancellationToken::new())
    }

    fn declared(with_vpc: bool) -> Resource {
        let mut resource = Resource::new(RESOURCE_TYPE, "people")
            .with_attribute(
                "data_access_role_arn",
                Value::from("arn:aws:iam::123456789012:role/comprehend"),
            )
            .with_attribute("language_code", Value::from("en"))
            .with_attribute("entity_types", Value::List(vec![Value::from("PERSON")]))
            .with_attribute("documents_s3_uri", Value::from("s3://training/documents/"));
        if with_vpc {
            let mut vpc = HashMap::new();
            vpc.insert(
                "security_group_ids".to_string(),
                Value::List(vec![Value::from("sg-1")]),
            );
            vpc.insert("subnets".to_string(), Value::List(vec![Value::from("subnet-1")]));
            resource = resource.with_attribute("vpc_config", Value::Map(vpc));
        }
        resource
    }

    #[test]
    fn test_waiter_confs_are_valid() {
        let settings = WaitSettings::default();
        let timeout = Duration::from_secs(3600);
        for conf in [
            started_conf(ARN, timeout, &settings),
            created_conf(ARN, timeout, &settings),
            stopped_conf(ARN, timeout, &settings),
            deleted_conf(ARN, timeout, &settings),
        ] {
            assert!(conf.validate().is_ok(), "{}", conf.resource());
        }
    }

    #[test]
    fn test_create_input() {
        let input = create_input(&declared(true)).unwrap();

        assert_eq!(input.name, "people");
        assert_eq!(input.entity_types, vec!["PERSON"]);
        assert_eq!(
            input.vpc_config,
            Some(VpcConfig {
                security_group_ids: vec!["sg-1".to_string()],
                subnets: vec!["subnet-1".to_string()],
            })
        );
    }

    #[test]
    fn test_create_input_requires_entity_types() {
        let resource = declared(false).with_attribute("entity_types", Value::List(vec![]));
        let err = create_input(&resource).unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidConfig);
        assert!(err.message.contains("entity_types"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_waits_for_training() {
        let api = MockComprehend::scripted(vec![
            Some(STATUS_SUBMITTED),
            Some(STATUS_TRAINING),
            Some(STATUS_TRAINED),
        ]);
        let locks = Arc::new(KeyedMutex::new());

        let state = recognizers(api.clone(), locks.clone())
            .create(&declared(false), &Timeouts::default())
            .await
            .unwrap();

        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some(ARN));
        assert_eq!(state.attributes.get("status"), Some(&Value::from("TRAINED")));
        assert_eq!(api.calls(), vec!["create", "describe", "describe", "describe"]);
        // No VPC config, so the ENI lock is never touched
        assert!(locks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_in_vpc_waits_for_eni_lock() {
        let api = MockComprehend::scripted(vec![Some(STATUS_TRAINING), Some(STATUS_TRAINED)]);
        let locks = Arc::new(KeyedMutex::new());
        let other_model = locks.lock(VPC_ENI_LOCK_KEY).await;

        let handler = Arc::new(recognizers(api.clone(), locks.clone()));
        let task = tokio::spawn({
            let handler = handler.clone();
            async move { handler.create(&declared(true), &Timeouts::default()).await }
        });

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(api.calls().is_empty());

        drop(other_model);
        let state = task.await.unwrap().unwrap();
        assert!(state.attributes.contains_key("status"));
        assert_eq!(api.calls()[0], "create");
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_in_vpc_releases_lock_once_training_starts() {
        let api = MockComprehend::scripted(vec![
            Some(STATUS_SUBMITTED),
            Some(STATUS_TRAINING),
            Some(STATUS_TRAINING),
            Some(STATUS_TRAINING),
            Some(STATUS_TRAINED),
        ]);
        let locks = Arc::new(KeyedMutex::new());

        let handler = Arc::new(recognizers(api.clone(), locks.clone()));
        let task = tokio::spawn({
            let handler = handler.clone();
            async move { handler.create(&declared(true), &Timeouts::default()).await }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        let guard = locks.lock(VPC_ENI_LOCK_KEY).await;
        // Released right after the started waiter, long before training ends
        assert_eq!(api.describes(), 2);
        drop(guard);

        task.await.unwrap().unwrap();
        assert_eq!(api.describes(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_reports_training_failure() {
        let api = MockComprehend::scripted(vec![Some(STATUS_TRAINING), Some(STATUS_IN_ERROR)]);

        let err = recognizers(api, Arc::new(KeyedMutex::new()))
            .create(&declared(false), &Timeouts::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::RemoteFailure);
        assert!(err.message.contains("IN_ERROR"), "{}", err);
        assert!(err.message.contains("Insufficient annotations"), "{}", err);
        assert_eq!(err.resource_id, Some(ResourceId::new(RESOURCE_TYPE, "people")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_times_out_while_training() {
        let api = MockComprehend::scripted(vec![Some(STATUS_TRAINING)]);
        let timeouts = Timeouts::default().with_create(Duration::from_secs(15 * 60));

        let err = recognizers(api, Arc::new(KeyedMutex::new()))
            .create(&declared(false), &timeouts)
            .await
            .unwrap_err();

        assert!(err.is_timeout(), "{}", err);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_stops_training_first() {
        let api = MockComprehend::scripted(vec![
            Some(STATUS_TRAINING),
            Some(STATUS_STOP_REQUESTED),
            Some(STATUS_STOPPED),
            Some(STATUS_DELETING),
            None,
        ]);
        let id = ResourceId::new(RESOURCE_TYPE, "people");

        recognizers(api.clone(), Arc::new(KeyedMutex::new()))
            .delete(&id, ARN, &State::not_found(id.clone()), &Timeouts::default())
            .await
            .unwrap();

        assert_eq!(
            api.calls(),
            vec!["describe", "stop", "describe", "describe", "delete", "describe", "describe"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_trained_recognizer_skips_stop() {
        let api = MockComprehend::scripted(vec![Some(STATUS_TRAINED), None]);
        let id = ResourceId::new(RESOURCE_TYPE, "people");

        recognizers(api.clone(), Arc::new(KeyedMutex::new()))
            .delete(&id, ARN, &State::not_found(id.clone()), &Timeouts::default())
            .await
            .unwrap();

        assert_eq!(api.calls(), vec!["describe", "delete", "describe"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_missing_recognizer_is_noop() {
        let api = MockComprehend::scripted(vec![None]);
        let id = ResourceId::new(RESOURCE_TYPE, "people");

        recognizers(api.clone(), Arc::new(KeyedMutex::new()))
            .delete(&id, ARN, &State::not_found(id.clone()), &Timeouts::default())
            .await
            .unwrap();

        assert_eq!(api.calls(), vec!["describe"]);
    }

    #[tokio::test]
    async fn test_read() {
        let id = ResourceId::new(RESOURCE_TYPE, "people");

        let missing = recognizers(MockComprehend::scripted(vec![None]), Arc::new(KeyedMutex::new()))
            .read(&id, Some(ARN))
            .await
            .unwrap();
        assert!(!missing.exists);

        let unknown = recognizers(MockComprehend::scripted(vec![None]), Arc::new(KeyedMutex::new()))
            .read(&id, None)
            .await
            .unwrap();
        assert!(!unknown.exists);

        let api = MockComprehend {
            statuses: Mutex::new(vec![Some(STATUS_TRAINED)].into()),
            vpc_config: Some(VpcConfig {
                security_group_ids: vec!["sg-1".to_string()],
                subnets: vec!["subnet-1".to_string(), "subnet-2".to_string()],
            }),
            calls: Mutex::new(Vec::new()),
        };

        let state = recognizers(Arc::new(api), Arc::new(KeyedMutex::new()))
            .read(&id, Some(ARN))
            .await
            .unwrap();
        let vpc = state.attributes.get("vpc_config").and_then(Value::as_map).unwrap();
        assert_eq!(vpc.get("subnets").unwrap().string_list(), vec!["subnet-1", "subnet-2"]);
    }

    #[test]
    fn test_update_is_rejected() {
        let id = ResourceId::new(RESOURCE_TYPE, "people");
        let err = recognizers(MockComprehend::scripted(vec![None]), Arc::new(KeyedMutex::new()))
            .update(&id)
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidConfig);
    }
}

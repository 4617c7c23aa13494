//! Resource type definitions
//!
//! Each type carries the default time budget of its operations; a resource's
//! `timeouts` block and the provider's `default_timeout` are layered on top.

use std::time::Duration;

use stratum_core::provider::ResourceType;
use stratum_core::timeouts::Timeouts;

use crate::cloudcontrol;
use crate::comprehend::entity_recognizer;
use crate::guardduty::member_detector_feature;

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $timeouts:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn timeouts(&self) -> Timeouts {
                $timeouts
            }
        }
    };
}

const MINUTE: Duration = Duration::from_secs(60);

define_resource_type!(
    CloudControlResourceType,
    cloudcontrol::RESOURCE_TYPE,
    Timeouts::uniform(10 * MINUTE)
);
define_resource_type!(
    EntityRecognizerType,
    entity_recognizer::RESOURCE_TYPE,
    Timeouts::uniform(180 * MINUTE).with_delete(30 * MINUTE)
);
define_resource_type!(
    MemberDetectorFeatureType,
    member_detector_feature::RESOURCE_TYPE,
    Timeouts::uniform(2 * MINUTE)
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(CloudControlResourceType),
        Box::new(EntityRecognizerType),
        Box::new(MemberDetectorFeatureType),
    ]
}

/// Look up a resource type by name
pub fn find(type_name: &str) -> Option<Box<dyn ResourceType>> {
    resource_types().into_iter().find(|t| t.name() == type_name)
}

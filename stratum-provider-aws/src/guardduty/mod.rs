//! Amazon GuardDuty resources

pub mod api;
pub mod member_detector_feature;

pub use api::{GuardDutyApi, MemberFeature};
pub use member_detector_feature::MemberDetectorFeatures;

//! Amazon Comprehend resources

pub mod api;
pub mod entity_recognizer;

pub use api::{ComprehendApi, CreateEntityRecognizer, EntityRecognizer, VpcConfig};
pub use entity_recognizer::{EntityRecognizers, WaitSettings};

//! Stratum Core
//!
//! Building blocks shared by the Stratum AWS provider:
//!
//! - `waiter` - polling a remote object until it reaches a terminal state
//! - `mutex` - keyed locks for remote objects without native concurrency control
//! - `resource` / `provider` - the declared-resource model and the Provider trait
//! - `timeouts` - per-operation time budgets

pub mod mutex;
pub mod provider;
pub mod resource;
pub mod timeouts;
pub mod waiter;

pub use mutex::{KeyedGuard, KeyedMutex};
pub use waiter::{FetchError, Observation, StateChangeConf, WaitError, WaitFailure};

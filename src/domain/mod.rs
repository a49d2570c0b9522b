//! Domain Layer
//!
//! Pure business objects and logic: the cluster configuration model, the
//! selection policy, the error taxonomy, and the outbound ports.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{ClusterDescriptor, ClusterView, MetadataTag, RegistrySnapshot};
pub use errors::DispatchError;
pub use value_objects::Credentials;

mod registry;

pub use registry::{ClusterHealth, ClusterRegistry, ClusterStatus};

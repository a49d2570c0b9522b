mod cluster_client;

pub use cluster_client::{
    ClientError, ClientFactory, ClusterClient, ClusterSummary, NodeSummary, PingReport,
};

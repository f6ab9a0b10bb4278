//! fanin-core: resolución de dependencias fan-in entre pipelines.
pub mod config;
pub mod constants;
pub mod errors;
pub mod graph;
pub mod hashing;
pub mod history;
pub mod model;
pub mod resolver;
pub mod service;

pub use config::FanInConfig;
pub use errors::{ConfigurationError, FailureAction, FanInError, FanInFailure, HistoryError, ResolveError};
pub use graph::{EdgeSource, FanInEdge, FanInGraphBuilder, InMemoryPipelineConfigs, MaterialGraph, MaterialNode, PipelineConfigProvider};
pub use history::{InMemoryRevisionHistory, MemoizedHistory, RevisionHistoryProvider};
pub use model::{CandidateRevision, DependencyMaterial, Fingerprint, MaterialConfig, MaterialKind, PipelineConfig, PipelineInstance, PipelineName};
pub use resolver::{resolve, FanInResolver, ResolvedEdge, ResolvedGraph, ResolvedInstance, ResolvedMaterial};
pub use service::{FanInService, ResolutionStrategy, TriggerRevisions};

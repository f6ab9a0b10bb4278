//! Servicio de disparo: construye el grafo del pipeline, resuelve fan-in y
//! aplica la política configurada (fan-in apagado o caída a lo más reciente).
//!
//! Es el punto de entrada que usa el scheduler. No guarda estado mutable;
//! varias resoluciones pueden correr en paralelo sobre el mismo servicio.

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::FanInConfig;
use crate::errors::{FanInError, FanInFailure, ResolveError};
use crate::graph::{FanInGraphBuilder, MaterialGraph, PipelineConfigProvider};
use crate::history::RevisionHistoryProvider;
use crate::model::PipelineName;
use crate::resolver::{FanInResolver, ResolvedGraph, ResolvedMaterial};

/// Cómo se obtuvieron las revisiones de disparo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ResolutionStrategy {
    FanIn,
    FanInDisabled,
    /// Fan-in no pudo completarse; se usó lo más reciente.
    Fallback { reason: String },
}

/// Revisiones con las que materializar una nueva corrida del pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRevisions {
    pub pipeline: PipelineName,
    #[serde(flatten)]
    pub strategy: ResolutionStrategy,
    pub selections: Vec<ResolvedMaterial>,
    /// Sólo presente cuando hubo convergencia.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<ResolvedGraph>,
}

pub struct FanInService<C, H> {
    configs: C,
    history: H,
    config: FanInConfig,
}

impl<C, H> FanInService<C, H>
    where C: PipelineConfigProvider,
          H: RevisionHistoryProvider
{
    pub fn new(configs: C, history: H, config: FanInConfig) -> Self {
        Self { configs,
               history,
               config }
    }

    pub fn config(&self) -> &FanInConfig {
        &self.config
    }

    pub fn configs(&self) -> &C {
        &self.configs
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    fn resolver(&self) -> FanInResolver {
        let resolver = FanInResolver::new(self.config.max_permutations);
        match self.config.history_depth {
            Some(depth) => resolver.with_history_depth(depth),
            None => resolver,
        }
    }

    /// Grafo de materiales del pipeline según la configuración actual.
    pub fn graph(&self, pipeline: &PipelineName) -> Result<MaterialGraph, FanInError> {
        Ok(FanInGraphBuilder::new(&self.configs).build_for(pipeline)?)
    }

    pub fn trigger_revisions(&self, pipeline: &PipelineName) -> Result<TriggerRevisions, FanInError> {
        let request = Uuid::new_v4();
        debug!("trigger:start request={} pipeline={} fanin={}", request, pipeline, self.config.enabled);
        let graph = self.graph(pipeline)?;
        let resolver = self.resolver();

        if !self.config.enabled {
            let selections = resolver.select_latest(&graph, &self.history)?;
            info!("trigger:latest request={} pipeline={}", request, pipeline);
            return Ok(TriggerRevisions { pipeline: graph.target,
                                         strategy: ResolutionStrategy::FanInDisabled,
                                         selections,
                                         graph: None });
        }

        match resolver.resolve(&graph, &self.history) {
            Ok(resolved) => {
                info!("trigger:fanin request={} pipeline={} tried={}", request, pipeline, resolved.permutations_tried);
                Ok(TriggerRevisions { pipeline: graph.target.clone(),
                                      strategy: ResolutionStrategy::FanIn,
                                      selections: resolved.selections.clone(),
                                      graph: Some(resolved) })
            }
            Err(err) if self.config.fallback_enabled && can_fall_back(&err) => {
                warn!("trigger:fallback request={} pipeline={} reason={}", request, pipeline, err);
                let selections = resolver.select_latest(&graph, &self.history)?;
                Ok(TriggerRevisions { pipeline: graph.target,
                                      strategy: ResolutionStrategy::Fallback { reason: err.to_string() },
                                      selections,
                                      graph: None })
            }
            Err(err) => {
                info!("trigger:failed request={} pipeline={} error={}", request, pipeline, err);
                Err(err.into())
            }
        }
    }
}

impl<C, H> FanInService<C, H>
    where C: PipelineConfigProvider + Sync,
          H: RevisionHistoryProvider + Sync
{
    /// Resuelve varios pipelines en paralelo; el resultado respeta el orden
    /// de entrada.
    pub fn resolve_many(&self, pipelines: &[PipelineName]) -> Vec<Result<TriggerRevisions, FanInError>> {
        pipelines.par_iter().map(|p| self.trigger_revisions(p)).collect()
    }
}

/// Sólo el truncamiento y los errores del historial admiten caer a lo más
/// reciente; los demás fallos describen un estado real que no se oculta.
fn can_fall_back(err: &ResolveError) -> bool {
    matches!(err,
             ResolveError::History(_) | ResolveError::Failure(FanInFailure::SearchSpaceTooLarge { .. }))
}

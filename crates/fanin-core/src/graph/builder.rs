//! Construcción del grafo de fan-in a partir de la configuración.
//!
//! Recorre en profundidad los materiales del pipeline destino, expandiendo
//! cada dependencia con los materiales de su pipeline aguas arriba hasta
//! llegar a materiales raíz. Los nodos se fusionan por fingerprint y cada
//! nodo de dependencia se expande una sola vez.
//!
//! Es una transformación pura: no consulta historial ni tiene efectos.
use std::collections::{HashMap, HashSet};

use log::debug;

use super::{EdgeSource, FanInEdge, MaterialGraph, MaterialNode};
use crate::errors::ConfigurationError;
use crate::model::{Fingerprint, MaterialConfig, PipelineConfig, PipelineName};

/// Fuente de configuración de pipelines (colaborador externo).
pub trait PipelineConfigProvider {
    /// Materiales del pipeline en orden de declaración, o `None` si no está
    /// configurado.
    fn materials_for(&self, pipeline: &PipelineName) -> Option<Vec<MaterialConfig>>;

    fn pipeline_config(&self, pipeline: &PipelineName) -> Option<PipelineConfig> {
        self.materials_for(pipeline)
            .map(|materials| PipelineConfig::new(pipeline.clone(), materials))
    }
}

/// Configuración en memoria, indexada por nombre (sin distinguir mayúsculas).
#[derive(Debug, Clone, Default)]
pub struct InMemoryPipelineConfigs {
    pipelines: HashMap<PipelineName, PipelineConfig>,
}

impl InMemoryPipelineConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, config: PipelineConfig) -> Self {
        self.insert(config);
        self
    }

    pub fn insert(&mut self, config: PipelineConfig) {
        self.pipelines.insert(config.name.clone(), config);
    }

    pub fn get(&self, pipeline: &PipelineName) -> Option<&PipelineConfig> {
        self.pipelines.get(pipeline)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

impl FromIterator<PipelineConfig> for InMemoryPipelineConfigs {
    fn from_iter<T: IntoIterator<Item = PipelineConfig>>(iter: T) -> Self {
        let mut configs = Self::new();
        for c in iter {
            configs.insert(c);
        }
        configs
    }
}

impl PipelineConfigProvider for InMemoryPipelineConfigs {
    fn materials_for(&self, pipeline: &PipelineName) -> Option<Vec<MaterialConfig>> {
        self.pipelines.get(pipeline).map(|c| c.materials.clone())
    }

    fn pipeline_config(&self, pipeline: &PipelineName) -> Option<PipelineConfig> {
        self.pipelines.get(pipeline).cloned()
    }
}

/// Estado del recorrido: camino actual (para detectar ciclos) y nodos de
/// dependencia ya expandidos.
struct Walk {
    path: Vec<PipelineName>,
    expanded: HashSet<Fingerprint>,
}

pub struct FanInGraphBuilder<'a, C>
    where C: PipelineConfigProvider + ?Sized
{
    configs: &'a C,
}

impl<'a, C> FanInGraphBuilder<'a, C>
    where C: PipelineConfigProvider + ?Sized
{
    pub fn new(configs: &'a C) -> Self {
        Self { configs }
    }

    /// Construye el grafo del pipeline destino.
    pub fn build(&self, target: &PipelineConfig) -> Result<MaterialGraph, ConfigurationError> {
        let mut graph = MaterialGraph::new(target.name.clone());
        graph.top_level = target.materials.iter().map(MaterialConfig::fingerprint).collect();

        let mut walk = Walk { path: vec![target.name.clone()],
                              expanded: HashSet::new() };
        self.expand(&mut graph, EdgeSource::Target, &target.name, &target.materials, &mut walk)?;

        debug!("graph:built target={} nodes={} edges={}",
               graph.target,
               graph.nodes.len(),
               graph.edges.len());
        Ok(graph)
    }

    /// Busca la configuración del destino en el provider y construye su grafo.
    pub fn build_for(&self, target: &PipelineName) -> Result<MaterialGraph, ConfigurationError> {
        let config = self.configs
                         .pipeline_config(target)
                         .ok_or_else(|| ConfigurationError::UnknownTarget { pipeline: target.clone() })?;
        self.build(&config)
    }

    fn expand(&self,
              graph: &mut MaterialGraph,
              from: EdgeSource,
              owner: &PipelineName,
              materials: &[MaterialConfig],
              walk: &mut Walk)
              -> Result<(), ConfigurationError> {
        validate_materials(owner, materials)?;

        for material in materials {
            let node = MaterialNode::from_config(material);
            let fp = node.fingerprint().clone();
            graph.insert_edge(FanInEdge { from: from.clone(),
                                          to: fp.clone() });
            if graph.insert_node(node) {
                debug!("graph:node owner={} material={} fp={}", owner, material.display_name(), fp.short());
            } else {
                debug!("graph:merge owner={} material={} fp={}", owner, material.display_name(), fp.short());
            }

            let Some(dep) = material.as_dependency() else { continue };
            if walk.path.contains(&dep.pipeline) {
                let mut path = walk.path.clone();
                path.push(dep.pipeline.clone());
                return Err(ConfigurationError::CyclicDependency { path });
            }
            if !walk.expanded.insert(fp.clone()) {
                continue;
            }
            let upstream = self.configs
                               .materials_for(&dep.pipeline)
                               .ok_or_else(|| ConfigurationError::UnknownPipeline { pipeline: dep.pipeline.clone(),
                                                                                    referenced_by: owner.clone() })?;
            walk.path.push(dep.pipeline.clone());
            self.expand(graph, EdgeSource::Dependency(fp), &dep.pipeline, &upstream, walk)?;
            walk.path.pop();
        }
        Ok(())
    }
}

fn validate_materials(owner: &PipelineName, materials: &[MaterialConfig]) -> Result<(), ConfigurationError> {
    if materials.is_empty() {
        return Err(ConfigurationError::NoMaterials { pipeline: owner.clone() });
    }
    let mut seen = HashSet::new();
    for m in materials {
        let fp = m.fingerprint();
        if !seen.insert(fp.clone()) {
            return Err(ConfigurationError::DuplicateMaterial { pipeline: owner.clone(),
                                                               fingerprint: fp });
        }
    }
    Ok(())
}

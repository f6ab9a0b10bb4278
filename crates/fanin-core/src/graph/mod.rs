//! Grafo de materiales de un pipeline destino.
//!
//! Rol en el flujo:
//! - `FanInGraphBuilder` lo construye a partir de la configuración.
//! - `FanInResolver` lo recorre para expandir candidatos y comprobar
//!   convergencia.
//!
//! Invariante: un nodo por fingerprint. Un material alcanzado por varios
//! caminos (diamante) es un único `MaterialNode` con varias aristas
//! entrantes.

pub mod builder;

pub use builder::{FanInGraphBuilder, InMemoryPipelineConfigs, PipelineConfigProvider};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{DependencyMaterial, Fingerprint, MaterialConfig, MaterialKind, PipelineName};

/// Nodo del grafo. La identidad es el fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialNode {
    Root {
        fingerprint: Fingerprint,
        display_name: String,
        material: MaterialConfig,
    },
    Dependency {
        fingerprint: Fingerprint,
        display_name: String,
        material: DependencyMaterial,
    },
}

impl MaterialNode {
    pub fn from_config(material: &MaterialConfig) -> Self {
        let fingerprint = material.fingerprint();
        let display_name = material.display_name();
        match material {
            MaterialConfig::Dependency(dep) => MaterialNode::Dependency { fingerprint,
                                                                          display_name,
                                                                          material: dep.clone() },
            other => MaterialNode::Root { fingerprint,
                                          display_name,
                                          material: other.clone() },
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        match self {
            MaterialNode::Root { fingerprint, .. } | MaterialNode::Dependency { fingerprint, .. } => fingerprint,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            MaterialNode::Root { display_name, .. } | MaterialNode::Dependency { display_name, .. } => display_name,
        }
    }

    pub fn kind(&self) -> MaterialKind {
        match self {
            MaterialNode::Root { .. } => MaterialKind::Root,
            MaterialNode::Dependency { .. } => MaterialKind::Dependency,
        }
    }

    pub fn as_dependency(&self) -> Option<&DependencyMaterial> {
        match self {
            MaterialNode::Dependency { material, .. } => Some(material),
            MaterialNode::Root { .. } => None,
        }
    }
}

impl PartialEq for MaterialNode {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint() == other.fingerprint()
    }
}

impl Eq for MaterialNode {}

/// Origen de una arista: el pipeline destino o un nodo de dependencia.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeSource {
    Target,
    Dependency(Fingerprint),
}

/// Arista "`to` se alcanza a través de `from`".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FanInEdge {
    pub from: EdgeSource,
    pub to: Fingerprint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialGraph {
    pub target: PipelineName,
    /// Nodos en orden de descubrimiento (determinista).
    pub nodes: IndexMap<Fingerprint, MaterialNode>,
    pub edges: Vec<FanInEdge>,
    /// Materiales del pipeline destino en orden de declaración.
    pub top_level: Vec<Fingerprint>,
}

impl MaterialGraph {
    pub fn new(target: PipelineName) -> Self {
        Self { target,
               nodes: IndexMap::new(),
               edges: vec![],
               top_level: vec![] }
    }

    pub fn node(&self, fingerprint: &Fingerprint) -> Option<&MaterialNode> {
        self.nodes.get(fingerprint)
    }

    /// Hijos directos de un nodo de dependencia (materiales del pipeline
    /// aguas arriba), en orden de declaración.
    pub fn children_of(&self, fingerprint: &Fingerprint) -> Vec<&Fingerprint> {
        self.edges
            .iter()
            .filter(|e| matches!(&e.from, EdgeSource::Dependency(fp) if fp == fingerprint))
            .map(|e| &e.to)
            .collect()
    }

    /// Aristas que terminan en `fingerprint`.
    pub fn incoming(&self, fingerprint: &Fingerprint) -> Vec<&FanInEdge> {
        self.edges.iter().filter(|e| &e.to == fingerprint).collect()
    }

    pub fn roots(&self) -> impl Iterator<Item = &MaterialNode> {
        self.nodes.values().filter(|n| n.kind() == MaterialKind::Root)
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &MaterialNode> {
        self.nodes.values().filter(|n| n.kind() == MaterialKind::Dependency)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Agrega el nodo si no existe. Devuelve `true` si era nuevo.
    pub(crate) fn insert_node(&mut self, node: MaterialNode) -> bool {
        if self.nodes.contains_key(node.fingerprint()) {
            return false;
        }
        self.nodes.insert(node.fingerprint().clone(), node);
        true
    }

    pub(crate) fn insert_edge(&mut self, edge: FanInEdge) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }
}

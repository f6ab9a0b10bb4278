//! Resultado de una resolución exitosa.
//!
//! Inmutable y determinista: mapas ordenados (`BTreeMap`) y aristas en el
//! orden del grafo, de modo que dos resoluciones sobre el mismo grafo e
//! historial producen valores idénticos.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::EdgeSource;
use crate::model::{CandidateRevision, Fingerprint, MaterialKind, PipelineName};

/// Selección para un material de primer nivel del pipeline destino.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMaterial {
    pub fingerprint: Fingerprint,
    pub display_name: String,
    pub kind: MaterialKind,
    pub revision: CandidateRevision,
}

/// Instancia aguas arriba elegida para un nodo de dependencia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInstance {
    pub pipeline: PipelineName,
    pub stage: String,
    pub counter: u64,
    pub label: String,
    pub revision: CandidateRevision,
}

/// Arista anotada: `to` quedó fijado en `revision`, provisto por la instancia
/// `via_counter` del nodo `from` (ninguna si viene del destino).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEdge {
    pub from: EdgeSource,
    pub to: Fingerprint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_counter: Option<u64>,
    pub revision: CandidateRevision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedGraph {
    pub target: PipelineName,
    pub selections: Vec<ResolvedMaterial>,
    pub roots: BTreeMap<Fingerprint, CandidateRevision>,
    pub dependencies: BTreeMap<Fingerprint, ResolvedInstance>,
    pub edges: Vec<ResolvedEdge>,
    pub permutations_tried: usize,
}

impl ResolvedGraph {
    /// Revisión fijada para cualquier nodo (raíz o dependencia).
    pub fn revision_of(&self, fingerprint: &Fingerprint) -> Option<&CandidateRevision> {
        self.roots
            .get(fingerprint)
            .or_else(|| self.dependencies.get(fingerprint).map(|d| &d.revision))
    }

    pub fn instance_of(&self, fingerprint: &Fingerprint) -> Option<&ResolvedInstance> {
        self.dependencies.get(fingerprint)
    }

    pub fn selection(&self, fingerprint: &Fingerprint) -> Option<&ResolvedMaterial> {
        self.selections.iter().find(|s| &s.fingerprint == fingerprint)
    }

    /// Aristas entrantes a un nodo: qué instancias aguas arriba lo aportaron.
    pub fn provenance(&self, fingerprint: &Fingerprint) -> Vec<&ResolvedEdge> {
        self.edges.iter().filter(|e| &e.to == fingerprint).collect()
    }

    /// Cadena de procedencia de un nodo hasta el destino: cada paso es la
    /// dependencia a través de la cual se alcanza, empezando por la más
    /// cercana al nodo. Si hay varios caminos sigue el primero registrado.
    /// Termina porque el grafo es acíclico.
    pub fn provenance_chain(&self, fingerprint: &Fingerprint) -> Vec<&ResolvedInstance> {
        let mut chain = vec![];
        let mut current = fingerprint;
        while let Some(edge) = self.edges.iter().find(|e| &e.to == current) {
            match &edge.from {
                EdgeSource::Target => break,
                EdgeSource::Dependency(fp) => {
                    let Some(instance) = self.dependencies.get(fp) else { break };
                    chain.push(instance);
                    current = fp;
                }
            }
        }
        chain
    }

    /// Todas las aristas hacia un mismo nodo llevan la misma revisión y ésta
    /// coincide con la fijada para el nodo.
    pub fn is_consistent(&self) -> bool {
        self.edges
            .iter()
            .all(|e| self.revision_of(&e.to).is_some_and(|r| r.same_revision(&e.revision)))
    }
}

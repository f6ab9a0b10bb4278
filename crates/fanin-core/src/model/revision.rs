//! Revisiones candidatas e instancias históricas de pipelines.
//!
//! El historial entrega las listas ya ordenadas (más reciente primero); el
//! motor nunca las reordena.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DependencyMaterial, Fingerprint, MaterialConfig, PipelineName};

/// Una revisión histórica de un material.
///
/// Para materiales raíz `revision` es el identificador del SCM (sha, número
/// de changeset, versión de paquete). Para dependencias es
/// `"{pipeline}/{counter}/{stage}"` (en minúsculas, igual que el fingerprint)
/// y `pipeline_counter` apunta a la instancia aguas arriba.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRevision {
    pub revision: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_counter: Option<u64>,
}

impl CandidateRevision {
    pub fn new(revision: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { revision: revision.into(),
               timestamp,
               pipeline_counter: None }
    }

    /// Revisión que representa a la instancia `counter` de un pipeline vista
    /// desde un material de dependencia.
    pub fn for_instance(material: &DependencyMaterial, counter: u64, timestamp: DateTime<Utc>) -> Self {
        Self { revision: format!("{}/{}/{}", material.pipeline.to_lower(), counter, material.stage.to_lowercase()),
               timestamp,
               pipeline_counter: Some(counter) }
    }

    /// Igualdad relevante para convergencia: sólo el identificador.
    pub fn same_revision(&self, other: &CandidateRevision) -> bool {
        self.revision == other.revision
    }
}

/// Instancia completada de un pipeline aguas arriba con las revisiones que
/// usó para cada uno de sus materiales (por fingerprint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInstance {
    pub pipeline: PipelineName,
    pub counter: u64,
    pub label: String,
    pub completed_at: DateTime<Utc>,
    pub passed_stages: Vec<String>,
    pub revisions: BTreeMap<Fingerprint, CandidateRevision>,
}

impl PipelineInstance {
    pub fn new(pipeline: impl Into<PipelineName>, counter: u64, completed_at: DateTime<Utc>) -> Self {
        Self { pipeline: pipeline.into(),
               counter,
               label: counter.to_string(),
               completed_at,
               passed_stages: vec![],
               revisions: BTreeMap::new() }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Marca un stage como aprobado en esta instancia.
    pub fn passed(mut self, stage: impl Into<String>) -> Self {
        self.passed_stages.push(stage.into());
        self
    }

    /// Registra la revisión usada para un material raíz.
    pub fn with_revision(mut self, material: &MaterialConfig, revision: CandidateRevision) -> Self {
        self.revisions.insert(material.fingerprint(), revision);
        self
    }

    /// Registra el contador de la instancia aguas arriba usada por un
    /// material de dependencia.
    pub fn with_upstream(mut self, material: &DependencyMaterial, counter: u64) -> Self {
        let fp = MaterialConfig::Dependency(material.clone()).fingerprint();
        self.revisions
            .insert(fp, CandidateRevision::for_instance(material, counter, self.completed_at));
        self
    }

    pub fn has_passed(&self, stage: &str) -> bool {
        let stage = stage.to_lowercase();
        self.passed_stages.iter().any(|s| s.to_lowercase() == stage)
    }

    /// Revisión que esta instancia representa para `material`.
    pub fn as_revision(&self, material: &DependencyMaterial) -> CandidateRevision {
        CandidateRevision::for_instance(material, self.counter, self.completed_at)
    }

    pub fn revision_for(&self, fingerprint: &Fingerprint) -> Option<&CandidateRevision> {
        self.revisions.get(fingerprint)
    }
}

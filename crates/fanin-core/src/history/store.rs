use dashmap::DashMap;

use super::RevisionHistoryProvider;
use crate::errors::HistoryError;
use crate::model::{CandidateRevision, Fingerprint, MaterialConfig, PipelineInstance, PipelineName};

/// Historial en memoria, seguro para compartir entre hilos: se puede
/// registrar historial mientras otras resoluciones leen.
///
/// Invariantes: revisiones ordenadas de la más nueva a la más vieja según
/// orden de registro; instancias ordenadas por `counter` descendente.
#[derive(Debug, Default)]
pub struct InMemoryRevisionHistory {
    revisions: DashMap<Fingerprint, Vec<CandidateRevision>>,
    instances: DashMap<PipelineName, Vec<PipelineInstance>>,
}

impl InMemoryRevisionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una revisión como la más reciente del material.
    pub fn record_revision(&self, material: &MaterialConfig, revision: CandidateRevision) {
        self.record_revision_for(material.fingerprint(), revision);
    }

    pub fn record_revision_for(&self, fingerprint: Fingerprint, revision: CandidateRevision) {
        self.revisions.entry(fingerprint).or_default().insert(0, revision);
    }

    /// Registra varias revisiones en orden cronológico (la última es la más
    /// reciente).
    pub fn record_revisions<I>(&self, material: &MaterialConfig, revisions: I)
        where I: IntoIterator<Item = CandidateRevision>
    {
        for r in revisions {
            self.record_revision(material, r);
        }
    }

    /// Registra una instancia completada. Un contador repetido reemplaza la
    /// instancia anterior.
    pub fn record_instance(&self, instance: PipelineInstance) {
        let mut list = self.instances.entry(instance.pipeline.clone()).or_default();
        list.retain(|i| i.counter != instance.counter);
        let pos = list.iter()
                      .position(|i| i.counter < instance.counter)
                      .unwrap_or(list.len());
        list.insert(pos, instance);
    }
}

impl RevisionHistoryProvider for InMemoryRevisionHistory {
    fn revisions_for(&self, fingerprint: &Fingerprint, max_count: usize) -> Result<Vec<CandidateRevision>, HistoryError> {
        Ok(self.revisions
               .get(fingerprint)
               .map(|r| r.iter().take(max_count).cloned().collect())
               .unwrap_or_default())
    }

    fn instances_of(&self, pipeline: &PipelineName) -> Result<Vec<PipelineInstance>, HistoryError> {
        Ok(self.instances.get(pipeline).map(|list| list.value().clone()).unwrap_or_default())
    }

    fn instance(&self, pipeline: &PipelineName, counter: u64) -> Result<Option<PipelineInstance>, HistoryError> {
        Ok(self.instances
               .get(pipeline)
               .and_then(|list| list.iter().find(|i| i.counter == counter).cloned()))
    }
}

//! Historial de revisiones: contrato del colaborador externo y una
//! implementación en memoria.
//!
//! El resolver sólo lee; caching y frescura son responsabilidad del
//! provider. `MemoizedHistory` evita consultas repetidas dentro de una misma
//! resolución.

pub mod memo;
pub mod store;

pub use memo::MemoizedHistory;
pub use store::InMemoryRevisionHistory;

use crate::errors::HistoryError;
use crate::model::{CandidateRevision, Fingerprint, PipelineInstance, PipelineName};

/// Historial de materiales y de instancias de pipelines.
pub trait RevisionHistoryProvider {
    /// Revisiones conocidas del material, más reciente primero. Puede devolver
    /// menos de `max_count` si el historial es corto.
    fn revisions_for(&self, fingerprint: &Fingerprint, max_count: usize) -> Result<Vec<CandidateRevision>, HistoryError>;

    /// Instancias completadas del pipeline, más reciente primero. Qué stages
    /// aprobó cada una se decide por `PipelineInstance::passed_stages`.
    fn instances_of(&self, pipeline: &PipelineName) -> Result<Vec<PipelineInstance>, HistoryError>;

    /// Instancia puntual por contador.
    fn instance(&self, pipeline: &PipelineName, counter: u64) -> Result<Option<PipelineInstance>, HistoryError> {
        Ok(self.instances_of(pipeline)?
               .into_iter()
               .find(|i| i.counter == counter))
    }
}

impl<T> RevisionHistoryProvider for &T
    where T: RevisionHistoryProvider + ?Sized
{
    fn revisions_for(&self, fingerprint: &Fingerprint, max_count: usize) -> Result<Vec<CandidateRevision>, HistoryError> {
        (**self).revisions_for(fingerprint, max_count)
    }

    fn instances_of(&self, pipeline: &PipelineName) -> Result<Vec<PipelineInstance>, HistoryError> {
        (**self).instances_of(pipeline)
    }

    fn instance(&self, pipeline: &PipelineName, counter: u64) -> Result<Option<PipelineInstance>, HistoryError> {
        (**self).instance(pipeline, counter)
    }
}

//! Memoización por llamada a `resolve()`.
//!
//! Vive sólo durante una resolución (no es `Sync`, no se comparte). Cada
//! respuesta del provider se pide como mucho una vez.
use std::cell::RefCell;
use std::collections::HashMap;

use super::RevisionHistoryProvider;
use crate::errors::HistoryError;
use crate::model::{CandidateRevision, DependencyMaterial, Fingerprint, PipelineInstance, PipelineName};

pub struct MemoizedHistory<'a, H>
    where H: RevisionHistoryProvider + ?Sized
{
    inner: &'a H,
    revisions: RefCell<HashMap<(Fingerprint, usize), Vec<CandidateRevision>>>,
    instances: RefCell<HashMap<PipelineName, Vec<PipelineInstance>>>,
}

impl<'a, H> MemoizedHistory<'a, H>
    where H: RevisionHistoryProvider + ?Sized
{
    pub fn new(inner: &'a H) -> Self {
        Self { inner,
               revisions: RefCell::new(HashMap::new()),
               instances: RefCell::new(HashMap::new()) }
    }

    /// Instancias que aprobaron el stage del material, más reciente primero.
    pub fn eligible_instances(&self, material: &DependencyMaterial) -> Result<Vec<PipelineInstance>, HistoryError> {
        Ok(self.instances_of(&material.pipeline)?
               .into_iter()
               .filter(|i| i.has_passed(&material.stage))
               .collect())
    }

    pub fn newest_revision(&self, fingerprint: &Fingerprint) -> Result<Option<CandidateRevision>, HistoryError> {
        Ok(self.revisions_for(fingerprint, 1)?.into_iter().next())
    }
}

impl<H> RevisionHistoryProvider for MemoizedHistory<'_, H>
    where H: RevisionHistoryProvider + ?Sized
{
    fn revisions_for(&self, fingerprint: &Fingerprint, max_count: usize) -> Result<Vec<CandidateRevision>, HistoryError> {
        let key = (fingerprint.clone(), max_count);
        if let Some(hit) = self.revisions.borrow().get(&key) {
            return Ok(hit.clone());
        }
        let fetched = self.inner.revisions_for(fingerprint, max_count)?;
        self.revisions.borrow_mut().insert(key, fetched.clone());
        Ok(fetched)
    }

    fn instances_of(&self, pipeline: &PipelineName) -> Result<Vec<PipelineInstance>, HistoryError> {
        if let Some(hit) = self.instances.borrow().get(pipeline) {
            return Ok(hit.clone());
        }
        let fetched = self.inner.instances_of(pipeline)?;
        self.instances.borrow_mut().insert(pipeline.clone(), fetched.clone());
        Ok(fetched)
    }

    fn instance(&self, pipeline: &PipelineName, counter: u64) -> Result<Option<PipelineInstance>, HistoryError> {
        Ok(self.instances_of(pipeline)?
               .into_iter()
               .find(|i| i.counter == counter))
    }
}

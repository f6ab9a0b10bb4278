#![allow(dead_code)]

use std::cell::Cell;

use chrono::{DateTime, TimeZone, Utc};
use fanin_core::{CandidateRevision, DependencyMaterial, FanInGraphBuilder, Fingerprint, HistoryError, InMemoryPipelineConfigs, InMemoryRevisionHistory, MaterialConfig, MaterialGraph,
                 PipelineConfig, PipelineInstance, PipelineName, RevisionHistoryProvider};

pub fn ts(n: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap()
}

pub fn dep(pipeline: &str, stage: &str) -> DependencyMaterial {
    DependencyMaterial::new(pipeline, stage)
}

pub fn fp_of(dep: &DependencyMaterial) -> Fingerprint {
    MaterialConfig::from(dep.clone()).fingerprint()
}

/// Qué usó una corrida para cada material.
pub enum Used<'a> {
    Rev(&'a MaterialConfig, &'a str),
    Run(&'a DependencyMaterial, u64),
}

/// Configuración + historial en memoria con un reloj creciente.
pub struct Fixture {
    pub configs: InMemoryPipelineConfigs,
    pub history: InMemoryRevisionHistory,
    clock: Cell<i64>,
}

impl Fixture {
    pub fn new() -> Self {
        Self { configs: InMemoryPipelineConfigs::new(),
               history: InMemoryRevisionHistory::new(),
               clock: Cell::new(0) }
    }

    fn tick(&self) -> DateTime<Utc> {
        self.clock.set(self.clock.get() + 1);
        ts(self.clock.get())
    }

    pub fn pipeline(&mut self, name: &str, materials: Vec<MaterialConfig>) {
        self.configs.insert(PipelineConfig::new(name, materials));
    }

    /// Registra revisiones en orden cronológico.
    pub fn checkin(&self, material: &MaterialConfig, revisions: &[&str]) {
        for r in revisions {
            self.history.record_revision(material, CandidateRevision::new(*r, self.tick()));
        }
    }

    /// Registra una corrida que aprobó `stage`.
    pub fn run_and_pass(&self, pipeline: &str, counter: u64, stage: &str, used: &[Used<'_>]) -> PipelineInstance {
        self.record(PipelineInstance::new(pipeline, counter, self.tick()).passed(stage), used)
    }

    /// Registra una corrida que no aprobó ningún stage.
    pub fn run_and_fail(&self, pipeline: &str, counter: u64, used: &[Used<'_>]) -> PipelineInstance {
        self.record(PipelineInstance::new(pipeline, counter, self.tick()), used)
    }

    fn record(&self, mut instance: PipelineInstance, used: &[Used<'_>]) -> PipelineInstance {
        for u in used {
            instance = match u {
                Used::Rev(material, rev) => instance.with_revision(material, CandidateRevision::new(*rev, ts(0))),
                Used::Run(material, counter) => instance.with_upstream(material, *counter),
            };
        }
        self.history.record_instance(instance.clone());
        instance
    }

    pub fn graph(&self, target: &str) -> MaterialGraph {
        FanInGraphBuilder::new(&self.configs).build_for(&PipelineName::new(target))
                                             .expect("graph")
    }
}

/// Provider que cuenta llamadas y delega.
pub struct CountingHistory<'a> {
    pub inner: &'a InMemoryRevisionHistory,
    pub revision_calls: Cell<usize>,
    pub instance_calls: Cell<usize>,
}

impl<'a> CountingHistory<'a> {
    pub fn new(inner: &'a InMemoryRevisionHistory) -> Self {
        Self { inner,
               revision_calls: Cell::new(0),
               instance_calls: Cell::new(0) }
    }
}

impl RevisionHistoryProvider for CountingHistory<'_> {
    fn revisions_for(&self, fingerprint: &Fingerprint, max_count: usize) -> Result<Vec<CandidateRevision>, HistoryError> {
        self.revision_calls.set(self.revision_calls.get() + 1);
        self.inner.revisions_for(fingerprint, max_count)
    }

    fn instances_of(&self, pipeline: &PipelineName) -> Result<Vec<PipelineInstance>, HistoryError> {
        self.instance_calls.set(self.instance_calls.get() + 1);
        self.inner.instances_of(pipeline)
    }
}

/// Provider caído.
pub struct UnavailableHistory;

impl RevisionHistoryProvider for UnavailableHistory {
    fn revisions_for(&self, _fingerprint: &Fingerprint, _max_count: usize) -> Result<Vec<CandidateRevision>, HistoryError> {
        Err(HistoryError::Unavailable("connection refused".into()))
    }

    fn instances_of(&self, _pipeline: &PipelineName) -> Result<Vec<PipelineInstance>, HistoryError> {
        Err(HistoryError::Unavailable("connection refused".into()))
    }
}

//! Snapshot JSON de configuración + historial.
//!
//! Formato pensado para escribirse a mano: los materiales de cada corrida se
//! declaran por configuración (no por fingerprint) y el loader calcula los
//! fingerprints.
//!
//! ```json
//! {
//!   "pipelines": [{ "name": "p", "materials": [{ "type": "scm", "scm": "git", "url": "g" }] }],
//!   "revisions": [{ "material": { "type": "scm", "scm": "git", "url": "g" },
//!                   "revisions": [{ "revision": "r1", "timestamp": "2024-01-01T00:00:00Z" }] }],
//!   "runs": [{ "pipeline": "up", "counter": 1, "completed_at": "2024-01-01T00:00:00Z",
//!              "passed_stages": ["build"],
//!              "materials": [{ "material": { "type": "scm", "scm": "git", "url": "g" }, "revision": "r1" }] }]
//! }
//! ```
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use fanin_core::{CandidateRevision, FanInConfig, FanInService, InMemoryPipelineConfigs, InMemoryRevisionHistory, MaterialConfig, PipelineConfig, PipelineInstance, PipelineName};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub type SnapshotService = FanInService<InMemoryPipelineConfigs, InMemoryRevisionHistory>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
    #[serde(default)]
    pub revisions: Vec<MaterialHistory>,
    #[serde(default)]
    pub runs: Vec<RunRecord>,
}

/// Revisiones de un material en orden cronológico (la última es la más nueva).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialHistory {
    pub material: MaterialConfig,
    pub revisions: Vec<CandidateRevision>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub pipeline: PipelineName,
    pub counter: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub passed_stages: Vec<String>,
    #[serde(default)]
    pub materials: Vec<UsedMaterial>,
}

/// Material usado por una corrida: `revision` para materiales raíz,
/// `counter` de la instancia aguas arriba para dependencias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsedMaterial {
    pub material: MaterialConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter: Option<u64>,
}

impl RunRecord {
    pub fn into_instance(self) -> Result<PipelineInstance, AppError> {
        let mut instance = PipelineInstance::new(self.pipeline, self.counter, self.completed_at);
        if let Some(label) = self.label {
            instance = instance.with_label(label);
        }
        for stage in self.passed_stages {
            instance = instance.passed(stage);
        }
        for used in self.materials {
            let revision = match (&used.material, used.revision, used.counter) {
                (MaterialConfig::Dependency(dep), _, Some(counter)) => {
                    instance = instance.with_upstream(dep, counter);
                    continue;
                }
                (MaterialConfig::Dependency(dep), _, None) => {
                    return Err(AppError::Snapshot(format!("run {}/{}: dependency on '{}' needs a counter",
                                                          instance.pipeline, instance.counter, dep.pipeline)));
                }
                (_, Some(revision), _) => CandidateRevision::new(revision, instance.completed_at),
                (material, None, _) => {
                    return Err(AppError::Snapshot(format!("run {}/{}: material '{}' needs a revision",
                                                          instance.pipeline,
                                                          instance.counter,
                                                          material.display_name())));
                }
            };
            instance = instance.with_revision(&used.material, revision);
        }
        Ok(instance)
    }
}

impl Snapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        debug!("snapshot:load path={} pipelines={} runs={}",
               path.as_ref().display(),
               snapshot.pipelines.len(),
               snapshot.runs.len());
        Ok(snapshot)
    }

    pub fn into_stores(self) -> Result<(InMemoryPipelineConfigs, InMemoryRevisionHistory), AppError> {
        let configs: InMemoryPipelineConfigs = self.pipelines.into_iter().collect();
        let history = InMemoryRevisionHistory::new();
        for entry in self.revisions {
            history.record_revisions(&entry.material, entry.revisions);
        }
        for run in self.runs {
            history.record_instance(run.into_instance()?);
        }
        Ok((configs, history))
    }

    pub fn into_service(self, config: FanInConfig) -> Result<SnapshotService, AppError> {
        let (configs, history) = self.into_stores()?;
        Ok(FanInService::new(configs, history, config))
    }
}

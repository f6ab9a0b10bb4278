//! Expansión de candidatos: qué revisión implica, para cada nodo alcanzable,
//! elegir una revisión o instancia concreta de un material de primer nivel.
//!
//! Una instancia aguas arriba se expande por los hijos que su nodo tiene en
//! el grafo actual. Si la instancia no registró un hijo (material agregado
//! después de esa corrida) el hijo aporta su revisión más reciente o su
//! instancia elegible más reciente.
use std::collections::BTreeMap;

use log::debug;

use crate::errors::{FanInFailure, HistoryError, ResolveError};
use crate::graph::{MaterialGraph, MaterialNode};
use crate::history::{MemoizedHistory, RevisionHistoryProvider};
use crate::model::{CandidateRevision, DependencyMaterial, Fingerprint, PipelineInstance};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pin {
    New,
    Same,
    Conflict,
}

/// Revisiones fijadas por un candidato (o por una combinación).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Pins {
    pub(crate) revisions: BTreeMap<Fingerprint, CandidateRevision>,
    /// Etiqueta de la instancia elegida para nodos de dependencia.
    pub(crate) labels: BTreeMap<Fingerprint, String>,
}

impl Pins {
    pub(crate) fn pin(&mut self, fingerprint: &Fingerprint, revision: CandidateRevision) -> Pin {
        match self.revisions.get(fingerprint) {
            Some(existing) if existing.same_revision(&revision) => Pin::Same,
            Some(_) => Pin::Conflict,
            None => {
                self.revisions.insert(fingerprint.clone(), revision);
                Pin::New
            }
        }
    }
}

/// Un candidato para un material de primer nivel.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) revision: CandidateRevision,
    pub(crate) pins: Pins,
}

/// Candidatos de un material de primer nivel y cuánto historial quedó
/// fuera de la ventana consultada.
#[derive(Debug, Clone)]
pub(crate) struct CandidateList {
    pub(crate) candidates: Vec<Candidate>,
    /// Hubo candidatos más viejos que no se consideraron.
    pub(crate) truncated: bool,
    /// Cota inferior de candidatos existentes.
    pub(crate) available: usize,
}

impl CandidateList {
    fn new(candidates: Vec<Candidate>, available: usize, window: usize) -> Self {
        let truncated = available > window;
        let available = if truncated { available } else { candidates.len() };
        Self { candidates,
               truncated,
               available }
    }
}

pub(crate) struct Expander<'m, 'h, H>
    where H: RevisionHistoryProvider + ?Sized
{
    graph: &'m MaterialGraph,
    history: &'m MemoizedHistory<'h, H>,
}

impl<'m, 'h, H> Expander<'m, 'h, H>
    where H: RevisionHistoryProvider + ?Sized
{
    pub(crate) fn new(graph: &'m MaterialGraph, history: &'m MemoizedHistory<'h, H>) -> Self {
        Self { graph, history }
    }

    /// Candidatos (más reciente primero) de un material de primer nivel,
    /// como mucho `window`. Los candidatos internamente inconsistentes se
    /// descartan.
    pub(crate) fn top_level_candidates(&self, fingerprint: &Fingerprint, window: usize) -> Result<CandidateList, ResolveError> {
        let Some(node) = self.graph.node(fingerprint) else {
            return Err(HistoryError::Internal(format!("top-level material {fingerprint} is not in the graph")).into());
        };
        match node {
            MaterialNode::Root { display_name, .. } => {
                // Uno más que la ventana para saber si quedó historial afuera.
                let mut revisions = self.history.revisions_for(fingerprint, window.saturating_add(1))?;
                if revisions.is_empty() {
                    return Err(FanInFailure::MaterialHasNoHistory { fingerprint: fingerprint.clone(),
                                                                    name: display_name.clone() }.into());
                }
                let available = revisions.len();
                revisions.truncate(window);
                let candidates = revisions.into_iter()
                                          .map(|revision| {
                                              let mut pins = Pins::default();
                                              pins.pin(fingerprint, revision.clone());
                                              Candidate { revision, pins }
                                          })
                                          .collect();
                Ok(CandidateList::new(candidates, available, window))
            }
            MaterialNode::Dependency { material, .. } => {
                let instances = self.history.eligible_instances(material)?;
                let available = instances.len();
                let mut candidates = Vec::new();
                for instance in instances.into_iter().take(window) {
                    let mut pins = Pins::default();
                    if self.expand_instance(fingerprint, material, &instance, &mut pins)? {
                        candidates.push(Candidate { revision: instance.as_revision(material),
                                                    pins });
                    } else {
                        debug!("expand:discard pipeline={} counter={} (inconsistent upstream history)",
                               material.pipeline,
                               instance.counter);
                    }
                }
                Ok(CandidateList::new(candidates, available, window))
            }
        }
    }

    /// Fija la instancia para el nodo y, recursivamente, todo lo que implica.
    /// Devuelve `false` si contradice algo ya fijado.
    pub(crate) fn expand_instance(&self,
                                  fingerprint: &Fingerprint,
                                  material: &DependencyMaterial,
                                  instance: &PipelineInstance,
                                  pins: &mut Pins)
                                  -> Result<bool, ResolveError> {
        match pins.pin(fingerprint, instance.as_revision(material)) {
            Pin::Conflict => return Ok(false),
            Pin::Same => return Ok(true),
            Pin::New => {
                pins.labels.insert(fingerprint.clone(), instance.label.clone());
            }
        }

        for child in self.graph.children_of(fingerprint) {
            let Some(node) = self.graph.node(child) else { continue };
            let consistent = match node {
                MaterialNode::Root { display_name, .. } => {
                    let revision = match instance.revision_for(child) {
                        Some(r) => r.clone(),
                        None => self.newest_revision(child, display_name)?,
                    };
                    pins.pin(child, revision) != Pin::Conflict
                }
                MaterialNode::Dependency { material: upstream_material, .. } => {
                    let upstream = match instance.revision_for(child).and_then(|r| r.pipeline_counter) {
                        Some(counter) => self.recorded_instance(instance, upstream_material, counter)?,
                        None => self.newest_instance(upstream_material)?,
                    };
                    self.expand_instance(child, upstream_material, &upstream, pins)?
                }
            };
            if !consistent {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn newest_revision(&self, fingerprint: &Fingerprint, name: &str) -> Result<CandidateRevision, ResolveError> {
        self.history
            .newest_revision(fingerprint)?
            .ok_or_else(|| {
                FanInFailure::MaterialHasNoHistory { fingerprint: fingerprint.clone(),
                                                     name: name.to_string() }.into()
            })
    }

    fn newest_instance(&self, material: &DependencyMaterial) -> Result<PipelineInstance, ResolveError> {
        self.history
            .eligible_instances(material)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                FanInFailure::UpstreamNotYetBuilt { pipeline: material.pipeline.clone(),
                                                    stage: material.stage.clone() }.into()
            })
    }

    /// Instancia que `downstream` registró haber usado. Que no exista en el
    /// historial es una inconsistencia del provider, no un fallo de fan-in.
    fn recorded_instance(&self,
                         downstream: &PipelineInstance,
                         material: &DependencyMaterial,
                         counter: u64)
                         -> Result<PipelineInstance, ResolveError> {
        self.history
            .instance(&material.pipeline, counter)?
            .ok_or_else(|| {
                HistoryError::Inconsistent(format!("{}/{} was built from {}/{} which is missing from history",
                                                   downstream.pipeline, downstream.counter, material.pipeline, counter)).into()
            })
    }
}

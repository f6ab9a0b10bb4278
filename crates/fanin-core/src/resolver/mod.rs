//! Resolución de fan-in: elegir, para cada material del pipeline destino,
//! una revisión tal que todo material alcanzado por varios caminos quede
//! fijado en una única revisión.
//!
//! Flujo de `resolve`:
//! 1. Cada nodo de dependencia del grafo debe tener al menos una instancia
//!    elegible (si no, `UpstreamNotYetBuilt` sin buscar).
//! 2. Cada material de primer nivel aporta su lista de candidatos (más
//!    reciente primero), ya expandidos a lo que implican aguas arriba. La
//!    lista se corta en `max_permutations + 1`: un índice mayor nunca se
//!    alcanza antes del límite.
//! 3. Las combinaciones se recorren en `StalenessOrder` con un contador
//!    explícito comparado contra `max_permutations`.
//! 4. La primera combinación convergente se convierte en `ResolvedGraph`.
//!    Si se agota el espacio pero alguna lista quedó cortada por
//!    `history_depth`, el resultado es `SearchSpaceTooLarge`: no se recorrió
//!    todo.

mod expand;
pub mod resolved;
pub mod search;

pub use resolved::{ResolvedEdge, ResolvedGraph, ResolvedInstance, ResolvedMaterial};
pub use search::{search_space, StalenessOrder};

use std::collections::BTreeMap;

use log::{debug, info};

use crate::constants::DEFAULT_MAX_PERMUTATIONS;
use crate::errors::{FanInFailure, ResolveError};
use crate::graph::{EdgeSource, MaterialGraph, MaterialNode};
use crate::history::{MemoizedHistory, RevisionHistoryProvider};
use expand::{Candidate, Expander, Pin, Pins};

/// Resolver sin estado entre llamadas: puede compartirse entre hilos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanInResolver {
    max_permutations: usize,
    history_depth: Option<usize>,
}

impl Default for FanInResolver {
    fn default() -> Self {
        Self { max_permutations: DEFAULT_MAX_PERMUTATIONS,
               history_depth: None }
    }
}

impl FanInResolver {
    pub fn new(max_permutations: usize) -> Self {
        Self { max_permutations,
               ..Self::default() }
    }

    /// Tope de candidatos consultados por material de primer nivel. Sin
    /// tope sólo limita `max_permutations`.
    pub fn with_history_depth(mut self, history_depth: usize) -> Self {
        self.history_depth = Some(history_depth.max(1));
        self
    }

    pub fn max_permutations(&self) -> usize {
        self.max_permutations
    }

    pub fn history_depth(&self) -> Option<usize> {
        self.history_depth
    }

    fn candidate_window(&self) -> usize {
        let reachable = self.max_permutations.saturating_add(1);
        self.history_depth.map_or(reachable, |depth| depth.min(reachable))
    }

    pub fn resolve<H>(&self, graph: &MaterialGraph, history: &H) -> Result<ResolvedGraph, ResolveError>
        where H: RevisionHistoryProvider + ?Sized
    {
        let memo = MemoizedHistory::new(history);
        ensure_upstreams_built(graph, &memo)?;

        let expander = Expander::new(graph, &memo);
        let window = self.candidate_window();
        let mut candidates = Vec::with_capacity(graph.top_level.len());
        let mut available = Vec::with_capacity(graph.top_level.len());
        let mut truncated = false;
        for fp in &graph.top_level {
            let list = expander.top_level_candidates(fp, window)?;
            truncated |= list.truncated;
            available.push(list.available);
            candidates.push(list.candidates);
        }
        let lens: Vec<usize> = candidates.iter().map(Vec::len).collect();
        let space = search_space(&available);
        debug!("resolve:start target={} nodes={} candidates={:?} space={} limit={} truncated={}",
               graph.target,
               graph.len(),
               lens,
               space,
               self.max_permutations,
               truncated);

        let mut tried = 0usize;
        for combination in StalenessOrder::new(&lens) {
            if tried >= self.max_permutations {
                info!("resolve:truncated target={} tried={} space={}", graph.target, tried, space);
                return Err(FanInFailure::SearchSpaceTooLarge { limit: self.max_permutations,
                                                               space }.into());
            }
            tried += 1;
            if let Some(pins) = converge(&candidates, &combination) {
                let resolved = assemble(graph, &candidates, &combination, &pins, tried);
                info!("resolve:ok target={} tried={} combination={:?}", graph.target, tried, combination);
                return Ok(resolved);
            }
        }
        if truncated {
            info!("resolve:truncated target={} tried={} space={} depth={:?}", graph.target, tried, space, self.history_depth);
            return Err(FanInFailure::SearchSpaceTooLarge { limit: self.max_permutations,
                                                           space }.into());
        }
        info!("resolve:exhausted target={} tried={} space={}", graph.target, tried, space);
        Err(FanInFailure::NoValidCombinationFound { tried }.into())
    }

    /// Selección sin fan-in: el candidato más reciente de cada material de
    /// primer nivel, sin comprobar convergencia.
    pub fn select_latest<H>(&self, graph: &MaterialGraph, history: &H) -> Result<Vec<ResolvedMaterial>, ResolveError>
        where H: RevisionHistoryProvider + ?Sized
    {
        let mut selections = Vec::with_capacity(graph.top_level.len());
        for fp in &graph.top_level {
            let Some(node) = graph.node(fp) else { continue };
            let revision = match node {
                MaterialNode::Root { display_name, .. } => {
                    history.revisions_for(fp, 1)?
                           .into_iter()
                           .next()
                           .ok_or_else(|| FanInFailure::MaterialHasNoHistory { fingerprint: fp.clone(),
                                                                               name: display_name.clone() })?
                }
                MaterialNode::Dependency { material, .. } => {
                    let newest = history.instances_of(&material.pipeline)?
                                        .into_iter()
                                        .find(|i| i.has_passed(&material.stage))
                                        .ok_or_else(|| FanInFailure::UpstreamNotYetBuilt { pipeline: material.pipeline.clone(),
                                                                                           stage: material.stage.clone() })?;
                    newest.as_revision(material)
                }
            };
            selections.push(ResolvedMaterial { fingerprint: fp.clone(),
                                               display_name: node.display_name().to_string(),
                                               kind: node.kind(),
                                               revision });
        }
        debug!("resolve:latest target={} selections={}", graph.target, selections.len());
        Ok(selections)
    }
}

/// Atajo sin tope de historial: sólo limita `max_permutations`.
pub fn resolve<H>(graph: &MaterialGraph, history: &H, max_permutations: usize) -> Result<ResolvedGraph, ResolveError>
    where H: RevisionHistoryProvider + ?Sized
{
    FanInResolver::new(max_permutations).resolve(graph, history)
}

fn ensure_upstreams_built<H>(graph: &MaterialGraph, history: &MemoizedHistory<'_, H>) -> Result<(), ResolveError>
    where H: RevisionHistoryProvider + ?Sized
{
    for dep in graph.dependencies().filter_map(MaterialNode::as_dependency) {
        if history.eligible_instances(dep)?.is_empty() {
            info!("resolve:waiting target={} upstream={} stage={}", graph.target, dep.pipeline, dep.stage);
            return Err(FanInFailure::UpstreamNotYetBuilt { pipeline: dep.pipeline.clone(),
                                                           stage: dep.stage.clone() }.into());
        }
    }
    Ok(())
}

/// Une lo fijado por cada candidato elegido; `None` si dos de ellos
/// discrepan en algún nodo.
fn converge(candidates: &[Vec<Candidate>], combination: &[usize]) -> Option<Pins> {
    let mut merged = Pins::default();
    for (list, &index) in candidates.iter().zip(combination) {
        let chosen = &list[index].pins;
        for (fp, revision) in &chosen.revisions {
            if merged.pin(fp, revision.clone()) == Pin::Conflict {
                return None;
            }
        }
        for (fp, label) in &chosen.labels {
            merged.labels.entry(fp.clone()).or_insert_with(|| label.clone());
        }
    }
    Some(merged)
}

fn assemble(graph: &MaterialGraph,
            candidates: &[Vec<Candidate>],
            combination: &[usize],
            pins: &Pins,
            tried: usize)
            -> ResolvedGraph {
    let selections = graph.top_level
                          .iter()
                          .zip(candidates.iter().zip(combination))
                          .filter_map(|(fp, (list, &index))| {
                              let node = graph.node(fp)?;
                              Some(ResolvedMaterial { fingerprint: fp.clone(),
                                                      display_name: node.display_name().to_string(),
                                                      kind: node.kind(),
                                                      revision: list[index].revision.clone() })
                          })
                          .collect();

    let roots = graph.roots()
                     .filter_map(|node| {
                         let fp = node.fingerprint();
                         pins.revisions.get(fp).map(|r| (fp.clone(), r.clone()))
                     })
                     .collect();

    let mut dependencies = BTreeMap::new();
    for node in graph.dependencies() {
        let (Some(dep), Some(revision)) = (node.as_dependency(), pins.revisions.get(node.fingerprint())) else {
            continue;
        };
        let counter = revision.pipeline_counter.unwrap_or_default();
        let label = pins.labels
                        .get(node.fingerprint())
                        .cloned()
                        .unwrap_or_else(|| counter.to_string());
        dependencies.insert(node.fingerprint().clone(),
                            ResolvedInstance { pipeline: dep.pipeline.clone(),
                                               stage: dep.stage.clone(),
                                               counter,
                                               label,
                                               revision: revision.clone() });
    }

    let edges = graph.edges
                     .iter()
                     .filter_map(|edge| {
                         let revision = pins.revisions.get(&edge.to)?.clone();
                         let via_counter = match &edge.from {
                             EdgeSource::Target => None,
                             EdgeSource::Dependency(fp) => pins.revisions.get(fp).and_then(|r| r.pipeline_counter),
                         };
                         Some(ResolvedEdge { from: edge.from.clone(),
                                             to: edge.to.clone(),
                                             via_counter,
                                             revision })
                     })
                     .collect();

    ResolvedGraph { target: graph.target.clone(),
                    selections,
                    roots,
                    dependencies,
                    edges,
                    permutations_tried: tried }
}

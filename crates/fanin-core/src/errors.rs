//! Errores del motor de fan-in.
//!
//! Los fallos esperados (configuración inválida, upstream sin construir,
//! espacio de búsqueda agotado o truncado) son datos: el llamador decide si
//! reintenta, reporta o ajusta la configuración. Sólo `HistoryError` proviene
//! de un colaborador externo y se propaga sin enmascarar.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Fingerprint, PipelineName};

/// Errores detectados al construir el grafo a partir de la configuración.
/// No son reintentables sin cambiar la configuración.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum ConfigurationError {
    #[error("cyclic pipeline dependency: {}", display_path(.path))]
    CyclicDependency { path: Vec<PipelineName> },
    #[error("pipeline '{pipeline}' (referenced by '{referenced_by}') is not configured")]
    UnknownPipeline { pipeline: PipelineName, referenced_by: PipelineName },
    #[error("target pipeline '{pipeline}' is not configured")]
    UnknownTarget { pipeline: PipelineName },
    #[error("pipeline '{pipeline}' has no materials")]
    NoMaterials { pipeline: PipelineName },
    #[error("pipeline '{pipeline}' declares material {fingerprint} more than once")]
    DuplicateMaterial { pipeline: PipelineName, fingerprint: Fingerprint },
}

fn display_path(path: &[PipelineName]) -> String {
    path.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(" -> ")
}

/// Qué debería hacer quien programa el pipeline ante un fallo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureAction {
    /// Transitorio: esperar a que el upstream construya.
    RetryLater,
    /// Los historiales no comparten revisión: bloquea el build.
    Unsatisfiable,
    /// Reducir la ventana de historial o subir el límite de combinaciones.
    ReduceHistoryWindow,
}

/// Resultado fallido de una resolución.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum FanInFailure {
    #[error("no compatible upstream revisions after trying {tried} combinations")]
    NoValidCombinationFound { tried: usize },
    #[error("fan-in search space of {space} combinations exceeds the limit of {limit}")]
    SearchSpaceTooLarge { limit: usize, space: u128 },
    #[error("upstream pipeline '{pipeline}' has no instance that passed stage '{stage}'")]
    UpstreamNotYetBuilt { pipeline: PipelineName, stage: String },
    #[error("material '{name}' ({fingerprint}) has no known revisions")]
    MaterialHasNoHistory { fingerprint: Fingerprint, name: String },
}

impl FanInFailure {
    pub fn action(&self) -> FailureAction {
        match self {
            FanInFailure::UpstreamNotYetBuilt { .. } | FanInFailure::MaterialHasNoHistory { .. } => FailureAction::RetryLater,
            FanInFailure::NoValidCombinationFound { .. } => FailureAction::Unsatisfiable,
            FanInFailure::SearchSpaceTooLarge { .. } => FailureAction::ReduceHistoryWindow,
        }
    }
}

/// Error de un `RevisionHistoryProvider` (IO, backend caído...).
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum HistoryError {
    #[error("history backend unavailable: {0}")]
    Unavailable(String),
    #[error("inconsistent history: {0}")]
    Inconsistent(String),
    #[error("internal: {0}")]
    Internal(String),
}

/// Error de `FanInResolver::resolve`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ResolveError {
    #[error(transparent)]
    Failure(#[from] FanInFailure),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Unión usada por `FanInService` (construcción + resolución).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum FanInError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("fan-in failure: {0}")]
    Failure(#[from] FanInFailure),
    #[error("history error: {0}")]
    History(#[from] HistoryError),
}

impl From<ResolveError> for FanInError {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::Failure(f) => FanInError::Failure(f),
            ResolveError::History(h) => FanInError::History(h),
        }
    }
}

use fanin_core::FanInError;
use thiserror::Error;

/// Errores de la aplicación (carga de snapshot + resolución).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Snapshot inconsistente: {0}")]
    Snapshot(String),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error(transparent)]
    FanIn(#[from] FanInError),
}

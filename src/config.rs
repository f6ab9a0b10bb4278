//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
use std::env;
use std::path::PathBuf;

use fanin_core::FanInConfig;
use once_cell::sync::Lazy;

/// Variable con la ruta del snapshot por defecto para `fanin-inspect`.
pub const ENV_SNAPSHOT: &str = "FANIN_SNAPSHOT";

/// Configuración global de la aplicación.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Parámetros del motor de fan-in.
    pub fanin: FanInConfig,
    /// Snapshot (configuración + historial) a cargar si no se pasa `--snapshot`.
    pub snapshot: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        // FanInConfig::from_env ya fuerza la carga de .env
        let fanin = FanInConfig::from_env();
        let snapshot = env::var(ENV_SNAPSHOT).ok()
                                             .filter(|v| !v.trim().is_empty())
                                             .map(PathBuf::from);
        Self { fanin, snapshot }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

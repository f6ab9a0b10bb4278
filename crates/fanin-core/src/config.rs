//! Parámetros del motor desde variables de entorno.
//! Convención `FANIN_*`; valores ausentes o inválidos usan el default.

use std::env;

use dotenvy::dotenv;
use log::warn;
use once_cell::sync::Lazy;

use crate::constants::DEFAULT_MAX_PERMUTATIONS;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const ENV_RESOLVE_REVISIONS: &str = "FANIN_RESOLVE_REVISIONS";
pub const ENV_FALLBACK_ENABLED: &str = "FANIN_FALLBACK_ENABLED";
pub const ENV_MAX_BACKTRACK_LIMIT: &str = "FANIN_MAX_BACKTRACK_LIMIT";
pub const ENV_HISTORY_DEPTH: &str = "FANIN_HISTORY_DEPTH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanInConfig {
    /// Resolver con convergencia. Con `false` se toma lo más reciente.
    pub enabled: bool,
    /// Ante espacio truncado o error del historial, caer a lo más reciente.
    pub fallback_enabled: bool,
    pub max_permutations: usize,
    /// Tope opcional de candidatos por material; `None` = sin tope.
    pub history_depth: Option<usize>,
}

impl Default for FanInConfig {
    fn default() -> Self {
        Self { enabled: true,
               fallback_enabled: true,
               max_permutations: DEFAULT_MAX_PERMUTATIONS,
               history_depth: None }
    }
}

impl FanInConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente arbitraria (tests, archivos).
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        Self { enabled: read(&lookup, ENV_RESOLVE_REVISIONS, defaults.enabled, parse_flag),
               fallback_enabled: read(&lookup, ENV_FALLBACK_ENABLED, defaults.fallback_enabled, parse_flag),
               max_permutations: read(&lookup, ENV_MAX_BACKTRACK_LIMIT, defaults.max_permutations, |v| v.trim().parse().ok()),
               history_depth: read(&lookup, ENV_HISTORY_DEPTH, defaults.history_depth, |v| {
                   v.trim().parse().ok().filter(|d: &usize| *d > 0).map(Some)
               }) }
    }
}

fn read<T, L, P>(lookup: &L, key: &str, default: T, parse: P) -> T
    where L: Fn(&str) -> Option<String>,
          P: Fn(&str) -> Option<T>,
          T: std::fmt::Debug
{
    match lookup(key) {
        None => default,
        Some(raw) => parse(&raw).unwrap_or_else(|| {
                                    warn!("config:ignored key={} value={:?} default={:?}", key, raw, default);
                                    default
                                }),
    }
}

/// `Y`/`N` como en las propiedades de sistema; también `true`/`false`.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_values_use_defaults() {
        assert_eq!(FanInConfig::from_lookup(lookup(&[])), FanInConfig::default());
    }

    #[test]
    fn reads_flags_and_limits() {
        let cfg = FanInConfig::from_lookup(lookup(&[(ENV_RESOLVE_REVISIONS, "N"),
                                                     (ENV_FALLBACK_ENABLED, "n"),
                                                     (ENV_MAX_BACKTRACK_LIMIT, " 250 "),
                                                     (ENV_HISTORY_DEPTH, "4")]));
        assert!(!cfg.enabled);
        assert!(!cfg.fallback_enabled);
        assert_eq!(cfg.max_permutations, 250);
        assert_eq!(cfg.history_depth, Some(4));
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let cfg = FanInConfig::from_lookup(lookup(&[(ENV_RESOLVE_REVISIONS, "maybe"),
                                                     (ENV_MAX_BACKTRACK_LIMIT, "-3"),
                                                     (ENV_HISTORY_DEPTH, "0")]));
        assert_eq!(cfg, FanInConfig::default());
    }
}

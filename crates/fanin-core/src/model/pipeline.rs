//! Nombres y configuración de pipelines tal como los entrega el subsistema de
//! configuración.
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::MaterialConfig;

/// Nombre de pipeline. Igualdad, hash y orden ignoran mayúsculas; se conserva
/// la grafía configurada para mostrarla.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineName(String);

impl PipelineName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Forma normalizada usada para comparar.
    pub fn to_lower(&self) -> String {
        self.0.to_lowercase()
    }
}

impl PartialEq for PipelineName {
    fn eq(&self, other: &Self) -> bool {
        self.to_lower() == other.to_lower()
    }
}

impl Eq for PipelineName {}

impl Hash for PipelineName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_lower().hash(state);
    }
}

impl PartialOrd for PipelineName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PipelineName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_lower().cmp(&other.to_lower())
    }
}

impl fmt::Display for PipelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PipelineName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PipelineName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Configuración de un pipeline: nombre + materiales en orden de declaración.
/// El orden importa: es el criterio de desempate del resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: PipelineName,
    pub materials: Vec<MaterialConfig>,
}

impl PipelineConfig {
    pub fn new(name: impl Into<PipelineName>, materials: Vec<MaterialConfig>) -> Self {
        Self { name: name.into(),
               materials }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn names_compare_ignoring_case() {
        assert_eq!(PipelineName::new("Build-Linux"), PipelineName::new("build-linux"));
        let set: BTreeSet<PipelineName> = ["Up", "up", "UP"].into_iter().map(PipelineName::from).collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_keeps_configured_spelling() {
        assert_eq!(PipelineName::new("Deploy-Prod").to_string(), "Deploy-Prod");
    }
}

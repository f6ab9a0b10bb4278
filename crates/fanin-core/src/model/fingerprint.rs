use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identidad estable de un material: hash hex (blake3) de sus atributos de
/// identidad canonicalizados. Dos nodos con el mismo fingerprint son el mismo
/// material físico aunque se alcancen por caminos distintos.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Envuelve un fingerprint ya calculado (p.ej. leído del historial).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefijo corto para logs (hasta 12 caracteres).
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insumos para calcular el fingerprint de un material.
/// NO es el fingerprint final sino el modelo previo a canonicalizar.
#[derive(Serialize)]
pub struct MaterialFingerprintInput<'a> {
    pub fingerprint_version: &'a str,
    #[serde(rename = "type")]
    pub material_type: &'a str,
    pub identity: Value, // sólo atributos de identidad (sin name/folder/ignore)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_prefix_respects_char_boundaries() {
        assert_eq!(Fingerprint::new("0123456789abcdef").short(), "0123456789ab");
        assert_eq!(Fingerprint::new("abc").short(), "abc");
        // 11 bytes ASCII + 'ñ' (2 bytes): el byte 12 cae dentro del carácter.
        assert_eq!(Fingerprint::new("0123456789añbcd").short(), "0123456789añ");
    }
}

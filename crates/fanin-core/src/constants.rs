//! Constantes del motor de fan-in.
//!
//! `FINGERPRINT_VERSION` forma parte del input del hashing de materiales: un
//! cambio invalida todos los fingerprints calculados previamente.

/// Versión lógica del esquema de fingerprint de materiales.
pub const FINGERPRINT_VERSION: &str = "FI1";

/// Límite por defecto de combinaciones evaluadas por resolución
/// (equivalente a `resolve.fanin.max.backtrack.limit`).
pub const DEFAULT_MAX_PERMUTATIONS: usize = 100;

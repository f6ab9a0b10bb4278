//! Modelos neutrales del motor (Material, Fingerprint, Pipeline, Revision).
//!
//! Todo lo que vive aquí es dato inmutable provisto por el subsistema de
//! configuración o por el historial; el motor nunca lo persiste.

pub mod fingerprint;
pub mod material;
pub mod pipeline;
pub mod revision;

pub use fingerprint::{Fingerprint, MaterialFingerprintInput};
pub use material::{DependencyMaterial, MaterialConfig, MaterialKind, PackageMaterial, PluggableScmMaterial, ScmKind, ScmMaterial};
pub use pipeline::{PipelineConfig, PipelineName};
pub use revision::{CandidateRevision, PipelineInstance};

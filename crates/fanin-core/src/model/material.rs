//! Configuración de materiales.
//!
//! Un material es una fuente de revisiones para un pipeline:
//! - Materiales raíz (`Scm`, `Package`, `PluggableScm`): no tienen
//!   dependencias aguas arriba.
//! - `Dependency`: referencia a un stage de otro pipeline; sus "revisiones"
//!   son instancias de ese pipeline.
//!
//! Los atributos `name`, `folder` e `ignore` son de presentación/checkout y
//! NO entran al fingerprint: el mismo repositorio clonado en carpetas
//! distintas sigue siendo un único material.
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Fingerprint, MaterialFingerprintInput, PipelineName};
use crate::constants::FINGERPRINT_VERSION;
use crate::hashing::hash_value;

/// Distinción de dos casos que necesita el resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Root,
    Dependency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScmKind {
    Git,
    Mercurial,
    Subversion,
    Perforce,
    Tfs,
}

impl ScmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScmKind::Git => "git",
            ScmKind::Mercurial => "hg",
            ScmKind::Subversion => "svn",
            ScmKind::Perforce => "p4",
            ScmKind::Tfs => "tfs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmMaterial {
    pub scm: ScmKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMaterial {
    pub repository_id: String,
    pub package_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluggableScmMaterial {
    pub scm_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

/// Dependencia sobre un stage de un pipeline aguas arriba.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyMaterial {
    pub pipeline: PipelineName,
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DependencyMaterial {
    pub fn new(pipeline: impl Into<PipelineName>, stage: impl Into<String>) -> Self {
        Self { pipeline: pipeline.into(),
               stage: stage.into(),
               name: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialConfig {
    Scm(ScmMaterial),
    Package(PackageMaterial),
    PluggableScm(PluggableScmMaterial),
    Dependency(DependencyMaterial),
}

impl From<DependencyMaterial> for MaterialConfig {
    fn from(value: DependencyMaterial) -> Self {
        MaterialConfig::Dependency(value)
    }
}

impl MaterialConfig {
    pub fn scm(scm: ScmKind, url: impl Into<String>) -> Self {
        MaterialConfig::Scm(ScmMaterial { scm,
                                          url: url.into(),
                                          branch: None,
                                          name: None,
                                          folder: None,
                                          ignore: vec![] })
    }

    pub fn git(url: impl Into<String>) -> Self {
        Self::scm(ScmKind::Git, url)
    }

    pub fn hg(url: impl Into<String>) -> Self {
        Self::scm(ScmKind::Mercurial, url)
    }

    pub fn svn(url: impl Into<String>) -> Self {
        Self::scm(ScmKind::Subversion, url)
    }

    pub fn package(repository_id: impl Into<String>, package_id: impl Into<String>) -> Self {
        MaterialConfig::Package(PackageMaterial { repository_id: repository_id.into(),
                                                  package_id: package_id.into(),
                                                  name: None })
    }

    pub fn pluggable_scm(scm_id: impl Into<String>) -> Self {
        MaterialConfig::PluggableScm(PluggableScmMaterial { scm_id: scm_id.into(),
                                                            name: None,
                                                            folder: None })
    }

    pub fn dependency(pipeline: impl Into<PipelineName>, stage: impl Into<String>) -> Self {
        MaterialConfig::Dependency(DependencyMaterial::new(pipeline, stage))
    }

    /// Fija la rama (sólo materiales SCM; en otros tipos no tiene efecto).
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        if let MaterialConfig::Scm(m) = &mut self {
            m.branch = Some(branch.into());
        }
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = Some(name.into());
        match &mut self {
            MaterialConfig::Scm(m) => m.name = name,
            MaterialConfig::Package(m) => m.name = name,
            MaterialConfig::PluggableScm(m) => m.name = name,
            MaterialConfig::Dependency(m) => m.name = name,
        }
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        match &mut self {
            MaterialConfig::Scm(m) => m.folder = Some(folder.into()),
            MaterialConfig::PluggableScm(m) => m.folder = Some(folder.into()),
            _ => {}
        }
        self
    }

    pub fn kind(&self) -> MaterialKind {
        match self {
            MaterialConfig::Dependency(_) => MaterialKind::Dependency,
            _ => MaterialKind::Root,
        }
    }

    pub fn as_dependency(&self) -> Option<&DependencyMaterial> {
        match self {
            MaterialConfig::Dependency(d) => Some(d),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            MaterialConfig::Scm(m) => m.scm.as_str(),
            MaterialConfig::Package(_) => "package",
            MaterialConfig::PluggableScm(_) => "plugin",
            MaterialConfig::Dependency(_) => "dependency",
        }
    }

    /// Nombre para mostrar: el nombre configurado o, en su defecto, el
    /// atributo que identifica al material.
    pub fn display_name(&self) -> String {
        match self {
            MaterialConfig::Scm(m) => m.name.clone().unwrap_or_else(|| m.url.clone()),
            MaterialConfig::Package(m) => m.name.clone().unwrap_or_else(|| format!("{}:{}", m.repository_id, m.package_id)),
            MaterialConfig::PluggableScm(m) => m.name.clone().unwrap_or_else(|| m.scm_id.clone()),
            MaterialConfig::Dependency(m) => m.name.clone().unwrap_or_else(|| m.pipeline.to_string()),
        }
    }

    pub fn fingerprint_input(&self) -> MaterialFingerprintInput<'static> {
        let identity = match self {
            MaterialConfig::Scm(m) => json!({ "url": m.url, "branch": m.branch }),
            MaterialConfig::Package(m) => json!({ "repository_id": m.repository_id, "package_id": m.package_id }),
            MaterialConfig::PluggableScm(m) => json!({ "scm_id": m.scm_id }),
            MaterialConfig::Dependency(m) => json!({ "pipeline": m.pipeline.to_lower(), "stage": m.stage.to_lowercase() }),
        };
        MaterialFingerprintInput { fingerprint_version: FINGERPRINT_VERSION,
                                   material_type: self.type_name(),
                                   identity }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let input = self.fingerprint_input();
        let value = json!({
            "fingerprint_version": input.fingerprint_version,
            "type": input.material_type,
            "identity": input.identity,
        });
        Fingerprint::new(hash_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_and_name_do_not_change_fingerprint() {
        let a = MaterialConfig::git("https://example.com/repo.git").with_folder("folder1");
        let b = MaterialConfig::git("https://example.com/repo.git").with_folder("folder2").with_name("app");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn branch_and_type_change_fingerprint() {
        let main = MaterialConfig::git("repo").with_branch("main");
        let dev = MaterialConfig::git("repo").with_branch("dev");
        assert_ne!(main.fingerprint(), dev.fingerprint());
        assert_ne!(MaterialConfig::git("repo").fingerprint(), MaterialConfig::hg("repo").fingerprint());
    }

    #[test]
    fn dependency_fingerprint_ignores_case_but_not_stage() {
        let a = MaterialConfig::dependency("Upstream", "Build");
        let b = MaterialConfig::dependency("upstream", "build");
        let c = MaterialConfig::dependency("upstream", "test");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.kind(), MaterialKind::Dependency);
    }

    #[test]
    fn fingerprint_is_64_hex_chars() {
        let fp = MaterialConfig::package("repo-1", "pkg-1").fingerprint();
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn material_config_json_is_tagged() {
        let m: MaterialConfig = serde_json::from_str(r#"{"type":"scm","scm":"git","url":"repo","folder":"src"}"#).expect("valid json");
        assert_eq!(m.kind(), MaterialKind::Root);
        assert_eq!(m.display_name(), "repo");
        let d: MaterialConfig = serde_json::from_str(r#"{"type":"dependency","pipeline":"up","stage":"dist"}"#).expect("valid json");
        assert_eq!(d.as_dependency().map(|d| d.stage.as_str()), Some("dist"));
    }
}

//! Profile table and run configuration.
//!
//! `profiles.toml` maps a profile name to a target system, its fact
//! sources, its shapes source and an optional ablation table:
//!
//! ```toml
//! [profiles.sentinel]
//! system = ":Sentinel_ID_System"
//! sources = ["ontology/arco_core.ttl", "ontology/instances_sentinel.ttl"]
//! shapes = "ontology/shapes/assessment_documentation_shape.ttl"
//!
//! [[profiles.sentinel.ablation]]
//! gate = "capability"
//! subject = ":Sentinel_FaceID_Module"
//! predicate = "ro:0000091"
//! object = ":Sentinel_FaceID_Disposition"
//! ```
//!
//! Relative paths resolve against the directory of the profile file.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::closure::Strictness;
use crate::error::{EngineError, Result, SourceKind};
use crate::gate::Gate;
use crate::graph::store::FactSource;
use crate::graph::{Term, Triple};
use crate::vocab;

/// Default cap on evidence bindings carried in the record.
pub const DEFAULT_EVIDENCE_CAP: usize = 20;
/// Default cap on proof-neighborhood edges carried in the record.
pub const DEFAULT_NEIGHBORHOOD_CAP: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileFile {
    #[serde(default)]
    profiles: BTreeMap<String, RawProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProfile {
    system: String,
    sources: Vec<PathBuf>,
    shapes: PathBuf,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    ablation: Vec<AblationFact>,
}

/// One designated ablation fact, as CURIEs or IRIs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AblationFact {
    /// Gate the fact backs.
    pub gate: Gate,
    /// Subject.
    pub subject: String,
    /// Predicate.
    pub predicate: String,
    /// Object.
    pub object: String,
}

impl AblationFact {
    /// The fact as a triple with expanded IRIs.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] on an unknown prefix.
    pub fn triple(&self) -> Result<Triple> {
        Ok(Triple::new(
            Term::iri(vocab::expand_curie(&self.subject)?),
            Term::iri(vocab::expand_curie(&self.predicate)?),
            Term::iri(vocab::expand_curie(&self.object)?),
        ))
    }
}

/// A resolved profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Profile name.
    pub name: String,
    /// Target system IRI, expanded.
    pub system: String,
    /// Fact source paths, resolved.
    pub sources: Vec<PathBuf>,
    /// Shapes source path, resolved.
    pub shapes: PathBuf,
    /// Display label.
    pub label: Option<String>,
    /// Ablation table, one fact per gate.
    pub ablation: Vec<AblationFact>,
}

/// All profiles of one profile file.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileSet {
    /// Reads and resolves a profile file.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingSource`] if the file does not exist,
    /// [`EngineError::Config`] if it is not a valid profile table.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                EngineError::MissingSource {
                    kind: SourceKind::Profiles,
                    path: path.to_path_buf(),
                }
            } else {
                EngineError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&text, base).map_err(|e| match e {
            EngineError::Config(msg) => EngineError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parses a profile table, resolving relative paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] on malformed TOML, unknown fields, unknown
    /// CURIE prefixes or a duplicated ablation gate.
    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self> {
        let file: ProfileFile =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { base_dir.join(p) };
        let mut profiles = BTreeMap::new();
        for (name, raw) in file.profiles {
            let mut gates: Vec<Gate> = raw.ablation.iter().map(|f| f.gate).collect();
            gates.sort();
            if gates.windows(2).any(|w| w[0] == w[1]) {
                return Err(EngineError::Config(format!(
                    "profile `{name}` designates more than one ablation fact for a gate"
                )));
            }
            for fact in &raw.ablation {
                fact.triple()?;
            }
            let profile = Profile {
                system: vocab::expand_curie(&raw.system)?,
                sources: raw.sources.into_iter().map(resolve).collect(),
                shapes: resolve(raw.shapes),
                label: raw.label,
                ablation: raw.ablation,
                name: name.clone(),
            };
            profiles.insert(name, profile);
        }
        Ok(Self { profiles })
    }

    /// Looks up a profile.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] naming the known profiles.
    pub fn get(&self, name: &str) -> Result<&Profile> {
        self.profiles.get(name).ok_or_else(|| {
            EngineError::Config(format!(
                "unknown profile `{name}` (known: {})",
                self.names().join(", ")
            ))
        })
    }

    /// Profile names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}

/// The explicit configuration of one determination run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Profile the run was derived from.
    pub profile: Option<String>,
    /// Target system IRI.
    pub system: String,
    /// Fact sources.
    pub sources: Vec<FactSource>,
    /// Shapes source.
    pub shapes: FactSource,
    /// Closure strictness.
    pub strictness: Strictness,
    /// Cap on evidence bindings.
    pub evidence_cap: usize,
    /// Cap on proof-neighborhood edges.
    pub neighborhood_cap: usize,
    /// Run timestamp, RFC 3339.
    pub timestamp: String,
    /// Optional source revision.
    pub source_revision: Option<String>,
}

impl RunConfig {
    /// A configuration with default caps and strict closure.
    pub fn new(
        system: impl Into<String>,
        sources: Vec<FactSource>,
        shapes: FactSource,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            profile: None,
            system: system.into(),
            sources,
            shapes,
            strictness: Strictness::default(),
            evidence_cap: DEFAULT_EVIDENCE_CAP,
            neighborhood_cap: DEFAULT_NEIGHBORHOOD_CAP,
            timestamp: timestamp.into(),
            source_revision: None,
        }
    }

    /// A configuration taken from a profile.
    pub fn from_profile(profile: &Profile, timestamp: impl Into<String>) -> Self {
        let mut config = Self::new(
            profile.system.clone(),
            profile.sources.iter().cloned().map(FactSource::File).collect(),
            FactSource::File(profile.shapes.clone()),
            timestamp,
        );
        config.profile = Some(profile.name.clone());
        config
    }

    /// Overrides the target system; accepts a CURIE.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] on an unknown prefix.
    pub fn with_system(mut self, system: &str) -> Result<Self> {
        self.system = vocab::expand_curie(system)?;
        Ok(self)
    }

    /// Sets the closure strictness.
    #[must_use]
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Sets the evidence cap.
    #[must_use]
    pub fn with_evidence_cap(mut self, cap: usize) -> Self {
        self.evidence_cap = cap;
        self
    }

    /// Sets the source revision.
    #[must_use]
    pub fn with_source_revision(mut self, revision: Option<String>) -> Self {
        self.source_revision = revision;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
[profiles.demo]
system = ":Demo_System"
sources = ["a.ttl", "/abs/b.ttl"]
shapes = "shapes.ttl"
label = "Demo"

[[profiles.demo.ablation]]
gate = "capability"
subject = ":C"
predicate = "ro:0000091"
object = ":D"
"#;

    #[test]
    fn profiles_resolve_paths_and_curies() {
        let set = ProfileSet::from_toml_str(TABLE, Path::new("/base")).unwrap();
        let demo = set.get("demo").unwrap();
        assert_eq!(demo.system, "https://arco.ai/ontology/core#Demo_System");
        assert_eq!(
            demo.sources,
            vec![PathBuf::from("/base/a.ttl"), PathBuf::from("/abs/b.ttl")]
        );
        assert_eq!(demo.shapes, PathBuf::from("/base/shapes.ttl"));
        assert_eq!(demo.ablation[0].gate, Gate::Capability);
        assert_eq!(
            demo.ablation[0].triple().unwrap().predicate,
            Term::iri(vocab::HAS_DISPOSITION)
        );
        assert_eq!(set.names(), vec!["demo"]);
    }

    #[test]
    fn unknown_profile_lists_known_ones() {
        let set = ProfileSet::from_toml_str(TABLE, Path::new(".")).unwrap();
        let err = set.get("other").unwrap_err().to_string();
        assert!(err.contains("known: demo"), "{err}");
    }

    #[test]
    fn bad_tables_are_config_errors() {
        for bad in [
            "[profiles.x]\nsystem = \":S\"\n",
            "[profiles.x]\nsystem = \"zz:S\"\nsources = []\nshapes = \"s.ttl\"\n",
            "[profiles.x]\nsystem = \":S\"\nsources = []\nshapes = \"s.ttl\"\ncolour = 1\n",
            "[profiles.x]\nsystem = \":S\"\nsources = []\nshapes = \"s.ttl\"\n\
             [[profiles.x.ablation]]\ngate = \"capability\"\nsubject = \":a\"\npredicate = \":p\"\nobject = \":b\"\n\
             [[profiles.x.ablation]]\ngate = \"capability\"\nsubject = \":c\"\npredicate = \":p\"\nobject = \":d\"\n",
        ] {
            assert!(
                matches!(ProfileSet::from_toml_str(bad, Path::new(".")), Err(EngineError::Config(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn missing_profile_file_is_a_missing_source() {
        let err = ProfileSet::load(Path::new("/no/such/profiles.toml")).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MissingSource { kind: SourceKind::Profiles, .. }
        ));
    }

    #[test]
    fn run_config_from_profile() {
        let set = ProfileSet::from_toml_str(TABLE, Path::new("/base")).unwrap();
        let config = RunConfig::from_profile(set.get("demo").unwrap(), "2026-01-01T00:00:00Z")
            .with_system("iao:0000136")
            .unwrap();
        assert_eq!(config.profile.as_deref(), Some("demo"));
        assert_eq!(config.system, vocab::IS_ABOUT);
        assert_eq!(config.evidence_cap, DEFAULT_EVIDENCE_CAP);
        assert_eq!(config.shapes, FactSource::file("/base/shapes.ttl"));
    }
}

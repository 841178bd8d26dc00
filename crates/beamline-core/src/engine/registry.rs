use super::algorithm::Algorithm;
use super::error::EngineError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Version argument meaning "the highest registered version".
pub const LATEST_VERSION: i32 = -1;

type AlgorithmConstructor = Box<dyn Fn() -> Box<dyn Algorithm> + Send + Sync>;

/// One registered algorithm, as shown by front-end listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    pub name: String,
    pub version: i32,
    pub category: String,
    pub summary: String,
}

/// Dynamic-dispatch registry of algorithm constructors keyed by name and
/// version.
///
/// Versions for one name live in a [`BTreeMap`] so "latest" is simply the
/// last key; registration of an already-taken (name, version) pair is an
/// error while a new version of an existing name is routine.
pub struct AlgorithmRegistry {
    entries: RwLock<HashMap<String, BTreeMap<i32, AlgorithmConstructor>>>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kernel type, reading its name and version from a default
    /// instance.
    pub fn register<A>(&self) -> Result<(), EngineError>
    where
        A: Algorithm + Default + 'static,
    {
        let probe = A::default();
        let name = probe.name().to_string();
        let version = probe.version();
        self.register_constructor(
            &name,
            version,
            Box::new(|| Box::new(A::default()) as Box<dyn Algorithm>),
        )
    }

    /// Registers an explicit constructor closure for (name, version).
    pub fn register_constructor(
        &self,
        name: &str,
        version: i32,
        constructor: AlgorithmConstructor,
    ) -> Result<(), EngineError> {
        if version < 1 {
            return Err(EngineError::Internal(format!(
                "algorithm versions start at 1, got {version} for '{name}'"
            )));
        }
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let versions = entries.entry(name.to_string()).or_default();
        if versions.contains_key(&version) {
            return Err(EngineError::DuplicateRegistration {
                name: name.to_string(),
                version,
            });
        }
        versions.insert(version, constructor);
        debug!(algorithm = name, version, "Registered algorithm.");
        Ok(())
    }

    /// Builds a fresh, uninitialized kernel instance.
    ///
    /// `LATEST_VERSION` (-1) resolves to the numerically highest registered
    /// version; an explicit version must match exactly.
    pub fn create(&self, name: &str, version: i32) -> Result<Box<dyn Algorithm>, EngineError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let versions = entries
            .get(name)
            .ok_or_else(|| EngineError::AlgorithmNotFound {
                name: name.to_string(),
            })?;
        let constructor = if version == LATEST_VERSION {
            versions.last_key_value().map(|(_, c)| c)
        } else {
            versions.get(&version)
        };
        let constructor = constructor.ok_or_else(|| EngineError::VersionNotFound {
            name: name.to_string(),
            version,
        })?;
        Ok(constructor())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn versions(&self, name: &str) -> Vec<i32> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|versions| versions.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn highest_version(&self, name: &str) -> Option<i32> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|versions| versions.keys().next_back().copied())
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Descriptors for every (name, version), sorted by name then version.
    /// Builds a throwaway instance per entry to read its metadata.
    pub fn descriptors(&self) -> Vec<AlgorithmDescriptor> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut descriptors: Vec<AlgorithmDescriptor> = entries
            .iter()
            .flat_map(|(name, versions)| {
                versions.iter().map(move |(version, constructor)| {
                    let instance = constructor();
                    AlgorithmDescriptor {
                        name: name.clone(),
                        version: *version,
                        category: instance.category().to_string(),
                        summary: instance.summary().to_string(),
                    }
                })
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name).then(a.version.cmp(&b.version)));
        descriptors
    }
}

impl std::fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("names", &self.names())
            .finish()
    }
}

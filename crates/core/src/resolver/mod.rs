//! Module resolution
//!
//! Maps dotted names such as `builtin.sample` or `ldap.groups.members` to a
//! [`ModuleDescriptor`]. The `builtin` namespace is served by the in-process
//! [`BuiltinCatalogue`]; every other namespace is a directory named after it
//! under one of the configured search roots, holding one TOML manifest per
//! module.

pub mod builtin;
pub mod external;
pub mod manifest;

pub use builtin::BuiltinCatalogue;
pub use external::ExternalModuleType;
pub use manifest::{FieldManifest, ModuleManifest, UnitManifest};

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::interfaces::ModuleType;
use crate::schema::Schema;

/// Namespace served by the builtin catalogue
pub const BUILTIN_NAMESPACE: &str = "builtin";

const MANIFEST_EXTENSION: &str = "toml";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    Builtin,
    External(String),
}

impl Namespace {
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin => BUILTIN_NAMESPACE,
            Self::External(name) => name,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved identity of a module
#[derive(Clone)]
pub struct ModuleDescriptor {
    /// Fully qualified dotted name
    pub name: String,
    pub namespace: Namespace,
    pub module_type: Arc<dyn ModuleType>,
    pub schema: Arc<Schema>,
    pub help: String,
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("schema", &self.schema)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

impl ModuleDescriptor {
    /// Name without the namespace prefix
    pub fn subpath(&self) -> &str {
        self.name
            .split_once('.')
            .map_or(self.name.as_str(), |(_, rest)| rest)
    }
}

/// Finds modules by dotted name. Read-only once built.
#[derive(Debug, Clone)]
pub struct Resolver {
    builtins: BuiltinCatalogue,
    search_paths: Vec<PathBuf>,
}

impl Resolver {
    /// Every search path must be an existing directory
    pub fn new(builtins: BuiltinCatalogue, search_paths: Vec<PathBuf>) -> Result<Self> {
        for path in &search_paths {
            if !path.is_dir() {
                return Err(Error::Configuration(format!(
                    "module search path {} does not exist or is not a directory",
                    path.display()
                )));
            }
        }
        debug!(?search_paths, builtins = builtins.len(), "resolver ready");
        Ok(Self {
            builtins,
            search_paths,
        })
    }

    /// Standard builtins plus the configured search paths
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            BuiltinCatalogue::standard()?,
            config.toolbox.module_search_paths.clone(),
        )
    }

    pub fn builtins(&self) -> &BuiltinCatalogue {
        &self.builtins
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// True for `builtin` and for any namespace directory present under a search root
    pub fn is_namespace(&self, namespace: &str) -> bool {
        namespace == BUILTIN_NAMESPACE || !self.namespace_dirs(namespace).is_empty()
    }

    pub fn resolve(&self, dotted: &str) -> Result<ModuleDescriptor> {
        let Some((namespace, subpath)) = dotted.split_once('.') else {
            return Err(Error::not_found(dotted, "expected <namespace>.<module>"));
        };

        if namespace == BUILTIN_NAMESPACE {
            return self.resolve_builtin(dotted, subpath);
        }

        let dirs = self.namespace_dirs(namespace);
        if dirs.is_empty() {
            return Err(Error::not_found(
                dotted,
                format!("unknown namespace '{namespace}'"),
            ));
        }
        resolve_external(dotted, namespace, subpath, &dirs)
    }

    /// Dotted names of every module under `namespace` that resolves.
    ///
    /// Walks the backing storage again on every call. Units that fail to
    /// resolve are logged and skipped.
    pub fn enumerate(&self, namespace: &str) -> Result<Box<dyn Iterator<Item = String> + '_>> {
        if namespace == BUILTIN_NAMESPACE {
            return Ok(Box::new(
                self.builtins
                    .paths()
                    .map(|path| format!("{BUILTIN_NAMESPACE}.{path}")),
            ));
        }

        let dirs = self.namespace_dirs(namespace);
        if dirs.is_empty() {
            return Err(Error::not_found(
                namespace,
                format!("unknown namespace '{namespace}'"),
            ));
        }

        let prefix = namespace.to_string();
        let mut seen = HashSet::new();
        let names = dirs
            .into_iter()
            .flat_map(move |dir| unit_names(dir, prefix.clone()))
            .filter(move |name| seen.insert(name.clone()))
            .filter(move |name| match self.resolve(name) {
                Ok(_) => true,
                Err(e) => {
                    warn!(module = %name, error = %e, "skipping unit that does not resolve");
                    false
                }
            });
        Ok(Box::new(names))
    }

    fn resolve_builtin(&self, dotted: &str, subpath: &str) -> Result<ModuleDescriptor> {
        let (module_type, schema) = self
            .builtins
            .get(subpath)
            .ok_or_else(|| Error::not_found(dotted, format!("no builtin module '{subpath}'")))?;
        debug!(module = %dotted, "resolved builtin module");
        Ok(ModuleDescriptor {
            name: dotted.to_string(),
            namespace: Namespace::Builtin,
            help: module_type.help().to_string(),
            module_type,
            schema,
        })
    }

    /// `<root>/<namespace>` for every root that has it, in search order
    fn namespace_dirs(&self, namespace: &str) -> Vec<PathBuf> {
        if !is_valid_segment(namespace) {
            return Vec::new();
        }
        self.search_paths
            .iter()
            .map(|root| root.join(namespace))
            .filter(|dir| dir.is_dir())
            .collect()
    }
}

fn resolve_external(
    dotted: &str,
    namespace: &str,
    subpath: &str,
    dirs: &[PathBuf],
) -> Result<ModuleDescriptor> {
    if !subpath.split('.').all(is_valid_segment) {
        return Err(Error::not_found(dotted, "invalid module path"));
    }

    let relative: PathBuf = subpath.split('.').collect();
    let relative = relative.with_extension(MANIFEST_EXTENSION);
    let manifest_path = dirs
        .iter()
        .map(|dir| dir.join(&relative))
        .find(|path| path.is_file())
        .ok_or_else(|| Error::not_found(dotted, "no such module"))?;

    let module = UnitManifest::load(&manifest_path)
        .and_then(UnitManifest::into_module)
        .map_err(|reason| Error::not_found(dotted, format!("{}: {reason}", manifest_path.display())))?;

    let base_dir = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let module_type = ExternalModuleType::new(dotted, module, base_dir);
    let schema = module_type
        .schema()
        .map_err(|e| Error::not_found(dotted, format!("invalid schema: {e}")))?;

    debug!(module = %dotted, path = %manifest_path.display(), "resolved external module");
    Ok(ModuleDescriptor {
        name: dotted.to_string(),
        namespace: Namespace::External(namespace.to_string()),
        help: module_type.help().to_string(),
        module_type: Arc::new(module_type),
        schema: Arc::new(schema),
    })
}

/// Dotted names of the manifest files below `dir`, in file-name order
fn unit_names(dir: PathBuf, namespace: String) -> impl Iterator<Item = String> {
    let walker = WalkDir::new(&dir).sort_by_file_name();
    walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "failed to read namespace directory entry");
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension() == Some(OsStr::new(MANIFEST_EXTENSION))
        })
        .filter_map(move |entry| {
            let name = unit_name(&dir, entry.path());
            if name.is_none() {
                debug!(path = %entry.path().display(), "ignoring file with an unaddressable name");
            }
            name.map(|name| format!("{namespace}.{name}"))
        })
}

fn unit_name(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?.with_extension("");
    let segments = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    segments
        .iter()
        .all(|s| is_valid_segment(s))
        .then(|| segments.join("."))
}

/// Non-empty and made of `[A-Za-z0-9_-]`
pub(crate) fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

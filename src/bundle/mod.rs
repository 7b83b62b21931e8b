//! Static-module bundling: dependency-graph building and loader emission.
//!
//! A [`GraphBuilder`] reads an entry module, extracts its dependency
//! specifiers through a [`Transform`], and walks the dependency graph
//! breadth-first, assigning each module a sequential integer id and
//! recording a specifier-to-id mapping per module. [`bundle`] then concatenates
//! the transformed module bodies into a single self-executing runtime
//! loader.
//!
//! The id counter is owned by the builder instance, so ids stay sequential
//! across multiple builds from the same builder and independent builders
//! never interfere.

mod transform;

pub use transform::{LineScanner, Parsed, Transform};

use crate::error::BundleError;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// One module in a dependency graph.
#[derive(Debug, Clone)]
pub struct Module {
    /// Sequential id assigned at discovery time.
    pub id: usize,

    /// Canonical path of the source file.
    pub path: PathBuf,

    /// Dependency specifiers exactly as written in the source.
    pub dependencies: Vec<String>,

    /// Transformed module body.
    pub code: String,

    /// Specifier-to-id mapping for this module's dependencies.
    pub mapping: BTreeMap<String, usize>,
}

/// Builds module graphs by breadth-first traversal from an entry file.
pub struct GraphBuilder<T = LineScanner> {
    transform: T,
    next_id: usize,
}

impl GraphBuilder<LineScanner> {
    /// Creates a builder using the default [`LineScanner`] transform.
    pub fn new() -> Self {
        Self::with_transform(LineScanner)
    }
}

impl Default for GraphBuilder<LineScanner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transform> GraphBuilder<T> {
    /// Creates a builder driving the given transformer.
    pub fn with_transform(transform: T) -> Self {
        Self {
            transform,
            next_id: 0,
        }
    }

    /// Walks the graph reachable from `entry`, breadth-first.
    ///
    /// The entry module comes first and every dependency is resolved
    /// relative to its parent module's directory. A module reached through
    /// several paths keeps the id of its first discovery, so diamonds share
    /// one module and cycles terminate.
    pub fn build(&mut self, entry: impl AsRef<Path>) -> Result<Vec<Module>, BundleError> {
        let entry = canonicalize(entry.as_ref())?;

        let mut graph = vec![self.load(&entry)?];
        let mut visited: BTreeMap<PathBuf, usize> = BTreeMap::new();
        visited.insert(entry, graph[0].id);

        let mut cursor = 0;
        while cursor < graph.len() {
            let parent_dir = graph[cursor]
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let specifiers = graph[cursor].dependencies.clone();

            for specifier in specifiers {
                let child = canonicalize(&parent_dir.join(&specifier))?;

                let id = match visited.get(&child) {
                    Some(&id) => id,
                    None => {
                        let module = self.load(&child)?;
                        let id = module.id;

                        visited.insert(child, id);
                        graph.push(module);
                        id
                    }
                };

                graph[cursor].mapping.insert(specifier, id);
            }

            cursor += 1;
        }

        Ok(graph)
    }

    /// Reads and transforms one module, assigning it the next id.
    fn load(&mut self, path: &Path) -> Result<Module, BundleError> {
        let source = fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = self
            .transform
            .transform(&source)
            .map_err(|message| BundleError::Parse {
                path: path.to_path_buf(),
                message,
            })?;

        let id = self.next_id;
        self.next_id += 1;

        debug!(id, path = %path.display(), "module discovered");

        Ok(Module {
            id,
            path: path.to_path_buf(),
            dependencies: parsed.dependencies,
            code: parsed.code,
            mapping: BTreeMap::new(),
        })
    }
}

/// Concatenates a module graph into a single self-executing runtime loader.
///
/// Each module body is wrapped in a scoped function alongside its serialized
/// mapping table; a local `require(id)` resolves specifiers through the
/// mapping, starting at the graph's entry module.
pub fn bundle(graph: &[Module]) -> Result<String, BundleError> {
    let mut modules = String::new();

    for module in graph {
        let mapping = serde_json::to_string(&module.mapping)?;

        let _ = write!(
            modules,
            "{}: [\nfunction (require, module, exports) {{\n{}\n}},\n{},\n],\n",
            module.id, module.code, mapping,
        );
    }

    let entry = graph.first().map(|module| module.id).unwrap_or(0);

    Ok(format!(
        "(function(modules) {{\n\
         \x20 function require(id) {{\n\
         \x20   const [body, mapping] = modules[id];\n\
         \x20   function localRequire(specifier) {{\n\
         \x20     return require(mapping[specifier]);\n\
         \x20   }}\n\
         \x20   const module = {{ exports: {{}} }};\n\
         \x20   body(localRequire, module, module.exports);\n\
         \x20   return module.exports;\n\
         \x20 }}\n\
         \x20 require({entry});\n\
         }})({{{modules}}})\n",
    ))
}

/// Emits the loader for `graph` to `out`, creating the parent directory when
/// missing.
pub fn write_bundle(graph: &[Module], out: impl AsRef<Path>) -> Result<(), BundleError> {
    let out = out.as_ref();
    let loader = bundle(graph)?;

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| BundleError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    fs::write(out, loader).map_err(|source| BundleError::Io {
        path: out.to_path_buf(),
        source,
    })
}

fn canonicalize(path: &Path) -> Result<PathBuf, BundleError> {
    fs::canonicalize(path).map_err(|source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// File: src/module.rs
//
// Module resolution and caching for `use` statements.
//
// A module is either a built-in extension activated by name or a
// `<name>.dmo.json` AST file found on the search paths. The loader only
// resolves, reads and bookkeeps; the interpreter evaluates a module's program
// in the frame that executed the `use`.

use crate::ast::{program_from_json, Node};
use crate::errors::{DmoError, ErrorKind, SourceLocation};
use ahash::AHashMap;
use std::fs;
use std::path::PathBuf;

/// File suffix of a serialized module program
pub const MODULE_EXTENSION: &str = "dmo.json";

/// Where a loaded module came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSource {
    Extension,
    File(PathBuf),
}

/// Manages module loading, caching, and resolution
#[derive(Debug)]
pub struct ModuleLoader {
    /// Modules already loaded; loading them again is a no-op
    loaded_modules: AHashMap<String, ModuleSource>,
    /// Stack of modules currently being loaded (for circular import detection)
    loading_stack: Vec<String>,
    /// Search paths for module resolution
    search_paths: Vec<PathBuf>,
}

impl ModuleLoader {
    /// Creates a loader searching `.`, `./modules`, then `extra_paths`
    pub fn new(extra_paths: Vec<PathBuf>) -> Self {
        let mut search_paths = vec![
            PathBuf::from("."),         // Current directory
            PathBuf::from("./modules"), // Local modules directory
        ];
        search_paths.extend(extra_paths);
        ModuleLoader { loaded_modules: AHashMap::new(), loading_stack: Vec::new(), search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded_modules.contains_key(name)
    }

    pub fn source_of(&self, name: &str) -> Option<&ModuleSource> {
        self.loaded_modules.get(name)
    }

    /// Resolves a module name to a file path. Dots in the name separate
    /// directories: `game.physics` is `game/physics.dmo.json`.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative: PathBuf = name.split('.').collect();
        let relative = relative.with_extension(MODULE_EXTENSION);

        self.search_paths.iter().map(|dir| dir.join(&relative)).find(|path| path.is_file())
    }

    /// Marks `name` as being loaded. Fails if it already is, which means
    /// the module (indirectly) uses itself.
    pub fn begin(&mut self, name: &str, location: SourceLocation) -> Result<(), DmoError> {
        if self.loading_stack.iter().any(|loading| loading == name) {
            let mut chain = self.loading_stack.clone();
            chain.push(name.to_string());
            return Err(DmoError::new(
                ErrorKind::ModuleError,
                format!("Circular import detected: {}", chain.join(" -> ")),
                location,
            ));
        }
        self.loading_stack.push(name.to_string());
        Ok(())
    }

    /// Reads and parses the program of a file module
    pub fn read(&self, name: &str, location: SourceLocation) -> Result<(PathBuf, Node), DmoError> {
        let path = self.resolve(name).ok_or_else(|| {
            DmoError::new(ErrorKind::ModuleError, format!("Module not found: {}", name), location.clone())
                .with_help(format!(
                    "Searched for {}.{} in: {}",
                    name,
                    MODULE_EXTENSION,
                    self.search_paths
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
        })?;

        let source = fs::read_to_string(&path).map_err(|e| {
            DmoError::new(
                ErrorKind::ModuleError,
                format!("Failed to read module {}: {}", name, e),
                location.clone(),
            )
        })?;

        let program = program_from_json(&source).map_err(|e| {
            DmoError::new(
                ErrorKind::ModuleError,
                format!("Failed to load module {}: {}", name, e.message),
                location.clone(),
            )
        })?;

        Ok((path, program))
    }

    /// Ends a load started with `begin`; a successful one is cached
    pub fn finish(&mut self, name: &str, source: Option<ModuleSource>) {
        if let Some(position) = self.loading_stack.iter().rposition(|loading| loading == name) {
            self.loading_stack.remove(position);
        }
        if let Some(source) = source {
            self.loaded_modules.insert(name.to_string(), source);
        }
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

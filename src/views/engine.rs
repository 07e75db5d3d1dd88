use super::ast::Template;
use super::parser;
use crate::config::ViewConfig;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::UNIX_EPOCH;

#[derive(Clone)]
struct CacheEntry {
    template: Arc<Template>,
    file_modified: Option<u64>,
}

/// Parsed template cache keyed by file path, invalidated by modification time
struct TemplateCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl TemplateCache {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn file_mtime(path: &Path) -> Option<u64> {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
    }

    fn get(&self, path: &Path) -> Option<Arc<Template>> {
        let current = Self::file_mtime(path)?;
        let entries = self.entries.read().ok()?;
        let entry = entries.get(path)?;
        match entry.file_modified {
            Some(cached) if current <= cached => Some(Arc::clone(&entry.template)),
            _ => None,
        }
    }

    fn insert(&self, path: &Path, template: Arc<Template>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                path.to_path_buf(),
                CacheEntry {
                    template,
                    file_modified: Self::file_mtime(path),
                },
            );
        }
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

/// Resolves template names to files under the views directory and parses them
pub struct ViewEngine {
    directory: PathBuf,
    extension: String,
    cache_enabled: bool,
    cache: TemplateCache,
}

impl ViewEngine {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            extension: "html".to_string(),
            cache_enabled: false,
            cache: TemplateCache::new(),
        }
    }

    pub fn from_config(config: &ViewConfig) -> Self {
        Self::new(&config.directory)
            .with_extension(&config.extension)
            .with_cache(config.cache_enabled)
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File backing a template name; names may contain `/` but never `..`
    pub fn template_path(&self, name: &str) -> Result<PathBuf> {
        let relative = PathBuf::from(format!("{}.{}", name, self.extension));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));

        if name.is_empty() || escapes {
            return Err(Error::template(format!("Invalid template name '{}'", name)));
        }

        Ok(self.directory.join(relative))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.template_path(name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Load and parse a template, going through the cache when enabled
    pub fn load(&self, name: &str) -> Result<Arc<Template>> {
        let path = self.template_path(name)?;

        if self.cache_enabled {
            if let Some(template) = self.cache.get(&path) {
                return Ok(template);
            }
        }

        if !path.is_file() {
            return Err(Error::TemplateNotFound(format!(
                "{} ({})",
                name,
                path.display()
            )));
        }

        let source = std::fs::read_to_string(&path)?;
        let template = Arc::new(
            parser::parse(&source)
                .map_err(|e| e.with_context(format!("Failed to parse template '{}'", name)))?,
        );

        if self.cache_enabled {
            self.cache.insert(&path, Arc::clone(&template));
            log::debug!("Cached template '{}'", name);
        }

        Ok(template)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

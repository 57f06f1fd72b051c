use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{
    COMPOSITE_FRAGMENT_PATH, COMPOSITE_FRAGMENT_SOURCE, COMPOSITE_VERTEX_PATH,
    COMPOSITE_VERTEX_SOURCE,
};

/// Failure to load a text resource.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("resource not found: {path}")]
    NotFound { path: String },

    #[error("failed to read resource {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source of shader text, addressed by slash-separated relative paths.
pub trait ResourceLoader {
    fn load_text(&self, path: &str) -> Result<String, ResourceError>;
}

/// Resources compiled into the binary.
///
/// ```rust,ignore
/// let loader = EmbeddedResources::builtin()
///     .with("shaders/composite.frag.wgsl", include_str!("tinted.frag.wgsl"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: HashMap<String, String>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle holding the compositing shader pair.
    pub fn builtin() -> Self {
        Self::new()
            .with(COMPOSITE_VERTEX_PATH, COMPOSITE_VERTEX_SOURCE)
            .with(COMPOSITE_FRAGMENT_PATH, COMPOSITE_FRAGMENT_SOURCE)
    }

    /// Adds or replaces the resource at `path`.
    pub fn with(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(path.into(), text.into());
        self
    }
}

impl ResourceLoader for EmbeddedResources {
    fn load_text(&self, path: &str) -> Result<String, ResourceError> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound { path: path.to_string() })
    }
}

/// Resources read from a directory at load time.
#[derive(Debug, Clone)]
pub struct DirResources {
    root: PathBuf,
}

impl DirResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLoader for DirResources {
    fn load_text(&self, path: &str) -> Result<String, ResourceError> {
        let full = self.root.join(path);
        std::fs::read_to_string(&full).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound { path: path.to_string() }
            } else {
                ResourceError::Io { path: path.to_string(), source }
            }
        })
    }
}

/// Loads `path`, substituting a diagnostic placeholder on failure.
///
/// The placeholder is not valid WGSL, so a missing shader surfaces as a
/// compile error of the stage that needed it.
pub fn load_or_placeholder(loader: &dyn ResourceLoader, path: &str) -> String {
    match loader.load_text(path) {
        Ok(text) => text,
        Err(err) => {
            log::error!("{err}");
            format!("shader failed to load: {path}")
        }
    }
}

//! Templates and the loaders that find them.
//!
//! A [`Template`] keeps the raw `.grd` source and parses a fresh
//! [`Workbook`] for every document, so no instance is ever shared between
//! two generations.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use reportline_engine::engine::Workbook;

use crate::error::{ReportError, Result};
use crate::storage::parse_workbook_content;

/// File extension of template files on disk.
pub const TEMPLATE_EXTENSION: &str = "grd";

/// Templates larger than this are refused.
pub const MAX_TEMPLATE_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    name: String,
    source: String,
}

impl Template {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Template {
        Template {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// A new, independently owned workbook parsed from the template source.
    pub fn instantiate(&self) -> Result<Workbook> {
        parse_workbook_content(&self.source)
    }
}

/// Source of raw templates, looked up by name.
pub trait TemplateLoader {
    fn load(&self, name: &str) -> Result<Template>;
}

impl<L: TemplateLoader + ?Sized> TemplateLoader for &L {
    fn load(&self, name: &str) -> Result<Template> {
        (**self).load(name)
    }
}

/// Loads `<root>/<name>.grd`.
#[derive(Clone, Debug)]
pub struct DirTemplateLoader {
    root: PathBuf,
}

impl DirTemplateLoader {
    pub fn new(root: impl Into<PathBuf>) -> DirTemplateLoader {
        DirTemplateLoader { root: root.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, TEMPLATE_EXTENSION))
    }
}

impl TemplateLoader for DirTemplateLoader {
    fn load(&self, name: &str) -> Result<Template> {
        let path = self.path_for(name);
        let not_found = || ReportError::TemplateNotFound {
            name: name.to_string(),
            path: path.clone(),
        };

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(not_found());
        }
        if metadata.len() > MAX_TEMPLATE_BYTES {
            return Err(ReportError::TemplateTooLarge {
                name: name.to_string(),
                size: metadata.len(),
                max: MAX_TEMPLATE_BYTES,
            });
        }

        let source = fs::read_to_string(&path)?;
        log::debug!("loaded template {:?} from {}", name, path.display());
        Ok(Template::new(name, source))
    }
}

/// In-memory templates, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct MemoryTemplateLoader {
    templates: HashMap<String, String>,
}

impl MemoryTemplateLoader {
    pub fn new() -> MemoryTemplateLoader {
        MemoryTemplateLoader::default()
    }

    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }
}

impl TemplateLoader for MemoryTemplateLoader {
    fn load(&self, name: &str) -> Result<Template> {
        self.templates
            .get(name)
            .map(|source| Template::new(name, source.clone()))
            .ok_or_else(|| ReportError::TemplateNotFound {
                name: name.to_string(),
                path: PathBuf::from(name),
            })
    }
}

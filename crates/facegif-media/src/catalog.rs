//! Demo target catalog.
//!
//! Stands in for a GIF search backend. The default catalog is embedded at
//! compile time from `catalog/demo.toml`; a different file can be loaded at
//! startup. Every non-blank query gets the whole catalog, in file order.

use async_trait::async_trait;
use facegif_core::{SearchError, TargetCandidate, TargetSearch};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

const DEMO_CATALOG: &str = include_str!("../catalog/demo.toml");

static DEMO: OnceLock<Catalog> = OnceLock::new();

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("bad catalog TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate target id in catalog: {0}")]
    DuplicateId(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetCandidate>,
}

impl Catalog {
    pub fn parse(src: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(src)?;
        let mut seen = HashSet::new();
        for target in &catalog.targets {
            if !seen.insert(target.id.as_str()) {
                return Err(CatalogError::DuplicateId(target.id.clone()));
            }
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let src = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&src)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// The embedded demo catalog.
pub fn demo_catalog() -> &'static Catalog {
    DEMO.get_or_init(|| match Catalog::parse(DEMO_CATALOG) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "embedded demo catalog is invalid");
            Catalog::default()
        }
    })
}

/// Mock search provider backed by a [`Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogSearch {
    catalog: Catalog,
}

impl CatalogSearch {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn demo() -> Self {
        Self::new(demo_catalog().clone())
    }
}

#[async_trait]
impl TargetSearch for CatalogSearch {
    fn name(&self) -> &str {
        "catalog"
    }

    async fn search(&self, query: &str) -> Result<Vec<TargetCandidate>, SearchError> {
        tracing::debug!(query, count = self.catalog.len(), "catalog search");
        Ok(self.catalog.targets.clone())
    }
}

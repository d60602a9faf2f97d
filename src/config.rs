//! Dashboard configuration loaded from an optional TOML file

use crate::data::NewProductSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Product codes launched in the current reporting period
pub const DEFAULT_NEW_PRODUCTS: [&str; 5] = ["F0110C", "F0183F", "F01K8A", "F0183K", "F0101P"];

pub const DEFAULT_INPUT: &str = "sales_q1.csv";

/// Analysis settings. Every field is optional in the file and falls back to its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Sales sheet read when no `--input` is given
    pub default_input: PathBuf,
    /// Codes counted as new products
    pub new_products: Vec<String>,
    /// Partners listed per new product in the product-mix section
    pub top_k: usize,
    /// Customers listed in the acceptance ranking
    pub top_acceptance: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_input: PathBuf::from(DEFAULT_INPUT),
            new_products: DEFAULT_NEW_PRODUCTS.iter().map(|c| c.to_string()).collect(),
            top_k: 3,
            top_acceptance: 10,
        }
    }
}

impl DashboardConfig {
    /// Read the config at `path`, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("Failed to read config '{}': {}", path.display(), e)
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.validate()
    }

    pub fn from_toml(text: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()
    }

    fn validate(mut self) -> crate::Result<Self> {
        if self.top_k == 0 {
            anyhow::bail!("top_k must be at least 1");
        }
        if self.top_acceptance == 0 {
            anyhow::bail!("top_acceptance must be at least 1");
        }

        self.new_products = self
            .new_products
            .iter()
            .map(|code| code.trim().to_string())
            .collect();
        if let Some(pos) = self.new_products.iter().position(|c| c.is_empty()) {
            anyhow::bail!("new_products entry {} is blank", pos + 1);
        }

        Ok(self)
    }

    pub fn new_product_set(&self) -> NewProductSet {
        NewProductSet::new(self.new_products.iter().cloned())
    }
}

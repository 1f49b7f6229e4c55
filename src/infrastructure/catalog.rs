//! Category catalogs: formula templates per industry and KPI.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Category, CategoryIndex};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{CategoryProvider, FileSystem};

const BUILTIN_CATALOG: &str = r#"
[[category]]
industry_class = "Consumer"
industry = "Retail"
tree_type = "profitability"
kpi = "profit"
formulas = [
    "profit = revenue - cost",
    "revenue = quantity * price",
    "cost = fixed_cost + variable_cost",
    "variable_cost = quantity * unit_cost",
]
metadata = { unit = "currency", period = "monthly" }

[[category]]
industry_class = "Technology"
industry = "SaaS"
tree_type = "growth"
kpi = "mrr"
formulas = [
    "mrr = new_mrr + expansion_mrr - churned_mrr",
    "new_mrr = new_customers * average_revenue_per_account",
    "churned_mrr = customers * churn_rate",
]
metadata = { unit = "currency", period = "monthly" }

[[category]]
industry_class = "Industrial"
industry = "Manufacturing"
tree_type = "profitability"
kpi = "gross_margin"
formulas = [
    "gross_margin = gross_profit / net_sales",
    "gross_profit = net_sales - cost_of_goods_sold",
    "cost_of_goods_sold = material_cost + labor_cost + overhead",
]
metadata = { unit = "ratio" }
"#;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "category")]
    categories: Vec<Category>,
}

/// Category provider over an in-memory list of categories.
#[derive(Debug, Clone, Default)]
pub struct CatalogProvider {
    categories: Vec<Category>,
}

impl CatalogProvider {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Catalog compiled into the binary.
    pub fn builtin() -> InfraResult<Self> {
        Self::from_toml_str(BUILTIN_CATALOG, "builtin")
    }

    /// Parse a catalog of `[[category]]` tables.
    pub fn from_toml_str(content: &str, origin: &str) -> InfraResult<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(|e| InfraError::Catalog {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        debug!("loaded {} categories from {}", file.categories.len(), origin);
        Ok(Self::new(file.categories))
    }

    /// Load a catalog file.
    #[instrument(level = "debug", skip(fs))]
    pub fn load(path: &Path, fs: &dyn FileSystem) -> InfraResult<Self> {
        let content = fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read catalog {}", path.display()), e))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }
}

impl CategoryProvider for CatalogProvider {
    fn get_formulas(&self, tree_type: &str, kpi: &str) -> ApplicationResult<Vec<String>> {
        self.categories
            .iter()
            .find(|c| {
                c.tree_type.eq_ignore_ascii_case(tree_type.trim())
                    && c.kpi.eq_ignore_ascii_case(kpi.trim())
            })
            .map(|c| c.formulas.clone())
            .ok_or_else(|| ApplicationError::CategoryNotFound {
                tree_type: tree_type.to_string(),
                kpi: kpi.to_string(),
            })
    }

    fn get_categories(&self) -> CategoryIndex {
        let mut index = CategoryIndex::new();
        for category in &self.categories {
            let tree_types = index
                .entry(category.industry_class.clone())
                .or_default()
                .entry(category.industry.clone())
                .or_default();
            if !tree_types.contains(&category.tree_type) {
                tree_types.push(category.tree_type.clone());
            }
        }
        index
    }

    fn list(&self) -> &[Category] {
        &self.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_builtin_catalog_when_loading_then_parses_all_entries() {
        let catalog = CatalogProvider::builtin().unwrap();
        assert_eq!(catalog.list().len(), 3);
        assert_eq!(
            catalog.list()[0].metadata.get("unit"),
            Some(&"currency".to_string())
        );
    }
}

//! Tests for CatalogProvider

use std::fs;

use tempfile::TempDir;

use kpitree::application::ErrorKind;
use kpitree::infrastructure::traits::{CategoryProvider, RealFileSystem};
use kpitree::infrastructure::{CatalogProvider, InfraError};

const CATALOG: &str = r#"
[[category]]
industry_class = "Services"
industry = "Consulting"
tree_type = "utilization"
kpi = "billable_ratio"
formulas = ["billable_ratio = billable_hours / available_hours"]

[[category]]
industry_class = "Services"
industry = "Consulting"
tree_type = "profitability"
kpi = "margin"
formulas = ["margin = fees - staff_cost", "staff_cost = hours * rate"]

[[category]]
industry_class = "Services"
industry = "Staffing"
tree_type = "profitability"
kpi = "margin"
formulas = ["margin = bill_rate - pay_rate"]
"#;

#[test]
fn given_catalog_file_when_loading_then_lists_categories() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.toml");
    fs::write(&path, CATALOG).unwrap();

    // Act
    let catalog = CatalogProvider::load(&path, &RealFileSystem).unwrap();

    // Assert
    assert_eq!(catalog.list().len(), 3);
    assert_eq!(
        catalog.get_formulas("profitability", "margin").unwrap(),
        vec!["margin = fees - staff_cost", "staff_cost = hours * rate"]
    );
}

#[test]
fn given_catalog_when_indexing_then_groups_by_class_and_industry() {
    let catalog = CatalogProvider::from_toml_str(CATALOG, "test").unwrap();

    let index = catalog.get_categories();

    let services = &index["Services"];
    assert_eq!(
        services["Consulting"],
        vec!["utilization".to_string(), "profitability".to_string()]
    );
    assert_eq!(services["Staffing"], vec!["profitability".to_string()]);
}

#[test]
fn given_unknown_kpi_when_getting_formulas_then_not_found() {
    let catalog = CatalogProvider::builtin().unwrap();

    let err = catalog.get_formulas("growth", "churn").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn given_builtin_catalog_when_indexing_then_contains_retail() {
    let catalog = CatalogProvider::builtin().unwrap();

    let index = catalog.get_categories();

    assert_eq!(index["Consumer"]["Retail"], vec!["profitability".to_string()]);
}

#[test]
fn given_invalid_toml_when_loading_then_catalog_error() {
    let result = CatalogProvider::from_toml_str("[[category]]\nkpi = 3", "broken");

    assert!(matches!(result, Err(InfraError::Catalog { origin, .. }) if origin == "broken"));
}

#[test]
fn given_missing_file_when_loading_then_io_error() {
    let temp = TempDir::new().unwrap();

    let result = CatalogProvider::load(&temp.path().join("nope.toml"), &RealFileSystem);

    assert!(matches!(result, Err(InfraError::Io { .. })));
}

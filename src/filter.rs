//! Set-membership filters over the sales table

use crate::data::{NewProductSet, SalesRecord, SalesTable};
use std::collections::BTreeSet;

/// Optional restrictions per dimension. An empty set leaves that dimension open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filters {
    pub regions: BTreeSet<String>,
    pub customers: BTreeSet<String>,
    pub products: BTreeSet<String>,
    pub applicants: BTreeSet<String>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_customers<I, S>(mut self, customers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.customers = customers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_products<I, S>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.products = products.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_applicants<I, S>(mut self, applicants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applicants = applicants.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.regions.is_empty()
            && self.customers.is_empty()
            && self.products.is_empty()
            && self.applicants.is_empty()
    }

    /// True when the record passes every non-empty dimension
    pub fn matches(&self, record: &SalesRecord) -> bool {
        admits(&self.regions, &record.region)
            && admits(&self.customers, &record.customer_name)
            && admits(&self.products, &record.product_code)
            && admits(&self.applicants, &record.applicant)
    }

    /// Stable text form, used as part of cache keys
    pub fn fingerprint(&self) -> String {
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join("\u{1f}");
        format!(
            "r={}|c={}|p={}|a={}",
            join(&self.regions),
            join(&self.customers),
            join(&self.products),
            join(&self.applicants)
        )
    }
}

fn admits(allowed: &BTreeSet<String>, value: &str) -> bool {
    allowed.is_empty() || allowed.contains(value)
}

/// Distinct sorted values available for each filter dimension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub customers: Vec<String>,
    pub products: Vec<String>,
    pub applicants: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &SalesTable) -> Self {
        let distinct = |f: fn(&SalesRecord) -> &str| -> Vec<String> {
            table
                .iter()
                .map(|r| f(r).to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        Self {
            regions: distinct(|r| r.region.as_str()),
            customers: distinct(|r| r.customer_name.as_str()),
            products: distinct(|r| r.product_code.as_str()),
            applicants: distinct(|r| r.applicant.as_str()),
        }
    }
}

/// Apply the filters, returning a new table with the surviving rows in input order
pub fn apply_filters(table: &SalesTable, filters: &Filters) -> SalesTable {
    table.retain_where(|record| filters.matches(record))
}

/// Rows of `table` whose product is in the new-product set
pub fn new_product_rows(table: &SalesTable, new_products: &NewProductSet) -> SalesTable {
    table.retain_where(|record| new_products.contains(&record.product_code))
}

/// The filtered view shared by every report section
#[derive(Debug, Clone)]
pub struct FilteredDataset {
    pub table: SalesTable,
    pub new_products: SalesTable,
    pub new_product_set: NewProductSet,
}

impl FilteredDataset {
    pub fn new(table: &SalesTable, filters: &Filters, new_product_set: &NewProductSet) -> Self {
        let filtered = apply_filters(table, filters);
        let new_products = new_product_rows(&filtered, new_product_set);
        log::debug!(
            "filtered {} -> {} rows ({} new-product rows)",
            table.len(),
            filtered.len(),
            new_products.len()
        );

        Self {
            table: filtered,
            new_products,
            new_product_set: new_product_set.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

//! Market penetration of new products: share of distinct customers reached

use crate::aggregate::{aggregate, GroupKey, CUSTOMER_COUNT, TOTAL_SALES};
use crate::data::SalesTable;
use crate::error::AnalysisError;
use crate::filter::FilteredDataset;
use std::collections::HashMap;

/// Distinct new-product buyers over distinct buyers, in percent; 0 with no buyers
pub fn penetration_rate(new_customers: usize, total_customers: usize) -> f64 {
    if total_customers == 0 {
        0.0
    } else {
        new_customers as f64 / total_customers as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Penetration {
    /// Group value (region or `YYYY-MM`); empty for the overall figure
    pub group: String,
    pub total_customers: usize,
    pub new_product_customers: usize,
    pub rate: f64,
    pub new_product_sales: f64,
}

/// Penetration across the whole filtered table
pub fn overall(dataset: &FilteredDataset) -> Penetration {
    let total_customers = dataset.table.distinct_customers();
    let new_product_customers = dataset.new_products.distinct_customers();
    Penetration {
        group: String::new(),
        total_customers,
        new_product_customers,
        rate: penetration_rate(new_product_customers, total_customers),
        new_product_sales: dataset.new_products.total_sales(),
    }
}

/// Penetration per region, highest rate first
pub fn by_region(dataset: &FilteredDataset) -> Vec<Penetration> {
    let mut rows = grouped(&dataset.table, &dataset.new_products, GroupKey::Region);
    rows.sort_by(|a, b| b.rate.partial_cmp(&a.rate).unwrap_or(std::cmp::Ordering::Equal));
    rows
}

/// Penetration per calendar month, in month order.
///
/// Unavailable when ship_month did not parse as dates.
pub fn by_month(dataset: &FilteredDataset) -> Result<Vec<Penetration>, AnalysisError> {
    if !dataset.table.ship_month_parsed {
        return Err(AnalysisError::ShipMonthUnparsed);
    }
    let mut rows = grouped(&dataset.table, &dataset.new_products, GroupKey::Month);
    rows.sort_by(|a, b| a.group.cmp(&b.group));
    Ok(rows)
}

fn grouped(table: &SalesTable, new_products: &SalesTable, key: GroupKey) -> Vec<Penetration> {
    let totals = aggregate(table, &[key], &[CUSTOMER_COUNT]);
    let reached = aggregate(new_products, &[key], &[CUSTOMER_COUNT, TOTAL_SALES]);
    let reached_by_group: HashMap<&str, (usize, f64)> = reached
        .rows
        .iter()
        .map(|row| {
            (
                row.key(0),
                (
                    reached.get(row, CUSTOMER_COUNT.name) as usize,
                    reached.get(row, TOTAL_SALES.name),
                ),
            )
        })
        .collect();

    totals
        .rows
        .iter()
        .map(|row| {
            let group = row.key(0);
            let total_customers = totals.get(row, CUSTOMER_COUNT.name) as usize;
            let (new_product_customers, new_product_sales) =
                reached_by_group.get(group).copied().unwrap_or((0, 0.0));
            Penetration {
                group: group.to_string(),
                total_customers,
                new_product_customers,
                rate: penetration_rate(new_product_customers, total_customers),
                new_product_sales,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NewProductSet, SalesRecord};
    use crate::filter::Filters;
    use crate::sample::sample_table;

    fn default_new_products() -> NewProductSet {
        NewProductSet::new(["F0110C", "F0183F", "F01K8A", "F0183K", "F0101P"])
    }

    fn sale(customer: &str, region: &str, month: &str, code: &str) -> SalesRecord {
        SalesRecord::new(customer, region, month, "x", code, "n", "o", 10.0, 1)
    }

    #[test]
    fn test_rate_guards_zero_denominator() {
        assert_eq!(penetration_rate(0, 0), 0.0);
        assert_eq!(penetration_rate(1, 4), 25.0);
    }

    #[test]
    fn test_no_new_buyers_is_zero() {
        let table = SalesTable::from_records(vec![sale("A", "East", "2025-03", "OLD")]);
        let dataset = FilteredDataset::new(&table, &Filters::new(), &default_new_products());
        assert_eq!(overall(&dataset).rate, 0.0);
    }

    #[test]
    fn test_all_buyers_is_hundred() {
        let dataset = FilteredDataset::new(&sample_table(), &Filters::new(), &default_new_products());
        let result = overall(&dataset);
        assert_eq!(result.total_customers, 2);
        assert_eq!(result.new_product_customers, 2);
        assert_eq!(result.rate, 100.0);
    }

    #[test]
    fn test_by_region() {
        let table = SalesTable::from_records(vec![
            sale("A", "East", "2025-03", "OLD"),
            sale("B", "East", "2025-03", "NEW"),
            sale("C", "West", "2025-03", "OLD"),
        ]);
        let dataset = FilteredDataset::new(&table, &Filters::new(), &NewProductSet::new(["NEW"]));
        let regions = by_region(&dataset);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].group, "East");
        assert_eq!(regions[0].rate, 50.0);
        assert_eq!(regions[0].new_product_sales, 10.0);
        assert_eq!(regions[1].group, "West");
        assert_eq!(regions[1].rate, 0.0);
    }

    #[test]
    fn test_by_month() {
        let table = SalesTable::from_records(vec![
            sale("A", "East", "2025-04", "NEW"),
            sale("A", "East", "2025-03", "OLD"),
            sale("B", "East", "2025-03-20", "NEW"),
        ]);
        let dataset = FilteredDataset::new(&table, &Filters::new(), &NewProductSet::new(["NEW"]));
        let months = by_month(&dataset).unwrap();
        let labels: Vec<&str> = months.iter().map(|m| m.group.as_str()).collect();
        assert_eq!(labels, vec!["2025-03", "2025-04"]);
        assert_eq!(months[0].rate, 50.0);
        assert_eq!(months[1].rate, 100.0);
    }

    #[test]
    fn test_by_month_skipped_without_dates() {
        let table = SalesTable::from_records(vec![sale("A", "East", "Q1", "NEW")]);
        let dataset = FilteredDataset::new(&table, &Filters::new(), &NewProductSet::new(["NEW"]));
        assert_eq!(by_month(&dataset), Err(AnalysisError::ShipMonthUnparsed));
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = FilteredDataset::new(
            &sample_table(),
            &Filters::new().with_regions(["Atlantis"]),
            &default_new_products(),
        );
        assert_eq!(overall(&dataset).rate, 0.0);
        assert!(by_region(&dataset).is_empty());
        assert!(by_month(&dataset).unwrap().is_empty());
    }
}

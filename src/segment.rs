//! Customer segmentation by new-product revenue share

use crate::aggregate::{aggregate, Field, GroupKey, Metric, AVG_UNIT_PRICE, TOTAL_QUANTITY, TOTAL_SALES};
use crate::filter::FilteredDataset;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Lower bound (inclusive) of the balanced band, in percent
pub const BALANCED_FROM: f64 = 10.0;
/// Lower bound (inclusive) of the innovative band, in percent
pub const INNOVATIVE_FROM: f64 = 30.0;

/// Customer band by share of revenue coming from new products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CustomerSegment {
    /// ratio in [0, 10)
    Conservative,
    /// ratio in [10, 30)
    Balanced,
    /// ratio in [30, 100]
    Innovative,
}

impl CustomerSegment {
    pub const ALL: [CustomerSegment; 3] = [
        CustomerSegment::Conservative,
        CustomerSegment::Balanced,
        CustomerSegment::Innovative,
    ];

    /// Band for a new-product ratio. Bands are left-closed: 10.0 is balanced, 30.0 innovative.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= INNOVATIVE_FROM {
            CustomerSegment::Innovative
        } else if ratio >= BALANCED_FROM {
            CustomerSegment::Balanced
        } else {
            CustomerSegment::Conservative
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CustomerSegment::Conservative => "conservative",
            CustomerSegment::Balanced => "balanced",
            CustomerSegment::Innovative => "innovative",
        }
    }
}

impl fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerFeatureRow {
    pub customer_name: String,
    pub total_sales: f64,
    pub distinct_product_count: usize,
    pub total_quantity: i64,
    pub avg_unit_price: f64,
    pub new_product_sales: f64,
    /// Percent of total_sales from new products, 0 to 100
    pub new_product_ratio: f64,
    pub customer_segment: CustomerSegment,
}

/// New-product share in percent; 0 when there are no sales
pub fn new_product_ratio(new_product_sales: f64, total_sales: f64) -> f64 {
    if total_sales == 0.0 {
        0.0
    } else {
        new_product_sales / total_sales * 100.0
    }
}

/// Build one feature row per customer in the filtered table, in first-seen order
pub fn customer_features(dataset: &FilteredDataset) -> Vec<CustomerFeatureRow> {
    let distinct_products = Metric::count_distinct("distinct_products", Field::ProductCode);
    let all = aggregate(
        &dataset.table,
        &[GroupKey::Customer],
        &[TOTAL_SALES, distinct_products, TOTAL_QUANTITY, AVG_UNIT_PRICE],
    );
    let new_sales = aggregate(&dataset.new_products, &[GroupKey::Customer], &[TOTAL_SALES]);
    let new_by_customer: HashMap<&str, f64> = new_sales
        .rows
        .iter()
        .map(|row| (row.key(0), new_sales.get(row, TOTAL_SALES.name)))
        .collect();

    all.rows
        .iter()
        .map(|row| {
            let customer = row.key(0);
            let total_sales = all.get(row, TOTAL_SALES.name);
            let new_product_sales = new_by_customer.get(customer).copied().unwrap_or(0.0);
            let ratio = new_product_ratio(new_product_sales, total_sales);

            CustomerFeatureRow {
                customer_name: customer.to_string(),
                total_sales,
                distinct_product_count: all.get(row, distinct_products.name) as usize,
                total_quantity: all.get(row, TOTAL_QUANTITY.name) as i64,
                avg_unit_price: all.get(row, AVG_UNIT_PRICE.name),
                new_product_sales,
                new_product_ratio: ratio,
                customer_segment: CustomerSegment::from_ratio(ratio),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSummary {
    pub segment: CustomerSegment,
    pub customer_count: usize,
    pub avg_total_sales: f64,
    pub avg_new_product_ratio: f64,
}

/// Per-segment counts and means; segments without customers are omitted
pub fn segment_summary(rows: &[CustomerFeatureRow]) -> Vec<SegmentSummary> {
    CustomerSegment::ALL
        .iter()
        .filter_map(|&segment| {
            let members: Vec<&CustomerFeatureRow> =
                rows.iter().filter(|r| r.customer_segment == segment).collect();
            if members.is_empty() {
                return None;
            }
            let n = members.len() as f64;
            Some(SegmentSummary {
                segment,
                customer_count: members.len(),
                avg_total_sales: members.iter().map(|r| r.total_sales).sum::<f64>() / n,
                avg_new_product_ratio: members.iter().map(|r| r.new_product_ratio).sum::<f64>() / n,
            })
        })
        .collect()
}

/// The `n` customers with the highest new-product ratio
pub fn top_acceptance(rows: &[CustomerFeatureRow], n: usize) -> Vec<CustomerFeatureRow> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| {
        b.new_product_ratio
            .partial_cmp(&a.new_product_ratio)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NewProductSet, SalesRecord, SalesTable};
    use crate::filter::Filters;

    fn dataset(records: Vec<SalesRecord>, new_codes: &[&str]) -> FilteredDataset {
        let table = SalesTable::from_records(records);
        FilteredDataset::new(&table, &Filters::new(), &NewProductSet::new(new_codes.iter().copied()))
    }

    fn sale(customer: &str, code: &str, amount: f64) -> SalesRecord {
        SalesRecord::new(customer, "East", "2025-03", "x", code, "n", "o", amount, 1)
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(CustomerSegment::from_ratio(0.0), CustomerSegment::Conservative);
        assert_eq!(CustomerSegment::from_ratio(9.999), CustomerSegment::Conservative);
        assert_eq!(CustomerSegment::from_ratio(10.0), CustomerSegment::Balanced);
        assert_eq!(CustomerSegment::from_ratio(29.999), CustomerSegment::Balanced);
        assert_eq!(CustomerSegment::from_ratio(30.0), CustomerSegment::Innovative);
        assert_eq!(CustomerSegment::from_ratio(100.0), CustomerSegment::Innovative);
    }

    #[test]
    fn test_ratio_guards_zero_sales() {
        assert_eq!(new_product_ratio(0.0, 0.0), 0.0);
        assert_eq!(new_product_ratio(5.0, 20.0), 25.0);
    }

    #[test]
    fn test_customer_features() {
        let data = dataset(
            vec![
                sale("A", "OLD", 90.0),
                sale("A", "NEW", 10.0),
                sale("B", "OLD", 70.0),
                sale("B", "NEW", 30.0),
                sale("C", "OLD", 50.0),
                sale("C", "OLD2", 50.0),
            ],
            &["NEW"],
        );
        let rows = customer_features(&data);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].customer_name, "A");
        assert_eq!(rows[0].new_product_ratio, 10.0);
        assert_eq!(rows[0].customer_segment, CustomerSegment::Balanced);
        assert_eq!(rows[0].distinct_product_count, 2);
        assert_eq!(rows[0].avg_unit_price, 50.0);

        assert_eq!(rows[1].new_product_ratio, 30.0);
        assert_eq!(rows[1].customer_segment, CustomerSegment::Innovative);

        assert_eq!(rows[2].new_product_sales, 0.0);
        assert_eq!(rows[2].customer_segment, CustomerSegment::Conservative);
    }

    #[test]
    fn test_every_customer_gets_exactly_one_segment() {
        let data = dataset(
            (0..=20)
                .flat_map(|i| {
                    let customer = format!("C{}", i);
                    let new_share = i as f64 * 5.0;
                    vec![
                        sale(&customer, "NEW", new_share),
                        sale(&customer, "OLD", 100.0 - new_share),
                    ]
                })
                .collect(),
            &["NEW"],
        );
        let rows = customer_features(&data);
        let summary = segment_summary(&rows);
        let counted: usize = summary.iter().map(|s| s.customer_count).sum();
        assert_eq!(counted, 21);
        // 0..=5 -> [0,10), 10..=25 -> [10,30), 30..=100 -> [30,100]
        assert_eq!(summary[0].customer_count, 2);
        assert_eq!(summary[1].customer_count, 4);
        assert_eq!(summary[2].customer_count, 15);
    }

    #[test]
    fn test_empty_dataset() {
        let data = dataset(Vec::new(), &["NEW"]);
        let rows = customer_features(&data);
        assert!(rows.is_empty());
        assert!(segment_summary(&rows).is_empty());
        assert!(top_acceptance(&rows, 10).is_empty());
    }

    #[test]
    fn test_top_acceptance_order() {
        let data = dataset(
            vec![
                sale("A", "NEW", 10.0),
                sale("A", "OLD", 90.0),
                sale("B", "NEW", 100.0),
                sale("C", "NEW", 50.0),
                sale("C", "OLD", 50.0),
            ],
            &["NEW"],
        );
        let top = top_acceptance(&customer_features(&data), 2);
        let names: Vec<&str> = top.iter().map(|r| r.customer_name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);
    }
}

//! Group-by rollups over the sales table.
//!
//! Every report is built from [`aggregate`]: rows are grouped by an ordered
//! list of [`GroupKey`]s and each group is reduced with a list of [`Metric`]s.
//! Groups come out in first-seen order so a stable sort on a metric breaks
//! ties by appearance in the input.

use crate::data::{SalesRecord, SalesTable};
use crate::error::AnalysisError;
use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Dimension to group records by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Region,
    Customer,
    ProductCode,
    DisplayName,
    Applicant,
    Packaging,
    OrderType,
    /// Calendar month of the ship date; rows without a parsed date are skipped
    Month,
}

impl GroupKey {
    pub fn column_name(&self) -> &'static str {
        match self {
            GroupKey::Region => "region",
            GroupKey::Customer => "customer",
            GroupKey::ProductCode => "product_code",
            GroupKey::DisplayName => "display_name",
            GroupKey::Applicant => "applicant",
            GroupKey::Packaging => "packaging_type",
            GroupKey::OrderType => "order_type",
            GroupKey::Month => "month",
        }
    }

    fn value(&self, record: &SalesRecord) -> Option<String> {
        match self {
            GroupKey::Region => Some(record.region.clone()),
            GroupKey::Customer => Some(record.customer_name.clone()),
            GroupKey::ProductCode => Some(record.product_code.clone()),
            GroupKey::DisplayName => Some(record.simplified_product_name.clone()),
            GroupKey::Applicant => Some(record.applicant.clone()),
            GroupKey::Packaging => Some(record.packaging_type.label().to_string()),
            GroupKey::OrderType => Some(record.order_type.clone()),
            GroupKey::Month => record.month_key(),
        }
    }
}

/// Record field a metric reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SaleAmount,
    Quantity,
    UnitPrice,
    Customer,
    ProductCode,
}

impl Field {
    /// Frame column holding this field; distinct from every group key column
    fn column_name(&self) -> &'static str {
        match self {
            Field::SaleAmount => "sale_amount",
            Field::Quantity => "quantity",
            Field::UnitPrice => "unit_price",
            Field::Customer => "buyer",
            Field::ProductCode => "sku",
        }
    }

    fn series(&self, records: &[&SalesRecord]) -> Series {
        let name = self.column_name();
        match self {
            Field::SaleAmount => Series::new(name, records.iter().map(|r| r.sale_amount).collect::<Vec<f64>>()),
            Field::Quantity => Series::new(
                name,
                records.iter().map(|r| r.quantity as f64).collect::<Vec<f64>>(),
            ),
            Field::UnitPrice => Series::new(name, records.iter().map(|r| r.unit_price).collect::<Vec<f64>>()),
            Field::Customer => Series::new(
                name,
                records.iter().map(|r| r.customer_name.as_str()).collect::<Vec<&str>>(),
            ),
            Field::ProductCode => Series::new(
                name,
                records.iter().map(|r| r.product_code.as_str()).collect::<Vec<&str>>(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Mean,
    CountDistinct,
}

/// A named reduction of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    pub name: &'static str,
    pub field: Field,
    pub reducer: Reducer,
}

impl Metric {
    pub const fn sum(name: &'static str, field: Field) -> Self {
        Self {
            name,
            field,
            reducer: Reducer::Sum,
        }
    }

    pub const fn mean(name: &'static str, field: Field) -> Self {
        Self {
            name,
            field,
            reducer: Reducer::Mean,
        }
    }

    pub const fn count_distinct(name: &'static str, field: Field) -> Self {
        Self {
            name,
            field,
            reducer: Reducer::CountDistinct,
        }
    }

    fn expr(&self) -> Expr {
        let field = col(self.field.column_name());
        match self.reducer {
            Reducer::Sum => field.sum(),
            Reducer::Mean => field.mean(),
            Reducer::CountDistinct => field.n_unique(),
        }
        .alias(self.name)
    }
}

pub const TOTAL_SALES: Metric = Metric::sum("total_sales", Field::SaleAmount);
pub const TOTAL_QUANTITY: Metric = Metric::sum("total_quantity", Field::Quantity);
pub const AVG_UNIT_PRICE: Metric = Metric::mean("avg_unit_price", Field::UnitPrice);
pub const CUSTOMER_COUNT: Metric = Metric::count_distinct("customer_count", Field::Customer);
pub const PRODUCT_COUNT: Metric = Metric::count_distinct("product_count", Field::ProductCode);

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub keys: Vec<String>,
    pub values: Vec<f64>,
}

impl AggregateRow {
    pub fn key(&self, index: usize) -> &str {
        self.keys.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Output of [`aggregate`]: one row per group
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTable {
    pub key_columns: Vec<&'static str>,
    pub metric_names: Vec<&'static str>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    fn metric_index(&self, metric: &str) -> Option<usize> {
        self.metric_names.iter().position(|name| *name == metric)
    }

    /// Value of `metric` in `row`; 0 for unknown metrics
    pub fn get(&self, row: &AggregateRow, metric: &str) -> f64 {
        self.metric_index(metric)
            .and_then(|i| row.values.get(i).copied())
            .unwrap_or(0.0)
    }

    /// Sum of a metric across all groups
    pub fn total(&self, metric: &str) -> f64 {
        self.rows.iter().map(|row| self.get(row, metric)).sum()
    }

    /// Row whose keys equal `keys`
    pub fn find(&self, keys: &[&str]) -> Option<&AggregateRow> {
        self.rows
            .iter()
            .find(|row| row.keys.len() == keys.len() && row.keys.iter().zip(keys).all(|(a, b)| a == b))
    }

    /// Stable descending sort on a metric
    pub fn sort_desc(mut self, metric: &str) -> Self {
        if let Some(index) = self.metric_index(metric) {
            self.rows.sort_by(|a, b| {
                b.values[index]
                    .partial_cmp(&a.values[index])
                    .unwrap_or(Ordering::Equal)
            });
        }
        self
    }

    /// Ascending sort on the group keys
    pub fn sort_by_keys(mut self) -> Self {
        self.rows.sort_by(|a, b| a.keys.cmp(&b.keys));
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Group `table` by `keys` and reduce each group with `metrics`.
///
/// With no keys the whole table is one group, so an empty table still yields
/// a single all-zero row. With keys, an empty table yields no rows. The mean
/// of an empty group is 0.
pub fn aggregate(table: &SalesTable, keys: &[GroupKey], metrics: &[Metric]) -> AggregateTable {
    let mut rows = match grouped_rows(table, keys, metrics) {
        Ok(rows) => rows,
        Err(err) => {
            log::error!("aggregation by {:?} failed: {}", keys, err);
            Vec::new()
        }
    };
    if keys.is_empty() && rows.is_empty() {
        rows.push(AggregateRow {
            keys: Vec::new(),
            values: vec![0.0; metrics.len()],
        });
    }

    AggregateTable {
        key_columns: keys.iter().map(GroupKey::column_name).collect(),
        metric_names: metrics.iter().map(|m| m.name).collect(),
        rows,
    }
}

fn grouped_rows(
    table: &SalesTable,
    keys: &[GroupKey],
    metrics: &[Metric],
) -> PolarsResult<Vec<AggregateRow>> {
    if metrics.is_empty() && keys.is_empty() {
        return Ok(Vec::new());
    }

    // Rows missing any key value (an unparsed month) belong to no group
    let mut records = Vec::with_capacity(table.len());
    let mut key_values: Vec<Vec<String>> = vec![Vec::with_capacity(table.len()); keys.len()];
    for record in table.iter() {
        let values: Option<Vec<String>> = keys.iter().map(|k| k.value(record)).collect();
        if let Some(values) = values {
            for (column, value) in key_values.iter_mut().zip(values) {
                column.push(value);
            }
            records.push(record);
        }
    }

    let mut columns: Vec<Series> = keys
        .iter()
        .zip(&key_values)
        .map(|(key, values)| Series::new(key.column_name(), values))
        .collect();
    let mut fields: Vec<Field> = Vec::new();
    for metric in metrics {
        if !fields.contains(&metric.field) {
            fields.push(metric.field);
            columns.push(metric.field.series(&records));
        }
    }

    let exprs: Vec<Expr> = metrics.iter().map(Metric::expr).collect();
    let frame = DataFrame::new(columns)?.lazy();
    let out = if keys.is_empty() {
        frame.select(exprs).collect()?
    } else {
        let by: Vec<Expr> = keys.iter().map(|k| col(k.column_name())).collect();
        frame.group_by_stable(by).agg(exprs).collect()?
    };

    let group_columns = keys
        .iter()
        .map(|k| text_values(&out, k.column_name()))
        .collect::<PolarsResult<Vec<_>>>()?;
    let metric_columns = metrics
        .iter()
        .map(|m| number_values(&out, m.name))
        .collect::<PolarsResult<Vec<_>>>()?;

    Ok((0..out.height())
        .map(|i| AggregateRow {
            keys: group_columns.iter().map(|c| c[i].clone()).collect(),
            values: metric_columns.iter().map(|c| c[i]).collect(),
        })
        .collect())
}

fn text_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    let series = df.column(name)?.cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Numeric output column as f64; nulls (mean of nothing) read as 0
fn number_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

/// First-seen display name for each product code
pub fn display_names(table: &SalesTable) -> HashMap<String, String> {
    let mut names = HashMap::new();
    for record in table.iter() {
        names
            .entry(record.product_code.clone())
            .or_insert_with(|| record.simplified_product_name.clone());
    }
    names
}

/// Sales per region, largest first
pub fn region_sales(table: &SalesTable) -> AggregateTable {
    aggregate(table, &[GroupKey::Region], &[TOTAL_SALES]).sort_desc(TOTAL_SALES.name)
}

/// Sales per packaging type, largest first
pub fn packaging_sales(table: &SalesTable) -> AggregateTable {
    aggregate(table, &[GroupKey::Packaging], &[TOTAL_SALES]).sort_desc(TOTAL_SALES.name)
}

/// Sales, customers served and product variety per applicant, largest sales first
pub fn applicant_performance(table: &SalesTable) -> AggregateTable {
    aggregate(
        table,
        &[GroupKey::Applicant],
        &[
            TOTAL_SALES,
            Metric::count_distinct("customers_served", Field::Customer),
            Metric::count_distinct("product_variety", Field::ProductCode),
        ],
    )
    .sort_desc(TOTAL_SALES.name)
}

/// Sales per region and product code, largest first
pub fn region_product_sales(table: &SalesTable) -> AggregateTable {
    aggregate(table, &[GroupKey::Region, GroupKey::ProductCode], &[TOTAL_SALES])
        .sort_desc(TOTAL_SALES.name)
}

/// Sales and active customers per calendar month, in month order
pub fn monthly_sales(table: &SalesTable) -> Result<AggregateTable, AnalysisError> {
    if !table.ship_month_parsed {
        return Err(AnalysisError::ShipMonthUnparsed);
    }
    Ok(aggregate(table, &[GroupKey::Month], &[TOTAL_SALES, CUSTOMER_COUNT]).sort_by_keys())
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionSummaryRow {
    pub region: String,
    pub total_sales: f64,
    pub customer_count: usize,
    pub product_count: usize,
    pub total_quantity: i64,
}

/// Region rollup for export, ordered by region name
pub fn region_summary(table: &SalesTable) -> Vec<RegionSummaryRow> {
    let agg = aggregate(
        table,
        &[GroupKey::Region],
        &[TOTAL_SALES, CUSTOMER_COUNT, PRODUCT_COUNT, TOTAL_QUANTITY],
    )
    .sort_by_keys();

    agg.rows
        .iter()
        .map(|row| RegionSummaryRow {
            region: row.key(0).to_string(),
            total_sales: agg.get(row, TOTAL_SALES.name),
            customer_count: agg.get(row, CUSTOMER_COUNT.name) as usize,
            product_count: agg.get(row, PRODUCT_COUNT.name) as usize,
            total_quantity: agg.get(row, TOTAL_QUANTITY.name) as i64,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummaryRow {
    pub product_code: String,
    pub display_name: String,
    pub total_sales: f64,
    pub buyer_count: usize,
    pub total_quantity: i64,
}

/// Product rollup keyed by product code, largest sales first
pub fn product_summary(table: &SalesTable) -> Vec<ProductSummaryRow> {
    let names = display_names(table);
    let agg = aggregate(
        table,
        &[GroupKey::ProductCode],
        &[TOTAL_SALES, CUSTOMER_COUNT, TOTAL_QUANTITY],
    )
    .sort_desc(TOTAL_SALES.name);

    agg.rows
        .iter()
        .map(|row| {
            let code = row.key(0);
            ProductSummaryRow {
                product_code: code.to_string(),
                display_name: names.get(code).cloned().unwrap_or_else(|| code.to_string()),
                total_sales: agg.get(row, TOTAL_SALES.name),
                buyer_count: agg.get(row, CUSTOMER_COUNT.name) as usize,
                total_quantity: agg.get(row, TOTAL_QUANTITY.name) as i64,
            }
        })
        .collect()
}

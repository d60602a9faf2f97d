//! Sales record loading and normalization using Polars

use crate::error::{LoadError, LoadWarning};
use crate::extract::{classify_packaging, simplify_product_name, PackagingType};
use crate::sample::sample_table;
use chrono::NaiveDate;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::Path;

pub const COL_CUSTOMER: &str = "customer";
pub const COL_REGION: &str = "region";
pub const COL_SHIP_MONTH: &str = "ship_month";
pub const COL_APPLICANT: &str = "applicant";
pub const COL_PRODUCT_CODE: &str = "product_code";
pub const COL_PRODUCT_NAME: &str = "product_name";
pub const COL_ORDER_TYPE: &str = "order_type";
pub const COL_UNIT_PRICE: &str = "unit_price";
pub const COL_QUANTITY: &str = "quantity";

/// Columns every input sheet must carry, matched by name
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_CUSTOMER,
    COL_REGION,
    COL_SHIP_MONTH,
    COL_APPLICANT,
    COL_PRODUCT_CODE,
    COL_PRODUCT_NAME,
    COL_ORDER_TYPE,
    COL_UNIT_PRICE,
    COL_QUANTITY,
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y-%m-%d %H:%M:%S"];
const MONTH_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// One normalized row of the sales sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub customer_name: String,
    pub region: String,
    /// Ship month exactly as it appeared in the input
    pub ship_month: String,
    /// Parsed ship date; `None` when the column did not parse as dates
    pub ship_date: Option<NaiveDate>,
    pub applicant: String,
    pub product_code: String,
    pub product_name: String,
    pub order_type: String,
    /// Price per case
    pub unit_price: f64,
    /// Quantity in cases
    pub quantity: i64,
    pub sale_amount: f64,
    pub simplified_product_name: String,
    pub packaging_type: PackagingType,
}

impl SalesRecord {
    /// Build a record from raw sheet values, deriving amount, display name and packaging
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_name: impl Into<String>,
        region: impl Into<String>,
        ship_month: impl Into<String>,
        applicant: impl Into<String>,
        product_code: impl Into<String>,
        product_name: impl Into<String>,
        order_type: impl Into<String>,
        unit_price: f64,
        quantity: i64,
    ) -> Self {
        let ship_month = ship_month.into();
        let product_code = product_code.into();
        let product_name = product_name.into();
        let simplified_product_name = simplify_product_name(&product_code, &product_name);
        let packaging_type = classify_packaging(&product_name);

        Self {
            customer_name: customer_name.into(),
            region: region.into(),
            ship_date: parse_ship_month(&ship_month),
            ship_month,
            applicant: applicant.into(),
            product_code,
            product_name,
            order_type: order_type.into(),
            unit_price,
            quantity,
            sale_amount: unit_price * quantity as f64,
            simplified_product_name,
            packaging_type,
        }
    }

    /// Calendar month bucket (`YYYY-MM`) of the parsed ship date
    pub fn month_key(&self) -> Option<String> {
        self.ship_date.map(|d| d.format("%Y-%m").to_string())
    }
}

/// Normalized sales table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesTable {
    pub records: Vec<SalesRecord>,
    /// True only when every row's ship_month parsed as a date
    pub ship_month_parsed: bool,
}

impl SalesTable {
    /// Build a table, deciding date parsing for the column as a whole
    pub fn from_records(mut records: Vec<SalesRecord>) -> Self {
        let ship_month_parsed = records.iter().all(|r| r.ship_date.is_some());
        if !ship_month_parsed {
            for record in &mut records {
                record.ship_date = None;
            }
        }
        Self {
            records,
            ship_month_parsed,
        }
    }

    /// Keep the rows matching `predicate`; the date flag carries over
    pub fn retain_where<F>(&self, predicate: F) -> Self
    where
        F: Fn(&SalesRecord) -> bool,
    {
        Self {
            records: self.records.iter().filter(|r| predicate(r)).cloned().collect(),
            ship_month_parsed: self.ship_month_parsed,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }

    pub fn total_sales(&self) -> f64 {
        self.records.iter().map(|r| r.sale_amount).sum()
    }

    pub fn distinct_customers(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.customer_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn distinct_products(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.product_code.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Product codes counted as new for the reporting period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductSet {
    codes: Vec<String>,
}

impl NewProductSet {
    /// Build the set, dropping duplicates while keeping configured order
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for code in codes {
            let code = code.into();
            if !unique.contains(&code) {
                unique.push(code);
            }
        }
        Self { codes: unique }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Where the loaded table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    File,
    Sample,
}

/// Result of a soft-failing load
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub table: SalesTable,
    pub origin: DataOrigin,
    pub warnings: Vec<LoadWarning>,
}

impl LoadOutcome {
    fn sample(warning: LoadWarning) -> Self {
        log::warn!("{}", warning);
        Self {
            table: sample_table(),
            origin: DataOrigin::Sample,
            warnings: vec![warning],
        }
    }
}

/// Load a sales sheet from a file path.
///
/// Never fails: a missing or unusable file yields the built-in sample data
/// together with a warning explaining why.
pub fn load_path(path: &Path) -> LoadOutcome {
    if !path.exists() {
        return LoadOutcome::sample(LoadWarning::FileNotFound(path.to_path_buf()));
    }
    match std::fs::read(path) {
        Ok(bytes) => load_bytes(&bytes),
        Err(err) => LoadOutcome::sample(LoadError::Io(err).into()),
    }
}

/// Load a sales sheet from any reader, with the same fallback as [`load_path`]
pub fn load_reader<R: Read>(mut reader: R) -> LoadOutcome {
    let mut bytes = Vec::new();
    match reader.read_to_end(&mut bytes) {
        Ok(_) => load_bytes(&bytes),
        Err(err) => LoadOutcome::sample(LoadError::Io(err).into()),
    }
}

/// Load a sales sheet from raw CSV bytes
pub fn load_bytes(bytes: &[u8]) -> LoadOutcome {
    match read_sheet(bytes) {
        Ok((table, warnings)) => {
            for warning in &warnings {
                log::warn!("{}", warning);
            }
            log::debug!("loaded {} sales records", table.len());
            LoadOutcome {
                table,
                origin: DataOrigin::File,
                warnings,
            }
        }
        Err(err) => LoadOutcome::sample(err.into()),
    }
}

/// Strict sheet reader: schema errors are returned, value-level problems are warnings.
///
/// Every column is read as text so codes like `0110` keep their leading zero
/// and a late non-numeric value cannot fail the whole sheet.
fn read_sheet(bytes: &[u8]) -> Result<(SalesTable, Vec<LoadWarning>), LoadError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()?;

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| df.column(name).is_err())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    let mut warnings = Vec::new();

    let customers = text_column(&df, COL_CUSTOMER)?;
    let regions = text_column(&df, COL_REGION)?;
    let ship_months = text_column(&df, COL_SHIP_MONTH)?;
    let applicants = text_column(&df, COL_APPLICANT)?;
    let codes = text_column(&df, COL_PRODUCT_CODE)?;
    let names = text_column(&df, COL_PRODUCT_NAME)?;
    let order_types = text_column(&df, COL_ORDER_TYPE)?;
    let prices = numeric_column(&df, COL_UNIT_PRICE, false, &mut warnings)?;
    let quantities = numeric_column(&df, COL_QUANTITY, true, &mut warnings)?;

    let records: Vec<SalesRecord> = (0..df.height())
        .map(|i| {
            SalesRecord::new(
                customers[i].clone(),
                regions[i].clone(),
                ship_months[i].clone(),
                applicants[i].clone(),
                codes[i].clone(),
                names[i].clone(),
                order_types[i].clone(),
                prices[i],
                // integral by construction
                quantities[i] as i64,
            )
        })
        .collect();

    if let Some(bad) = records.iter().find(|r| r.ship_date.is_none()) {
        warnings.push(LoadWarning::UnparsedShipMonth(bad.ship_month.clone()));
    }

    Ok((SalesTable::from_records(records), warnings))
}

/// Read a column as text; nulls become empty strings
fn text_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    let series = df.column(name)?.cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|value| value.unwrap_or_default().trim().to_string())
        .collect())
}

/// Parse a text column cell by cell. Empty cells, unparseable values and,
/// when `integral` is set, fractional values become 0 with a warning.
fn numeric_column(
    df: &DataFrame,
    name: &'static str,
    integral: bool,
    warnings: &mut Vec<LoadWarning>,
) -> PolarsResult<Vec<f64>> {
    let series = df.column(name)?.cast(&DataType::String)?;
    let mut nulls = 0;
    let mut invalid: Vec<String> = Vec::new();

    let values: Vec<f64> = series
        .str()?
        .into_iter()
        .map(|cell| {
            let raw = cell.unwrap_or_default().trim();
            if raw.is_empty() {
                nulls += 1;
                return 0.0;
            }
            match raw.parse::<f64>() {
                Ok(value) if value.is_finite() && (!integral || value.fract() == 0.0) => value,
                _ => {
                    invalid.push(raw.to_string());
                    0.0
                }
            }
        })
        .collect();

    if nulls > 0 {
        warnings.push(LoadWarning::NullNumeric {
            column: name,
            count: nulls,
        });
    }
    if let Some(first) = invalid.first() {
        warnings.push(LoadWarning::InvalidNumeric {
            column: name,
            count: invalid.len(),
            first: first.clone(),
        });
    }
    Ok(values)
}

/// Parse a ship month as a full date or as a bare `YYYY-MM` month
pub fn parse_ship_month(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    let first_of_month = format!("{}-01", raw.replace('/', "-"));
    MONTH_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&first_of_month, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "customer,region,ship_month,applicant,product_code,product_name,order_type,unit_price,quantity";

    fn create_test_csv(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file
    }

    #[test]
    fn test_load_computes_derived_fields() {
        let file = create_test_csv(&[
            "Acme,East,2025-03,Lee,F0104L,Kouli Pizza 68G Bag-China,Order-Regular,126.72,50",
            "Acme,East,2025-04-15,Lee,F0110C,Kouli Gummy New B-China,Order-Regular,150,0",
        ]);

        let outcome = load_path(file.path());
        assert_eq!(outcome.origin, DataOrigin::File);
        assert!(outcome.warnings.is_empty());

        let table = outcome.table;
        assert_eq!(table.len(), 2);
        assert!(table.ship_month_parsed);

        let first = &table.records[0];
        assert_eq!(first.sale_amount, 126.72 * 50.0);
        assert_eq!(first.packaging_type, PackagingType::Bag);
        assert_eq!(first.simplified_product_name, "Pizza (F0104L)");
        assert_eq!(first.month_key().as_deref(), Some("2025-03"));

        let second = &table.records[1];
        assert_eq!(second.sale_amount, 0.0);
        assert_eq!(second.month_key().as_deref(), Some("2025-04"));
    }

    #[test]
    fn test_missing_columns_fall_back_to_sample() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "customer,region,unit_price").unwrap();
        writeln!(file, "Acme,East,10").unwrap();

        let outcome = load_path(file.path());
        assert_eq!(outcome.origin, DataOrigin::Sample);
        assert_eq!(outcome.table.len(), 16);
        match &outcome.warnings[0] {
            LoadWarning::MissingColumns(cols) => {
                assert!(cols.contains(&"ship_month".to_string()));
                assert!(cols.contains(&"quantity".to_string()));
                assert!(!cols.contains(&"region".to_string()));
            }
            other => panic!("unexpected warning: {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_sample() {
        let outcome = load_path(Path::new("/definitely/not/here.csv"));
        assert_eq!(outcome.origin, DataOrigin::Sample);
        assert!(matches!(outcome.warnings[0], LoadWarning::FileNotFound(_)));
    }

    #[test]
    fn test_unparsed_ship_month_degrades() {
        let file = create_test_csv(&[
            "Acme,East,2025-03,Lee,F0104L,Kouli Pizza 68G Bag-China,Order-Regular,10,1",
            "Acme,East,Q1 launch,Lee,F0110C,Kouli Gummy New B-China,Order-Regular,10,2",
        ]);

        let outcome = load_path(file.path());
        assert_eq!(outcome.origin, DataOrigin::File);
        assert!(!outcome.table.ship_month_parsed);
        assert!(outcome.table.records.iter().all(|r| r.ship_date.is_none()));
        assert_eq!(outcome.table.records[1].ship_month, "Q1 launch");
        assert!(outcome
            .warnings
            .contains(&LoadWarning::UnparsedShipMonth("Q1 launch".to_string())));
    }

    #[test]
    fn test_null_numeric_is_zero_with_warning() {
        let file = create_test_csv(&[
            "Acme,East,2025-03,Lee,F0104L,Kouli Pizza 68G Bag-China,Order-Regular,,4",
            "Acme,East,2025-03,Lee,F0104L,Kouli Pizza 68G Bag-China,Order-Regular,2.5,4",
        ]);

        let outcome = load_path(file.path());
        assert_eq!(outcome.table.records[0].sale_amount, 0.0);
        assert_eq!(outcome.table.records[1].sale_amount, 10.0);
        assert!(outcome.warnings.contains(&LoadWarning::NullNumeric {
            column: COL_UNIT_PRICE,
            count: 1,
        }));
    }

    #[test]
    fn test_late_alphanumeric_code_keeps_file() {
        let mut rows: Vec<String> = (1000..1150)
            .map(|code| format!("Acme,East,2025-03,Lee,{},Kouli Gummy-China,Order-Regular,10,1", code))
            .collect();
        rows.push("Acme,East,2025-03,Lee,F0110C,Kouli Gummy New B-China,Order-Regular,10,1".to_string());
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();

        let outcome = load_path(create_test_csv(&refs).path());
        assert_eq!(outcome.origin, DataOrigin::File);
        assert_eq!(outcome.table.len(), 151);
        assert_eq!(outcome.table.records[150].product_code, "F0110C");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_leading_zero_code_preserved() {
        let file = create_test_csv(&["Acme,East,2025-03,Lee,0110,Kouli Gummy-China,Order-Regular,10,1"]);
        let outcome = load_path(file.path());
        assert_eq!(outcome.table.records[0].product_code, "0110");
        assert!(NewProductSet::new(["0110"]).contains(&outcome.table.records[0].product_code));
    }

    #[test]
    fn test_fractional_quantity_rejected_with_warning() {
        let mut rows: Vec<String> = (0..150)
            .map(|_| "Acme,East,2025-03,Lee,F0104L,Kouli Pizza 68G Bag-China,Order-Regular,10,1".to_string())
            .collect();
        rows.push("Acme,East,2025-03,Lee,F0104L,Kouli Pizza 68G Bag-China,Order-Regular,10,2.5".to_string());
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();

        let outcome = load_path(create_test_csv(&refs).path());
        assert_eq!(outcome.origin, DataOrigin::File);
        assert_eq!(outcome.table.len(), 151);

        let last = &outcome.table.records[150];
        assert_eq!(last.quantity, 0);
        assert_eq!(last.sale_amount, last.unit_price * last.quantity as f64);
        assert!(outcome
            .table
            .iter()
            .all(|r| r.sale_amount == r.unit_price * r.quantity as f64));
        assert_eq!(
            outcome.warnings,
            vec![LoadWarning::InvalidNumeric {
                column: COL_QUANTITY,
                count: 1,
                first: "2.5".to_string(),
            }]
        );
    }

    #[test]
    fn test_unparseable_price_is_zero_with_warning() {
        let file = create_test_csv(&[
            "Acme,East,2025-03,Lee,F0104L,Kouli Pizza 68G Bag-China,Order-Regular,n/a,4",
        ]);
        let outcome = load_path(file.path());
        assert_eq!(outcome.origin, DataOrigin::File);
        assert_eq!(outcome.table.records[0].sale_amount, 0.0);
        assert!(matches!(
            outcome.warnings[0],
            LoadWarning::InvalidNumeric { column: COL_UNIT_PRICE, count: 1, .. }
        ));
    }

    #[test]
    fn test_load_is_repeatable() {
        let file = create_test_csv(&[
            "Acme,East,2025-03,Lee,F0104L,Kouli Pizza 68G Bag-China,Order-Regular,126.72,50",
        ]);
        let first = load_path(file.path()).table;
        let second = load_path(file.path()).table;
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_ship_month_formats() {
        let march = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert_eq!(parse_ship_month("2025-03"), march);
        assert_eq!(parse_ship_month("2025/03"), march);
        assert_eq!(parse_ship_month("2025-03-01"), march);
        assert_eq!(parse_ship_month("2025-03-01 00:00:00"), march);
        assert_eq!(parse_ship_month("March"), None);
        assert_eq!(parse_ship_month(""), None);
    }

    #[test]
    fn test_new_product_set_dedupes() {
        let set = NewProductSet::new(["A", "B", "A"]);
        assert_eq!(set.codes(), &["A".to_string(), "B".to_string()]);
        assert!(set.contains("B"));
        assert!(!set.contains("C"));
    }
}

//! Multi-sheet export of the filtered data and its summaries

use crate::aggregate::{product_summary, region_summary};
use crate::data::SalesTable;
use crate::filter::FilteredDataset;
use polars::prelude::*;
use std::path::{Path, PathBuf};

pub const SHEET_SALES: &str = "sales_records";
pub const SHEET_NEW_PRODUCTS: &str = "new_product_records";
pub const SHEET_REGIONS: &str = "region_summary";
pub const SHEET_PRODUCTS: &str = "product_summary";

/// One rendered sheet
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub csv: Vec<u8>,
}

/// All sheets of one export, in workbook order
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    pub sheets: Vec<Sheet>,
}

impl ExportBundle {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Write every sheet as `<dir>/<sheet>.csv`, returning the written paths
    pub fn write_to_dir(&self, dir: &Path) -> crate::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.sheets.len());
        for sheet in &self.sheets {
            let path = dir.join(format!("{}.csv", sheet.name));
            std::fs::write(&path, &sheet.csv)
                .map_err(|e| anyhow::anyhow!("Failed to write '{}': {}", path.display(), e))?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Render the four export sheets for a filtered dataset
pub fn build_export(dataset: &FilteredDataset) -> crate::Result<ExportBundle> {
    let sheets = vec![
        Sheet {
            name: SHEET_SALES,
            csv: to_csv(records_frame(&dataset.table)?)?,
        },
        Sheet {
            name: SHEET_NEW_PRODUCTS,
            csv: to_csv(records_frame(&dataset.new_products)?)?,
        },
        Sheet {
            name: SHEET_REGIONS,
            csv: to_csv(region_frame(&dataset.table)?)?,
        },
        Sheet {
            name: SHEET_PRODUCTS,
            csv: to_csv(product_frame(&dataset.table)?)?,
        },
    ];
    log::debug!("rendered {} export sheets", sheets.len());
    Ok(ExportBundle { sheets })
}

fn records_frame(table: &SalesTable) -> PolarsResult<DataFrame> {
    let text = |f: fn(&crate::data::SalesRecord) -> &str| -> Vec<String> {
        table.iter().map(|r| f(r).to_string()).collect()
    };

    DataFrame::new(vec![
        Series::new("customer", text(|r| r.customer_name.as_str())),
        Series::new("region", text(|r| r.region.as_str())),
        Series::new("ship_month", text(|r| r.ship_month.as_str())),
        Series::new("applicant", text(|r| r.applicant.as_str())),
        Series::new("product_code", text(|r| r.product_code.as_str())),
        Series::new("product_name", text(|r| r.product_name.as_str())),
        Series::new("order_type", text(|r| r.order_type.as_str())),
        Series::new(
            "unit_price",
            table.iter().map(|r| r.unit_price).collect::<Vec<f64>>(),
        ),
        Series::new(
            "quantity",
            table.iter().map(|r| r.quantity).collect::<Vec<i64>>(),
        ),
        Series::new(
            "sale_amount",
            table.iter().map(|r| r.sale_amount).collect::<Vec<f64>>(),
        ),
        Series::new(
            "simplified_product_name",
            text(|r| r.simplified_product_name.as_str()),
        ),
        Series::new("packaging_type", text(|r| r.packaging_type.label())),
    ])
}

fn region_frame(table: &SalesTable) -> PolarsResult<DataFrame> {
    let rows = region_summary(table);
    DataFrame::new(vec![
        Series::new("region", rows.iter().map(|r| r.region.clone()).collect::<Vec<_>>()),
        Series::new("total_sales", rows.iter().map(|r| r.total_sales).collect::<Vec<f64>>()),
        Series::new(
            "customer_count",
            rows.iter().map(|r| r.customer_count as u32).collect::<Vec<u32>>(),
        ),
        Series::new(
            "product_count",
            rows.iter().map(|r| r.product_count as u32).collect::<Vec<u32>>(),
        ),
        Series::new(
            "total_quantity",
            rows.iter().map(|r| r.total_quantity).collect::<Vec<i64>>(),
        ),
    ])
}

fn product_frame(table: &SalesTable) -> PolarsResult<DataFrame> {
    let rows = product_summary(table);
    DataFrame::new(vec![
        Series::new(
            "product_code",
            rows.iter().map(|r| r.product_code.clone()).collect::<Vec<_>>(),
        ),
        Series::new(
            "display_name",
            rows.iter().map(|r| r.display_name.clone()).collect::<Vec<_>>(),
        ),
        Series::new("total_sales", rows.iter().map(|r| r.total_sales).collect::<Vec<f64>>()),
        Series::new(
            "buyer_count",
            rows.iter().map(|r| r.buyer_count as u32).collect::<Vec<u32>>(),
        ),
        Series::new(
            "total_quantity",
            rows.iter().map(|r| r.total_quantity).collect::<Vec<i64>>(),
        ),
    ])
}

fn to_csv(mut df: DataFrame) -> PolarsResult<Vec<u8>> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).include_header(true).finish(&mut df)?;
    Ok(buf)
}

/// Format an amount with thousands separators and two decimals, e.g. `1,234,567.89`
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NewProductSet;
    use crate::filter::Filters;
    use crate::sample::sample_table;
    use tempfile::tempdir;

    fn sample_dataset(filters: &Filters) -> FilteredDataset {
        FilteredDataset::new(
            &sample_table(),
            filters,
            &NewProductSet::new(["F0110C", "F0183F", "F01K8A", "F0183K", "F0101P"]),
        )
    }

    fn lines(sheet: &Sheet) -> Vec<String> {
        String::from_utf8(sheet.csv.clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_sheet_columns() {
        let bundle = build_export(&sample_dataset(&Filters::new())).unwrap();
        assert_eq!(bundle.sheets.len(), 4);

        let regions = lines(bundle.sheet(SHEET_REGIONS).unwrap());
        assert_eq!(
            regions[0],
            "region,total_sales,customer_count,product_count,total_quantity"
        );
        assert_eq!(regions.len(), 6);

        let products = lines(bundle.sheet(SHEET_PRODUCTS).unwrap());
        assert_eq!(
            products[0],
            "product_code,display_name,total_sales,buyer_count,total_quantity"
        );
        // F3411A carries the largest scaled amount in the sample
        assert!(products[1].starts_with("F3411A,Lunch Bag (F3411A),"));

        let sales = lines(bundle.sheet(SHEET_SALES).unwrap());
        assert_eq!(sales.len(), 17);
        assert!(sales[0].ends_with("sale_amount,simplified_product_name,packaging_type"));

        let new_rows = lines(bundle.sheet(SHEET_NEW_PRODUCTS).unwrap());
        assert_eq!(new_rows.len(), 6);
    }

    #[test]
    fn test_empty_dataset_exports_headers_only() {
        let bundle = build_export(&sample_dataset(&Filters::new().with_regions(["Atlantis"]))).unwrap();
        for sheet in &bundle.sheets {
            assert_eq!(lines(sheet).len(), 1, "sheet {} should be header only", sheet.name);
        }
    }

    #[test]
    fn test_write_to_dir() {
        let bundle = build_export(&sample_dataset(&Filters::new())).unwrap();
        let dir = tempdir().unwrap();
        let written = bundle.write_to_dir(&dir.path().join("report")).unwrap();
        assert_eq!(written.len(), 4);
        assert!(written.iter().all(|p| p.exists()));
        assert!(dir.path().join("report").join("product_summary.csv").exists());
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(0.0), "0.00");
        assert_eq!(format_grouped(999.999), "1,000.00");
        assert_eq!(format_grouped(393090.048), "393,090.05");
        assert_eq!(format_grouped(1234567.891), "1,234,567.89");
        assert_eq!(format_grouped(-1500.5), "-1,500.50");
    }
}

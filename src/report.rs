//! Console rendering of the five dashboard sections.
//!
//! Each section has a plain KPI struct computed from a [`FilteredDataset`]
//! and a `print_*` function that writes it to stdout. Sections that cannot be
//! computed for the current data print a single informational line instead.

use crate::aggregate::{
    aggregate, applicant_performance, display_names, packaging_sales, product_summary,
    region_product_sales, region_sales, AVG_UNIT_PRICE, TOTAL_SALES,
};
use crate::cooccur::{
    key_product_matrix, new_product_pairings, BasketStats, CoOccurrenceMatrix, IncidenceMatrix,
};
use crate::export::format_grouped;
use crate::filter::FilteredDataset;
use crate::penetration;
use crate::segment::{customer_features, segment_summary, top_acceptance};

/// Headline figures of the filtered table
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewKpis {
    pub total_sales: f64,
    pub customer_count: usize,
    pub product_count: usize,
    pub avg_unit_price: f64,
}

impl OverviewKpis {
    pub fn compute(dataset: &FilteredDataset) -> Self {
        let whole = aggregate(&dataset.table, &[], &[AVG_UNIT_PRICE]);
        Self {
            total_sales: dataset.table.total_sales(),
            customer_count: dataset.table.distinct_customers(),
            product_count: dataset.table.distinct_products(),
            avg_unit_price: whole.total(AVG_UNIT_PRICE.name),
        }
    }
}

/// Headline figures of the new-product subset
#[derive(Debug, Clone, PartialEq)]
pub struct NewProductKpis {
    pub new_product_sales: f64,
    /// Percent of total sales; 0 when there are no sales
    pub sales_share: f64,
    pub buyer_count: usize,
    pub product_count: usize,
}

impl NewProductKpis {
    pub fn compute(dataset: &FilteredDataset) -> Self {
        let new_product_sales = dataset.new_products.total_sales();
        let total = dataset.table.total_sales();
        Self {
            new_product_sales,
            sales_share: if total > 0.0 {
                new_product_sales / total * 100.0
            } else {
                0.0
            },
            buyer_count: dataset.new_products.distinct_customers(),
            product_count: dataset.new_products.distinct_products(),
        }
    }
}

fn share(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

fn heading(title: &str) {
    println!("\n=== {} ===", title);
}

/// Sales overview: KPIs, region and packaging rankings, applicant performance
pub fn print_overview(dataset: &FilteredDataset) {
    heading("Sales Overview");
    let kpis = OverviewKpis::compute(dataset);
    println!("Total sales:      {}", format_grouped(kpis.total_sales));
    println!("Customers:        {}", kpis.customer_count);
    println!("Products:         {}", kpis.product_count);
    println!("Avg unit price:   {}", format_grouped(kpis.avg_unit_price));

    if dataset.is_empty() {
        println!("No sales match the current filters.");
        return;
    }

    println!("\nSales by region:");
    let regions = region_sales(&dataset.table);
    for (rank, row) in regions.rows.iter().enumerate() {
        let sales = regions.get(row, TOTAL_SALES.name);
        println!(
            "  {}. {:<12} {:>16}  ({:.1}%)",
            rank + 1,
            row.key(0),
            format_grouped(sales),
            share(sales, kpis.total_sales)
        );
    }

    println!("\nSales by packaging:");
    let packaging = packaging_sales(&dataset.table);
    for row in &packaging.rows {
        let sales = packaging.get(row, TOTAL_SALES.name);
        println!(
            "  {:<16} {:>16}  ({:.1}%)",
            row.key(0),
            format_grouped(sales),
            share(sales, kpis.total_sales)
        );
    }

    println!("\nApplicant performance:");
    let applicants = applicant_performance(&dataset.table);
    for row in &applicants.rows {
        println!(
            "  {:<16} {:>16}  customers: {}  products: {}",
            row.key(0),
            format_grouped(applicants.get(row, TOTAL_SALES.name)),
            applicants.get(row, "customers_served"),
            applicants.get(row, "product_variety")
        );
    }
}

/// New products: KPIs, per-product sales, region x product sales
pub fn print_new_products(dataset: &FilteredDataset) {
    heading("New Products");
    let kpis = NewProductKpis::compute(dataset);
    println!("New product sales: {}", format_grouped(kpis.new_product_sales));
    println!("Share of sales:    {:.2}%", kpis.sales_share);
    println!("Buyers:            {}", kpis.buyer_count);

    if dataset.new_products.is_empty() {
        println!("No new product sales in the current selection.");
        return;
    }

    println!("\nSales by new product:");
    for row in product_summary(&dataset.new_products) {
        println!(
            "  {:<28} {:>16}  buyers: {}",
            row.display_name,
            format_grouped(row.total_sales),
            row.buyer_count
        );
    }

    println!("\nSales by region and new product:");
    let names = display_names(&dataset.new_products);
    let by_region = region_product_sales(&dataset.new_products);
    for row in &by_region.rows {
        let code = row.key(1);
        println!(
            "  {:<12} {:<28} {:>16}",
            row.key(0),
            names.get(code).map(String::as_str).unwrap_or(code),
            format_grouped(by_region.get(row, TOTAL_SALES.name))
        );
    }
}

/// Customer segmentation: summary per segment and the top acceptance list
pub fn print_segmentation(dataset: &FilteredDataset, top_n: usize) {
    heading("Customer Segmentation");
    let features = customer_features(dataset);
    if features.is_empty() {
        println!("No customers match the current filters.");
        return;
    }

    for summary in segment_summary(&features) {
        println!(
            "  {:<13} customers: {:<4} avg sales: {:>14}  avg new-product ratio: {:.2}%",
            summary.segment.label(),
            summary.customer_count,
            format_grouped(summary.avg_total_sales),
            summary.avg_new_product_ratio
        );
    }

    println!("\nTop new-product acceptance:");
    for (rank, row) in top_acceptance(&features, top_n).iter().enumerate() {
        println!(
            "  {}. {:<24} {:>6.2}%  {:<13} sales: {}",
            rank + 1,
            row.customer_name,
            row.new_product_ratio,
            row.customer_segment.label(),
            format_grouped(row.total_sales)
        );
    }
}

/// Product mix: pairings of new products, key-product matrix, basket statistics
pub fn print_product_mix(dataset: &FilteredDataset, top_k: usize) {
    heading("Product Mix");
    let incidence = IncidenceMatrix::build(&dataset.table);
    let matrix = match CoOccurrenceMatrix::build(&dataset.table) {
        Ok(matrix) => matrix,
        Err(err) => {
            log::warn!("{}", err);
            println!("{}", err);
            return;
        }
    };

    println!("Frequent companions of new products:");
    let names = display_names(&dataset.table);
    let pairings = new_product_pairings(&matrix, &dataset.new_product_set, &names, top_k);
    if pairings.is_empty() {
        println!("  (no new product shares a basket with another product)");
    }
    for pairing in &pairings {
        println!(
            "  {:<28} + {:<28} {} customer(s)",
            pairing.new_name, pairing.partner_name, pairing.count
        );
    }

    match key_product_matrix(&matrix, &dataset.new_product_set, top_k) {
        Some(focus) => {
            println!("\nKey product co-occurrence:");
            print!("  {:>8}", "");
            for code in &focus.products {
                print!(" {:>8}", code);
            }
            println!();
            for (i, code) in focus.products.iter().enumerate() {
                print!("  {:>8}", code);
                for j in 0..focus.products.len() {
                    print!(" {:>8}", focus.counts[[i, j]]);
                }
                println!();
            }
        }
        None => println!("\nToo few key products for a focused matrix."),
    }

    let stats = BasketStats::from_incidence(&incidence, &dataset.new_product_set);
    println!("\nBasket statistics:");
    println!("  Customers:                     {}", stats.customer_count);
    println!(
        "  Avg products per customer:     {:.2}",
        stats.avg_products_per_customer
    );
    println!(
        "  Customers buying new products: {:.1}%",
        stats.new_product_customer_share
    );
    for (products, customers) in &stats.distribution {
        println!("  {:>3} product(s): {} customer(s)", products, customers);
    }
}

/// Market penetration overall, per region and per month
pub fn print_penetration(dataset: &FilteredDataset) {
    heading("Market Penetration");
    let overall = penetration::overall(dataset);
    println!(
        "Overall: {:.2}% ({} of {} customers), new product sales {}",
        overall.rate,
        overall.new_product_customers,
        overall.total_customers,
        format_grouped(overall.new_product_sales)
    );

    let regions = penetration::by_region(dataset);
    if !regions.is_empty() {
        println!("\nBy region:");
    }
    for row in &regions {
        println!(
            "  {:<12} {:>6.2}%  ({}/{})",
            row.group, row.rate, row.new_product_customers, row.total_customers
        );
    }

    match penetration::by_month(dataset) {
        Ok(months) => {
            if !months.is_empty() {
                println!("\nBy month:");
            }
            for row in &months {
                println!(
                    "  {}  {:>6.2}%  new product sales: {}",
                    row.group,
                    row.rate,
                    format_grouped(row.new_product_sales)
                );
            }
        }
        Err(err) => {
            log::warn!("{}", err);
            println!("{}", err);
        }
    }
}

/// Print every section in dashboard order
pub fn print_all(dataset: &FilteredDataset, top_k: usize, top_acceptance: usize) {
    print_overview(dataset);
    print_new_products(dataset);
    print_segmentation(dataset, top_acceptance);
    print_product_mix(dataset, top_k);
    print_penetration(dataset);
}

//! Built-in demonstration dataset used when no usable input is available

use crate::data::{SalesRecord, SalesTable};

const SHIP_MONTH: &str = "2025-03";
const ORDER_TYPE: &str = "Order-Regular";

/// Per-region multipliers applied to sale_amount so regions differ visibly
pub const REGION_FACTORS: [(&str, f64); 5] = [
    ("East", 5.2),
    ("South", 3.8),
    ("Central", 0.9),
    ("North", 1.6),
    ("West", 1.3),
];

// customer, region, applicant, product code, product name, unit price, quantity
const SAMPLE_ROWS: [(&str, &str, &str, &str, &str, f64, i64); 16] = [
    ("Guangzhou Jiacheng", "East", "Liang Hongze", "F3415D", "Kouli Sour Worms 250G Share Pack Bag-China", 121.44, 10),
    ("Guangzhou Jiacheng", "East", "Liang Hongze", "F3421D", "Kouli Cola Bottle 250G Share Pack Bag-China", 121.44, 10),
    ("Guangzhou Jiacheng", "East", "Liang Hongze", "F0104J", "Kouli Pizza XXL45G Box-China", 216.96, 20),
    ("Guangzhou Jiacheng", "East", "Liang Hongze", "F0104L", "Kouli Pizza 68G Bag-China", 126.72, 50),
    ("Guangzhou Jiacheng", "East", "Liang Hongze", "F3411A", "Kouli Lunch Bag 77G Bag-China", 137.04, 252),
    ("Guangzhou Jiacheng", "East", "Liang Hongze", "F01E4B", "Kouli Burger 108G Bag-China", 137.04, 204),
    ("Henan Tianfeng", "Central", "Hu Bin", "F01L4C", "Kouli Twist Worms 2KG Mini Pack-China", 127.2, 7),
    ("Henan Tianfeng", "Central", "Hu Bin", "F01C2P", "Kouli Byte Gummies 2KG Mini Pack-China", 127.2, 2),
    ("Henan Tianfeng", "Central", "Hu Bin", "F01E6D", "Kouli Watermelon 1.5KG Pocket Pack-China", 180.0, 6),
    ("Henan Tianfeng", "Central", "Hu Bin", "F3450B", "Kouli Rainbow Bears 1.5KG Pocket Pack-China", 180.0, 6),
    ("Henan Tianfeng", "Central", "Hu Bin", "F3415B", "Kouli Gummy New A-China", 180.0, 6),
    ("Guangzhou Jiacheng", "South", "Liang Hongze", "F0110C", "Kouli Gummy New B-China", 150.0, 30),
    ("Henan Tianfeng", "Central", "Hu Bin", "F0183F", "Kouli Gummy New C-China", 160.0, 20),
    ("Guangzhou Jiacheng", "North", "Liang Hongze", "F01K8A", "Kouli Gummy New D-China", 170.0, 15),
    ("Henan Tianfeng", "North", "Hu Bin", "F0183K", "Kouli Gummy New E-China", 180.0, 10),
    ("Guangzhou Jiacheng", "West", "Liang Hongze", "F0101P", "Kouli Gummy New F-China", 190.0, 5),
];

/// Multiplier for a region; regions without one keep their raw amount
pub fn region_factor(region: &str) -> f64 {
    REGION_FACTORS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

/// The fixed 16-row sample table.
///
/// Unlike loaded files, sale_amount here is `unit_price * quantity` scaled by
/// the row's region factor.
pub fn sample_table() -> SalesTable {
    let records = SAMPLE_ROWS
        .iter()
        .map(|&(customer, region, applicant, code, name, price, quantity)| {
            let mut record = SalesRecord::new(
                customer, region, SHIP_MONTH, applicant, code, name, ORDER_TYPE, price, quantity,
            );
            record.sale_amount *= region_factor(region);
            record
        })
        .collect();

    SalesTable::from_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PackagingType;

    #[test]
    fn test_sample_shape() {
        let table = sample_table();
        assert_eq!(table.len(), 16);
        assert!(table.ship_month_parsed);
        assert_eq!(table.distinct_customers(), 2);
        assert_eq!(table.distinct_products(), 16);
    }

    #[test]
    fn test_region_factor_applied() {
        let table = sample_table();
        let west = table.iter().find(|r| r.region == "West").unwrap();
        assert!((west.sale_amount - 190.0 * 5.0 * 1.3).abs() < 1e-9);
        assert_eq!(region_factor("Atlantis"), 1.0);
    }

    #[test]
    fn test_sample_derived_fields() {
        let table = sample_table();
        let cola = table.iter().find(|r| r.product_code == "F3421D").unwrap();
        assert_eq!(cola.packaging_type, PackagingType::ShareBag);
        assert_eq!(cola.simplified_product_name, "Cola Bottle (F3421D)");

        let watermelon = table.iter().find(|r| r.product_code == "F01E6D").unwrap();
        assert_eq!(watermelon.packaging_type, PackagingType::PocketPack);
    }
}

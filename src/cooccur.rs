//! Product co-occurrence across customers
//!
//! Purchases are first binarized into a customer x product incidence matrix,
//! so a customer counts once per product pair however many rows they have.

use crate::aggregate::{aggregate, GroupKey, TOTAL_SALES};
use crate::data::{NewProductSet, SalesTable};
use crate::error::AnalysisError;
use ndarray::{Array2, Axis};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Binary customer x product purchase matrix
#[derive(Debug, Clone, PartialEq)]
pub struct IncidenceMatrix {
    /// Row labels, sorted
    pub customers: Vec<String>,
    /// Column labels, sorted
    pub products: Vec<String>,
    pub matrix: Array2<u32>,
}

impl IncidenceMatrix {
    /// Mark 1 where a customer's summed sale_amount for a product is positive
    pub fn build(table: &SalesTable) -> Self {
        let customers: Vec<String> = table
            .iter()
            .map(|r| r.customer_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let products: Vec<String> = table
            .iter()
            .map(|r| r.product_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let customer_index: HashMap<&str, usize> =
            customers.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();
        let product_index: HashMap<&str, usize> =
            products.iter().enumerate().map(|(i, p)| (p.as_str(), i)).collect();

        let mut matrix = Array2::<u32>::zeros((customers.len(), products.len()));
        let spend = aggregate(table, &[GroupKey::Customer, GroupKey::ProductCode], &[TOTAL_SALES]);
        for row in &spend.rows {
            if spend.get(row, TOTAL_SALES.name) <= 0.0 {
                continue;
            }
            if let (Some(&c), Some(&p)) = (customer_index.get(row.key(0)), product_index.get(row.key(1))) {
                matrix[[c, p]] = 1;
            }
        }

        Self {
            customers,
            products,
            matrix,
        }
    }

    /// Number of distinct products each customer holds
    pub fn products_per_customer(&self) -> Vec<u32> {
        self.matrix.sum_axis(Axis(1)).to_vec()
    }
}

/// Symmetric product x product matrix of shared-customer counts
#[derive(Debug, Clone, PartialEq)]
pub struct CoOccurrenceMatrix {
    pub products: Vec<String>,
    pub counts: Array2<u32>,
}

impl CoOccurrenceMatrix {
    /// Count, for each product pair, the customers who bought both.
    ///
    /// Needs at least two customers and two products; anything less is
    /// reported as [`AnalysisError::InsufficientData`].
    pub fn build(table: &SalesTable) -> Result<Self, AnalysisError> {
        let customers = table.distinct_customers();
        let products = table.distinct_products();
        if customers < 2 || products < 2 {
            return Err(AnalysisError::InsufficientData {
                customers,
                products,
            });
        }
        Ok(Self::from_incidence(&IncidenceMatrix::build(table)))
    }

    pub fn from_incidence(incidence: &IncidenceMatrix) -> Self {
        let mut counts = incidence.matrix.t().dot(&incidence.matrix);
        counts.diag_mut().fill(0);
        Self {
            products: incidence.products.clone(),
            counts,
        }
    }

    pub fn index_of(&self, product: &str) -> Option<usize> {
        self.products.iter().position(|p| p == product)
    }

    pub fn count(&self, a: &str, b: &str) -> u32 {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.counts[[i, j]],
            _ => 0,
        }
    }

    /// Strongest partners of `focal`: descending by count, skipping the focal
    /// product, anything in `exclude` and zero counts. Ties keep matrix order.
    pub fn top_partners(&self, focal: &str, k: usize, exclude: &[String]) -> Vec<(String, u32)> {
        let Some(row) = self.index_of(focal) else {
            return Vec::new();
        };

        let mut partners: Vec<(String, u32)> = self
            .products
            .iter()
            .zip(self.counts.row(row).iter())
            .filter(|(code, count)| **count > 0 && code.as_str() != focal && !exclude.contains(*code))
            .map(|(code, &count)| (code.clone(), count))
            .collect();
        partners.sort_by(|a, b| b.1.cmp(&a.1));
        partners.truncate(k);
        partners
    }

    /// Sub-matrix over `codes` (unknown codes are skipped), diagonal zero
    pub fn focus(&self, codes: &[String]) -> Self {
        let picked: Vec<(String, usize)> = codes
            .iter()
            .filter_map(|code| self.index_of(code).map(|i| (code.clone(), i)))
            .collect();
        let indices: Vec<usize> = picked.iter().map(|(_, i)| *i).collect();
        let mut counts = self.counts.select(Axis(0), &indices).select(Axis(1), &indices);
        counts.diag_mut().fill(0);

        Self {
            products: picked.into_iter().map(|(code, _)| code).collect(),
            counts,
        }
    }

    pub fn is_symmetric(&self) -> bool {
        self.counts == self.counts.t()
    }
}

/// A new product and one of its frequent companions
#[derive(Debug, Clone, PartialEq)]
pub struct Pairing {
    pub new_code: String,
    pub new_name: String,
    pub partner_code: String,
    pub partner_name: String,
    pub count: u32,
}

/// Top-`k` established companions of each new product present in the matrix
pub fn new_product_pairings(
    matrix: &CoOccurrenceMatrix,
    new_products: &NewProductSet,
    names: &HashMap<String, String>,
    k: usize,
) -> Vec<Pairing> {
    let name_of = |code: &str| names.get(code).cloned().unwrap_or_else(|| code.to_string());

    new_products
        .codes()
        .iter()
        .filter(|code| matrix.index_of(code).is_some())
        .flat_map(|code| {
            matrix
                .top_partners(code, k, new_products.codes())
                .into_iter()
                .map(|(partner, count)| Pairing {
                    new_code: code.clone(),
                    new_name: name_of(code),
                    partner_name: name_of(&partner),
                    partner_code: partner,
                    count,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Key products for a focused view: every new product present plus the
/// top-`k` partners of each. `None` when two or fewer products qualify.
pub fn key_product_matrix(
    matrix: &CoOccurrenceMatrix,
    new_products: &NewProductSet,
    k: usize,
) -> Option<CoOccurrenceMatrix> {
    let mut codes: Vec<String> = Vec::new();
    for code in new_products.codes() {
        if matrix.index_of(code).is_none() {
            continue;
        }
        if !codes.contains(code) {
            codes.push(code.clone());
        }
        for (partner, _) in matrix.top_partners(code, k, &[]) {
            if !codes.contains(&partner) {
                codes.push(partner);
            }
        }
    }

    if codes.len() > 2 {
        Some(matrix.focus(&codes))
    } else {
        None
    }
}

/// Breadth of customer baskets
#[derive(Debug, Clone, PartialEq)]
pub struct BasketStats {
    pub customer_count: usize,
    pub avg_products_per_customer: f64,
    /// Percent of customers holding at least one new product
    pub new_product_customer_share: f64,
    /// Distinct-product count -> number of customers
    pub distribution: BTreeMap<u32, usize>,
}

impl BasketStats {
    pub fn from_incidence(incidence: &IncidenceMatrix, new_products: &NewProductSet) -> Self {
        let per_customer = incidence.products_per_customer();
        let customer_count = per_customer.len();

        let mut distribution = BTreeMap::new();
        for &n in &per_customer {
            *distribution.entry(n).or_insert(0) += 1;
        }

        let new_columns: Vec<usize> = incidence
            .products
            .iter()
            .enumerate()
            .filter(|(_, code)| new_products.contains(code))
            .map(|(i, _)| i)
            .collect();
        let with_new = incidence
            .matrix
            .outer_iter()
            .filter(|row| new_columns.iter().any(|&c| row[c] > 0))
            .count();

        let (avg, share) = if customer_count == 0 {
            (0.0, 0.0)
        } else {
            (
                per_customer.iter().map(|&n| n as f64).sum::<f64>() / customer_count as f64,
                with_new as f64 / customer_count as f64 * 100.0,
            )
        };

        Self {
            customer_count,
            avg_products_per_customer: avg,
            new_product_customer_share: share,
            distribution,
        }
    }
}

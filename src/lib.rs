//! LaunchLens: sales and new-product launch analytics
//!
//! This library normalizes a sales sheet into typed records, filters it by
//! region, customer, product and applicant, and derives the dashboard views:
//! rollups, customer segments by new-product adoption, product co-occurrence
//! and market penetration.

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod config;
pub mod cooccur;
pub mod data;
pub mod error;
pub mod export;
pub mod extract;
pub mod filter;
pub mod penetration;
pub mod report;
pub mod sample;
pub mod segment;

// Re-export public items for easier access
pub use aggregate::{aggregate, AggregateTable, GroupKey, Metric};
pub use cache::DatasetCache;
pub use cli::Args;
pub use config::DashboardConfig;
pub use cooccur::{BasketStats, CoOccurrenceMatrix, IncidenceMatrix};
pub use data::{load_bytes, load_path, DataOrigin, LoadOutcome, NewProductSet, SalesRecord, SalesTable};
pub use error::{AnalysisError, LoadError, LoadWarning};
pub use export::{build_export, ExportBundle};
pub use extract::{classify_packaging, simplify_product_name, PackagingType};
pub use filter::{apply_filters, FilterOptions, FilteredDataset, Filters};
pub use segment::{customer_features, CustomerSegment};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;

//! Command-line interface definitions and argument parsing

use crate::config::DashboardConfig;
use crate::filter::Filters;
use clap::Parser;
use std::path::PathBuf;

/// Sales and new-product launch analytics over a sales sheet
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file (defaults to the configured input)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Keep only these regions (comma-separated, repeatable)
    #[arg(long, value_delimiter = ',')]
    pub region: Vec<String>,

    /// Keep only these customers
    #[arg(long, value_delimiter = ',')]
    pub customer: Vec<String>,

    /// Keep only these product codes
    #[arg(long, value_delimiter = ',')]
    pub product: Vec<String>,

    /// Keep only these applicants
    #[arg(long, value_delimiter = ',')]
    pub applicant: Vec<String>,

    /// Directory to write the export sheets into
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Partners listed per new product (overrides the config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Filter selection from the dimension flags; blank values are ignored
    pub fn filters(&self) -> Filters {
        Filters::new()
            .with_regions(non_blank(&self.region))
            .with_customers(non_blank(&self.customer))
            .with_products(non_blank(&self.product))
            .with_applicants(non_blank(&self.applicant))
    }

    /// Load the configuration and apply command-line overrides
    pub fn resolve_config(&self) -> crate::Result<DashboardConfig> {
        let mut config = DashboardConfig::load(self.config.as_deref())?;
        if let Some(top_k) = self.top_k {
            if top_k == 0 {
                anyhow::bail!("--top-k must be at least 1");
            }
            config.top_k = top_k;
        }
        if let Some(ref input) = self.input {
            config.default_input = input.clone();
        }
        Ok(config)
    }
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_from_flags() {
        let args = Args::parse_from([
            "launchlens",
            "--region",
            "East, South",
            "--region",
            "West",
            "--product",
            "F0110C",
        ]);
        let filters = args.filters();
        assert_eq!(filters.regions.len(), 3);
        assert!(filters.regions.contains("South"));
        assert!(filters.products.contains("F0110C"));
        assert!(filters.customers.is_empty());
        assert!(!filters.is_unrestricted());
    }

    #[test]
    fn test_no_flags_is_unrestricted() {
        let args = Args::parse_from(["launchlens"]);
        assert!(args.filters().is_unrestricted());
        assert!(args.output.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_resolve_config_overrides() {
        let mut args = Args::parse_from(["launchlens", "--input", "q2.csv", "-k", "5"]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.default_input, PathBuf::from("q2.csv"));

        args.top_k = Some(0);
        assert!(args.resolve_config().is_err());
    }
}

pub mod toml_config;

use crate::domain::model::ThresholdName;
use crate::domain::ports::ThresholdSource;

/// 依序查詢兩個門檻來源：先 primary（命令列覆蓋），再 fallback（檔案）。
/// 兩者都沒有的門檻交給呼叫端的預設值。
#[derive(Debug, Clone)]
pub struct LayeredThresholds<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> LayeredThresholds<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P, F> ThresholdSource for LayeredThresholds<P, F>
where
    P: ThresholdSource,
    F: ThresholdSource,
{
    fn threshold(&self, name: ThresholdName) -> Option<i64> {
        self.primary
            .threshold(name)
            .or_else(|| self.fallback.threshold(name))
    }
}

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use crate::domain::model::ThresholdName;
    use crate::domain::ports::ThresholdSource;
    use crate::utils::error::Result;
    use crate::utils::validation::{
        validate_file_extensions, validate_min_value, validate_path, validate_range, Validate,
    };
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "auction-rules")]
    #[command(about = "Reputation-driven listing admission for an auction marketplace")]
    pub struct CliConfig {
        /// Market snapshot JSON with listings, bids and ratings
        #[arg(long, default_value = "./market.json")]
        pub snapshot: String,

        /// Candidate listing JSON to review for admission
        #[arg(long)]
        pub candidate: Option<String>,

        /// Seller id to report the standing of
        #[arg(long)]
        pub seller: Option<i64>,

        /// TOML file with threshold overrides
        #[arg(long)]
        pub thresholds: Option<String>,

        /// Write the snapshot back after an admitted listing
        #[arg(long)]
        pub save: bool,

        /// Override: max overlapping listings per seller
        #[arg(long)]
        pub k: Option<i64>,

        /// Override: max overlapping listings per seller and category
        #[arg(long)]
        pub m: Option<i64>,

        /// Override: how many recent ratings feed the score
        #[arg(long)]
        pub n: Option<i64>,

        /// Override: score threshold for listing at all
        #[arg(long)]
        pub s: Option<i64>,

        /// Override: listing quota granted at score S
        #[arg(long)]
        pub t: Option<i64>,

        /// Override: similarity percent that marks a duplicate description
        #[arg(long)]
        pub l: Option<i64>,

        /// Enable verbose output
        #[arg(long)]
        pub verbose: bool,

        /// Log CPU/memory usage while evaluating
        #[arg(long)]
        pub monitor: bool,

        /// Emit logs as JSON
        #[arg(long)]
        pub log_json: bool,
    }

    impl ThresholdSource for CliConfig {
        fn threshold(&self, name: ThresholdName) -> Option<i64> {
            match name {
                ThresholdName::K => self.k,
                ThresholdName::M => self.m,
                ThresholdName::N => self.n,
                ThresholdName::S => self.s,
                ThresholdName::T => self.t,
                ThresholdName::L => self.l,
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("snapshot", &self.snapshot)?;
            validate_file_extensions("snapshot", &[self.snapshot.clone()], &["json"])?;

            if let Some(candidate) = &self.candidate {
                validate_path("candidate", candidate)?;
                validate_file_extensions("candidate", &[candidate.clone()], &["json"])?;
            }

            if let Some(thresholds) = &self.thresholds {
                validate_path("thresholds", thresholds)?;
                validate_file_extensions("thresholds", &[thresholds.clone()], &["toml"])?;
            }

            // 覆蓋值遵守與門檻檔相同的規則
            if let Some(s) = self.s {
                validate_range("s", s, 1, 10)?;
            }
            if let Some(t) = self.t {
                validate_min_value("t", t, 1)?;
            }
            if let Some(n) = self.n {
                validate_min_value("n", n, 1)?;
            }
            if let Some(k) = self.k {
                validate_min_value("k", k, 0)?;
            }
            if let Some(m) = self.m {
                validate_min_value("m", m, 0)?;
            }
            if let Some(l) = self.l {
                validate_range("l", l, 0, 100)?;
            }

            Ok(())
        }
    }
}

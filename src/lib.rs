pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::memory::{MarketSnapshot, MemoryMarket};
pub use config::{toml_config::TomlThresholds, LayeredThresholds};
pub use crate::core::admission::{AdmissionController, AdmissionDecision, RejectReason};
pub use crate::core::engine::{MarketplaceEngine, SellerStanding};
pub use crate::core::limit::LimitMapper;
pub use crate::core::rating::{RatingDecision, RatingProtocol, RatingRejection};
pub use crate::core::score::ScoreCalculator;
pub use utils::error::{MarketError, Result};

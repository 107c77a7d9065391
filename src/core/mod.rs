pub mod admission;
pub mod engine;
pub mod limit;
pub mod rating;
pub mod score;
pub mod similarity;

pub use crate::domain::model::{Bid, Grade, Listing, ListingDefect, Rating, ThresholdName};
pub use crate::domain::ports::{
    BidDirectory, ListingDirectory, MarketWriter, RatingDirectory, ThresholdSource,
};
pub use crate::utils::error::Result;

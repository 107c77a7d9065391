use crate::domain::model::{Grade, Listing, ListingDefect, Rating};
use crate::domain::ports::{BidDirectory, RatingDirectory};
use crate::utils::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A revised grade may move at most this many tenths from the prior one.
pub const GRADE_REVISION_TOLERANCE_TENTHS: u16 = 1;

/// 評價審查的裁決結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingDecision {
    Accepted,
    Rejected(RatingRejection),
}

impl RatingDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RatingDecision::Accepted)
    }
}

/// 評價被拒的原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingRejection {
    InvalidListing(ListingDefect),
    AuctionStillActive { until: DateTime<Utc> },
    AlreadyRated,
    NotYetRated,
    NoWinningBid,
    InvalidPairing,
    GradeChangeTooLarge { previous: Grade, submitted: Grade },
}

impl fmt::Display for RatingRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingRejection::InvalidListing(defect) => {
                write!(f, "listing is invalid: {}", defect)
            }
            RatingRejection::AuctionStillActive { until } => {
                write!(f, "auction is still open until {}", until)
            }
            RatingRejection::AlreadyRated => {
                f.write_str("this party already rated this listing")
            }
            RatingRejection::NotYetRated => {
                f.write_str("no prior rating exists to revise")
            }
            RatingRejection::NoWinningBid => {
                f.write_str("the auction closed without a winning bid")
            }
            RatingRejection::InvalidPairing => {
                f.write_str("rater and rated must be the seller and the winning buyer")
            }
            RatingRejection::GradeChangeTooLarge {
                previous,
                submitted,
            } => {
                write!(
                    f,
                    "grade {} differs from the prior {} by more than 0.1",
                    submitted, previous
                )
            }
        }
    }
}

/// 拍賣結束後雙方互評的裁判。
///
/// 交易雙方是賣家與得標買家，每一方對同一筆刊登只能評一次；
/// 已送出的評價只能在 ±0.1 的範圍內修訂。審查順序固定：
/// 結構缺陷、拍賣是否已終止、重複或缺少前一筆評價、得標者存在、
/// 評價方向，最後（僅修訂時）是分數變動幅度。
pub struct RatingProtocol<R, B> {
    ratings: R,
    bids: B,
}

impl<R, B> RatingProtocol<R, B>
where
    R: RatingDirectory,
    B: BidDirectory,
{
    pub fn new(ratings: R, bids: B) -> Self {
        Self { ratings, bids }
    }

    /// Reviews a first-time rating for a listing.
    pub async fn review_submission(
        &self,
        candidate: &Rating,
        listing: &Listing,
    ) -> Result<RatingDecision> {
        ensure_candidate_matches(candidate, listing)?;

        if let Some(defect) = listing.structural_defect() {
            return Ok(RatingDecision::Rejected(RatingRejection::InvalidListing(
                defect,
            )));
        }
        if let Some(rejection) = still_active(candidate, listing) {
            return Ok(RatingDecision::Rejected(rejection));
        }

        let prior = self
            .ratings
            .rating_by_rater_and_listing(candidate.rater, candidate.listing)
            .await?;
        if prior.is_some() {
            return Ok(RatingDecision::Rejected(RatingRejection::AlreadyRated));
        }

        if let Some(rejection) = self.counterpart_mismatch(candidate, listing).await? {
            return Ok(RatingDecision::Rejected(rejection));
        }

        tracing::debug!(
            "Rating by {} for {} on listing {} passed review",
            candidate.rater,
            candidate.rated,
            candidate.listing
        );
        Ok(RatingDecision::Accepted)
    }

    /// Reviews a correction of an already recorded rating.
    pub async fn review_revision(
        &self,
        candidate: &Rating,
        listing: &Listing,
    ) -> Result<RatingDecision> {
        ensure_candidate_matches(candidate, listing)?;

        if let Some(defect) = listing.structural_defect() {
            return Ok(RatingDecision::Rejected(RatingRejection::InvalidListing(
                defect,
            )));
        }
        if let Some(rejection) = still_active(candidate, listing) {
            return Ok(RatingDecision::Rejected(rejection));
        }

        let prior = self
            .ratings
            .rating_by_rater_and_listing(candidate.rater, candidate.listing)
            .await?;
        let Some(prior) = prior else {
            return Ok(RatingDecision::Rejected(RatingRejection::NotYetRated));
        };

        if let Some(rejection) = self.counterpart_mismatch(candidate, listing).await? {
            return Ok(RatingDecision::Rejected(rejection));
        }

        if candidate.grade.delta_tenths(prior.grade) > GRADE_REVISION_TOLERANCE_TENTHS {
            return Ok(RatingDecision::Rejected(
                RatingRejection::GradeChangeTooLarge {
                    previous: prior.grade,
                    submitted: candidate.grade,
                },
            ));
        }

        tracing::debug!(
            "Revision by {} on listing {} passed review ({} to {})",
            candidate.rater,
            candidate.listing,
            prior.grade,
            candidate.grade
        );
        Ok(RatingDecision::Accepted)
    }

    // 評價必須由賣家指向得標買家，或由得標買家指向賣家，兩者擇一
    async fn counterpart_mismatch(
        &self,
        candidate: &Rating,
        listing: &Listing,
    ) -> Result<Option<RatingRejection>> {
        let Some(winner) = self.bids.winning_buyer(candidate.listing).await? else {
            return Ok(Some(RatingRejection::NoWinningBid));
        };

        let seller_rates_buyer =
            candidate.rater == listing.seller && candidate.rated == winner;
        let buyer_rates_seller =
            candidate.rater == winner && candidate.rated == listing.seller;
        if seller_rates_buyer == buyer_rates_seller {
            return Ok(Some(RatingRejection::InvalidPairing));
        }

        Ok(None)
    }
}

// 終止日尚未過去就不能評價；正好等於終止時刻也算未結束
fn still_active(candidate: &Rating, listing: &Listing) -> Option<RatingRejection> {
    if candidate.rated_at <= listing.terminates_at {
        return Some(RatingRejection::AuctionStillActive {
            until: listing.terminates_at,
        });
    }
    None
}

fn ensure_candidate_matches(candidate: &Rating, listing: &Listing) -> Result<()> {
    if candidate.listing != listing.id {
        return Err(MarketError::EntityValidationError {
            entity: "rating".to_string(),
            field: "listing".to_string(),
            reason: format!(
                "rating references listing {} but listing {} was supplied",
                candidate.listing, listing.id
            ),
        });
    }
    Ok(())
}

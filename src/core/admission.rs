use crate::core::limit::LimitMapper;
use crate::core::similarity::similarity_percent;
use crate::domain::model::{Listing, ListingDefect, ThresholdName};
use crate::domain::ports::{ListingDirectory, RatingDirectory, ThresholdSource};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 准入檢查的裁決結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionDecision {
    Admitted,
    Rejected(RejectReason),
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionDecision::Admitted)
    }
}

/// 拒絕原因，連同觸發拒絕的數字一起回報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidListing(ListingDefect),
    QuotaExceeded { active: u64, limit: i64 },
    TooManyConcurrent { overlapping: u64, limit: i64 },
    TooManyInCategory { overlapping: u64, limit: i64 },
    DuplicateDescription { similarity: u8, limit: i64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidListing(defect) => {
                write!(f, "listing is invalid: {}", defect)
            }
            RejectReason::QuotaExceeded { active, limit } => {
                write!(
                    f,
                    "seller already runs {} active or future listings (limit {})",
                    active, limit
                )
            }
            RejectReason::TooManyConcurrent { overlapping, limit } => {
                write!(
                    f,
                    "{} listings overlap the requested window (limit {})",
                    overlapping, limit
                )
            }
            RejectReason::TooManyInCategory { overlapping, limit } => {
                write!(
                    f,
                    "{} listings overlap in the same category (limit {})",
                    overlapping, limit
                )
            }
            RejectReason::DuplicateDescription { similarity, limit } => {
                write!(
                    f,
                    "description is {}% similar to an existing listing (limit {}%)",
                    similarity, limit
                )
            }
        }
    }
}

/// 新刊登的守門員。
///
/// 檢查按固定順序執行，第一個失敗的檢查決定拒絕原因：
/// 結構缺陷、全局配額、時間窗重疊、分類重疊、描述重複。
pub struct AdmissionController<L, R, T> {
    listings: L,
    limits: LimitMapper<R, T>,
    thresholds: T,
}

impl<L, R, T> AdmissionController<L, R, T>
where
    L: ListingDirectory,
    R: RatingDirectory,
    T: ThresholdSource + Clone,
{
    pub fn new(listings: L, ratings: R, thresholds: T) -> Self {
        Self {
            listings,
            limits: LimitMapper::new(ratings, thresholds.clone()),
            thresholds,
        }
    }

    pub async fn can_admit(&self, candidate: &Listing) -> Result<AdmissionDecision> {
        if let Some(defect) = candidate.structural_defect() {
            return Ok(AdmissionDecision::Rejected(RejectReason::InvalidListing(
                defect,
            )));
        }

        let limit = self.limits.listing_limit(candidate.seller).await?;
        let active = self
            .listings
            .active_and_future_count(candidate.seller, candidate.created_at)
            .await?;
        tracing::debug!(
            "Seller {}: {} active or future listings against a limit of {}",
            candidate.seller,
            active,
            limit
        );
        if active as i64 >= limit {
            return Ok(AdmissionDecision::Rejected(RejectReason::QuotaExceeded {
                active,
                limit,
            }));
        }

        let k = self.thresholds.threshold_or_default(ThresholdName::K);
        let overlapping = self
            .listings
            .overlapping_count(candidate.seller, candidate.starts_at, candidate.terminates_at)
            .await?;
        if overlapping as i64 >= k {
            return Ok(AdmissionDecision::Rejected(
                RejectReason::TooManyConcurrent {
                    overlapping,
                    limit: k,
                },
            ));
        }

        let m = self.thresholds.threshold_or_default(ThresholdName::M);
        let in_category = self
            .listings
            .overlapping_count_in_category(
                candidate.seller,
                candidate.category,
                candidate.starts_at,
                candidate.terminates_at,
            )
            .await?;
        if in_category as i64 >= m {
            return Ok(AdmissionDecision::Rejected(
                RejectReason::TooManyInCategory {
                    overlapping: in_category,
                    limit: m,
                },
            ));
        }

        let l = self.thresholds.threshold_or_default(ThresholdName::L);
        let descriptions = self.listings.all_descriptions().await?;
        for existing in &descriptions {
            let similarity = similarity_percent(&candidate.description, existing);
            if i64::from(similarity) >= l {
                return Ok(AdmissionDecision::Rejected(
                    RejectReason::DuplicateDescription {
                        similarity,
                        limit: l,
                    },
                ));
            }
        }

        Ok(AdmissionDecision::Admitted)
    }
}

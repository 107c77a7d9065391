use crate::core::admission::{AdmissionController, AdmissionDecision};
use crate::core::limit::LimitMapper;
use crate::core::rating::{RatingDecision, RatingProtocol};
use crate::domain::model::{Listing, Rating, UserId};
use crate::domain::ports::{
    BidDirectory, ListingDirectory, MarketWriter, RatingDirectory, ThresholdSource,
};
use crate::utils::error::{MarketError, Result};
use crate::utils::monitor::SystemMonitor;
use serde::Serialize;

/// 賣家現況：分數與由它換算出的刊登配額
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerStanding {
    pub seller: UserId,
    pub score: f64,
    pub limit: i64,
}

/// 串起所有規則元件的市場引擎。
///
/// 裁決與寫入不在同一個交易裡：併發送件時由存儲層的寫鎖或交易
/// 邊界保證「檢查時的計數」仍然有效。
pub struct MarketplaceEngine<S, T> {
    store: S,
    admission: AdmissionController<S, S, T>,
    protocol: RatingProtocol<S, S>,
    limits: LimitMapper<S, T>,
    monitor: SystemMonitor,
}

impl<S, T> MarketplaceEngine<S, T>
where
    S: ListingDirectory + RatingDirectory + BidDirectory + MarketWriter + Clone,
    T: ThresholdSource + Clone,
{
    pub fn new(store: S, thresholds: T) -> Self {
        Self::new_with_monitoring(store, thresholds, false)
    }

    pub fn new_with_monitoring(store: S, thresholds: T, monitoring: bool) -> Self {
        Self {
            admission: AdmissionController::new(store.clone(), store.clone(), thresholds.clone()),
            protocol: RatingProtocol::new(store.clone(), store.clone()),
            limits: LimitMapper::new(store.clone(), thresholds),
            store,
            monitor: SystemMonitor::new(monitoring),
        }
    }

    /// Admits the candidate and, when admitted, persists it.
    pub async fn create_listing(&self, listing: Listing) -> Result<AdmissionDecision> {
        let decision = self.admission.can_admit(&listing).await?;
        match &decision {
            AdmissionDecision::Admitted => {
                self.store.persist_listing(&listing).await?;
                tracing::info!(
                    "✅ Listing {} admitted for seller {}",
                    listing.id,
                    listing.seller
                );
            }
            AdmissionDecision::Rejected(reason) => {
                tracing::info!("❌ Listing {} rejected: {}", listing.id, reason);
            }
        }
        self.monitor.record_evaluation();
        self.monitor.log_stats("Admission");
        Ok(decision)
    }

    /// Reviews a first-time rating and records it when accepted.
    pub async fn submit_rating(&self, rating: Rating) -> Result<RatingDecision> {
        let listing = self.listing_for(&rating).await?;
        let decision = self.protocol.review_submission(&rating, &listing).await?;
        self.record_rating_outcome(&rating, &decision).await?;
        Ok(decision)
    }

    /// Reviews a grade correction and records it when accepted.
    pub async fn revise_rating(&self, rating: Rating) -> Result<RatingDecision> {
        let listing = self.listing_for(&rating).await?;
        let decision = self.protocol.review_revision(&rating, &listing).await?;
        self.record_rating_outcome(&rating, &decision).await?;
        Ok(decision)
    }

    pub async fn seller_standing(&self, seller: UserId) -> Result<SellerStanding> {
        let score = self.limits.scores().score(seller).await?;
        let limit = self.limits.limit_for_score(score)?;
        Ok(SellerStanding {
            seller,
            score,
            limit,
        })
    }

    pub fn log_final_stats(&self) {
        self.monitor.log_final_stats();
    }

    async fn record_rating_outcome(
        &self,
        rating: &Rating,
        decision: &RatingDecision,
    ) -> Result<()> {
        match decision {
            RatingDecision::Accepted => {
                self.store.persist_rating(rating).await?;
                tracing::info!(
                    "✅ Rating by {} on listing {} recorded as {}",
                    rating.rater,
                    rating.listing,
                    rating.grade
                );
            }
            RatingDecision::Rejected(reason) => {
                tracing::info!(
                    "❌ Rating by {} on listing {} rejected: {}",
                    rating.rater,
                    rating.listing,
                    reason
                );
            }
        }
        self.monitor.record_evaluation();
        self.monitor.log_stats("Rating review");
        Ok(())
    }

    async fn listing_for(&self, rating: &Rating) -> Result<Listing> {
        self.store
            .listing_by_id(rating.listing)
            .await?
            .ok_or_else(|| MarketError::EntityValidationError {
                entity: "rating".to_string(),
                field: "listing".to_string(),
                reason: format!("listing {} does not exist", rating.listing),
            })
    }
}

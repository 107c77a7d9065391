use crate::domain::model::{CategoryId, Listing, ListingId, Rating, ThresholdName, UserId};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 查詢已收到的評價。
///
/// `ratings_for_rated` 必須以 (`rated_at`, id) 遞減排序回傳，
/// 分數計算只取最前面的 N 筆。
#[async_trait]
pub trait RatingDirectory: Send + Sync {
    async fn ratings_for_rated(&self, user: UserId) -> Result<Vec<Rating>>;

    async fn rating_by_rater_and_listing(
        &self,
        rater: UserId,
        listing: ListingId,
    ) -> Result<Option<Rating>>;
}

/// 查詢出價，只用來決定得標者。
#[async_trait]
pub trait BidDirectory: Send + Sync {
    /// Buyer of the winning bid, if the listing received any bid.
    /// The winning bid is the most recently placed one; bids sharing a
    /// timestamp go to the higher bid id.
    async fn winning_buyer(&self, listing: ListingId) -> Result<Option<UserId>>;
}

/// 查詢既有刊登，准入檢查的資料來源。
#[async_trait]
pub trait ListingDirectory: Send + Sync {
    /// Listings of `seller` whose termination date lies after `reference`.
    async fn active_and_future_count(
        &self,
        seller: UserId,
        reference: DateTime<Utc>,
    ) -> Result<u64>;

    /// Listings of `seller` whose [start, termination] interval touches
    /// the closed interval [`from`, `until`].
    async fn overlapping_count(
        &self,
        seller: UserId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64>;

    async fn overlapping_count_in_category(
        &self,
        seller: UserId,
        category: CategoryId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64>;

    /// Every stored listing description, regardless of seller or state.
    async fn all_descriptions(&self) -> Result<Vec<String>>;

    async fn listing_by_id(&self, id: ListingId) -> Result<Option<Listing>>;
}

/// 寫入通過裁決的刊登與評價。
#[async_trait]
pub trait MarketWriter: Send + Sync {
    async fn persist_listing(&self, listing: &Listing) -> Result<()>;

    /// Upserts by (rater, listing); a revision replaces the prior entry.
    async fn persist_rating(&self, rating: &Rating) -> Result<()>;
}

/// 門檻配置來源。讀不到的門檻回傳 `None`，由呼叫端決定後援值。
pub trait ThresholdSource: Send + Sync {
    fn threshold(&self, name: ThresholdName) -> Option<i64>;

    fn threshold_or_default(&self, name: ThresholdName) -> i64 {
        self.threshold(name)
            .unwrap_or_else(|| name.default_value())
    }
}

// 沒有配置檔也能組裝分層來源
impl<T: ThresholdSource> ThresholdSource for Option<T> {
    fn threshold(&self, name: ThresholdName) -> Option<i64> {
        self.as_ref().and_then(|source| source.threshold(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ThresholdName;

    struct EmptySource;

    impl ThresholdSource for EmptySource {
        fn threshold(&self, _name: ThresholdName) -> Option<i64> {
            None
        }
    }

    struct FixedSource(i64);

    impl ThresholdSource for FixedSource {
        fn threshold(&self, _name: ThresholdName) -> Option<i64> {
            Some(self.0)
        }
    }

    #[test]
    fn test_threshold_or_default_falls_back_per_name() {
        let source = EmptySource;
        assert_eq!(source.threshold_or_default(ThresholdName::K), 10);
        assert_eq!(source.threshold_or_default(ThresholdName::M), 5);
        assert_eq!(source.threshold_or_default(ThresholdName::N), 5);
        assert_eq!(source.threshold_or_default(ThresholdName::S), 5);
        assert_eq!(source.threshold_or_default(ThresholdName::T), 20);
        assert_eq!(source.threshold_or_default(ThresholdName::L), 100);
    }

    #[test]
    fn test_threshold_or_default_prefers_configured_value() {
        let source = FixedSource(42);
        for name in ThresholdName::ALL {
            assert_eq!(source.threshold_or_default(name), 42);
        }
    }
}

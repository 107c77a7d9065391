use crate::domain::model::{Bid, CategoryId, Listing, ListingId, Rating, UserId};
use crate::domain::ports::{
    BidDirectory, ListingDirectory, MarketWriter, RatingDirectory,
};
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 市場的完整狀態，也是快照檔案的 JSON 結構
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    #[serde(default)]
    pub listings: Vec<Listing>,
    #[serde(default)]
    pub bids: Vec<Bid>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

impl MarketSnapshot {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(MarketError::IoError)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(MarketError::SerializationError)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(MarketError::SerializationError)?;
        std::fs::write(path, content).map_err(MarketError::IoError)
    }

    /// Distinct sellers, in first-appearance order.
    pub fn sellers(&self) -> Vec<UserId> {
        let mut seen = Vec::new();
        for listing in &self.listings {
            if !seen.contains(&listing.seller) {
                seen.push(listing.seller);
            }
        }
        seen
    }
}

/// 以讀寫鎖保護的共享記憶體市場，同時實作所有查詢與寫入埠。
///
/// 排序約定都集中在這裡：評價以 (rated_at, id) 遞減回傳，
/// 得標出價取最後出價者，同一時刻以編號較大者為準。
#[derive(Clone, Default)]
pub struct MemoryMarket {
    state: Arc<RwLock<MarketSnapshot>>,
}

impl MemoryMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: MarketSnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Current state, cloned out for persistence or inspection.
    pub async fn snapshot(&self) -> MarketSnapshot {
        self.state.read().await.clone()
    }

    pub async fn seed_listing(&self, listing: Listing) {
        self.state.write().await.listings.push(listing);
    }

    pub async fn seed_bid(&self, bid: Bid) {
        self.state.write().await.bids.push(bid);
    }

    pub async fn seed_rating(&self, rating: Rating) {
        self.state.write().await.ratings.push(rating);
    }
}

// 閉區間 [start, termination] 與 [from, until] 相碰就算重疊
fn overlaps(listing: &Listing, from: DateTime<Utc>, until: DateTime<Utc>) -> bool {
    listing.starts_at <= until && from <= listing.terminates_at
}

#[async_trait]
impl RatingDirectory for MemoryMarket {
    async fn ratings_for_rated(&self, user: UserId) -> Result<Vec<Rating>> {
        let state = self.state.read().await;
        let mut ratings: Vec<Rating> = state
            .ratings
            .iter()
            .filter(|r| r.rated == user)
            .cloned()
            .collect();
        ratings.sort_by(|x, y| {
            y.rated_at
                .cmp(&x.rated_at)
                .then_with(|| y.id.cmp(&x.id))
        });
        Ok(ratings)
    }

    async fn rating_by_rater_and_listing(
        &self,
        rater: UserId,
        listing: ListingId,
    ) -> Result<Option<Rating>> {
        let state = self.state.read().await;
        Ok(state
            .ratings
            .iter()
            .find(|r| r.rater == rater && r.listing == listing)
            .cloned())
    }
}

#[async_trait]
impl BidDirectory for MemoryMarket {
    async fn winning_buyer(&self, listing: ListingId) -> Result<Option<UserId>> {
        let state = self.state.read().await;
        Ok(state
            .bids
            .iter()
            .filter(|b| b.listing == listing)
            .max_by_key(|b| (b.placed_at, b.id))
            .map(|b| b.buyer))
    }
}

#[async_trait]
impl ListingDirectory for MemoryMarket {
    async fn active_and_future_count(
        &self,
        seller: UserId,
        reference: DateTime<Utc>,
    ) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .listings
            .iter()
            .filter(|l| l.seller == seller && l.terminates_at > reference)
            .count() as u64)
    }

    async fn overlapping_count(
        &self,
        seller: UserId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .listings
            .iter()
            .filter(|l| l.seller == seller && overlaps(l, from, until))
            .count() as u64)
    }

    async fn overlapping_count_in_category(
        &self,
        seller: UserId,
        category: CategoryId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .listings
            .iter()
            .filter(|l| {
                l.seller == seller && l.category == category && overlaps(l, from, until)
            })
            .count() as u64)
    }

    async fn all_descriptions(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        Ok(state.listings.iter().map(|l| l.description.clone()).collect())
    }

    async fn listing_by_id(&self, id: ListingId) -> Result<Option<Listing>> {
        let state = self.state.read().await;
        Ok(state.listings.iter().find(|l| l.id == id).cloned())
    }
}

#[async_trait]
impl MarketWriter for MemoryMarket {
    async fn persist_listing(&self, listing: &Listing) -> Result<()> {
        let mut state = self.state.write().await;
        if state.listings.iter().any(|l| l.id == listing.id) {
            return Err(MarketError::StoreError {
                message: format!("listing {} already exists", listing.id),
            });
        }
        state.listings.push(listing.clone());
        Ok(())
    }

    async fn persist_rating(&self, rating: &Rating) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .ratings
            .iter_mut()
            .find(|r| r.rater == rating.rater && r.listing == rating.listing)
        {
            *existing = rating.clone();
        } else {
            state.ratings.push(rating.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BidId, Grade, RatingId};
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn listing(id: i64, seller: i64, start_day: u32, end_day: u32) -> Listing {
        Listing::new(
            ListingId(id),
            format!("Listing {}", id),
            format!("Description {}", id),
            CategoryId(1),
            UserId(seller),
            1000,
            "EUR",
            ts(1, 0),
            ts(start_day, 12),
            ts(end_day, 12),
        )
    }

    fn bid(id: i64, listing: i64, buyer: i64, amount: i64, day: u32, hour: u32) -> Bid {
        Bid {
            id: BidId(id),
            listing: ListingId(listing),
            buyer: UserId(buyer),
            amount,
            placed_at: ts(day, hour),
        }
    }

    fn rating(id: i64, rater: i64, rated: i64, tenths: u16, day: u32) -> Rating {
        Rating {
            id: RatingId(id),
            listing: ListingId(id),
            rater: UserId(rater),
            rated: UserId(rated),
            grade: Grade::from_tenths(tenths).unwrap(),
            rated_at: ts(day, 12),
        }
    }

    #[tokio::test]
    async fn test_latest_bid_wins_even_when_an_earlier_one_was_higher() {
        let market = MemoryMarket::new();
        market.seed_bid(bid(1, 100, 11, 900, 3, 10)).await;
        market.seed_bid(bid(2, 100, 22, 500, 5, 10)).await;

        let winner = market.winning_buyer(ListingId(100)).await.unwrap();
        assert_eq!(winner, Some(UserId(22)));
    }

    #[tokio::test]
    async fn test_simultaneous_bids_go_to_the_higher_id() {
        let market = MemoryMarket::new();
        market.seed_bid(bid(1, 100, 11, 900, 3, 10)).await;
        market.seed_bid(bid(2, 100, 22, 500, 3, 10)).await;

        let winner = market.winning_buyer(ListingId(100)).await.unwrap();
        assert_eq!(winner, Some(UserId(22)));
    }

    #[tokio::test]
    async fn test_bids_on_other_listings_do_not_count() {
        let market = MemoryMarket::new();
        market.seed_bid(bid(1, 200, 11, 900, 3, 10)).await;

        assert_eq!(market.winning_buyer(ListingId(100)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ratings_come_back_newest_first_with_id_tiebreak() {
        let market = MemoryMarket::new();
        market.seed_rating(rating(1, 11, 7, 60, 10)).await;
        market.seed_rating(rating(2, 22, 7, 70, 12)).await;
        market.seed_rating(rating(3, 33, 7, 80, 12)).await;

        let ratings = market.ratings_for_rated(UserId(7)).await.unwrap();
        let ids: Vec<i64> = ratings.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_active_count_excludes_already_terminated() {
        let market = MemoryMarket::new();
        market.seed_listing(listing(1, 7, 2, 9)).await;
        market.seed_listing(listing(2, 7, 2, 20)).await;
        market.seed_listing(listing(3, 8, 2, 20)).await;

        // listing 1 terminates exactly at the reference instant: not in the future
        let count = market
            .active_and_future_count(UserId(7), ts(9, 12))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_touching_intervals_overlap() {
        let market = MemoryMarket::new();
        market.seed_listing(listing(1, 7, 2, 9)).await;

        let touching = market
            .overlapping_count(UserId(7), ts(9, 12), ts(15, 12))
            .await
            .unwrap();
        assert_eq!(touching, 1);

        let disjoint = market
            .overlapping_count(UserId(7), ts(9, 13), ts(15, 12))
            .await
            .unwrap();
        assert_eq!(disjoint, 0);
    }

    #[tokio::test]
    async fn test_category_overlap_ignores_other_categories() {
        let market = MemoryMarket::new();
        let mut other_category = listing(1, 7, 2, 9);
        other_category.category = CategoryId(2);
        market.seed_listing(other_category).await;
        market.seed_listing(listing(2, 7, 2, 9)).await;

        let count = market
            .overlapping_count_in_category(UserId(7), CategoryId(1), ts(2, 12), ts(9, 12))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_overlap_uses_the_fixed_termination_date() {
        let market = MemoryMarket::new();
        let mut edited = listing(1, 7, 2, 9);
        // the seller pushed the visible end date out, termination stays on day 9
        edited.edit_ends_at(ts(30, 12));
        market.seed_listing(edited).await;

        let count = market
            .overlapping_count(UserId(7), ts(10, 0), ts(15, 0))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_persist_listing_rejects_duplicate_ids() {
        let market = MemoryMarket::new();
        market.persist_listing(&listing(1, 7, 2, 9)).await.unwrap();
        let result = market.persist_listing(&listing(1, 8, 3, 10)).await;
        assert!(matches!(result, Err(MarketError::StoreError { .. })));
    }

    #[tokio::test]
    async fn test_persist_rating_upserts_by_rater_and_listing() {
        let market = MemoryMarket::new();
        let first = rating(1, 11, 7, 60, 10);
        market.persist_rating(&first).await.unwrap();

        let mut revised = first.clone();
        revised.grade = Grade::from_tenths(61).unwrap();
        market.persist_rating(&revised).await.unwrap();

        let snapshot = market.snapshot().await;
        assert_eq!(snapshot.ratings.len(), 1);
        assert_eq!(snapshot.ratings[0].grade, Grade::from_tenths(61).unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.json");

        let market = MemoryMarket::new();
        market.seed_listing(listing(1, 7, 2, 9)).await;
        market.seed_bid(bid(1, 1, 11, 500, 3, 10)).await;
        market.seed_rating(rating(1, 11, 7, 60, 10)).await;

        market.snapshot().await.to_file(&path).unwrap();
        let loaded = MarketSnapshot::from_file(&path).unwrap();
        assert_eq!(loaded.listings.len(), 1);
        assert_eq!(loaded.bids.len(), 1);
        assert_eq!(loaded.ratings.len(), 1);
        assert_eq!(loaded.listings[0].terminates_at, ts(9, 12));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let snapshot = MarketSnapshot::from_json_str(r#"{"listings": []}"#).unwrap();
        assert!(snapshot.bids.is_empty());
        assert!(snapshot.ratings.is_empty());
    }

    #[test]
    fn test_sellers_are_distinct_in_first_appearance_order() {
        let snapshot = MarketSnapshot {
            listings: vec![
                listing(1, 7, 2, 9),
                listing(2, 8, 2, 9),
                listing(3, 7, 2, 9),
            ],
            bids: vec![],
            ratings: vec![],
        };
        assert_eq!(snapshot.sellers(), vec![UserId(7), UserId(8)]);
    }
}

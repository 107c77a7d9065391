use crate::core::score::ScoreCalculator;
use crate::domain::model::{ThresholdName, UserId};
use crate::domain::ports::{RatingDirectory, ThresholdSource};
use crate::utils::error::{MarketError, Result};

/// 把信譽分數換算成同時刊登的配額。
pub struct LimitMapper<R, T> {
    scores: ScoreCalculator<R, T>,
    thresholds: T,
}

impl<R, T> LimitMapper<R, T>
where
    R: RatingDirectory,
    T: ThresholdSource + Clone,
{
    pub fn new(ratings: R, thresholds: T) -> Self {
        Self {
            scores: ScoreCalculator::new(ratings, thresholds.clone()),
            thresholds,
        }
    }

    pub async fn listing_limit(&self, user: UserId) -> Result<i64> {
        let score = self.scores.score(user).await?;
        let limit = self.limit_for_score(score)?;
        tracing::debug!(
            "User {} with score {:.2} may run up to {} listings",
            user,
            score,
            limit
        );
        Ok(limit)
    }

    pub fn limit_for_score(&self, score: f64) -> Result<i64> {
        let s = self.thresholds.threshold_or_default(ThresholdName::S);
        let t = self.thresholds.threshold_or_default(ThresholdName::T);
        interpolate_limit(score, s, t)
    }

    pub fn scores(&self) -> &ScoreCalculator<R, T> {
        &self.scores
    }
}

/// Maps a score onto a listing quota by linear interpolation.
///
/// The line is anchored at (S/2, 1) and (S, T), with S/2 truncated to an
/// integer. Scores below S map to 0; scores above S follow the same line
/// without a cap, so excellent sellers earn quotas beyond T. The result is
/// rounded half away from zero (`f64::round`).
///
/// S must be at least 1, otherwise both anchors collapse onto the same
/// abscissa and no line exists; that is reported as a configuration error
/// rather than a quota.
pub fn interpolate_limit(score: f64, s: i64, t: i64) -> Result<i64> {
    let a = s / 2;
    let b = s;
    let (c, d) = (1_i64, t);

    if b - a <= 0 {
        return Err(MarketError::InvalidConfigValueError {
            field: ThresholdName::S.as_str().to_string(),
            value: s.to_string(),
            reason: "interpolation anchors collapse; S must be at least 1".to_string(),
        });
    }

    if score < b as f64 {
        return Ok(0);
    }

    let slope = (d - c) as f64 / (b - a) as f64;
    Ok((c as f64 + slope * (score - a as f64)).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Grade, ListingId, Rating, RatingId};
    use crate::domain::ports::RatingDirectory;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    #[test]
    fn test_score_below_threshold_gets_no_quota() {
        assert_eq!(interpolate_limit(4.9, 5, 20).unwrap(), 0);
        assert_eq!(interpolate_limit(0.0, 5, 20).unwrap(), 0);
        assert_eq!(interpolate_limit(2.0, 5, 20).unwrap(), 0);
    }

    #[test]
    fn test_score_at_threshold_gets_exactly_t() {
        assert_eq!(interpolate_limit(5.0, 5, 20).unwrap(), 20);
        assert_eq!(interpolate_limit(8.0, 8, 30).unwrap(), 30);
        assert_eq!(interpolate_limit(1.0, 1, 7).unwrap(), 7);
    }

    #[test]
    fn test_scores_above_threshold_extrapolate_without_cap() {
        // anchors (2, 1) and (5, 20): 1 + 19/3 * (7 - 2) = 32.67
        assert_eq!(interpolate_limit(7.0, 5, 20).unwrap(), 33);
        // 1 + 19/3 * (10 - 2) = 51.67
        assert_eq!(interpolate_limit(10.0, 5, 20).unwrap(), 52);
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        // anchors (1, 1) and (2, 4): 1 + 3 * (2.5 - 1) = 5.5
        assert_eq!(interpolate_limit(2.5, 2, 4).unwrap(), 6);
    }

    #[test]
    fn test_collapsed_anchors_are_a_configuration_error() {
        assert!(interpolate_limit(5.0, 0, 20).is_err());
        assert!(interpolate_limit(5.0, -2, 20).is_err());

        let err = interpolate_limit(5.0, 0, 20).unwrap_err();
        assert!(matches!(
            err,
            MarketError::InvalidConfigValueError { ref field, .. } if field == "S"
        ));
    }

    struct MockRatings {
        ratings: Vec<Rating>,
    }

    #[async_trait]
    impl RatingDirectory for MockRatings {
        async fn ratings_for_rated(&self, user: UserId) -> Result<Vec<Rating>> {
            Ok(self
                .ratings
                .iter()
                .filter(|r| r.rated == user)
                .cloned()
                .collect())
        }

        async fn rating_by_rater_and_listing(
            &self,
            rater: UserId,
            listing: ListingId,
        ) -> Result<Option<Rating>> {
            Ok(self
                .ratings
                .iter()
                .find(|r| r.rater == rater && r.listing == listing)
                .cloned())
        }
    }

    #[derive(Clone)]
    struct TestThresholds(HashMap<ThresholdName, i64>);

    impl ThresholdSource for TestThresholds {
        fn threshold(&self, name: ThresholdName) -> Option<i64> {
            self.0.get(&name).copied()
        }
    }

    fn rating_with_grade(rated: UserId, tenths: u16, id: i64) -> Rating {
        Rating {
            id: RatingId(id),
            listing: ListingId(id),
            rater: UserId(900 + id),
            rated,
            grade: Grade::from_tenths(tenths).unwrap(),
            rated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_unrated_seller_lands_on_t() {
        // no ratings: score is the neutral S, which maps exactly onto T
        let mapper = LimitMapper::new(
            MockRatings { ratings: vec![] },
            TestThresholds(HashMap::new()),
        );
        assert_eq!(mapper.listing_limit(UserId(1)).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_poorly_rated_seller_gets_zero() {
        let user = UserId(2);
        let ratings = (0..5).map(|i| rating_with_grade(user, 20, i)).collect();
        let mapper = LimitMapper::new(
            MockRatings { ratings },
            TestThresholds(HashMap::new()),
        );
        assert_eq!(mapper.listing_limit(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_highly_rated_seller_exceeds_t() {
        let user = UserId(3);
        let ratings = (0..5).map(|i| rating_with_grade(user, 70, i)).collect();
        let mapper = LimitMapper::new(
            MockRatings { ratings },
            TestThresholds(HashMap::new()),
        );
        assert_eq!(mapper.listing_limit(user).await.unwrap(), 33);
    }
}

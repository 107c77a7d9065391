use crate::domain::model::{ThresholdName, UserId};
use crate::domain::ports::{RatingDirectory, ThresholdSource};
use crate::utils::error::Result;

/// 由最近收到的評價推導使用者的信譽分數。
///
/// 分數是最近 N 筆評價的平均分；完全沒有評價的使用者取得中性分數 S，
/// 讓新賣家從門檻邊緣起步而不是直接被拒。
pub struct ScoreCalculator<R, T> {
    ratings: R,
    thresholds: T,
}

impl<R, T> ScoreCalculator<R, T>
where
    R: RatingDirectory,
    T: ThresholdSource,
{
    pub fn new(ratings: R, thresholds: T) -> Self {
        Self { ratings, thresholds }
    }

    pub async fn score(&self, user: UserId) -> Result<f64> {
        let ratings = self.ratings.ratings_for_rated(user).await?;
        if ratings.is_empty() {
            let neutral = self.thresholds.threshold_or_default(ThresholdName::S);
            tracing::debug!(
                "User {} has no ratings yet, starting at the neutral score {}",
                user,
                neutral
            );
            return Ok(neutral as f64);
        }

        // 評價以 (rated_at, id) 遞減排序送達，取前 N 筆即最近 N 筆
        let window = self.rating_window();
        let recent: Vec<u32> = ratings
            .iter()
            .take(window)
            .map(|r| u32::from(r.grade.tenths()))
            .collect();
        let sum: u32 = recent.iter().sum();
        let score = f64::from(sum) / (recent.len() as f64 * 10.0);

        tracing::debug!(
            "User {} scores {:.2} over the {} most recent ratings",
            user,
            score,
            recent.len()
        );
        Ok(score)
    }

    fn rating_window(&self) -> usize {
        let n = self.thresholds.threshold_or_default(ThresholdName::N);
        if n <= 0 {
            let fallback = ThresholdName::N.default_value();
            tracing::warn!(
                "Rating window of {} cannot support a mean, using {} instead",
                n,
                fallback
            );
            return fallback as usize;
        }
        n as usize
    }
}

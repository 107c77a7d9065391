use crate::utils::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(UserId);
id_type!(ListingId);
id_type!(CategoryId);
id_type!(BidId);
id_type!(RatingId);

/// 評價分數，0.0 到 10.0，精確到小數點後一位。
///
/// 內部以「十分之一點」的整數存放，讓平均分數與門檻的比較、
/// 以及修訂時 ±0.1 的界限檢查都是精確的十進位比較，不受浮點誤差影響。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Grade(u16);

impl Grade {
    pub const MAX_TENTHS: u16 = 100;

    /// Builds a grade from a decimal value, rounded to the nearest tenth.
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || !(0.0..=10.0).contains(&value) {
            return Err(MarketError::EntityValidationError {
                entity: "rating".to_string(),
                field: "grade".to_string(),
                reason: format!("grade {} is outside the 0.0..=10.0 scale", value),
            });
        }
        Ok(Grade((value * 10.0).round() as u16))
    }

    pub fn from_tenths(tenths: u16) -> Result<Self> {
        if tenths > Self::MAX_TENTHS {
            return Err(MarketError::EntityValidationError {
                entity: "rating".to_string(),
                field: "grade".to_string(),
                reason: format!("{} tenths exceeds the 10.0 maximum", tenths),
            });
        }
        Ok(Grade(tenths))
    }

    pub fn value(&self) -> f64 {
        f64::from(self.0) / 10.0
    }

    pub fn tenths(&self) -> u16 {
        self.0
    }

    /// Absolute difference in tenths, used for the revision tolerance check.
    pub fn delta_tenths(&self, other: Grade) -> u16 {
        self.0.abs_diff(other.0)
    }
}

impl TryFrom<f64> for Grade {
    type Error = MarketError;

    fn try_from(value: f64) -> Result<Self> {
        Grade::new(value)
    }
}

impl From<Grade> for f64 {
    fn from(grade: Grade) -> f64 {
        grade.value()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

/// 規則引擎可調門檻的名稱。
///
/// 每個門檻都有文件化的預設值；配置來源讀不到值時一律退回預設值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdName {
    /// Max simultaneously open listings per seller inside a time window.
    K,
    /// Max simultaneously open listings per seller and category.
    M,
    /// How many of the most recent ratings feed the reputation score.
    N,
    /// Score threshold: below it no listings are allowed, at it the quota is T.
    S,
    /// Listing quota granted at score S.
    T,
    /// Description similarity percent at or above which a listing is a duplicate.
    L,
}

impl ThresholdName {
    pub const ALL: [ThresholdName; 6] = [
        ThresholdName::K,
        ThresholdName::M,
        ThresholdName::N,
        ThresholdName::S,
        ThresholdName::T,
        ThresholdName::L,
    ];

    pub fn default_value(&self) -> i64 {
        match self {
            ThresholdName::K => 10,
            ThresholdName::M => 5,
            ThresholdName::N => 5,
            ThresholdName::S => 5,
            ThresholdName::T => 20,
            ThresholdName::L => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdName::K => "K",
            ThresholdName::M => "M",
            ThresholdName::N => "N",
            ThresholdName::S => "S",
            ThresholdName::T => "T",
            ThresholdName::L => "L",
        }
    }
}

impl fmt::Display for ThresholdName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 候選刊登在結構上不合格的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingDefect {
    EmptyName,
    EmptyDescription,
    NegativeStartingPrice,
    EndsBeforeStarts,
}

impl fmt::Display for ListingDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ListingDefect::EmptyName => "name must not be blank",
            ListingDefect::EmptyDescription => "description must not be blank",
            ListingDefect::NegativeStartingPrice => "starting price must not be negative",
            ListingDefect::EndsBeforeStarts => "end date must not precede the start date",
        };
        f.write_str(text)
    }
}

/// 拍賣刊登。
///
/// `terminates_at` 在建立時等於 `ends_at`，之後固定不變：賣家可以延後
/// 顯示用的結束日，但評價窗口與重疊計算永遠以原始的終止日為準。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub name: String,
    pub description: String,
    pub category: CategoryId,
    pub seller: UserId,
    pub starting_price: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub terminates_at: DateTime<Utc>,
}

impl Listing {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ListingId,
        name: impl Into<String>,
        description: impl Into<String>,
        category: CategoryId,
        seller: UserId,
        starting_price: i64,
        currency: impl Into<String>,
        created_at: DateTime<Utc>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            category,
            seller,
            starting_price,
            currency: currency.into(),
            created_at,
            starts_at,
            ends_at,
            // 終止日在建立當下定格
            terminates_at: ends_at,
        }
    }

    /// Moves the displayed end date. The termination date stays untouched.
    pub fn edit_ends_at(&mut self, new_ends_at: DateTime<Utc>) {
        self.ends_at = new_ends_at;
    }

    /// First structural problem found, in a fixed check order.
    pub fn structural_defect(&self) -> Option<ListingDefect> {
        if self.name.trim().is_empty() {
            return Some(ListingDefect::EmptyName);
        }
        if self.description.trim().is_empty() {
            return Some(ListingDefect::EmptyDescription);
        }
        if self.starting_price < 0 {
            return Some(ListingDefect::NegativeStartingPrice);
        }
        if self.ends_at < self.starts_at {
            return Some(ListingDefect::EndsBeforeStarts);
        }
        None
    }
}

/// 買家對刊登的出價
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub listing: ListingId,
    pub buyer: UserId,
    pub amount: i64,
    pub placed_at: DateTime<Utc>,
}

/// 拍賣結束後，交易一方對另一方的評價
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub listing: ListingId,
    pub rater: UserId,
    pub rated: UserId,
    pub grade: Grade,
    pub rated_at: DateTime<Utc>,
}

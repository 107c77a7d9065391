use crate::domain::model::ThresholdName;
use crate::domain::ports::ThresholdSource;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{
    validate_min_value, validate_non_empty_string, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlThresholds {
    pub ruleset: RulesetInfo,
    #[serde(default)]
    pub thresholds: ThresholdTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesetInfo {
    pub name: String,
    pub description: String,
    pub version: String,
}

/// 六個門檻都可省略，省略的門檻由呼叫端的預設值補上
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub k: Option<i64>,
    pub m: Option<i64>,
    pub n: Option<i64>,
    pub s: Option<i64>,
    pub t: Option<i64>,
    pub l: Option<i64>,
}

impl TomlThresholds {
    /// 從 TOML 檔案載入門檻配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarketError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析門檻配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarketError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${STRICT_SCORE_FLOOR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證門檻的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("ruleset.name", &self.ruleset.name)?;

        // S 是分數門檻，分數的量表只到 10
        if let Some(s) = self.thresholds.s {
            validate_range("thresholds.s", s, 1, 10)?;
        }

        if let Some(t) = self.thresholds.t {
            validate_min_value("thresholds.t", t, 1)?;
        }

        // 平均值至少需要一筆評價
        if let Some(n) = self.thresholds.n {
            validate_min_value("thresholds.n", n, 1)?;
        }

        if let Some(k) = self.thresholds.k {
            validate_min_value("thresholds.k", k, 0)?;
        }

        if let Some(m) = self.thresholds.m {
            validate_min_value("thresholds.m", m, 0)?;
        }

        // L 是相似度百分比
        if let Some(l) = self.thresholds.l {
            validate_range("thresholds.l", l, 0, 100)?;
        }

        Ok(())
    }
}

impl ThresholdSource for TomlThresholds {
    fn threshold(&self, name: ThresholdName) -> Option<i64> {
        match name {
            ThresholdName::K => self.thresholds.k,
            ThresholdName::M => self.thresholds.m,
            ThresholdName::N => self.thresholds.n,
            ThresholdName::S => self.thresholds.s,
            ThresholdName::T => self.thresholds.t,
            ThresholdName::L => self.thresholds.l,
        }
    }
}

impl Validate for TomlThresholds {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_threshold_config() {
        let toml_content = r#"
[ruleset]
name = "default-market"
description = "Production thresholds"
version = "1.0.0"

[thresholds]
k = 8
s = 4
t = 25
"#;

        let config = TomlThresholds::from_toml_str(toml_content).unwrap();

        assert_eq!(config.ruleset.name, "default-market");
        assert_eq!(config.threshold(ThresholdName::K), Some(8));
        assert_eq!(config.threshold(ThresholdName::S), Some(4));
        assert_eq!(config.threshold(ThresholdName::T), Some(25));
        // omitted thresholds stay unset and fall back downstream
        assert_eq!(config.threshold(ThresholdName::M), None);
        assert_eq!(config.threshold_or_default(ThresholdName::M), 5);
    }

    #[test]
    fn test_missing_threshold_table_is_allowed() {
        let toml_content = r#"
[ruleset]
name = "bare"
description = "No overrides at all"
version = "0.1"
"#;

        let config = TomlThresholds::from_toml_str(toml_content).unwrap();
        for name in ThresholdName::ALL {
            assert_eq!(config.threshold(name), None);
        }
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MARKET_SCORE_FLOOR", "7");

        let toml_content = r#"
[ruleset]
name = "env-test"
description = "test"
version = "1.0"

[thresholds]
s = ${MARKET_SCORE_FLOOR}
"#;

        let config = TomlThresholds::from_toml_str(toml_content).unwrap();
        assert_eq!(config.threshold(ThresholdName::S), Some(7));

        std::env::remove_var("MARKET_SCORE_FLOOR");
    }

    #[test]
    fn test_config_validation_rejects_out_of_range_values() {
        let toml_content = r#"
[ruleset]
name = "broken"
description = "test"
version = "1.0"

[thresholds]
s = 0
"#;

        let config = TomlThresholds::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let toml_content = r#"
[ruleset]
name = "broken"
description = "test"
version = "1.0"

[thresholds]
l = 150
"#;

        let config = TomlThresholds::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[ruleset]
name = "file-test"
description = "File test"
version = "1.0"

[thresholds]
n = 3
l = 85
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlThresholds::from_file(temp_file.path()).unwrap();
        assert_eq!(config.ruleset.name, "file-test");
        assert_eq!(config.threshold(ThresholdName::N), Some(3));
        assert_eq!(config.threshold(ThresholdName::L), Some(85));
    }
}

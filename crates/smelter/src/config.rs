//! Field configuration: canonical names, declared types, column roles.
//!
//! The defaults describe Chanmama/Douyin export layouts. A TOML file can
//! override any section independently; omitted sections keep their
//! defaults, while a present-but-empty section genuinely empties it.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SmelterError};

/// Declared storage type of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Float64,
    Int64,
    Utf8,
    Date,
    Datetime,
}

/// How a source column's values are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Passthrough, no derived column.
    Plain,
    /// Rate text like "20.00%"; derived value divided by 100.
    Percentage,
    /// Quantity text like "7.5w~10w"; derived value is the lower bound.
    FuzzyRange,
    /// Key-like column, passthrough.
    Identifier,
}

/// Column-level configuration for normalization and quality checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Source column name → canonical field name.
    #[serde(default = "default_field_mapping")]
    pub field_mapping: IndexMap<String, String>,
    /// Canonical field name → declared type, used for conformance checks.
    #[serde(default = "default_data_types")]
    pub data_types: IndexMap<String, FieldType>,
    /// Canonical fields a table is expected to carry.
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
    /// Source column name → normalization role. Unlisted columns are
    /// treated as plain.
    #[serde(default = "default_column_roles")]
    pub column_roles: IndexMap<String, ColumnRole>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            field_mapping: default_field_mapping(),
            data_types: default_data_types(),
            required_fields: default_required_fields(),
            column_roles: default_column_roles(),
        }
    }
}

impl FieldConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| SmelterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SmelterError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|source| SmelterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Role of a source column, matched case- and whitespace-insensitively.
    pub fn role_of(&self, column: &str) -> ColumnRole {
        let key = lookup_key(column);
        self.column_roles
            .iter()
            .find(|(name, _)| lookup_key(name) == key)
            .map(|(_, role)| *role)
            .unwrap_or(ColumnRole::Plain)
    }

    /// Canonical name of a source column, if one is mapped.
    pub fn canonical_of(&self, column: &str) -> Option<&str> {
        let key = lookup_key(column);
        self.field_mapping
            .iter()
            .find(|(name, _)| lookup_key(name) == key)
            .map(|(_, canonical)| canonical.as_str())
    }

    /// Declared type for a source column, resolved through the canonical
    /// mapping, or directly when the column already bears a canonical name.
    pub fn expected_type(&self, column: &str) -> Option<FieldType> {
        if let Some(canonical) = self.canonical_of(column) {
            if let Some(ty) = self.data_types.get(canonical) {
                return Some(*ty);
            }
        }
        let key = lookup_key(column);
        self.data_types
            .iter()
            .find(|(name, _)| lookup_key(name) == key)
            .map(|(_, ty)| *ty)
    }
}

fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn default_field_mapping() -> IndexMap<String, String> {
    [
        ("排名", "rank"),
        ("商品", "product_title"),
        ("商品标题", "product_title"),
        ("商品链接", "product_url"),
        ("商品价格", "price"),
        ("销量", "sales"),
        ("销售额", "gmv"),
        ("佣金比例", "commission_rate"),
        ("转化率", "conversion_rate"),
        ("30天转化率", "conversion_rate_30d"),
        ("近30天销量", "sales_30d"),
        ("周销量", "sales_weekly"),
        ("近1年销量", "sales_1y"),
        ("近30天销售额", "gmv_30d"),
        ("近1年销售额", "gmv_1y"),
        ("昨日销量", "sales_yesterday"),
        ("近90天销量", "sales_90d"),
        ("同期销量", "sales_same_period"),
        ("直播销售额", "live_gmv"),
        ("商品卡销售额", "card_gmv"),
        ("店铺", "shop_name"),
        ("小店", "shop_name"),
        ("品牌", "brand"),
        ("商品分类", "category"),
        ("类目", "category"),
        ("上架时间", "listed_at"),
        ("达人昵称", "influencer_name"),
        ("周带货达人", "weekly_influencers"),
        ("关联达人", "related_influencers"),
        ("商品头图链接", "image_url"),
        ("蝉妈妈商品链接", "chanmama_url"),
        ("蝉妈妈链接", "chanmama_url"),
        ("抖音商品链接", "douyin_url"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_data_types() -> IndexMap<String, FieldType> {
    [
        ("rank", FieldType::Int64),
        ("product_title", FieldType::Utf8),
        ("price", FieldType::Float64),
        ("live_gmv", FieldType::Float64),
        ("card_gmv", FieldType::Float64),
        ("listed_at", FieldType::Date),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_required_fields() -> Vec<String> {
    vec!["rank".to_string(), "product_title".to_string()]
}

fn default_column_roles() -> IndexMap<String, ColumnRole> {
    let fuzzy = [
        "近30天销量",
        "周销量",
        "近1年销量",
        "销售额",
        "近30天销售额",
        "近1年销售额",
        "昨日销量",
        "近90天销量",
        "同期销量",
        "周带货达人",
        "关联达人",
    ];
    let percentage = ["佣金比例", "转化率", "30天转化率"];

    let mut roles: IndexMap<String, ColumnRole> = IndexMap::new();
    roles.insert("排名".to_string(), ColumnRole::Identifier);
    for name in fuzzy {
        roles.insert(name.to_string(), ColumnRole::FuzzyRange);
    }
    for name in percentage {
        roles.insert(name.to_string(), ColumnRole::Percentage);
    }
    roles
}

//! Keyword vocabulary for header and table-name recognition.
//!
//! These terms come from Chanmama/Douyin export layouts. Header keywords
//! are matched by exact equality against distinct trimmed cell values;
//! table-name keywords are matched by substring against joined title rows.

/// Column labels that commonly appear in export header rows.
pub const HEADER_KEYWORDS: &[&str] = &[
    "商品",
    "销量",
    "销售额",
    "佣金",
    "转化率",
    "链接",
    "分类",
    "商品标题",
    "商品链接",
    "商品价格",
    "店铺",
    "品牌",
    "类目",
    "佣金比例",
    "直播销售额",
    "商品卡销售额",
    "近30天销量",
    "周销量",
    "近1年销量",
    "30天转化率",
    "上架时间",
    "达人昵称",
];

/// A small combination that identifies ranking-table headers even when
/// few other keywords match. Two of these three is enough.
pub const CORE_COMBO: &[&str] = &["排名", "商品", "佣金比例"];

/// Table-type markers searched for in title rows above a header.
pub const TABLE_NAME_KEYWORDS: &[&str] = &[
    "销量榜",
    "商品库",
    "SKU",
    "抖音",
    "直播",
    "热推榜",
    "潜力爆品榜",
    "持续好货榜",
    "历史同期榜",
];

/// Generic markers accepted when no full table-type keyword matches.
pub const GENERIC_NAME_MARKERS: &[&str] = &["榜", "库"];

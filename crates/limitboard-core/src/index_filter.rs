//! Selection and ordering of the major A-share indices.

use std::cmp::Ordering;

use crate::IndexSnapshot;

/// Major indices in display order.
pub const MAIN_INDEX_CODES: [(&str, &str); 11] = [
    ("000001", "上证指数"),
    ("000016", "上证50"),
    ("399001", "深证成指"),
    ("399006", "创业板指"),
    ("000688", "科创50"),
    ("000680", "科创综指"),
    ("899050", "北证50"),
    ("000300", "沪深300"),
    ("000905", "中证500"),
    ("000852", "中证1000"),
    ("932000", "中证2000"),
];

/// Name fragments matched in either direction against index names.
pub const MAIN_INDEX_KEYWORDS: [&str; 13] = [
    "上证指数",
    "上证50",
    "深证成指",
    "深证指数",
    "创业板指",
    "创业板指数",
    "科创50",
    "科创综指",
    "北证50",
    "沪深300",
    "中证500",
    "中证1000",
    "中证2000",
];

fn display_rank(code: &str) -> Option<usize> {
    MAIN_INDEX_CODES
        .iter()
        .position(|(main_code, _)| *main_code == code)
}

pub fn is_main_index(code: &str, name: &str) -> bool {
    if display_rank(code).is_some() {
        return true;
    }
    let name = name.trim();
    !name.is_empty()
        && MAIN_INDEX_KEYWORDS
            .iter()
            .any(|keyword| name.contains(keyword) || keyword.contains(name))
}

/// Keeps the major indices: listed codes first in display order, then
/// name matches sorted by name.
pub fn filter_main_indices(indices: Vec<IndexSnapshot>) -> Vec<IndexSnapshot> {
    let mut main: Vec<IndexSnapshot> = indices
        .into_iter()
        .filter(|index| is_main_index(&index.index_code, &index.index_name))
        .collect();

    main.sort_by(|a, b| {
        match (display_rank(&a.index_code), display_rank(&b.index_code)) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.index_name.cmp(&b.index_name),
        }
    });
    main
}

//! 报告生成：纯文本提示与搜索结果 JSON
//!
//! 这些字符串只是便利输出，不是稳定的格式。

use serde::Serialize;

use crate::model::node_index::{NodeIndex, SourcePath};
use crate::model::shadow_tree::{walk_preorder, DisplaySurface, MarkStyle, NodeId};
use crate::search::{Query, ResultNavigator, SearchMatch};

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "Ready";
pub const STATUS_NO_MATCH: &str = "No match";
pub const STATUS_NOTHING_TO_UNDO: &str = "Nothing to undo";
pub const STATUS_UNDONE: &str = "Last replace undone";
pub const ARROW: &str = "→";

pub fn found_report(term: &str, count: usize) -> String {
    match count {
        0 => format!("No matches for '{}'", term),
        1 => format!("Found 1 match for '{}'", term),
        n => format!("Found {} matches for '{}'", n, term),
    }
}

/// “Match i/N”，空结果集为 [`STATUS_NO_MATCH`]
pub fn position_report(navigator: &ResultNavigator) -> String {
    match navigator.position() {
        Some((i, n)) => format!("Match {}/{}", i, n),
        None => STATUS_NO_MATCH.to_string(),
    }
}

/// 每行一条 “旧标签 → 新标签”
pub fn replace_preview_report(changes: &[(String, String)]) -> String {
    changes
        .iter()
        .map(|(before, after)| format!("{} {} {}", before, ARROW, after))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn replace_report(find: &str, replace_with: &str, count: usize) -> String {
    format!("Replaced '{}' {} '{}' in {} labels", find, ARROW, replace_with, count)
}

pub fn rollback_report(undone: bool) -> &'static str {
    if undone {
        STATUS_UNDONE
    } else {
        STATUS_NOTHING_TO_UNDO
    }
}

/// 缩进大纲，两格一层；高亮节点以 `*` 标出
pub fn outline<S: DisplaySurface + ?Sized>(surface: &S, root: NodeId, style: MarkStyle) -> String {
    let mut out = String::new();
    for id in walk_preorder(surface, root) {
        let mut depth = 0;
        let mut cur = id;
        while cur != root {
            match surface.parent(cur) {
                Some(p) => {
                    depth += 1;
                    cur = p;
                }
                None => break,
            }
        }
        let marker = if surface.is_marked(id, style) { "* " } else { "" };
        out.push_str(&"  ".repeat(depth));
        out.push_str(marker);
        out.push_str(surface.label(id).unwrap_or_default());
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct ResultEntry<'a> {
    path: String,
    source: Option<&'a SourcePath>,
    #[serde(flatten)]
    hit: &'a SearchMatch,
}

#[derive(Serialize)]
struct ResultsDoc<'a> {
    query: &'a Query,
    total_matches: usize,
    results: Vec<ResultEntry<'a>>,
}

/// 搜索结果导出为 pretty JSON，附带每个命中的源路径
pub fn search_results_json(
    query: &Query,
    matches: &[SearchMatch],
    index: &NodeIndex,
) -> Result<String, serde_json::Error> {
    let results = matches
        .iter()
        .map(|hit| {
            let source = index.path_of(hit.id);
            ResultEntry {
                path: source.map(SourcePath::to_json_path).unwrap_or_default(),
                source,
                hit,
            }
        })
        .collect();
    let doc = ResultsDoc {
        query,
        total_matches: matches.len(),
        results,
    };
    serde_json::to_string_pretty(&doc)
}

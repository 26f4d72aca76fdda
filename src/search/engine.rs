//! SearchEngine：先序遍历产生有序命中列表
//!
//! 节点先于子节点被测试，子节点按 childIds 从左到右。导航器的 Next/Previous 依赖这一顺序。

use std::ops::Range;
use std::time::Instant;

use serde::Serialize;

use crate::model::shadow_tree::{walk_preorder, DisplaySurface, NodeId};
use crate::search::matcher::Matcher;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    #[serde(skip)]
    pub id: NodeId,
    pub label: String,
    /// 命中区间（字节偏移）
    pub span: Option<Range<usize>>,
}

/// 以任意谓词查找；返回先序排列的节点 id
pub fn find<S, P>(surface: &S, root: NodeId, predicate: P) -> Vec<NodeId>
where
    S: DisplaySurface + ?Sized,
    P: Fn(&str) -> bool,
{
    walk_preorder(surface, root)
        .filter(|id| surface.label(*id).is_some_and(&predicate))
        .collect()
}

/// 以编译后的查询查找，保留标签与命中区间；空查询直接返回空序列
pub fn find_matches<S>(surface: &S, root: NodeId, matcher: &Matcher) -> Vec<SearchMatch>
where
    S: DisplaySurface + ?Sized,
{
    if matcher.is_empty() {
        return Vec::new();
    }
    let start = Instant::now();
    let matches: Vec<SearchMatch> = walk_preorder(surface, root)
        .filter_map(|id| {
            let label = surface.label(id)?;
            let span = matcher.find(label)?;
            Some(SearchMatch {
                id,
                label: label.to_string(),
                span: Some(span),
            })
        })
        .collect();
    tracing::debug!("搜索完成: {} 个匹配，耗时: {:.1}ms", matches.len(), start.elapsed().as_secs_f64() * 1000.0);
    matches
}

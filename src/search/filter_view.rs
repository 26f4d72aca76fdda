//! FilterView：按谓词重建的扁平合成树
//!
//! 命中的叶子（无子节点的节点）按先序直接挂在一个合成根下，丢弃原有层级。
//! 视图使用独立的显示面，重建不会使主树的 id 失效。

use std::collections::HashMap;

use crate::model::shadow_tree::{walk_preorder, DisplaySurface, NodeId, ShadowTree};

pub struct FilterView<S: DisplaySurface = ShadowTree> {
    surface: S,
    root_label: String,
    no_match_label: String,
    root: Option<NodeId>,
    /// 合成节点 → 主树原节点
    origins: HashMap<NodeId, NodeId>,
}

impl Default for FilterView<ShadowTree> {
    fn default() -> Self {
        Self::new(ShadowTree::new(), "Filter results", "No matches")
    }
}

impl<S: DisplaySurface> FilterView<S> {
    pub fn new(surface: S, root_label: impl Into<String>, no_match_label: impl Into<String>) -> Self {
        Self {
            surface,
            root_label: root_label.into(),
            no_match_label: no_match_label.into(),
            root: None,
            origins: HashMap::new(),
        }
    }

    /// 全量重建，返回新的合成根；无命中时合成根下只有一个哨兵叶子
    pub fn rebuild<T, P>(&mut self, source: &T, root: NodeId, predicate: P) -> NodeId
    where
        T: DisplaySurface + ?Sized,
        P: Fn(&str) -> bool,
    {
        self.surface.clear();
        self.origins.clear();

        let synthetic_root = self.surface.insert(&self.root_label, None);
        for id in walk_preorder(source, root) {
            if source.has_children(id) {
                continue;
            }
            let Some(label) = source.label(id) else {
                continue;
            };
            if predicate(label) {
                let leaf = self.surface.insert(label, Some(synthetic_root));
                self.origins.insert(leaf, id);
            }
        }
        if self.origins.is_empty() {
            self.surface.insert(&self.no_match_label, Some(synthetic_root));
        }

        tracing::debug!("过滤视图重建: {} 个叶子", self.origins.len());
        self.root = Some(synthetic_root);
        synthetic_root
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// 命中叶子数（不含哨兵）
    pub fn match_count(&self) -> usize {
        self.origins.len()
    }

    /// 合成节点对应的主树节点；哨兵与合成根没有来源
    pub fn origin_of(&self, synthetic: NodeId) -> Option<NodeId> {
        self.origins.get(&synthetic).copied()
    }

    /// 合成根下的标签，按显示顺序
    pub fn labels(&self) -> Vec<String> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut cur = self.surface.first_child(root);
        while let Some(id) = cur {
            if let Some(label) = self.surface.label(id) {
                out.push(label.to_string());
            }
            cur = self.surface.next_sibling(id);
        }
        out
    }

    pub fn clear(&mut self) {
        self.surface.clear();
        self.origins.clear();
        self.root = None;
    }
}

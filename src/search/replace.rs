//! ReplaceEngine：批量改写节点标签，以事务入撤销栈，支持整批回滚
//!
//! 对调用方可见的状态只有 Idle：ReplaceAll 要么整批生效并压入事务，要么什么都不改。

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::time::Instant;

use crate::model::shadow_tree::{walk_preorder, DisplaySurface, NodeId};

/// 一次批量改写的逆操作记录：(节点, 改写前标签)，按应用顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    entries: Vec<(NodeId, String)>,
}

impl Transaction {
    pub fn entries(&self) -> &[(NodeId, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 预览/执行共用的单条改写
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelChange {
    pub id: NodeId,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Default)]
pub struct ReplaceEngine {
    undo: VecDeque<Transaction>,
    /// None 表示不限深度
    history_depth: Option<NonZeroUsize>,
}

impl ReplaceEngine {
    pub fn new(history_depth: Option<NonZeroUsize>) -> Self {
        Self {
            undo: VecDeque::new(),
            history_depth,
        }
    }

    pub fn history_len(&self) -> usize {
        self.undo.len()
    }

    pub fn can_rollback(&self) -> bool {
        !self.undo.is_empty()
    }

    /// 重绑定后旧事务引用的 id 全部失效，必须丢弃
    pub fn clear_history(&mut self) {
        self.undo.clear();
    }

    /// 计算所有改写而不修改任何状态；先序，与搜索顺序一致
    pub fn plan<S>(surface: &S, root: NodeId, find: &str, replace_with: &str) -> Vec<LabelChange>
    where
        S: DisplaySurface + ?Sized,
    {
        if find.is_empty() {
            return Vec::new();
        }
        walk_preorder(surface, root)
            .filter_map(|id| {
                let before = surface.label(id)?;
                before.contains(find).then(|| LabelChange {
                    id,
                    before: before.to_string(),
                    after: before.replace(find, replace_with),
                })
            })
            .collect()
    }

    /// 供确认界面使用的 (旧标签, 新标签) 列表
    pub fn preview<S>(&self, surface: &S, root: NodeId, find: &str, replace_with: &str) -> Vec<(String, String)>
    where
        S: DisplaySurface + ?Sized,
    {
        Self::plan(surface, root, find, replace_with)
            .into_iter()
            .map(|c| (c.before, c.after))
            .collect()
    }

    /// 改写所有包含 `find` 的标签，返回改写的节点数
    ///
    /// 先完整规划再应用；中途任何节点写入失败都会把已写入的恢复原样并返回 0。
    /// 没有可改写的节点时不压入事务。
    pub fn replace_all<S>(&mut self, surface: &mut S, root: NodeId, find: &str, replace_with: &str) -> usize
    where
        S: DisplaySurface + ?Sized,
    {
        let start = Instant::now();
        let changes = Self::plan(&*surface, root, find, replace_with);
        if changes.is_empty() {
            return 0;
        }

        let mut tx = Transaction {
            entries: Vec::with_capacity(changes.len()),
        };
        for change in &changes {
            if !surface.set_label(change.id, &change.after) {
                tracing::error!("节点 {} 写入失败，整批回退 {} 条", change.id, tx.len());
                Self::revert(surface, &tx);
                return 0;
            }
            tx.entries.push((change.id, change.before.clone()));
        }

        let count = tx.len();
        self.push(tx);
        tracing::info!(
            "替换完成: '{}' → '{}'，{} 个节点，耗时: {:.1}ms",
            find,
            replace_with,
            count,
            start.elapsed().as_secs_f64() * 1000.0
        );
        count
    }

    /// 弹出最近事务并恢复全部标签；栈空返回 false 且不改任何状态
    ///
    /// 事务中任一节点已失效（例如中间发生过重绑定）时整条事务作废，不做部分恢复。
    pub fn rollback<S>(&mut self, surface: &mut S) -> bool
    where
        S: DisplaySurface + ?Sized,
    {
        let Some(tx) = self.undo.pop_back() else {
            tracing::info!("撤销栈为空，无可回滚");
            return false;
        };
        if let Some((stale, _)) = tx.entries.iter().find(|(id, _)| !surface.contains(*id)) {
            tracing::warn!("事务引用了失效节点 {}，已丢弃", stale);
            return false;
        }
        Self::revert(surface, &tx);
        tracing::info!("回滚完成: 恢复 {} 个节点", tx.len());
        true
    }

    fn revert<S: DisplaySurface + ?Sized>(surface: &mut S, tx: &Transaction) {
        for (id, before) in tx.entries.iter().rev() {
            surface.set_label(*id, before);
        }
    }

    fn push(&mut self, tx: Transaction) {
        self.undo.push_back(tx);
        if let Some(max) = self.history_depth {
            while self.undo.len() > max.get() {
                self.undo.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::binder::TreeBinder;
    use crate::model::data_node::DataNode;
    use crate::model::shadow_tree::{MarkStyle, ShadowTree};
    use crate::search::test_support::folders;

    fn snapshot(surface: &ShadowTree, root: NodeId) -> Vec<(NodeId, String)> {
        walk_preorder(surface, root)
            .map(|id| (id, surface.label(id).unwrap().to_string()))
            .collect()
    }

    #[test]
    fn test_replace_then_rollback_restores_everything() {
        let mut binder = TreeBinder::default();
        let root = binder.bind(&folders());
        let original = snapshot(binder.surface(), root);
        let mut engine = ReplaceEngine::default();

        let count = engine.replace_all(binder.surface_mut(), root, "File", "Document");
        assert_eq!(count, 80);
        let leaves: Vec<String> = walk_preorder(binder.surface(), root)
            .filter(|id| !binder.surface().has_children(*id))
            .map(|id| binder.surface().label(id).unwrap().to_string())
            .collect();
        assert_eq!(leaves.len(), 80);
        assert!(leaves.iter().all(|l| l.starts_with("Document")));
        assert!(!leaves.iter().any(|l| l.contains("File")), "同一标签内的每处出现都应替换");

        assert!(engine.rollback(binder.surface_mut()));
        assert_eq!(snapshot(binder.surface(), root), original);

        assert!(!engine.rollback(binder.surface_mut()), "第二次回滚应无可撤销");
        assert_eq!(snapshot(binder.surface(), root), original);
    }

    #[test]
    fn test_stacked_transactions_roll_back_in_order() {
        let mut binder = TreeBinder::default();
        let root = binder.bind(&DataNode::record([("k", DataNode::from("aaa"))]));
        let leaf = binder.surface().first_child(root).unwrap();
        let mut engine = ReplaceEngine::default();

        engine.replace_all(binder.surface_mut(), root, "a", "b");
        engine.replace_all(binder.surface_mut(), root, "b", "c");
        assert_eq!(binder.surface().label(leaf), Some("k: ccc"));
        assert_eq!(engine.history_len(), 2);

        assert!(engine.rollback(binder.surface_mut()));
        assert_eq!(binder.surface().label(leaf), Some("k: bbb"));
        assert!(engine.rollback(binder.surface_mut()));
        assert_eq!(binder.surface().label(leaf), Some("k: aaa"));
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let mut binder = TreeBinder::default();
        let root = binder.bind(&folders());
        let original = snapshot(binder.surface(), root);
        let engine = ReplaceEngine::default();

        let preview = engine.preview(binder.surface(), root, "Folder1/", "Archive/");
        assert_eq!(preview.len(), 8);
        assert_eq!(
            preview[0],
            ("File1.txt: Folder1/File1.txt".to_string(), "File1.txt: Archive/File1.txt".to_string())
        );
        assert_eq!(snapshot(binder.surface(), root), original);
        assert!(!engine.can_rollback());
    }

    #[test]
    fn test_no_match_and_empty_find_push_nothing() {
        let mut binder = TreeBinder::default();
        let root = binder.bind(&folders());
        let mut engine = ReplaceEngine::default();
        assert_eq!(engine.replace_all(binder.surface_mut(), root, "nope", "x"), 0);
        assert_eq!(engine.replace_all(binder.surface_mut(), root, "", "x"), 0);
        assert_eq!(engine.history_len(), 0);
        assert!(!engine.rollback(binder.surface_mut()));
    }

    #[test]
    fn test_history_depth_drops_oldest() {
        let mut binder = TreeBinder::default();
        let root = binder.bind(&DataNode::record([("k", DataNode::from("a"))]));
        let mut engine = ReplaceEngine::new(NonZeroUsize::new(2));
        engine.replace_all(binder.surface_mut(), root, "a", "b");
        engine.replace_all(binder.surface_mut(), root, "b", "c");
        engine.replace_all(binder.surface_mut(), root, "c", "d");
        assert_eq!(engine.history_len(), 2);

        assert!(engine.rollback(binder.surface_mut()));
        assert!(engine.rollback(binder.surface_mut()));
        assert!(!engine.rollback(binder.surface_mut()));
        let leaf = binder.surface().first_child(root).unwrap();
        assert_eq!(binder.surface().label(leaf), Some("k: b"), "最早的事务已被挤出");
    }

    #[test]
    fn test_smallest_history_depth_still_allows_undo() {
        let mut binder = TreeBinder::default();
        let root = binder.bind(&DataNode::record([("k", DataNode::from("a"))]));
        let leaf = binder.surface().first_child(root).unwrap();
        let mut engine = ReplaceEngine::new(NonZeroUsize::new(1));

        assert_eq!(engine.replace_all(binder.surface_mut(), root, "a", "b"), 1);
        assert_eq!(engine.replace_all(binder.surface_mut(), root, "b", "c"), 1);
        assert_eq!(engine.history_len(), 1);
        assert!(engine.rollback(binder.surface_mut()), "最近一次替换总能撤销");
        assert_eq!(binder.surface().label(leaf), Some("k: b"));
        assert!(!engine.rollback(binder.surface_mut()));
    }

    #[test]
    fn test_rollback_after_rebind_discards_stale_transaction() {
        let mut binder = TreeBinder::default();
        let data = folders();
        let root = binder.bind(&data);
        let mut engine = ReplaceEngine::default();
        engine.replace_all(binder.surface_mut(), root, "File", "Doc");

        let new_root = binder.bind(&data);
        let fresh = snapshot(binder.surface(), new_root);
        assert!(!engine.rollback(binder.surface_mut()));
        assert_eq!(snapshot(binder.surface(), new_root), fresh);
        assert_eq!(engine.history_len(), 0);
    }

    /// 拒绝写入指定节点的显示面，用来制造中途失败
    struct FlakySurface {
        inner: ShadowTree,
        reject: Option<NodeId>,
    }

    impl DisplaySurface for FlakySurface {
        fn insert(&mut self, label: &str, parent: Option<NodeId>) -> NodeId {
            self.inner.insert(label, parent)
        }
        fn clear(&mut self) {
            self.inner.clear()
        }
        fn set_label(&mut self, id: NodeId, text: &str) -> bool {
            if self.reject == Some(id) {
                return false;
            }
            self.inner.set_label(id, text)
        }
        fn mark(&mut self, id: NodeId, style: MarkStyle) -> bool {
            self.inner.mark(id, style)
        }
        fn unmark(&mut self, id: NodeId, style: MarkStyle) -> bool {
            self.inner.unmark(id, style)
        }
        fn is_marked(&self, id: NodeId, style: MarkStyle) -> bool {
            self.inner.is_marked(id, style)
        }
        fn label(&self, id: NodeId) -> Option<&str> {
            self.inner.label(id)
        }
        fn parent(&self, id: NodeId) -> Option<NodeId> {
            self.inner.parent(id)
        }
        fn first_child(&self, id: NodeId) -> Option<NodeId> {
            self.inner.first_child(id)
        }
        fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
            self.inner.next_sibling(id)
        }
        fn select(&mut self, id: NodeId) -> bool {
            self.inner.select(id)
        }
    }

    #[test]
    fn test_partial_failure_leaves_tree_untouched() {
        let surface = FlakySurface {
            inner: ShadowTree::new(),
            reject: None,
        };
        let mut binder = TreeBinder::new(surface, Default::default());
        let root = binder.bind(&folders());
        let original = snapshot(&binder.surface().inner, root);

        // 第 40 个待改写节点拒绝写入：前 39 个已写入的必须被恢复
        let planned = ReplaceEngine::plan(binder.surface(), root, "File", "Doc");
        binder.surface_mut().reject = Some(planned[39].id);

        let mut engine = ReplaceEngine::default();
        assert_eq!(engine.replace_all(binder.surface_mut(), root, "File", "Doc"), 0);
        assert_eq!(engine.history_len(), 0, "失败的批次不入栈");
        assert_eq!(snapshot(&binder.surface().inner, root), original);
    }
}

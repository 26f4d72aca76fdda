//! HighlightState：命中节点的标记与清除

use crate::model::shadow_tree::{walk_preorder, DisplaySurface, MarkStyle, NodeId};

#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightState {
    style: MarkStyle,
}

impl HighlightState {
    pub fn new(style: MarkStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> MarkStyle {
        self.style
    }

    /// 返回实际标记的节点数（失效 id 被跳过）
    pub fn mark<S: DisplaySurface + ?Sized>(&self, surface: &mut S, ids: &[NodeId]) -> usize {
        ids.iter().filter(|id| surface.mark(**id, self.style)).count()
    }

    /// 遍历整棵树逐一取消标记，而不只是上次标记过的节点
    pub fn clear_all<S: DisplaySurface + ?Sized>(&self, surface: &mut S, root: NodeId) -> usize {
        let all: Vec<NodeId> = walk_preorder(&*surface, root).collect();
        for id in &all {
            surface.unmark(*id, self.style);
        }
        all.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::binder::TreeBinder;
    use crate::search::engine::find;
    use crate::search::test_support::folders;

    fn marked_count(binder: &TreeBinder, root: NodeId, style: MarkStyle) -> usize {
        walk_preorder(binder.surface(), root)
            .filter(|id| binder.surface().is_marked(*id, style))
            .count()
    }

    #[test]
    fn test_mark_then_clear_twice() {
        let mut binder = TreeBinder::default();
        let root = binder.bind(&folders());
        let hits = find(binder.surface(), root, |l| l.contains("File3"));

        let hl = HighlightState::new(MarkStyle::Bold);
        assert_eq!(hl.mark(binder.surface_mut(), &hits), 10);
        assert_eq!(marked_count(&binder, root, MarkStyle::Bold), 10);

        hl.clear_all(binder.surface_mut(), root);
        assert_eq!(marked_count(&binder, root, MarkStyle::Bold), 0);
        hl.clear_all(binder.surface_mut(), root);
        assert_eq!(marked_count(&binder, root, MarkStyle::Bold), 0, "重复清除应保持无标记");
    }

    #[test]
    fn test_clear_removes_marks_from_stale_result_sets() {
        let mut binder = TreeBinder::default();
        let root = binder.bind(&folders());
        let hl = HighlightState::default();

        let first = find(binder.surface(), root, |l| l.contains("File1"));
        hl.mark(binder.surface_mut(), &first);
        let second = find(binder.surface(), root, |l| l.contains("File2"));
        hl.mark(binder.surface_mut(), &second);

        // 只知道第二批结果也必须清干净
        hl.clear_all(binder.surface_mut(), root);
        assert_eq!(marked_count(&binder, root, MarkStyle::Bold), 0);
    }

    #[test]
    fn test_clear_leaves_other_styles_alone() {
        let mut binder = TreeBinder::default();
        let root = binder.bind(&folders());
        binder.surface_mut().mark(root, MarkStyle::Selected);

        HighlightState::new(MarkStyle::Bold).clear_all(binder.surface_mut(), root);
        assert!(binder.surface().is_marked(root, MarkStyle::Selected));
    }
}

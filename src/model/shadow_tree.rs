//! 影子树（Shadow Tree）：与 UI 解耦的显示面抽象及其内存实现
//!
//! 绑定器、搜索、高亮、过滤与替换只通过 [`DisplaySurface`] 访问树，
//! 真实的树控件与测试用的 [`ShadowTree`] 实现同一组原语。

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_SURFACE_TAG: AtomicU32 = AtomicU32::new(1);

/// 树节点标识：在所属显示面内唯一，创建时生成，永不复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    surface: u32,
    serial: u64,
}

impl NodeId {
    pub fn surface(&self) -> u32 {
        self.surface
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.surface, self.serial)
    }
}

/// 标记样式（粗体 / 选中）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkStyle {
    #[default]
    Bold,
    Selected,
}

impl MarkStyle {
    fn bit(self) -> u8 {
        match self {
            MarkStyle::Bold => 0b01,
            MarkStyle::Selected => 0b10,
        }
    }
}

/// 树显示面的最小能力集
///
/// 对未知 id 的访问返回 `None` / `false`，不会 panic。
pub trait DisplaySurface {
    fn insert(&mut self, label: &str, parent: Option<NodeId>) -> NodeId;
    /// 删除全部节点；此前发出的 id 全部失效
    fn clear(&mut self);
    fn set_label(&mut self, id: NodeId, text: &str) -> bool;
    fn mark(&mut self, id: NodeId, style: MarkStyle) -> bool;
    fn unmark(&mut self, id: NodeId, style: MarkStyle) -> bool;
    fn is_marked(&self, id: NodeId, style: MarkStyle) -> bool;
    fn label(&self, id: NodeId) -> Option<&str>;
    fn parent(&self, id: NodeId) -> Option<NodeId>;
    fn first_child(&self, id: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, id: NodeId) -> Option<NodeId>;
    /// 滚动/聚焦到节点
    fn select(&mut self, id: NodeId) -> bool;

    fn contains(&self, id: NodeId) -> bool {
        self.label(id).is_some()
    }

    fn has_children(&self, id: NodeId) -> bool {
        self.first_child(id).is_some()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    label: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// 在父节点 children 中的位置，next_sibling 用
    position: usize,
    marks: u8,
}

/// 内存中的显示面：扁平 id 表，不做任何渲染
#[derive(Debug)]
pub struct ShadowTree {
    tag: u32,
    next_serial: u64,
    slots: HashMap<NodeId, Slot>,
    roots: Vec<NodeId>,
    selected: Option<NodeId>,
}

impl Default for ShadowTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowTree {
    pub fn new() -> Self {
        Self {
            tag: NEXT_SURFACE_TAG.fetch_add(1, Ordering::Relaxed),
            next_serial: 0,
            slots: HashMap::with_capacity(1024),
            roots: Vec::new(),
            selected: None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// 外来 id 属于编程错误：调试构建直接断言，发布构建按未知 id 处理
    fn slot(&self, id: NodeId) -> Option<&Slot> {
        debug_assert_eq!(id.surface, self.tag, "节点 {} 不属于此显示面", id);
        self.slots.get(&id)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        debug_assert_eq!(id.surface, self.tag, "节点 {} 不属于此显示面", id);
        self.slots.get_mut(&id)
    }
}

impl DisplaySurface for ShadowTree {
    fn insert(&mut self, label: &str, parent: Option<NodeId>) -> NodeId {
        self.next_serial += 1;
        let id = NodeId {
            surface: self.tag,
            serial: self.next_serial,
        };
        // 未知父节点退化为顶层节点
        let parent = parent.filter(|p| self.slot(*p).is_some());
        let position = match parent.and_then(|p| self.slots.get_mut(&p)) {
            Some(p) => {
                p.children.push(id);
                p.children.len() - 1
            }
            None => {
                self.roots.push(id);
                self.roots.len() - 1
            }
        };
        self.slots.insert(
            id,
            Slot {
                label: label.to_string(),
                parent,
                children: Vec::new(),
                position,
                marks: 0,
            },
        );
        id
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.roots.clear();
        self.selected = None;
    }

    fn set_label(&mut self, id: NodeId, text: &str) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.label = text.to_string();
                true
            }
            None => false,
        }
    }

    fn mark(&mut self, id: NodeId, style: MarkStyle) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.marks |= style.bit();
                true
            }
            None => false,
        }
    }

    fn unmark(&mut self, id: NodeId, style: MarkStyle) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.marks &= !style.bit();
                true
            }
            None => false,
        }
    }

    fn is_marked(&self, id: NodeId, style: MarkStyle) -> bool {
        self.slot(id).is_some_and(|s| s.marks & style.bit() != 0)
    }

    fn label(&self, id: NodeId) -> Option<&str> {
        self.slot(id).map(|s| s.label.as_str())
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.children.first().copied())
    }

    fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let slot = self.slot(id)?;
        let siblings = match slot.parent {
            Some(p) => &self.slots.get(&p)?.children,
            None => &self.roots,
        };
        siblings.get(slot.position + 1).copied()
    }

    fn select(&mut self, id: NodeId) -> bool {
        if self.slot(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }
}

/// 以 `root` 为界的先序遍历：先访问节点，再从左到右访问子节点
///
/// 只依赖 first_child / next_sibling / parent，不递归，不受深度限制。
pub struct PreOrder<'a, S: DisplaySurface + ?Sized> {
    surface: &'a S,
    root: NodeId,
    next: Option<NodeId>,
}

impl<'a, S: DisplaySurface + ?Sized> PreOrder<'a, S> {
    pub fn new(surface: &'a S, root: NodeId) -> Self {
        let next = surface.contains(root).then_some(root);
        Self {
            surface,
            root,
            next,
        }
    }

    fn advance(&self, node: NodeId) -> Option<NodeId> {
        if let Some(child) = self.surface.first_child(node) {
            return Some(child);
        }
        let mut cur = node;
        loop {
            if cur == self.root {
                return None;
            }
            if let Some(sibling) = self.surface.next_sibling(cur) {
                return Some(sibling);
            }
            cur = self.surface.parent(cur)?;
        }
    }
}

impl<S: DisplaySurface + ?Sized> Iterator for PreOrder<'_, S> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.advance(current);
        Some(current)
    }
}

pub fn walk_preorder<S: DisplaySurface + ?Sized>(surface: &S, root: NodeId) -> PreOrder<'_, S> {
    PreOrder::new(surface, root)
}

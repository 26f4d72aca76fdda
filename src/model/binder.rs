//! TreeBinder：把分类后的嵌套数据先序投影为树节点，同时填充 NodeIndex

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::config::BinderConfig;
use crate::model::data_node::{DataNode, DefaultStringifier, Scalar, Stringify};
use crate::model::node_index::{NodeIndex, SourcePath};
use crate::model::shadow_tree::{DisplaySurface, NodeId, ShadowTree};

/// 一次绑定的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindStats {
    /// 创建的树节点总数（含合成根）
    pub nodes: usize,
    pub containers: usize,
    pub leaves: usize,
    /// 以哨兵叶子截断的环引用
    pub cyclic: usize,
    pub unrepresentable: usize,
    pub truncated: usize,
}

/// 节点在父级中的称呼：记录键或列表下标
enum Slot<'a> {
    Key(&'a str),
    Index(usize),
}

pub struct TreeBinder<S: DisplaySurface = ShadowTree> {
    surface: S,
    index: NodeIndex,
    config: BinderConfig,
    stringifier: Box<dyn Stringify>,
    root: Option<NodeId>,
    stats: BindStats,
}

impl Default for TreeBinder<ShadowTree> {
    fn default() -> Self {
        Self::new(ShadowTree::new(), BinderConfig::default())
    }
}

impl<S: DisplaySurface> TreeBinder<S> {
    pub fn new(surface: S, config: BinderConfig) -> Self {
        Self {
            surface,
            index: NodeIndex::new(),
            config,
            stringifier: Box::new(DefaultStringifier),
            root: None,
            stats: BindStats::default(),
        }
    }

    pub fn with_stringifier(mut self, stringifier: impl Stringify + 'static) -> Self {
        self.stringifier = Box::new(stringifier);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn index(&self) -> &NodeIndex {
        &self.index
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn stats(&self) -> BindStats {
        self.stats
    }

    /// 全量绑定：清空显示面与索引，再从合成根开始先序投影
    ///
    /// 此前发出的所有 id 随之失效。单个叶子无法转文本时以哨兵标签绑定，不中断整体。
    pub fn bind(&mut self, data: &DataNode) -> NodeId {
        let start = Instant::now();
        self.surface.clear();
        self.index.clear();
        self.stats = BindStats::default();

        let mut visited = HashSet::new();
        let root = self.bind_root(data, &mut visited);
        self.root = Some(root);

        tracing::info!(
            "绑定完成: {} 个节点（{} 容器 / {} 叶子，环 {}，不可表示 {}），耗时: {:.1}ms",
            self.stats.nodes,
            self.stats.containers,
            self.stats.leaves,
            self.stats.cyclic,
            self.stats.unrepresentable,
            start.elapsed().as_secs_f64() * 1000.0
        );
        root
    }

    /// 合成根：结构化数据以根标签作容器；标量根本身就是唯一的叶子
    fn bind_root(&mut self, data: &DataNode, visited: &mut HashSet<usize>) -> NodeId {
        let root_path = SourcePath::root();
        let (label, is_leaf) = match data {
            DataNode::Shared(rc) => {
                if data.identity().is_some_and(|id| visited.insert(id)) {
                    let inner = rc.borrow();
                    return self.bind_root(&inner, visited);
                }
                tracing::warn!("根节点指向自身，已截断");
                self.stats.cyclic += 1;
                (self.config.cyclic_label.clone(), true)
            }
            DataNode::Scalar(scalar) => (self.render_scalar(scalar, &root_path), true),
            DataNode::List(_) | DataNode::Record(_) => (self.config.root_label.clone(), false),
        };

        let root = self.surface.insert(&label, None);
        self.index.register(root, root_path.clone());
        self.stats.nodes += 1;
        if is_leaf {
            self.stats.leaves += 1;
        } else {
            self.stats.containers += 1;
            self.bind_children(data, root, &root_path, visited);
        }
        root
    }

    /// 展开一个已解引用的结构化值，挂到 `parent` 之下
    fn bind_children(
        &mut self,
        data: &DataNode,
        parent: NodeId,
        path: &SourcePath,
        visited: &mut HashSet<usize>,
    ) {
        match data {
            DataNode::Record(fields) => {
                // 直接构造的记录可能含重复键：后者覆盖前者，位置保持首次出现处
                let latest: HashMap<&str, &DataNode> = fields.iter().map(|(k, v)| (k.as_str(), v)).collect();
                if latest.len() < fields.len() {
                    tracing::warn!("记录含重复键，仅绑定最后一个值: {}", path);
                }
                let mut seen = HashSet::new();
                for (key, _) in fields {
                    let key = key.as_str();
                    if !seen.insert(key) {
                        continue;
                    }
                    if let Some(child) = latest.get(key) {
                        self.bind_node(child, Slot::Key(key), parent, &path.child(key), visited);
                    }
                }
            }
            DataNode::List(items) => {
                for (idx, child) in items.iter().enumerate() {
                    self.bind_node(child, Slot::Index(idx), parent, &path.child(idx), visited);
                }
            }
            DataNode::Scalar(_) | DataNode::Shared(_) => {}
        }
    }

    fn bind_node(
        &mut self,
        data: &DataNode,
        slot: Slot<'_>,
        parent: NodeId,
        path: &SourcePath,
        visited: &mut HashSet<usize>,
    ) {
        match data {
            DataNode::Scalar(scalar) => {
                let value = self.render_scalar(scalar, path);
                self.leaf(&slot, &value, parent, path);
            }
            DataNode::Shared(rc) => {
                let identity = data.identity();
                if identity.is_some_and(|id| visited.contains(&id)) {
                    tracing::warn!("检测到环引用，已截断: {}", path);
                    let label = self.config.cyclic_label.clone();
                    self.leaf(&slot, &label, parent, path);
                    self.stats.cyclic += 1;
                    return;
                }
                if let Some(id) = identity {
                    visited.insert(id);
                }
                // 只读借用；环上的同一节点会在上面被截断，不会重复借用到可变
                let inner = rc.borrow();
                self.bind_node(&inner, slot, parent, path, visited);
                if let Some(id) = identity {
                    visited.remove(&id);
                }
            }
            DataNode::List(_) | DataNode::Record(_) => {
                if self.config.max_depth.is_some_and(|max| path.depth() > max) {
                    tracing::warn!("超出深度上限 {:?}，已截断: {}", self.config.max_depth, path);
                    let label = self.config.truncated_label.clone();
                    self.leaf(&slot, &label, parent, path);
                    self.stats.truncated += 1;
                    return;
                }
                let label = match slot {
                    Slot::Key(k) => k.to_string(),
                    Slot::Index(i) => self.config.index_label(i),
                };
                let id = self.surface.insert(&label, Some(parent));
                self.index.register(id, path.clone());
                self.stats.nodes += 1;
                self.stats.containers += 1;
                self.bind_children(data, id, path, visited);
            }
        }
    }

    fn render_scalar(&mut self, scalar: &Scalar, path: &SourcePath) -> String {
        match self.stringifier.stringify(scalar) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("叶子无法转为文本 {}: {}", path, e);
                self.stats.unrepresentable += 1;
                self.config.unrepresentable_label.clone()
            }
        }
    }

    fn leaf(&mut self, slot: &Slot<'_>, value: &str, parent: NodeId, path: &SourcePath) -> NodeId {
        let label = match slot {
            Slot::Key(k) => format!("{}: {}", k, value),
            Slot::Index(i) => format!("[{}]: {}", i, value),
        };
        let id = self.surface.insert(&label, Some(parent));
        self.index.register(id, path.clone());
        self.stats.nodes += 1;
        self.stats.leaves += 1;
        id
    }
}

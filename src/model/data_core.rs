//! TreeSession：一个绑定会话的全部状态，以及基于 JSONPath 的回写
//!
//! 每棵树各自持有一个会话：绑定器、索引、导航、高亮、过滤视图与撤销栈都不跨会话共享。

use std::path::{Path, PathBuf};
use std::time::Instant;

use jsonpath_rust::{JsonPath, query::queryable::Queryable}; // 提供 query/query_only_path/reference_mut 等扩展
use serde_json::Value;
use thiserror::Error;

use crate::config::SessionConfig;
use crate::model::binder::{BindStats, TreeBinder};
use crate::model::data_node::DataNode;
use crate::model::node_index::NodeIndex;
use crate::model::shadow_tree::{DisplaySurface, NodeId, ShadowTree};
use crate::search::{
    find_matches, FilterView, HighlightState, Matcher, Query, ReplaceEngine, ResultNavigator, SearchMatch,
};
use crate::utils::fs::{read_json_file, write_json_file};
use crate::vm::report;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("状态错误: {0}")]
    State(String),
    #[error("未找到: {0}")]
    NotFound(String),
    #[error("配置错误: {0}")]
    Config(String),
}

pub struct TreeSession {
    pub source_path: Option<PathBuf>,
    /// 从 JSON 加载时保留原文档，回写与保存都作用于它
    dom: Option<Value>,
    data: Option<DataNode>,
    config: SessionConfig,
    binder: TreeBinder<ShadowTree>,
    navigator: ResultNavigator,
    highlight: HighlightState,
    filter: FilterView<ShadowTree>,
    replace: ReplaceEngine,
}

impl Default for TreeSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl TreeSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            source_path: None,
            dom: None,
            data: None,
            binder: TreeBinder::new(ShadowTree::new(), config.binder.clone()),
            navigator: ResultNavigator::new(),
            highlight: HighlightState::new(config.highlight_style),
            filter: FilterView::new(ShadowTree::new(), &config.filter_root_label, &config.no_match_label),
            replace: ReplaceEngine::new(config.history_depth),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// 加载JSON文件并绑定
    pub fn load_file(&mut self, p: &Path) -> Result<NodeId, AppError> {
        let dom = read_json_file(p)?;
        let root = self.load_value(dom);
        self.source_path = Some(p.to_path_buf());
        Ok(root)
    }

    pub fn load_value(&mut self, dom: Value) -> NodeId {
        self.data = Some(DataNode::from(&dom));
        self.dom = Some(dom);
        self.rebind_inner()
    }

    /// 绑定调用方直接提供的数据（无 JSON 原文档，不支持回写）
    pub fn bind_data(&mut self, data: DataNode) -> NodeId {
        self.dom = None;
        self.source_path = None;
        self.data = Some(data);
        self.rebind_inner()
    }

    /// 按当前数据全量重绑定；旧 id、导航、过滤视图与撤销历史一并作废
    pub fn rebind(&mut self) -> Option<NodeId> {
        self.data.as_ref()?;
        Some(self.rebind_inner())
    }

    fn rebind_inner(&mut self) -> NodeId {
        self.navigator.clear();
        self.filter.clear();
        self.replace.clear_history();
        match &self.data {
            Some(data) => self.binder.bind(data),
            None => self.binder.bind(&DataNode::Record(Vec::new())),
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.binder.root()
    }

    pub fn surface(&self) -> &ShadowTree {
        self.binder.surface()
    }

    pub fn index(&self) -> &NodeIndex {
        self.binder.index()
    }

    pub fn stats(&self) -> BindStats {
        self.binder.stats()
    }

    pub fn dom(&self) -> Option<&Value> {
        self.dom.as_ref()
    }

    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.binder.surface().label(id)
    }

    /// 搜索并刷新高亮与导航；游标落在第一个命中上
    pub fn search(&mut self, query: &Query) -> Vec<SearchMatch> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        let start = Instant::now();
        let matcher = Matcher::new(query);
        let matches = find_matches(self.binder.surface(), root, &matcher);
        let ids: Vec<NodeId> = matches.iter().map(|m| m.id).collect();

        let surface = self.binder.surface_mut();
        self.highlight.clear_all(surface, root);
        self.highlight.mark(surface, &ids);
        self.navigator.set_results(ids);
        if let Some(first) = self.navigator.current() {
            surface.select(first);
        }

        tracing::info!(
            "搜索 '{}': {} 个匹配，耗时: {:.1}ms",
            query.term,
            matches.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        matches
    }

    pub fn navigator(&self) -> &ResultNavigator {
        &self.navigator
    }

    pub fn next_match(&mut self) -> Option<NodeId> {
        let id = self.navigator.next()?;
        self.binder.surface_mut().select(id);
        Some(id)
    }

    pub fn previous_match(&mut self) -> Option<NodeId> {
        let id = self.navigator.previous()?;
        self.binder.surface_mut().select(id);
        Some(id)
    }

    pub fn clear_highlights(&mut self) {
        if let Some(root) = self.root() {
            self.highlight.clear_all(self.binder.surface_mut(), root);
        }
    }

    pub fn is_highlighted(&self, id: NodeId) -> bool {
        self.binder.surface().is_marked(id, self.highlight.style())
    }

    /// 以查询重建过滤视图
    pub fn filter(&mut self, query: &Query) -> &FilterView<ShadowTree> {
        if let Some(root) = self.root() {
            let matcher = Matcher::new(query);
            self.filter.rebuild(self.binder.surface(), root, |label| matcher.is_match(label));
            tracing::info!("过滤 '{}': {} 个叶子", query.term, self.filter.match_count());
        }
        &self.filter
    }

    pub fn filter_view(&self) -> &FilterView<ShadowTree> {
        &self.filter
    }

    pub fn preview_replace(&self, find: &str, replace_with: &str) -> Vec<(String, String)> {
        match self.root() {
            Some(root) => self.replace.preview(self.binder.surface(), root, find, replace_with),
            None => Vec::new(),
        }
    }

    pub fn replace_all(&mut self, find: &str, replace_with: &str) -> usize {
        match self.root() {
            Some(root) => self.replace.replace_all(self.binder.surface_mut(), root, find, replace_with),
            None => 0,
        }
    }

    pub fn rollback(&mut self) -> bool {
        self.replace.rollback(self.binder.surface_mut())
    }

    pub fn can_rollback(&self) -> bool {
        self.replace.can_rollback()
    }

    /// 把新值写回节点对应的源位置，然后全量重绑定
    ///
    /// 返回同一源路径在新树中的 id。
    pub fn write_back(&mut self, id: NodeId, new_value: Value) -> Result<NodeId, AppError> {
        let path = self
            .index()
            .path_of(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("节点 {} 不在当前树中", id)))?;
        let dom = self
            .dom
            .as_mut()
            .ok_or_else(|| AppError::State("DOM尚未加载".into()))?;

        let json_path = path.to_json_path();
        let paths: Vec<String> = dom
            .query_only_path(&json_path)
            .map_err(|e| AppError::JsonPath(e.to_string()))?;
        let Some(p) = paths.into_iter().next() else {
            return Err(AppError::JsonPath(format!("未匹配到可更新路径: {}", json_path)));
        };
        // 通过 reference_mut 按路径获取可变引用
        if let Some(slot) = dom.reference_mut(&p) {
            *slot = new_value;
        } else {
            return Err(AppError::JsonPath(format!("路径不可更新: {}", p)));
        }

        self.data = Some(DataNode::from(&*dom));
        self.rebind_inner();
        tracing::info!("回写成功: {}", json_path);
        self.index()
            .id_of(&path)
            .ok_or_else(|| AppError::NotFound(format!("回写后路径消失: {}", json_path)))
    }

    /// 按 JSONPath 提取第一个匹配节点的 pretty 字符串
    pub fn extract_subtree_pretty(&self, json_path: &str) -> Result<String, AppError> {
        let dom = self
            .dom
            .as_ref()
            .ok_or_else(|| AppError::State("DOM尚未加载".into()))?;
        let hits: Vec<&Value> = dom
            .query(json_path)
            .map_err(|e| AppError::JsonPath(e.to_string()))?;
        let first = hits
            .into_iter()
            .next()
            .ok_or_else(|| AppError::JsonPath("未匹配到任何节点".into()))?;
        Ok(serde_json::to_string_pretty(first)?)
    }

    /// 搜索结果导出为 JSON（路径、标签、命中区间）
    pub fn extract_search_results(&mut self, query: &Query) -> Result<String, AppError> {
        let matches = self.search(query);
        Ok(report::search_results_json(query, &matches, self.binder.index())?)
    }

    /// 将当前DOM保存到指定路径
    pub fn save_to_file(&self, path: &Path) -> Result<(), AppError> {
        let dom = self
            .dom
            .as_ref()
            .ok_or_else(|| AppError::State("DOM尚未加载".into()))?;
        write_json_file(path, dom)?;
        Ok(())
    }

    /// 将当前DOM保存到原始文件路径
    pub fn save_to_original_file(&self) -> Result<(), AppError> {
        let original_path = self
            .source_path
            .as_ref()
            .ok_or_else(|| AppError::State("原始文件路径未设置".into()))?;
        self.save_to_file(original_path)
    }
}

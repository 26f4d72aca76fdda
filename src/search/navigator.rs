//! ResultNavigator：命中列表上的游标，Next/Previous 首尾回绕

use crate::model::shadow_tree::NodeId;

#[derive(Debug, Clone, Default)]
pub struct ResultNavigator {
    results: Vec<NodeId>,
    cursor: Option<usize>,
}

impl ResultNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 重置结果集，游标指向第一个（空集则无游标）
    pub fn set_results(&mut self, results: Vec<NodeId>) {
        self.cursor = if results.is_empty() { None } else { Some(0) };
        self.results = results;
    }

    pub fn clear(&mut self) {
        self.set_results(Vec::new());
    }

    pub fn results(&self) -> &[NodeId] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn current(&self) -> Option<NodeId> {
        self.cursor.map(|i| self.results[i])
    }

    /// 前进一个，末尾回绕到开头；空集返回 None 且状态不变
    pub fn next(&mut self) -> Option<NodeId> {
        let i = self.cursor?;
        let next = (i + 1) % self.results.len();
        self.cursor = Some(next);
        Some(self.results[next])
    }

    /// 后退一个，开头回绕到末尾
    pub fn previous(&mut self) -> Option<NodeId> {
        let i = self.cursor?;
        let len = self.results.len();
        let prev = (i + len - 1) % len;
        self.cursor = Some(prev);
        Some(self.results[prev])
    }

    /// 当前位置（从 1 开始）与总数，供“第 i/N 个”提示
    pub fn position(&self) -> Option<(usize, usize)> {
        self.cursor.map(|i| (i + 1, self.results.len()))
    }
}

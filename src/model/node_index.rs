//! NodeIndex：树节点 id ↔ 源数据路径 的双向表，归单个绑定会话所有

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::model::shadow_tree::NodeId;

/// 源路径的一段：记录键或列表下标
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(k: &str) -> Self {
        PathSegment::Key(k.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

/// 进入原始 DataNode 的路径，例如 `["b", "c"]` 或 `["items", 2]`；根为空路径
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SourcePath(Vec<PathSegment>);

impl SourcePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn child(&self, seg: impl Into<PathSegment>) -> Self {
        let mut segs = self.0.clone();
        segs.push(seg.into());
        Self(segs)
    }

    /// RFC 9535 JSONPath（用于精确寻址与回写）
    pub fn to_json_path(&self) -> String {
        let mut out = String::from("$");
        for seg in &self.0 {
            match seg {
                PathSegment::Key(k) if is_shorthand_name(k) => {
                    out.push('.');
                    out.push_str(k);
                }
                PathSegment::Key(k) => push_quoted_name(&mut out, k),
                PathSegment::Index(i) => out.push_str(&format!("[{}]", i)),
            }
        }
        out
    }
}

/// 可以写成 `.name` 的键：ASCII 字母或下划线开头，其余为字母数字或下划线
fn is_shorthand_name(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// bracket-notation 单引号字面量：转义 `'`、`\` 与 C0 控制字符
fn push_quoted_name(out: &mut String, key: &str) {
    out.push_str("['");
    for c in key.chars() {
        match c {
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            c if c < '\u{0020}' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push_str("']");
}

impl<S: Into<PathSegment>> FromIterator<S> for SourcePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_path())
    }
}

#[derive(Debug, Default)]
pub struct NodeIndex {
    by_id: HashMap<NodeId, SourcePath>,
    by_path: HashMap<SourcePath, NodeId>,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一对映射；同一 id 或同一路径重复登记时，旧的反向条目一并移除，保持双向一致
    pub fn register(&mut self, id: NodeId, path: SourcePath) {
        if let Some(old_path) = self.by_id.remove(&id) {
            self.by_path.remove(&old_path);
        }
        if let Some(old_id) = self.by_path.remove(&path) {
            self.by_id.remove(&old_id);
        }
        self.by_path.insert(path.clone(), id);
        self.by_id.insert(id, path);
    }

    pub fn path_of(&self, id: NodeId) -> Option<&SourcePath> {
        self.by_id.get(&id)
    }

    pub fn id_of(&self, path: &SourcePath) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_path.clear();
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::shadow_tree::{DisplaySurface, ShadowTree};

    #[test]
    fn test_register_and_lookup_both_ways() {
        let mut t = ShadowTree::new();
        let id = t.insert("c: 2", None);
        let path: SourcePath = ["b", "c"].into_iter().collect();

        let mut index = NodeIndex::new();
        index.register(id, path.clone());
        assert_eq!(index.path_of(id), Some(&path));
        assert_eq!(index.id_of(&path), Some(id));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_clear_invalidates_old_ids() {
        let mut t = ShadowTree::new();
        let id = t.insert("a", None);
        let mut index = NodeIndex::new();
        index.register(id, SourcePath::root().child("a"));
        index.clear();

        assert!(index.is_empty());
        assert_eq!(index.path_of(id), None, "清空后旧 id 必须查不到");
        assert_eq!(index.id_of(&SourcePath::root().child("a")), None);
    }

    #[test]
    fn test_reregister_keeps_bijection() {
        let mut t = ShadowTree::new();
        let first = t.insert("x", None);
        let second = t.insert("y", None);
        let path = SourcePath::root().child("x");

        let mut index = NodeIndex::new();
        index.register(first, path.clone());
        index.register(second, path.clone());
        assert_eq!(index.id_of(&path), Some(second));
        assert_eq!(index.path_of(first), None, "被取代的 id 不应残留");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_json_path_rendering() {
        assert_eq!(SourcePath::root().to_json_path(), "$");
        let p = SourcePath::root().child("items").child(2usize).child("id");
        assert_eq!(p.to_json_path(), "$.items[2].id");
        assert_eq!(SourcePath::root().child("key with spaces").to_json_path(), "$['key with spaces']");
        assert_eq!(SourcePath::root().child("key'q").to_json_path(), "$['key\\'q']");
        assert_eq!(SourcePath::root().child("").to_json_path(), "$['']");
        assert_eq!(SourcePath::root().child("_id").child("v2").to_json_path(), "$._id.v2");
    }

    #[test]
    fn test_json_path_quotes_digit_leading_and_control_keys() {
        let p = SourcePath::root().child("2024").child("1st");
        assert_eq!(p.to_json_path(), "$['2024']['1st']", "数字开头的键不能用点号");
        assert_eq!(SourcePath::root().child("a\nb").to_json_path(), "$['a\\nb']");
        assert_eq!(SourcePath::root().child("a\tb\\c").to_json_path(), "$['a\\tb\\\\c']");
        assert_eq!(SourcePath::root().child("x\u{1}").to_json_path(), "$['x\\u0001']");
        assert_eq!(SourcePath::root().child("名字").to_json_path(), "$['名字']");
    }

    #[test]
    fn test_path_serializes_as_mixed_array() {
        let p = SourcePath::root().child("items").child(2usize);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"["items",2]"#);
    }
}

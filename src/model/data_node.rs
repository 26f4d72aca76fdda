//! 数据模型：调用方提供的嵌套数据（标量 / 有序列表 / 键控记录）与形状分类器

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

/// 共享节点：赋予源对象身份，允许调用方构造 DAG 乃至环
pub type SharedNode = Rc<RefCell<DataNode>>;

/// 叶子值
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// 宿主侧无法表示为文本的值（仅保留类型名）
    Opaque { type_name: String },
}

/// 输入侧数据节点（不归绑定器所有，只读）
#[derive(Debug, Clone)]
pub enum DataNode {
    Scalar(Scalar),
    List(Vec<DataNode>),
    /// 字段按插入顺序保存；经 `record`/`insert_field` 构造时键唯一，直接构造的重复键在绑定时取最后的值
    Record(Vec<(String, DataNode)>),
    Shared(SharedNode),
}

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    List,
    Record,
}

impl Shape {
    /// 对 JSON 值做同样的结构判定：整数索引有序 / 字符串键控 / 其他
    pub fn of_json(v: &Value) -> Self {
        match v {
            Value::Array(_) => Shape::List,
            Value::Object(_) => Shape::Record,
            _ => Shape::Scalar,
        }
    }

    pub fn is_structured(self) -> bool {
        !matches!(self, Shape::Scalar)
    }
}

/// 纯函数，无副作用；共享节点按其指向的值分类
pub fn classify(node: &DataNode) -> Shape {
    match node {
        DataNode::Scalar(_) => Shape::Scalar,
        DataNode::List(_) => Shape::List,
        DataNode::Record(_) => Shape::Record,
        DataNode::Shared(rc) => classify(&rc.borrow()),
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("非有限浮点数: {0}")]
    NonFinite(f64),
    #[error("不可表示的值: {0}")]
    Opaque(String),
}

/// 标量转文本（调用方可替换）
pub trait Stringify {
    fn stringify(&self, scalar: &Scalar) -> Result<String, FormatError>;
}

impl<F> Stringify for F
where
    F: Fn(&Scalar) -> Result<String, FormatError>,
{
    fn stringify(&self, scalar: &Scalar) -> Result<String, FormatError> {
        self(scalar)
    }
}

/// 默认转换：非有限浮点与不透明值视为不可表示
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStringifier;

impl Stringify for DefaultStringifier {
    fn stringify(&self, scalar: &Scalar) -> Result<String, FormatError> {
        match scalar {
            Scalar::Null => Ok("null".to_string()),
            Scalar::Bool(b) => Ok(b.to_string()),
            Scalar::Integer(i) => Ok(i.to_string()),
            Scalar::Float(f) if f.is_finite() => Ok(f.to_string()),
            Scalar::Float(f) => Err(FormatError::NonFinite(*f)),
            Scalar::Text(s) => Ok(s.clone()),
            Scalar::Opaque { type_name } => Err(FormatError::Opaque(type_name.clone())),
        }
    }
}

impl DataNode {
    /// 以有序 (键, 值) 序列构造记录；重复键后者覆盖前者，位置保持首次出现处
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, DataNode)>,
    {
        let mut node = DataNode::Record(Vec::new());
        for (k, v) in fields {
            node.insert_field(k, v);
        }
        node
    }

    pub fn list<I: IntoIterator<Item = DataNode>>(items: I) -> Self {
        DataNode::List(items.into_iter().collect())
    }

    pub fn share(node: DataNode) -> SharedNode {
        Rc::new(RefCell::new(node))
    }

    /// 向记录插入字段；非记录节点返回 false。共享节点会穿透到其内部值
    pub fn insert_field(&mut self, key: impl Into<String>, value: DataNode) -> bool {
        match self {
            DataNode::Record(fields) => {
                let key = key.into();
                if let Some(slot) = fields.iter_mut().find(|(k, _)| *k == key) {
                    slot.1 = value;
                } else {
                    fields.push((key, value));
                }
                true
            }
            DataNode::Shared(rc) => rc.borrow_mut().insert_field(key, value),
            _ => false,
        }
    }

    /// 源对象身份：仅共享节点具有跨引用稳定的身份
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            DataNode::Shared(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            _ => None,
        }
    }
}

impl From<Scalar> for DataNode {
    fn from(s: Scalar) -> Self {
        DataNode::Scalar(s)
    }
}

impl From<&str> for DataNode {
    fn from(s: &str) -> Self {
        DataNode::Scalar(Scalar::Text(s.to_string()))
    }
}

impl From<String> for DataNode {
    fn from(s: String) -> Self {
        DataNode::Scalar(Scalar::Text(s))
    }
}

impl From<i64> for DataNode {
    fn from(i: i64) -> Self {
        DataNode::Scalar(Scalar::Integer(i))
    }
}

impl From<f64> for DataNode {
    fn from(f: f64) -> Self {
        DataNode::Scalar(Scalar::Float(f))
    }
}

impl From<bool> for DataNode {
    fn from(b: bool) -> Self {
        DataNode::Scalar(Scalar::Bool(b))
    }
}

impl From<SharedNode> for DataNode {
    fn from(rc: SharedNode) -> Self {
        DataNode::Shared(rc)
    }
}

impl From<&Value> for DataNode {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => DataNode::Scalar(Scalar::Null),
            Value::Bool(b) => DataNode::Scalar(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => DataNode::Scalar(Scalar::Integer(i)),
                // u64 超出 i64 或浮点
                None => match n.as_f64() {
                    Some(f) if n.is_f64() => DataNode::Scalar(Scalar::Float(f)),
                    _ => DataNode::Scalar(Scalar::Text(n.to_string())),
                },
            },
            Value::String(s) => DataNode::Scalar(Scalar::Text(s.clone())),
            Value::Array(arr) => DataNode::List(arr.iter().map(DataNode::from).collect()),
            Value::Object(map) => DataNode::Record(
                map.iter()
                    .map(|(k, child)| (k.clone(), DataNode::from(child)))
                    .collect(),
            ),
        }
    }
}

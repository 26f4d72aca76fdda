//! 层次数据绑定与树搜索库
//!
//! 把任意嵌套数据（标量、有序列表、键控记录）投影为与显示无关的树，
//! 维护节点与源数据之间稳定的双向映射，并在树上提供搜索、结果导航、
//! 高亮、扁平过滤视图以及带事务回滚的批量替换。

pub mod config;
pub mod model;
pub mod search;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use config::{BinderConfig, SessionConfig};
pub use model::binder::{BindStats, TreeBinder};
pub use model::data_core::{AppError, TreeSession};
pub use model::data_node::{classify, DataNode, FormatError, Scalar, Shape, Stringify};
pub use model::node_index::{NodeIndex, PathSegment, SourcePath};
pub use model::shadow_tree::{walk_preorder, DisplaySurface, MarkStyle, NodeId, ShadowTree};
pub use search::{
    find, find_matches, CaseMode, FilterView, HighlightState, MatchMode, Matcher, Query, ReplaceEngine,
    ResultNavigator, SearchMatch,
};

//! 树上的搜索、导航、高亮、过滤与替换
//!
//! 所有组件共用同一个先序遍历，顺序即节点的首次绑定顺序。

pub mod engine;
pub mod filter_view;
pub mod highlight;
pub mod matcher;
pub mod navigator;
pub mod replace;

pub use engine::{find, find_matches, SearchMatch};
pub use filter_view::FilterView;
pub use highlight::HighlightState;
pub use matcher::{CaseMode, MatchMode, Matcher, Query};
pub use navigator::ResultNavigator;
pub use replace::{LabelChange, ReplaceEngine, Transaction};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::data_node::DataNode;

    /// Folder1..Folder10，每个含 File1.txt..File8.txt，共 80 个叶子
    pub fn folders() -> DataNode {
        DataNode::record((1..=10).map(|f| {
            let files = DataNode::record(
                (1..=8).map(|n| (format!("File{}.txt", n), DataNode::from(format!("Folder{}/File{}.txt", f, n)))),
            );
            (format!("Folder{}", f), files)
        }))
    }
}

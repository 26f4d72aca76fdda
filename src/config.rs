//! 会话配置：所有字段均有默认值，可从 JSON 文件部分覆盖

use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::data_core::AppError;
use crate::model::shadow_tree::MarkStyle;
use crate::utils::fs::read_json_file;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// 合成根节点标签
    pub root_label: String,
    /// 结构化列表元素的标签模板，`{index}` 替换为下标
    pub index_template: String,
    pub cyclic_label: String,
    pub unrepresentable_label: String,
    /// 可选的硬深度上限，超出部分绑定为截断叶子
    pub max_depth: Option<usize>,
    pub truncated_label: String,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            root_label: "$".to_string(),
            index_template: "[{index}]".to_string(),
            cyclic_label: "<cyclic reference>".to_string(),
            unrepresentable_label: "<unrepresentable>".to_string(),
            max_depth: None,
            truncated_label: "<truncated>".to_string(),
        }
    }
}

impl BinderConfig {
    pub fn index_label(&self, index: usize) -> String {
        self.index_template.replace("{index}", &index.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub binder: BinderConfig,
    /// 撤销栈深度上限，None 表示不限；0 会在加载时被拒绝
    pub history_depth: Option<NonZeroUsize>,
    pub highlight_style: MarkStyle,
    pub filter_root_label: String,
    pub no_match_label: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            binder: BinderConfig::default(),
            history_depth: None,
            highlight_style: MarkStyle::Bold,
            filter_root_label: "Filter results".to_string(),
            no_match_label: "No matches".to_string(),
        }
    }
}

impl SessionConfig {
    /// 从 JSON 文件加载，缺省字段取默认值
    pub fn from_file(p: &Path) -> Result<Self, AppError> {
        let v = read_json_file(p)?;
        serde_json::from_value(v).map_err(|e| AppError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.binder.root_label, "$");
        assert_eq!(cfg.binder.index_label(3), "[3]");
        assert_eq!(cfg.history_depth, None);
        assert_eq!(cfg.highlight_style, MarkStyle::Bold);
    }

    #[test]
    fn test_partial_file_overrides() {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(
            br#"{"history_depth": 2, "highlight_style": "selected", "binder": {"index_template": "Item {index}"}}"#,
        )
        .expect("写入临时文件失败");

        let cfg = SessionConfig::from_file(file.path()).expect("加载配置应该成功");
        assert_eq!(cfg.history_depth, NonZeroUsize::new(2));
        assert_eq!(cfg.highlight_style, MarkStyle::Selected);
        assert_eq!(cfg.binder.index_label(0), "Item 0");
        assert_eq!(cfg.binder.cyclic_label, "<cyclic reference>", "未给出的字段应保持默认");
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(br#"{"history_depth": "many"}"#).expect("写入临时文件失败");
        let result = SessionConfig::from_file(file.path());
        assert!(matches!(result, Err(AppError::Config(_))), "类型错误应返回配置错误");
    }

    #[test]
    fn test_zero_history_depth_is_rejected() {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(br#"{"history_depth": 0}"#).expect("写入临时文件失败");
        let result = SessionConfig::from_file(file.path());
        assert!(matches!(result, Err(AppError::Config(_))), "深度为 0 会让替换无法撤销，应拒绝");
    }
}

//! 标签匹配谓词：包含 / 前缀 / 后缀 / 全等 / 正则，区分或忽略大小写
//!
//! 所有模式统一编译为一个 [`Regex`]，命中区间因此总是指向原标签的字节偏移。

use std::ops::Range;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Contains,
    Prefix,
    Suffix,
    Exact,
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    /// 与 ReplaceEngine 的字面替换一致
    #[default]
    Sensitive,
    Insensitive,
}

/// 调用方给出的查询
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    pub term: String,
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default)]
    pub case: CaseMode,
}

impl Query {
    pub fn new(term: impl Into<String>, mode: MatchMode, case: CaseMode) -> Self {
        Self {
            term: term.into(),
            mode,
            case,
        }
    }

    /// 默认模式与大小写下的包含查询，等同 `Query { term, ..Default::default() }`
    pub fn contains(term: impl Into<String>) -> Self {
        Self::new(term, MatchMode::default(), CaseMode::default())
    }
}

/// 编译后的查询；空查询不匹配任何标签
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Option<Regex>,
}

impl Matcher {
    /// 正则非法时退化为按字面子串匹配（输入过程中常出现半截模式）
    pub fn new(query: &Query) -> Self {
        if query.term.is_empty() {
            return Self { regex: None };
        }
        let literal = regex::escape(&query.term);
        let source = match query.mode {
            MatchMode::Contains => literal,
            MatchMode::Prefix => format!("^(?:{})", literal),
            MatchMode::Suffix => format!("(?:{})$", literal),
            MatchMode::Exact => format!("^(?:{})$", literal),
            MatchMode::Pattern => query.term.clone(),
        };
        let insensitive = query.case == CaseMode::Insensitive;
        let regex = match RegexBuilder::new(&source).case_insensitive(insensitive).build() {
            Ok(re) => Some(re),
            Err(e) if query.mode == MatchMode::Pattern => {
                tracing::warn!("非法正则 '{}'，退化为子串匹配: {}", query.term, e);
                RegexBuilder::new(&regex::escape(&query.term))
                    .case_insensitive(insensitive)
                    .build()
                    .ok()
            }
            Err(e) => {
                tracing::warn!("查询无法编译 '{}': {}", query.term, e);
                None
            }
        };
        Self { regex }
    }

    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }

    pub fn is_match(&self, label: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(label))
    }

    /// 第一处命中的字节区间
    pub fn find(&self, label: &str) -> Option<Range<usize>> {
        self.regex.as_ref()?.find(label).map(|m| m.range())
    }
}

//! 呈现层桥接：供消息框/菜单式界面使用的纯文本与 JSON 报告

pub mod report;

//! 程序入口：初始化日志，绑定 JSON 文件并打印大纲、搜索与替换预览
//!
//! 用法：
//!   tree_binder <file.json> [搜索词] [替换为]
//!   tree_binder --bench

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tracing_subscriber::fmt::SubscriberBuilder;

use tree_binder::model::performance::run_performance_suite;
use tree_binder::vm::report;
use tree_binder::{Query, SessionConfig, TreeSession};

const LOG_ENV: &str = "TREE_BINDER_LOG";
const CONFIG_ENV: &str = "TREE_BINDER_CONFIG";

fn main() -> Result<()> {
    // 初始化日志输出，级别取自环境变量，默认 INFO
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| tracing::Level::from_str(&v).ok())
        .unwrap_or(tracing::Level::INFO);
    let _ = SubscriberBuilder::default()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("--bench") => run_bench(),
        Some(path) => run_file(PathBuf::from(path), args.get(1), args.get(2)),
        None => bail!("用法: tree_binder <file.json> [搜索词] [替换为] | tree_binder --bench"),
    }
}

fn load_config() -> Result<SessionConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(p) => SessionConfig::from_file(Path::new(&p)).with_context(|| format!("加载配置失败: {}", p)),
        Err(_) => Ok(SessionConfig::default()),
    }
}

fn run_file(path: PathBuf, term: Option<&String>, replacement: Option<&String>) -> Result<()> {
    let mut session = TreeSession::new(load_config()?);
    let root = session
        .load_file(&path)
        .with_context(|| format!("文件加载失败: {}", path.display()))?;
    tracing::info!("文件加载成功: {} 个节点", session.stats().nodes);

    if let Some(term) = term {
        let query = Query::contains(term.as_str());
        let matches = session.search(&query);
        println!("{}", report::found_report(term, matches.len()));
        println!("{}", report::position_report(session.navigator()));

        if let Some(replacement) = replacement {
            let preview = session.preview_replace(term, replacement);
            println!("{}", report::replace_preview_report(&preview));
        }
    }

    print!("{}", report::outline(session.surface(), root, session.config().highlight_style));
    Ok(())
}

fn run_bench() -> Result<()> {
    let results = run_performance_suite();
    for r in &results {
        let status = if r.success { "OK" } else { "FAIL" };
        println!("[{}] {:<32} {:>6}ms  {}", status, r.operation, r.duration_ms, r.details);
    }
    if results.iter().any(|r| !r.success) {
        bail!("性能测试存在失败项");
    }
    Ok(())
}

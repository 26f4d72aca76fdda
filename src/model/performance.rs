//! 性能基准测试模块
//!
//! 测量大树上的绑定、搜索、过滤与替换/回滚耗时。
//! 搜索常在每次按键时触发，这里的数字用来判断调用方需要多大的去抖间隔。

use std::time::Instant;

use crate::model::binder::TreeBinder;
use crate::model::data_node::DataNode;
use crate::model::shadow_tree::{DisplaySurface, NodeId};
use crate::search::{find_matches, FilterView, Matcher, Query, ReplaceEngine};

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 生成嵌套测试数据：每层 width 个字段，按下标轮换标量、列表与子记录
pub fn generate_sample_data(depth: usize, width: usize) -> DataNode {
    fn create_nested(current_depth: usize, max_depth: usize, width: usize) -> DataNode {
        if current_depth >= max_depth {
            return DataNode::from("leaf value");
        }
        DataNode::record((0..width).map(|i| {
            let value = match i % 5 {
                0 => DataNode::from(format!("text_{}", i)),
                1 => DataNode::from(i as i64),
                2 => DataNode::from(i % 2 == 0),
                3 => DataNode::list([1i64, 2, 3, i as i64].map(DataNode::from)),
                _ => create_nested(current_depth + 1, max_depth, width / 2),
            };
            (format!("field_{}", i), value)
        }))
    }

    let items = DataNode::list((0..width * 10).map(|i| {
        DataNode::record([
            ("id", DataNode::from(i as i64)),
            ("name", DataNode::from(format!("item_{}", i))),
            ("active", DataNode::from(i % 3 == 0)),
        ])
    }));

    DataNode::record([
        (
            "metadata",
            DataNode::record([
                ("depth", DataNode::from(depth as i64)),
                ("width", DataNode::from(width as i64)),
            ]),
        ),
        ("data", create_nested(0, depth, width)),
        ("items", items),
    ])
}

/// 测试绑定性能
pub fn benchmark_bind(binder: &mut TreeBinder, data: &DataNode) -> (PerformanceResult, NodeId) {
    let start = Instant::now();
    let root = binder.bind(data);
    let duration = start.elapsed();
    let nodes = binder.stats().nodes;
    let result = PerformanceResult::new("绑定", duration.as_millis(), nodes > 0, &format!("构建了 {} 个节点", nodes));
    (result, root)
}

/// 测试搜索性能
pub fn benchmark_find(binder: &TreeBinder, root: NodeId, query: &Query) -> PerformanceResult {
    let start = Instant::now();
    let matches = find_matches(binder.surface(), root, &Matcher::new(query));
    let duration = start.elapsed();
    PerformanceResult::new(
        &format!("搜索: {}", query.term),
        duration.as_millis(),
        true,
        &format!("找到 {} 个匹配", matches.len()),
    )
}

/// 测试过滤视图重建性能
pub fn benchmark_filter(binder: &TreeBinder, root: NodeId, query: &Query) -> PerformanceResult {
    let matcher = Matcher::new(query);
    let mut view = FilterView::default();
    let start = Instant::now();
    view.rebuild(binder.surface(), root, |l| matcher.is_match(l));
    let duration = start.elapsed();
    PerformanceResult::new(
        &format!("过滤: {}", query.term),
        duration.as_millis(),
        true,
        &format!("保留 {} 个叶子", view.match_count()),
    )
}

/// 测试替换 + 回滚往返；成功意味着所有标签恢复原样
pub fn benchmark_replace_roundtrip(
    binder: &mut TreeBinder,
    root: NodeId,
    find: &str,
    replace_with: &str,
) -> PerformanceResult {
    let before = ReplaceEngine::plan(binder.surface(), root, find, "");
    let mut engine = ReplaceEngine::default();
    let start = Instant::now();
    let count = engine.replace_all(binder.surface_mut(), root, find, replace_with);
    let undone = engine.rollback(binder.surface_mut());
    let duration = start.elapsed();

    let restored = before
        .iter()
        .all(|c| binder.surface().label(c.id) == Some(c.before.as_str()));
    PerformanceResult::new(
        &format!("替换回滚: {} → {}", find, replace_with),
        duration.as_millis(),
        (count == 0 || undone) && restored,
        &format!("改写并恢复 {} 个节点", count),
    )
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    // 测试不同规模的数据
    let test_cases = [
        (3, 10), // 小型：深度3，宽度10
        (4, 20), // 中型：深度4，宽度20
        (5, 30), // 大型：深度5，宽度30
    ];

    for (depth, width) in test_cases {
        tracing::info!("测试规模：深度{}，宽度{}", depth, width);

        let start = Instant::now();
        let data = generate_sample_data(depth, width);
        results.push(PerformanceResult::new(
            &format!("数据生成({}x{})", depth, width),
            start.elapsed().as_millis(),
            true,
            &format!("生成了深度{}宽度{}的数据", depth, width),
        ));

        let mut binder = TreeBinder::default();
        let (bind_result, root) = benchmark_bind(&mut binder, &data);
        results.push(bind_result);
        results.push(benchmark_find(&binder, root, &Query::contains("item_1")));
        results.push(benchmark_filter(&binder, root, &Query::contains("field_3")));
        results.push(benchmark_replace_roundtrip(&mut binder, root, "item", "entry"));
    }

    results
}

//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集。
//! 推理引擎以库的形式嵌入调用方进程，这里只安装 recorder，
//! 指标快照由调用方通过 [`render`] 取出并自行暴露。

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    handle: PrometheusHandle,
}

impl MetricsHandle {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// 安装 Prometheus recorder 并注册指标描述
pub fn init(service_name: &str) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // 保存到全局，供其他地方获取指标快照
    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(service_name);

    Ok(MetricsHandle { handle })
}

/// 注册推理相关指标
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!(
        "fuzzy_rule_block_activations_total",
        "Total number of rule block activations"
    );
    metrics::describe_counter!(
        "fuzzy_rules_triggered_total",
        "Total number of rules triggered"
    );
    metrics::describe_histogram!(
        "fuzzy_engine_process_duration_seconds",
        "Inference cycle duration in seconds"
    );

    // 记录服务启动
    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// 渲染当前指标快照，未初始化时为 None
pub fn render() -> Option<String> {
    get_handle().map(|handle| handle.render())
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录一次规则块激活及其触发的规则数
#[inline]
pub fn record_block_activation(block: &str, triggered: usize) {
    metrics::counter!(
        "fuzzy_rule_block_activations_total",
        "block" => block.to_string()
    )
    .increment(1);

    metrics::counter!(
        "fuzzy_rules_triggered_total",
        "block" => block.to_string()
    )
    .increment(triggered as u64);
}

/// 记录一个推理周期
#[inline]
pub fn record_engine_process(engine: &str, duration_secs: f64) {
    metrics::histogram!(
        "fuzzy_engine_process_duration_seconds",
        "engine" => engine.to_string()
    )
    .record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 即使没有初始化 recorder，这些函数也不应该 panic
        record_block_activation("mamdani", 3);
        record_engine_process("obstacle-avoidance", 0.001);
    }
}

//! 进程级引擎设置
//!
//! 数值比较使用的绝对容差在进程内全局共享，以位模式存放在原子变量中，
//! 读取无锁。

use crate::error::{Result, RuleError};
use fuzzy_shared::config::EngineConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// 默认绝对容差
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

static TOLERANCE_BITS: AtomicU64 = AtomicU64::new(DEFAULT_TOLERANCE.to_bits());

/// 当前绝对容差
pub fn tolerance() -> f64 {
    f64::from_bits(TOLERANCE_BITS.load(Ordering::Relaxed))
}

/// 设置绝对容差，必须为有限正数
pub fn set_tolerance(tolerance: f64) -> Result<()> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(RuleError::InvalidSetting(format!(
            "容差必须为有限正数, 实际为 {}",
            tolerance
        )));
    }
    TOLERANCE_BITS.store(tolerance.to_bits(), Ordering::Relaxed);
    Ok(())
}

/// 应用配置文件中的引擎设置
pub fn apply(config: &EngineConfig) -> Result<()> {
    set_tolerance(config.tolerance)?;
    info!(tolerance = config.tolerance, "引擎设置已应用");
    Ok(())
}

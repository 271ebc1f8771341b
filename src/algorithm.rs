//! 定义了可插拔的拥塞控制算法能力接口及其注册表。
//! Defines the pluggable congestion-control capability interface and its
//! registry.

use crate::config::Config;
use crate::selection::AlgorithmId;
use crate::state::{AckFlags, AckSample, ConnectionState, CwndEvent, RateSample, RecoveryState};

pub mod hybla;
pub mod rate;
pub mod reno;

/// A congestion-control algorithm, as seen by the dispatcher.
///
/// Implementations are stateless services: every per-connection datum lives
/// in the [`ConnectionState`] handed to each hook, so the same instance can
/// drive any number of connections. Hooks run synchronously on the per-ack
/// path and must never block or allocate.
///
/// 分发器眼中的拥塞控制算法。
///
/// 实现是无状态服务：所有每连接数据都存放在传入各钩子的 [`ConnectionState`]
/// 中，因此同一实例可以驱动任意数量的连接。钩子在逐确认路径上同步运行，
/// 绝不允许阻塞或分配内存。
pub trait CongestionAlgorithm: Send + Sync + 'static {
    /// Initializes the algorithm's private slot for a new connection.
    /// Invoked once per connection, at establishment.
    ///
    /// 为新连接初始化算法的私有槽位。每个连接在建立时恰好调用一次。
    fn init(&self, conn: &mut ConnectionState);

    /// Returns the slow-start threshold to adopt after a loss signal.
    /// 返回丢包信号后应采用的慢启动阈值。
    fn ssthresh(&self, conn: &mut ConnectionState) -> u32;

    /// Returns the congestion window to restore after a loss signal turned
    /// out to be spurious.
    ///
    /// 返回在丢包信号被证实为虚假后应恢复的拥塞窗口。
    fn undo_cwnd(&self, conn: &mut ConnectionState) -> u32;

    /// Grows the congestion window in response to acknowledged segments.
    /// 响应已确认的报文段增长拥塞窗口。
    fn cong_avoid(&self, conn: &mut ConnectionState, ack: u32, acked: u32);

    /// Reacts to a lifecycle or network event.
    /// 响应生命周期或网络事件。
    fn cwnd_event(&self, conn: &mut ConnectionState, event: CwndEvent);

    /// Reacts to a loss-handling state transition.
    /// 响应丢包处理状态的转换。
    fn set_state(&self, conn: &mut ConnectionState, new_state: RecoveryState);

    /// Observes an acknowledgment sample. Optional; the default does
    /// nothing.
    ///
    /// 观察一个确认样本。可选；默认不做任何事。
    fn on_ack(&self, _conn: &mut ConnectionState, _sample: &AckSample) {}

    /// Takes full ownership of the window and pacing decision for this
    /// event. Returns `true` when handled; `false` hands the event back to
    /// the dispatcher's classic skeleton. Optional; the default declines.
    ///
    /// 完全接管本次事件的窗口与整形决策。返回 `true` 表示已处理；
    /// `false` 表示交还给分发器的经典骨架。可选；默认拒绝接管。
    fn cong_control(
        &self,
        _conn: &mut ConnectionState,
        _rs: &RateSample,
        _ack: u32,
        _acked: u32,
        _flags: &AckFlags,
    ) -> bool {
        false
    }
}

/// The fixed table of registered algorithms.
///
/// The table is closed: the identifier enum enumerates every entry, lookup
/// is an exhaustive match, and exactly one implementation is returned per
/// lookup.
///
/// 已注册算法的固定表。
///
/// 此表是封闭的：标识符枚举列举了所有条目，查找是穷尽匹配，
/// 每次查找恰好返回一个实现。
pub struct AlgorithmRegistry {
    loss_based: Box<dyn CongestionAlgorithm>,
    rate_based: Box<dyn CongestionAlgorithm>,
    rtt_scaling: Box<dyn CongestionAlgorithm>,
}

impl AlgorithmRegistry {
    /// Builds the registry with the built-in algorithms.
    /// 用内置算法构建注册表。
    pub fn new(config: &Config) -> Self {
        Self {
            loss_based: Box::new(reno::Reno::new(config.clone())),
            rate_based: Box::new(rate::RateModel::new(config.clone())),
            rtt_scaling: Box::new(hybla::Hybla::new(config.clone())),
        }
    }

    /// Builds a registry from explicit implementations.
    /// 由显式实现构建注册表。
    #[cfg(test)]
    pub(crate) fn with_algorithms(
        loss_based: Box<dyn CongestionAlgorithm>,
        rate_based: Box<dyn CongestionAlgorithm>,
        rtt_scaling: Box<dyn CongestionAlgorithm>,
    ) -> Self {
        Self {
            loss_based,
            rate_based,
            rtt_scaling,
        }
    }

    /// Looks up the implementation registered under `id`.
    /// 查找注册在 `id` 下的实现。
    pub fn get(&self, id: AlgorithmId) -> &dyn CongestionAlgorithm {
        match id {
            AlgorithmId::LossBased => self.loss_based.as_ref(),
            AlgorithmId::RateBased => self.rate_based.as_ref(),
            AlgorithmId::RttScaling => self.rtt_scaling.as_ref(),
        }
    }
}

#[cfg(test)]
pub(crate) use self::testing::CountingAlgorithm;

#[cfg(test)]
mod testing {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// An algorithm that only counts hook invocations.
    /// Useful for verifying dispatch behavior.
    pub(crate) struct CountingAlgorithm {
        pub init: Arc<AtomicUsize>,
        pub hooks: Arc<AtomicUsize>,
        pub handles_cong_control: bool,
    }

    impl CountingAlgorithm {
        pub(crate) fn new() -> Self {
            Self {
                init: Arc::new(AtomicUsize::new(0)),
                hooks: Arc::new(AtomicUsize::new(0)),
                handles_cong_control: false,
            }
        }

        pub(crate) fn handling_cong_control() -> Self {
            Self {
                handles_cong_control: true,
                ..Self::new()
            }
        }
    }

    impl CongestionAlgorithm for CountingAlgorithm {
        fn init(&self, _conn: &mut ConnectionState) {
            self.init.fetch_add(1, Ordering::SeqCst);
        }

        fn ssthresh(&self, conn: &mut ConnectionState) -> u32 {
            self.hooks.fetch_add(1, Ordering::SeqCst);
            conn.cwnd / 2
        }

        fn undo_cwnd(&self, conn: &mut ConnectionState) -> u32 {
            self.hooks.fetch_add(1, Ordering::SeqCst);
            conn.cwnd
        }

        fn cong_avoid(&self, _conn: &mut ConnectionState, _ack: u32, _acked: u32) {
            self.hooks.fetch_add(1, Ordering::SeqCst);
        }

        fn cwnd_event(&self, _conn: &mut ConnectionState, _event: CwndEvent) {
            self.hooks.fetch_add(1, Ordering::SeqCst);
        }

        fn set_state(&self, _conn: &mut ConnectionState, _new_state: RecoveryState) {
            self.hooks.fetch_add(1, Ordering::SeqCst);
        }

        fn on_ack(&self, _conn: &mut ConnectionState, _sample: &AckSample) {
            self.hooks.fetch_add(1, Ordering::SeqCst);
        }

        fn cong_control(
            &self,
            _conn: &mut ConnectionState,
            _rs: &RateSample,
            _ack: u32,
            _acked: u32,
            _flags: &AckFlags,
        ) -> bool {
            self.hooks.fetch_add(1, Ordering::SeqCst);
            self.handles_cong_control
        }
    }
}

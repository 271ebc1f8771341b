//! RTT缩放算法：让长RTT路径以参考路径的速度增长窗口。
//! The RTT-scaling algorithm: long-RTT paths grow their window at the pace
//! of a reference short-RTT path.
//!
//! Growth is normalized by `rho = srtt / reference_rtt`. Slow start adds
//! `2^rho - 1` per acked segment and congestion avoidance `rho^2 / cwnd`,
//! so a connection with ten times the reference RTT ramps up roughly as
//! fast, in wall-clock terms, as one at the reference RTT.
//!
//! 增长按 `rho = srtt / reference_rtt` 归一化。慢启动阶段每个确认的报文段
//! 增加 `2^rho - 1`，拥塞避免阶段增加 `rho^2 / cwnd`，因此RTT为参考值十倍的
//! 连接在墙钟时间上大致与参考RTT的连接一样快地爬升。

use crate::algorithm::CongestionAlgorithm;
use crate::config::Config;
use crate::state::{AckSample, AlgorithmState, ConnectionState, CwndEvent, RecoveryState};
use tracing::trace;

/// Private bookkeeping for the RTT-scaling algorithm.
///
/// RTT缩放算法的私有记录。
#[derive(Debug, Clone, Copy)]
pub struct HyblaState {
    /// The RTT normalization factor, at least 1.
    /// RTT归一化因子，至少为1。
    pub(crate) rho: f64,
    /// Fractional window carried between acks.
    /// 在确认之间结转的窗口小数部分。
    pub(crate) fraction: f64,
    /// Scaling only runs while the connection is in the open state.
    /// 仅当连接处于正常状态时才进行缩放。
    pub(crate) scaling_enabled: bool,
}

impl Default for HyblaState {
    fn default() -> Self {
        Self {
            rho: 1.0,
            fraction: 0.0,
            scaling_enabled: true,
        }
    }
}

/// An RTT-scaling window-growth algorithm.
///
/// 一个RTT缩放的窗口增长算法。
#[derive(Debug)]
pub struct Hybla {
    config: Config,
}

impl Hybla {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn rho(&self, srtt_us: u64) -> f64 {
        if srtt_us == 0 {
            return 1.0;
        }
        (srtt_us as f64 / self.config.algorithm.reference_rtt_us as f64).max(1.0)
    }
}

fn state_mut(conn: &mut ConnectionState) -> &mut HyblaState {
    if !matches!(conn.private, AlgorithmState::Hybla(_)) {
        conn.private = AlgorithmState::Hybla(HyblaState::default());
    }
    match &mut conn.private {
        AlgorithmState::Hybla(state) => state,
        _ => unreachable!("slot was just set"),
    }
}

impl CongestionAlgorithm for Hybla {
    fn init(&self, conn: &mut ConnectionState) {
        let rho = self.rho(conn.srtt_us);
        conn.private = AlgorithmState::Hybla(HyblaState {
            rho,
            ..HyblaState::default()
        });
    }

    fn ssthresh(&self, conn: &mut ConnectionState) -> u32 {
        (conn.cwnd / 2).max(self.config.connection.min_cwnd_packets)
    }

    fn undo_cwnd(&self, conn: &mut ConnectionState) -> u32 {
        conn.cwnd.max(conn.prior_cwnd)
    }

    fn on_ack(&self, conn: &mut ConnectionState, _sample: &AckSample) {
        let rho = self.rho(conn.srtt_us);
        state_mut(conn).rho = rho;
    }

    fn cong_avoid(&self, conn: &mut ConnectionState, _ack: u32, acked: u32) {
        let in_slow_start = conn.cwnd < conn.ssthresh;
        let window = conn.cwnd.max(1);
        let state = state_mut(conn);

        // Per-ack increment, before RTT scaling:
        // slow start adds one segment, avoidance 1/cwnd.
        let increment = if !state.scaling_enabled {
            if in_slow_start {
                1.0
            } else {
                1.0 / f64::from(window)
            }
        } else if in_slow_start {
            // 2^rho - 1 segments per acked segment.
            state.rho.exp2() - 1.0
        } else {
            // rho^2 / cwnd segments per acked segment.
            state.rho * state.rho / f64::from(window)
        };

        state.fraction += increment * f64::from(acked);
        let whole = state.fraction.floor();
        state.fraction -= whole;

        let grown = conn.cwnd.saturating_add(whole as u32);
        conn.cwnd = if in_slow_start {
            grown.min(conn.ssthresh.max(conn.cwnd))
        } else {
            grown
        };
        trace!(cwnd = conn.cwnd, increment, "RTT-scaled growth");
    }

    fn cwnd_event(&self, _conn: &mut ConnectionState, _event: CwndEvent) {}

    fn set_state(&self, conn: &mut ConnectionState, new_state: RecoveryState) {
        let state = state_mut(conn);
        state.scaling_enabled = new_state == RecoveryState::Open;
        if new_state == RecoveryState::Loss {
            state.fraction = 0.0;
        }
    }
}

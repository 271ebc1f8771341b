//! 基于丢包的经典AIMD算法，是注册表的回退项。
//! The loss-based classic AIMD algorithm and the registry's fallback.

use crate::algorithm::CongestionAlgorithm;
use crate::config::Config;
use crate::state::{AlgorithmState, ConnectionState, CwndEvent, RecoveryState};
use tracing::trace;

/// Private bookkeeping for the classic algorithm.
///
/// 经典算法的私有记录。
#[derive(Debug, Clone, Copy, Default)]
pub struct RenoState {
    /// Acked segments accumulated toward the next window increment.
    /// 为下一次窗口增量累积的已确认报文段数。
    pub(crate) cwnd_cnt: u32,
}

/// Slow start with additive increase and multiplicative decrease.
///
/// 带加性增与乘性减的慢启动算法。
#[derive(Debug)]
pub struct Reno {
    config: Config,
}

impl Reno {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

/// Adopts the private slot, replacing a foreign variant with fresh
/// bookkeeping on first use.
fn state_mut(conn: &mut ConnectionState) -> &mut RenoState {
    if !matches!(conn.private, AlgorithmState::Reno(_)) {
        conn.private = AlgorithmState::Reno(RenoState::default());
    }
    match &mut conn.private {
        AlgorithmState::Reno(state) => state,
        _ => unreachable!("slot was just set"),
    }
}

/// Exponential growth below ssthresh. Returns the acked segments left over
/// after reaching the threshold, to be spent on additive increase.
fn slow_start(conn: &mut ConnectionState, acked: u32) -> u32 {
    let target = conn.cwnd.saturating_add(acked).min(conn.ssthresh);
    let consumed = target - conn.cwnd;
    conn.cwnd = target;
    acked - consumed
}

impl CongestionAlgorithm for Reno {
    fn init(&self, conn: &mut ConnectionState) {
        conn.private = AlgorithmState::Reno(RenoState::default());
    }

    fn ssthresh(&self, conn: &mut ConnectionState) -> u32 {
        (conn.cwnd / 2).max(self.config.connection.min_cwnd_packets)
    }

    fn undo_cwnd(&self, conn: &mut ConnectionState) -> u32 {
        conn.cwnd.max(conn.prior_cwnd)
    }

    fn cong_avoid(&self, conn: &mut ConnectionState, _ack: u32, acked: u32) {
        let mut acked = acked;
        if conn.cwnd < conn.ssthresh {
            acked = slow_start(conn, acked);
            trace!(cwnd = conn.cwnd, "Slow start growth");
            if acked == 0 {
                return;
            }
        }

        // Additive increase: one extra segment per full window of acks.
        // 加性增：每确认满一个窗口的报文段，窗口加一。
        let window = conn.cwnd.max(1);
        let state = state_mut(conn);
        state.cwnd_cnt = state.cwnd_cnt.saturating_add(acked);
        if state.cwnd_cnt >= window {
            let increment = state.cwnd_cnt / window;
            state.cwnd_cnt -= increment * window;
            conn.cwnd = conn.cwnd.saturating_add(increment);
            trace!(cwnd = conn.cwnd, "Congestion avoidance growth");
        }
    }

    fn cwnd_event(&self, conn: &mut ConnectionState, event: CwndEvent) {
        if let CwndEvent::CwndRestart = event {
            state_mut(conn).cwnd_cnt = 0;
        }
    }

    fn set_state(&self, conn: &mut ConnectionState, new_state: RecoveryState) {
        if new_state == RecoveryState::Loss {
            // The accumulator is meaningless across an RTO-driven restart.
            state_mut(conn).cwnd_cnt = 0;
        }
    }
}

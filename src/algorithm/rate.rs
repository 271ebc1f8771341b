//! 基于速率/模型的算法：直接从交付速率样本建模可达带宽与RTT。
//! The rate/model-based algorithm: models achievable bandwidth and RTT
//! directly from delivery-rate samples instead of reacting to loss.
//!
//! It takes over the whole window/pacing decision through `cong_control`:
//! a startup phase probes with a high gain until the bandwidth estimate
//! plateaus, a drain phase empties the queue built up during startup, and a
//! steady state cycles the pacing gain around the estimate. The congestion
//! window follows the estimated bandwidth-delay product.
//!
//! 它通过 `cong_control` 接管全部窗口/整形决策：启动阶段以高增益探测，
//! 直到带宽估计趋于平稳；排空阶段清空启动期间积累的队列；稳态阶段让整形
//! 增益围绕估计值循环。拥塞窗口跟随估计的带宽时延积。

use crate::algorithm::CongestionAlgorithm;
use crate::config::Config;
use crate::rate_control::USEC_PER_SEC;
use crate::state::{AckFlags, AlgorithmState, ConnectionState, CwndEvent, RateSample, RecoveryState};
use tracing::{debug, trace};

/// The steady-state pacing-gain cycle. One phase per round: probe up,
/// drain the probe, then cruise.
const GAIN_CYCLE: [f64; 8] = [1.25, 0.75, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];

/// Rounds a bandwidth sample stays in the windowed-max estimate.
const BW_WINDOW_ROUNDS: u32 = 10;

/// Rounds before a min-RTT sample is considered stale.
const MIN_RTT_WINDOW_ROUNDS: u32 = 10;

/// Consecutive non-growing rounds before the pipe counts as full.
const MAX_FULL_BW_COUNT: u32 = 3;

/// The window never falls below this, so ack clocking keeps running.
const MIN_PIPE_CWND: u32 = 4;

/// The model's phase.
/// 模型所处的阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum RateMode {
    #[default]
    Startup,
    Drain,
    ProbeBw,
}

/// Private bookkeeping for the rate model.
///
/// 速率模型的私有记录。
#[derive(Debug, Clone, Copy, Default)]
pub struct RateState {
    pub(crate) mode: RateMode,
    /// Windowed minimum RTT, in microseconds. Zero until sampled.
    /// 窗口化的最小RTT（微秒）。采样前为零。
    pub(crate) min_rtt_us: u64,
    pub(crate) min_rtt_round: u32,
    /// Two-window max filter over bandwidth samples, in bytes per second.
    /// 带宽样本的双窗口最大值滤波器（字节/秒）。
    pub(crate) max_bw: u64,
    pub(crate) max_bw_prev: u64,
    pub(crate) bw_window_round: u32,
    /// Plateau detection for leaving startup.
    /// 用于离开启动阶段的平台期检测。
    pub(crate) full_bw: u64,
    pub(crate) full_bw_count: u32,
    /// Packet-timed round counting.
    /// 按包计时的回合计数。
    pub(crate) round: u32,
    pub(crate) round_delivered: u32,
    pub(crate) cycle_index: u8,
}

/// A delivery-rate model driving both window and pacing.
///
/// 同时驱动窗口与整形速率的交付速率模型。
#[derive(Debug)]
pub struct RateModel {
    config: Config,
}

impl RateModel {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn min_cwnd(&self) -> u32 {
        self.config.connection.min_cwnd_packets.max(MIN_PIPE_CWND)
    }
}

fn state_mut(conn: &mut ConnectionState) -> &mut RateState {
    if !matches!(conn.private, AlgorithmState::Rate(_)) {
        conn.private = AlgorithmState::Rate(RateState::default());
    }
    match &mut conn.private {
        AlgorithmState::Rate(state) => state,
        _ => unreachable!("slot was just set"),
    }
}

/// Picks a random phase to start the steady-state cycle in, skipping the
/// drain phase so a fresh cycle never begins by shrinking.
fn random_cycle_start() -> u8 {
    let raw = rand::random_range(0..GAIN_CYCLE.len() as u8 - 1);
    if raw >= 1 { raw + 1 } else { raw }
}

impl RateState {
    fn bw_estimate(&self) -> u64 {
        self.max_bw.max(self.max_bw_prev)
    }

    /// Feeds one bandwidth sample into the two-window max filter.
    fn update_bw(&mut self, bw: u64, app_limited: bool) {
        // App-limited samples understate the path; only accept them when
        // they still raise the estimate.
        if app_limited && bw <= self.bw_estimate() {
            return;
        }
        if self.round.wrapping_sub(self.bw_window_round) >= BW_WINDOW_ROUNDS {
            self.max_bw_prev = self.max_bw;
            self.max_bw = 0;
            self.bw_window_round = self.round;
        }
        self.max_bw = self.max_bw.max(bw);
    }

    /// Advances plateau detection once per round; true when startup has
    /// filled the pipe.
    fn pipe_is_full(&mut self, bw: u64) -> bool {
        if bw.saturating_mul(4) >= self.full_bw.saturating_mul(5) {
            self.full_bw = bw;
            self.full_bw_count = 0;
            return false;
        }
        self.full_bw_count += 1;
        self.full_bw_count >= MAX_FULL_BW_COUNT
    }
}

impl CongestionAlgorithm for RateModel {
    fn init(&self, conn: &mut ConnectionState) {
        conn.private = AlgorithmState::Rate(RateState::default());
    }

    fn ssthresh(&self, conn: &mut ConnectionState) -> u32 {
        // The model does not steer by ssthresh; leave it where it is.
        conn.ssthresh
    }

    fn undo_cwnd(&self, conn: &mut ConnectionState) -> u32 {
        conn.cwnd.max(conn.prior_cwnd)
    }

    fn cong_avoid(&self, _conn: &mut ConnectionState, _ack: u32, _acked: u32) {
        // Window growth happens in cong_control; nothing to do here.
    }

    fn cwnd_event(&self, conn: &mut ConnectionState, event: CwndEvent) {
        if event == CwndEvent::Loss {
            // Confirmed loss invalidates the plateau; probe again.
            let state = state_mut(conn);
            state.full_bw = 0;
            state.full_bw_count = 0;
        }
    }

    fn set_state(&self, conn: &mut ConnectionState, new_state: RecoveryState) {
        if new_state == RecoveryState::Loss {
            let state = state_mut(conn);
            state.mode = RateMode::Startup;
            state.full_bw = 0;
            state.full_bw_count = 0;
        }
    }

    fn cong_control(
        &self,
        conn: &mut ConnectionState,
        rs: &RateSample,
        _ack: u32,
        _acked: u32,
        _flags: &AckFlags,
    ) -> bool {
        let cwnd = conn.cwnd;
        let in_flight = conn.packets_in_flight;
        let mss = u64::from(conn.mss);
        let max_pacing_rate = conn.max_pacing_rate;
        let startup_gain = self.config.algorithm.startup_gain;
        let cwnd_gain = self.config.algorithm.cwnd_gain;
        let min_cwnd = self.min_cwnd();

        let state = state_mut(conn);

        // Packet-timed rounds: one round per full window of deliveries.
        state.round_delivered = state.round_delivered.saturating_add(rs.delivered);
        let new_round = state.round_delivered >= cwnd;
        if new_round {
            state.round_delivered = 0;
            state.round = state.round.wrapping_add(1);
            if state.mode == RateMode::ProbeBw {
                state.cycle_index = (state.cycle_index + 1) % GAIN_CYCLE.len() as u8;
            }
        }

        if rs.rtt_us > 0 {
            let expired =
                state.round.wrapping_sub(state.min_rtt_round) >= MIN_RTT_WINDOW_ROUNDS;
            if state.min_rtt_us == 0 || rs.rtt_us <= state.min_rtt_us || expired {
                state.min_rtt_us = rs.rtt_us;
                state.min_rtt_round = state.round;
            }
        }

        if rs.interval_us > 0 && rs.delivered > 0 {
            let bw = u64::from(rs.delivered)
                .saturating_mul(mss)
                .saturating_mul(USEC_PER_SEC)
                / rs.interval_us;
            state.update_bw(bw, rs.is_app_limited);
        }

        let bw = state.bw_estimate();
        if bw == 0 || state.min_rtt_us == 0 {
            // No usable model yet; hold the window until samples arrive.
            return true;
        }

        let bdp_packets = (bw.saturating_mul(state.min_rtt_us) / USEC_PER_SEC / mss).max(1);

        if state.mode == RateMode::Startup && new_round && state.pipe_is_full(bw) {
            state.mode = RateMode::Drain;
            debug!(bw, "Pipe filled, draining startup queue");
        }
        if state.mode == RateMode::Drain && u64::from(in_flight) <= bdp_packets {
            state.mode = RateMode::ProbeBw;
            state.cycle_index = random_cycle_start();
            debug!(bw, "Queue drained, entering steady state");
        }

        let pacing_gain = match state.mode {
            RateMode::Startup => startup_gain,
            RateMode::Drain => 1.0 / startup_gain,
            RateMode::ProbeBw => GAIN_CYCLE[usize::from(state.cycle_index)],
        };

        let target = ((cwnd_gain * bdp_packets as f64) as u32).max(min_cwnd);
        let new_cwnd = if state.mode == RateMode::Startup {
            // Never shrink while still probing for the ceiling.
            cwnd.max(target)
        } else {
            target
        };
        let pacing = ((pacing_gain * bw as f64) as u64).min(max_pacing_rate);

        trace!(
            mode = ?state.mode,
            bw,
            bdp = bdp_packets,
            cwnd = new_cwnd,
            pacing,
            "Model update"
        );

        conn.cwnd = new_cwnd;
        conn.store_pacing_rate(pacing);
        true
    }
}

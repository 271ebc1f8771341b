//! 各算法在丢包恢复与速率整形期间共享的通用速率控制数学。
//! The generic rate-control math shared across algorithms during loss
//! recovery and pacing.
//!
//! Everything here is stateless per call: each function reads and writes a
//! single [`ConnectionState`] plus configuration, never blocks, and never
//! allocates, since it runs on the per-ack fast path.
//!
//! 此处的一切都是每次调用无状态的：每个函数只读写单个 [`ConnectionState`]
//! 与配置，绝不阻塞，也绝不分配内存，因为它运行在逐确认的快速路径上。

use crate::config::PacingConfig;
use crate::state::{AckFlags, ConnectionState};
use tracing::trace;

pub(crate) const USEC_PER_SEC: u64 = 1_000_000;

/// Decides whether the window-growth routine may run for this ack.
///
/// When the connection has observed more reordering than the configured
/// threshold, growth is permitted whenever data is delivered regardless of
/// its ordering. Otherwise growth requires strictly in-order delivery.
///
/// 决定本次确认是否允许运行窗口增长例程。
///
/// 当连接观察到的乱序超过配置阈值时，只要有数据交付即允许增长，无论其顺序；
/// 否则增长要求严格按序交付。
pub fn may_raise_cwnd(conn: &ConnectionState, flags: &AckFlags, reordering_threshold: u32) -> bool {
    if conn.reordering > reordering_threshold {
        return flags.forward_progress;
    }
    flags.data_acked
}

/// Shrinks the congestion window proportionally to delivered data while the
/// connection is in a reduction state.
///
/// Preconditions: `newly_acked > 0` and a recovery-entry snapshot must have
/// been taken (`prior_cwnd != 0`). Otherwise this is a no-op.
///
/// 在连接处于缩减状态时，按交付数据的比例收缩拥塞窗口。
///
/// 前置条件：`newly_acked > 0` 且已拍摄恢复进入快照（`prior_cwnd != 0`）。
/// 否则本函数不做任何事。
pub fn cwnd_reduction(conn: &mut ConnectionState, newly_acked: u32, flags: &AckFlags) {
    if newly_acked == 0 || conn.prior_cwnd == 0 {
        return;
    }

    conn.prr_delivered = conn.prr_delivered.saturating_add(newly_acked);

    let in_flight = conn.packets_in_flight;
    let delta = i64::from(conn.ssthresh) - i64::from(in_flight);

    let sndcnt = if delta < 0 {
        // Still above ssthresh: release segments in proportion to what was
        // delivered, against the window held at recovery entry.
        let dividend = u64::from(conn.ssthresh) * u64::from(conn.prr_delivered)
            + u64::from(conn.prior_cwnd)
            - 1;
        (dividend / u64::from(conn.prior_cwnd)) as i64 - i64::from(conn.prr_out)
    } else if flags.retrans_data_acked && !flags.lost_retrans {
        // A retransmission was acked and nothing new was lost: allow a
        // slightly faster climb back toward ssthresh.
        let pending = (i64::from(conn.prr_delivered) - i64::from(conn.prr_out))
            .max(i64::from(newly_acked));
        delta.min(pending + 1)
    } else {
        delta.min(i64::from(newly_acked))
    };

    // Force a retransmission probe upon entering the reduction round.
    let floor = if conn.prr_out == 0 { 1 } else { 0 };
    let sndcnt = sndcnt.max(floor);

    conn.cwnd = in_flight.saturating_add(sndcnt as u32);
    trace!(
        cwnd = conn.cwnd,
        sndcnt,
        prr_delivered = conn.prr_delivered,
        prr_out = conn.prr_out,
        "Proportional reduction applied"
    );
}

/// Recomputes the pacing rate from the current window and RTT and publishes
/// it with a single atomic store.
///
/// The base is `cwnd * mss / srtt`, scaled to twice the current rate while
/// in slow start and to 1.2x in congestion avoidance. A connection counts as
/// still slow-starting only below half of ssthresh; approaching the
/// threshold it should already slow down. The ratios come from
/// configuration; the arithmetic works in integer percent so the scaling
/// stays exact.
///
/// 根据当前窗口与RTT重新计算整形速率，并以单次原子写入发布。
///
/// 基准是 `cwnd * mss / srtt`，慢启动阶段放大到当前速率的两倍，
/// 拥塞避免阶段放大到1.2倍。只有低于 ssthresh 的一半才算仍在慢启动；
/// 接近阈值时就应当减速。比率来自配置；运算以整数百分比进行以保持精确。
pub fn update_pacing_rate(conn: &ConnectionState, pacing: &PacingConfig) {
    let ratio = if conn.cwnd < conn.ssthresh / 2 {
        pacing.slow_start_ratio
    } else {
        pacing.congestion_avoidance_ratio
    };
    let percent = (ratio * 100.0).round().max(0.0) as u64;

    let mut rate = u64::from(conn.mss) * ((USEC_PER_SEC / 100) << 3);
    rate = rate.saturating_mul(percent);
    rate = rate.saturating_mul(u64::from(conn.cwnd.max(conn.packets_out)));
    if conn.srtt_us != 0 {
        rate /= conn.srtt_us;
    }

    conn.store_pacing_rate(rate.min(conn.max_pacing_rate));
}

#[cfg(test)]
mod tests;

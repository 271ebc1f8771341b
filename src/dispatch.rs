//! 分发器——将每个传输事件路由给当前选中的算法。
//! The dispatcher: routes every transport event to the currently selected
//! algorithm.
//!
//! Each hook performs one selection load, one registry lookup (an exhaustive
//! match over the closed identifier enum, so exactly one implementation runs
//! per event) and one call. Hooks never block, never allocate, and never
//! touch the control path.
//!
//! 每个钩子执行一次选择读取、一次注册表查找（对封闭标识符枚举的穷尽匹配，
//! 因此每个事件恰好运行一个实现）以及一次调用。钩子绝不阻塞、不分配内存，
//! 也不触碰控制路径。

use crate::algorithm::AlgorithmRegistry;
use crate::config::{Config, SwitchPolicy};
use crate::rate_control;
use crate::selection::{AlgorithmId, SelectionHandle};
use crate::state::{AckFlags, AckSample, ConnectionState, CwndEvent, RateSample, RecoveryState};
use std::sync::Arc;
use tracing::debug;

/// Routes transport events to the active algorithm and supplies the classic
/// window-reduction/growth skeleton where the algorithm declines to take
/// over.
///
/// 将传输事件路由给活动算法，并在算法不接管时提供经典的窗口缩减/增长骨架。
pub struct Dispatcher {
    config: Arc<Config>,
    registry: AlgorithmRegistry,
    selection: SelectionHandle,
}

impl Dispatcher {
    pub(crate) fn new(
        config: Arc<Config>,
        registry: AlgorithmRegistry,
        selection: SelectionHandle,
    ) -> Self {
        Self {
            config,
            registry,
            selection,
        }
    }

    /// The algorithm governing this connection right now: its pinned
    /// selection if it has one, the live selection otherwise.
    fn active(&self, conn: &ConnectionState) -> AlgorithmId {
        match conn.pinned {
            Some(id) => id,
            None => self.selection.load(),
        }
    }

    /// Loads the active algorithm and applies the configured switch policy
    /// when it differs from the one that last ran on this connection.
    fn active_checked(&self, conn: &mut ConnectionState) -> AlgorithmId {
        let id = self.active(conn);
        if conn.last_active != id {
            debug!(
                from = ?conn.last_active,
                to = ?id,
                policy = ?self.config.selection.switch_policy,
                "Algorithm switch observed on connection"
            );
            if self.config.selection.switch_policy == SwitchPolicy::Reinit {
                self.registry.get(id).init(conn);
            }
            conn.last_active = id;
        }
        id
    }

    /// Runs the active algorithm's `init` for a newly established
    /// connection. Invoked exactly once per connection, by the engine.
    ///
    /// 为新建立的连接运行活动算法的 `init`。由引擎对每个连接恰好调用一次。
    pub fn init(&self, conn: &mut ConnectionState) {
        let id = self.active(conn);
        conn.last_active = id;
        self.registry.get(id).init(conn);
    }

    /// Forwards an acknowledgment sample to the active algorithm.
    /// 将确认样本转发给活动算法。
    pub fn on_ack(&self, conn: &mut ConnectionState, sample: &AckSample) {
        let id = self.active_checked(conn);
        self.registry.get(id).on_ack(conn, sample);
    }

    /// Asks the active algorithm for the post-loss slow-start threshold.
    /// 向活动算法询问丢包后的慢启动阈值。
    pub fn ssthresh(&self, conn: &mut ConnectionState) -> u32 {
        let id = self.active_checked(conn);
        self.registry.get(id).ssthresh(conn)
    }

    /// Asks the active algorithm which window to restore after a loss
    /// signal proved spurious. The caller applies the returned value.
    ///
    /// 向活动算法询问丢包信号被证伪后应恢复的窗口。返回值由调用方应用。
    pub fn undo_cwnd(&self, conn: &mut ConnectionState) -> u32 {
        let id = self.active_checked(conn);
        self.registry.get(id).undo_cwnd(conn)
    }

    /// Forwards a window-growth opportunity to the active algorithm.
    /// 将窗口增长机会转发给活动算法。
    pub fn cong_avoid(&self, conn: &mut ConnectionState, ack: u32, acked: u32) {
        let id = self.active_checked(conn);
        self.registry.get(id).cong_avoid(conn, ack, acked);
    }

    /// Forwards a lifecycle or network event to the active algorithm.
    /// 将生命周期或网络事件转发给活动算法。
    pub fn cwnd_event(&self, conn: &mut ConnectionState, event: CwndEvent) {
        let id = self.active_checked(conn);
        self.registry.get(id).cwnd_event(conn, event);
    }

    /// Applies a loss-handling state transition: snapshots the reduction
    /// bookkeeping when a reduction round begins, records the new state,
    /// then lets the active algorithm react.
    ///
    /// 应用丢包处理状态转换：在缩减回合开始时拍摄缩减记录的快照，
    /// 记录新状态，然后让活动算法做出反应。
    pub fn set_state(&self, conn: &mut ConnectionState, new_state: RecoveryState) {
        let id = self.active_checked(conn);

        let entering_reduction = matches!(
            new_state,
            RecoveryState::Cwr | RecoveryState::Recovery
        ) && !conn.in_cwnd_reduction();
        if entering_reduction {
            conn.prior_cwnd = conn.cwnd;
            conn.prr_delivered = 0;
            conn.prr_out = 0;
            conn.ssthresh = self.registry.get(id).ssthresh(conn);
            debug!(
                prior_cwnd = conn.prior_cwnd,
                ssthresh = conn.ssthresh,
                "Entering window reduction"
            );
        }

        conn.recovery_state = new_state;
        self.registry.get(id).set_state(conn, new_state);
    }

    /// The per-ack main loop.
    ///
    /// A rate-based algorithm may own the whole decision through its
    /// `cong_control` hook, in which case the classic path and the shared
    /// pacing update are skipped entirely. Otherwise: reduce the window
    /// proportionally while in a reduction state, else grow it when the
    /// eligibility test passes, and recompute the pacing rate
    /// unconditionally.
    ///
    /// 逐确认的主循环。
    ///
    /// 基于速率的算法可以通过其 `cong_control` 钩子接管整个决策，
    /// 此时经典路径与共享整形更新被完全跳过。否则：处于缩减状态时按比例
    /// 缩减窗口，不然在通过增长资格测试时增长窗口，最后无条件重算整形速率。
    pub fn cong_control(
        &self,
        conn: &mut ConnectionState,
        rs: &RateSample,
        ack: u32,
        acked: u32,
        flags: &AckFlags,
    ) {
        let id = self.active_checked(conn);
        let algorithm = self.registry.get(id);

        if algorithm.cong_control(conn, rs, ack, acked, flags) {
            return;
        }

        if conn.in_cwnd_reduction() {
            rate_control::cwnd_reduction(conn, acked, flags);
        } else if rate_control::may_raise_cwnd(
            conn,
            flags,
            self.config.recovery.reordering_threshold,
        ) {
            algorithm.cong_avoid(conn, ack, acked);
        }
        rate_control::update_pacing_rate(conn, &self.config.pacing);
    }
}

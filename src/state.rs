//! 每连接的拥塞状态以及传输事件样本类型。
//! Per-connection congestion state and the transport-event sample types.

use crate::algorithm::{hybla::HyblaState, rate::RateState, reno::RenoState};
use crate::config::Config;
use crate::selection::AlgorithmId;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Phase of a connection's loss-handling lifecycle.
///
/// 连接丢包处理生命周期的阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    /// Normal operation, no loss suspected.
    /// 正常运行，未怀疑丢包。
    Open,
    /// Reordering suspected; not yet treated as loss.
    /// 怀疑乱序；尚未按丢包处理。
    Disorder,
    /// Window reduction in response to a congestion notification.
    /// 响应拥塞通知的窗口缩减。
    Cwr,
    /// Fast recovery after a loss signal.
    /// 丢包信号后的快速恢复。
    Recovery,
    /// Retransmission-timeout loss handling.
    /// 重传超时丢包处理。
    Loss,
}

/// Lifecycle and network events forwarded to the active algorithm.
///
/// 转发给活动算法的生命周期与网络事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CwndEvent {
    /// First transmission after an idle period.
    /// 空闲后的首次发送。
    TxStart,
    /// Congestion window restart.
    /// 拥塞窗口重启。
    CwndRestart,
    /// The congestion-window-reduction phase completed.
    /// 拥塞窗口缩减阶段完成。
    CompleteCwr,
    /// A loss signal was confirmed.
    /// 丢包信号已确认。
    Loss,
    /// ECN: no congestion-experienced mark.
    /// ECN：无拥塞经历标记。
    EcnNoCe,
    /// ECN: congestion-experienced mark received.
    /// ECN：收到拥塞经历标记。
    EcnIsCe,
}

/// Summary of a single acknowledgment, handed to the `on_ack` hook.
///
/// 单个确认的摘要，传递给 `on_ack` 钩子。
#[derive(Debug, Clone, Copy)]
pub struct AckSample {
    /// Packets newly acknowledged by this ack.
    /// 本次确认新确认的包数。
    pub packets_acked: u32,
    /// Bytes newly acknowledged by this ack.
    /// 本次确认新确认的字节数。
    pub bytes_acked: u32,
    /// The RTT measured from this ack, in microseconds. Zero when no valid
    /// sample could be taken.
    /// 本次确认测得的RTT（微秒）。无有效样本时为零。
    pub rtt_us: u64,
}

/// A delivery-rate sample covering the interval between two acks, handed to
/// the `cong_control` hook.
///
/// 覆盖两次确认之间区间的交付速率样本，传递给 `cong_control` 钩子。
#[derive(Debug, Clone, Copy)]
pub struct RateSample {
    /// Packets delivered over the sample interval.
    /// 样本区间内交付的包数。
    pub delivered: u32,
    /// The sample interval, in microseconds.
    /// 样本区间（微秒）。
    pub interval_us: u64,
    /// The RTT observed with this sample, in microseconds.
    /// 随样本观察到的RTT（微秒）。
    pub rtt_us: u64,
    /// Packets marked lost over the interval.
    /// 区间内标记为丢失的包数。
    pub losses: u32,
    /// Whether the sender was application-limited during the interval.
    /// 区间内发送方是否受应用限制。
    pub is_app_limited: bool,
    /// Packets in flight before this ack arrived.
    /// 本次确认到达前的在途包数。
    pub prior_in_flight: u32,
}

/// Flags describing what an incoming acknowledgment achieved.
///
/// 描述一个传入确认达成了什么的标志。
#[derive(Debug, Clone, Copy, Default)]
pub struct AckFlags {
    /// The ack acknowledged in-order data.
    /// 该确认按序确认了数据。
    pub data_acked: bool,
    /// The ack made forward progress (new data acked or SACKed).
    /// 该确认取得了前向进展（确认或SACK了新数据）。
    pub forward_progress: bool,
    /// The ack acknowledged retransmitted data.
    /// 该确认确认了重传数据。
    pub retrans_data_acked: bool,
    /// A retransmission was itself detected lost.
    /// 检测到重传本身丢失。
    pub lost_retrans: bool,
}

/// Private state of whichever algorithm is driving a connection.
///
/// A tagged union sized by the compiler to its largest variant, so the
/// "slot fits every registered algorithm" invariant holds by construction
/// and a foreign variant can never be misread as one's own.
///
/// 驱动连接的算法的私有状态。
///
/// 一个由编译器按最大变体确定大小的带标签联合体，因此"槽位容纳所有已注册算法"
/// 的不变式天然成立，外来变体也绝不会被误读。
#[derive(Debug, Clone)]
pub enum AlgorithmState {
    /// Loss-based classic bookkeeping.
    /// 基于丢包的经典算法的记录。
    Reno(RenoState),
    /// Rate-model bookkeeping.
    /// 速率模型的记录。
    Rate(RateState),
    /// RTT-scaling bookkeeping.
    /// RTT缩放算法的记录。
    Hybla(HyblaState),
}

impl Default for AlgorithmState {
    fn default() -> Self {
        Self::Reno(RenoState::default())
    }
}

/// Per-connection congestion data, owned exclusively by the connection's
/// own processing context. All hooks mutate it synchronously; nothing here
/// is shared across connections except the pacing-rate cell, which an
/// external packet scheduler may read through a cloned handle.
///
/// 每连接的拥塞数据，由该连接自己的处理上下文独占。所有钩子同步修改它；
/// 除了外部调度器可通过克隆句柄读取的整形速率单元格外，连接间不共享任何内容。
#[derive(Debug)]
pub struct ConnectionState {
    /// Congestion window, in packets.
    /// 拥塞窗口（以包为单位）。
    pub cwnd: u32,
    /// Slow-start threshold, in packets.
    /// 慢启动阈值（以包为单位）。
    pub ssthresh: u32,
    /// Packets currently in flight.
    /// 当前在途的包数。
    pub packets_in_flight: u32,
    /// Packets sent and not yet fully accounted for.
    /// 已发送且尚未完全结算的包数。
    pub packets_out: u32,
    /// Smoothed RTT, in microseconds. Maintained by the host transport.
    /// 平滑RTT（微秒）。由宿主传输层维护。
    pub srtt_us: u64,
    /// Maximum segment size, in bytes.
    /// 最大报文段大小（字节）。
    pub mss: u32,
    /// Congestion window snapshot taken on recovery entry.
    /// 进入恢复时拍摄的拥塞窗口快照。
    pub prior_cwnd: u32,
    /// Packets delivered since recovery entry.
    /// 进入恢复以来交付的包数。
    pub prr_delivered: u32,
    /// Packets sent since recovery entry.
    /// 进入恢复以来发送的包数。
    pub prr_out: u32,
    /// Reordering observed on this connection, in packets.
    /// 此连接上观察到的乱序程度（以包为单位）。
    pub reordering: u32,
    /// Upper bound for the pacing rate, in bytes per second.
    /// 整形速率上限（字节/秒）。
    pub max_pacing_rate: u64,
    /// The connection's loss-handling phase.
    /// 连接的丢包处理阶段。
    pub recovery_state: RecoveryState,
    /// The pacing-rate cell, written with a single atomic store and read
    /// concurrently by the packet scheduler.
    /// 整形速率单元格，以单次原子写入，由调度器并发读取。
    pacing_rate: Arc<AtomicU64>,
    /// The active algorithm's private slot.
    /// 活动算法的私有槽位。
    pub(crate) private: AlgorithmState,
    /// Which algorithm last ran a hook on this connection.
    /// 最近在此连接上运行钩子的算法。
    pub(crate) last_active: AlgorithmId,
    /// Pinned selection when per-connection scope is configured.
    /// 配置为每连接作用域时固定的选择。
    pub(crate) pinned: Option<AlgorithmId>,
}

impl ConnectionState {
    /// Creates the state for a newly established connection. The `init`
    /// hook has not run yet; the dispatcher invokes it exactly once.
    ///
    /// 为新建立的连接创建状态。此时 `init` 钩子尚未运行；分发器会恰好调用一次。
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            cwnd: config.connection.initial_cwnd_packets.max(1),
            ssthresh: config.connection.initial_ssthresh,
            packets_in_flight: 0,
            packets_out: 0,
            srtt_us: 0,
            mss: config.connection.mss,
            prior_cwnd: 0,
            prr_delivered: 0,
            prr_out: 0,
            reordering: 0,
            max_pacing_rate: config.connection.max_pacing_rate,
            recovery_state: RecoveryState::Open,
            pacing_rate: Arc::new(AtomicU64::new(0)),
            private: AlgorithmState::default(),
            last_active: AlgorithmId::LossBased,
            pinned: None,
        }
    }

    /// The most recently computed pacing rate, in bytes per second.
    /// 最近计算出的整形速率（字节/秒）。
    pub fn pacing_rate(&self) -> u64 {
        self.pacing_rate.load(Ordering::Acquire)
    }

    /// A cloneable handle to the pacing-rate cell for the packet scheduler.
    /// 供调度器使用的整形速率单元格句柄。
    pub fn pacing_rate_handle(&self) -> Arc<AtomicU64> {
        self.pacing_rate.clone()
    }

    /// Publishes a new pacing rate with a single atomic store.
    /// 以单次原子写入发布新的整形速率。
    pub(crate) fn store_pacing_rate(&self, rate: u64) {
        self.pacing_rate.store(rate, Ordering::Release);
    }

    /// Whether the connection is currently in a window-reduction state.
    /// 连接当前是否处于窗口缩减状态。
    pub fn in_cwnd_reduction(&self) -> bool {
        matches!(
            self.recovery_state,
            RecoveryState::Cwr | RecoveryState::Recovery
        )
    }

    /// Accounts for newly sent segments. During a reduction round this also
    /// advances the proportional-reduction send counter.
    ///
    /// 结算新发送的报文段。在缩减回合中这同时推进按比例缩减的发送计数。
    pub fn note_sent(&mut self, segments: u32) {
        self.packets_out = self.packets_out.saturating_add(segments);
        self.packets_in_flight = self.packets_in_flight.saturating_add(segments);
        if self.in_cwnd_reduction() {
            self.prr_out = self.prr_out.saturating_add(segments);
        }
    }
}

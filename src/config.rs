//! 定义了引擎和各算法的可配置参数。
//! Defines configurable parameters for the engine and its algorithms.

use crate::selection::AlgorithmId;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// A structure containing all configurable parameters for the engine.
///
/// 包含引擎所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct Config {
    /// Per-connection window parameters.
    /// 每连接窗口参数。
    pub connection: ConnectionConfig,

    /// Pacing-rate parameters.
    /// 速率整形参数。
    pub pacing: PacingConfig,

    /// Loss-recovery parameters.
    /// 丢包恢复参数。
    pub recovery: RecoveryConfig,

    /// Runtime algorithm-selection parameters.
    /// 运行时算法选择参数。
    pub selection: SelectionConfig,

    /// Control-channel parameters.
    /// 控制通道参数。
    pub control: ControlConfig,

    /// Built-in algorithm tunables.
    /// 内置算法调节参数。
    pub algorithm: AlgorithmConfig,
}

/// Per-connection window parameters.
///
/// 每连接窗口参数。
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// The initial congestion window size in packets.
    /// 初始拥塞窗口大小（以包为单位）。
    pub initial_cwnd_packets: u32,
    /// The minimum congestion window size in packets.
    /// 最小拥塞窗口大小（以包为单位）。
    pub min_cwnd_packets: u32,
    /// The initial slow start threshold in packets.
    /// 初始慢启动阈值（以包为单位）。
    pub initial_ssthresh: u32,
    /// The maximum segment size in bytes.
    /// 最大报文段大小（以字节为单位）。
    pub mss: u32,
    /// The upper bound for the computed pacing rate, in bytes per second.
    /// 计算出的整形速率的上限（字节/秒）。
    pub max_pacing_rate: u64,
}

/// Pacing-rate parameters.
///
/// The pacing rate is derived from `cwnd * mss / srtt`, scaled by one of the
/// two ratios below depending on the growth phase.
///
/// 速率整形参数。
///
/// 整形速率由 `cwnd * mss / srtt` 推导而来，并根据增长阶段乘以下面两个比率之一。
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// The multiplier applied while in slow start (`cwnd < ssthresh / 2`).
    /// 慢启动阶段（`cwnd < ssthresh / 2`）应用的乘数。
    pub slow_start_ratio: f64,
    /// The multiplier applied in congestion avoidance.
    /// 拥塞避免阶段应用的乘数。
    pub congestion_avoidance_ratio: f64,
}

/// Loss-recovery parameters.
///
/// 丢包恢复参数。
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// The reordering tolerance, in packets. When a connection has observed
    /// more reordering than this, window growth is permitted on any ack that
    /// makes forward progress rather than only on in-order delivery.
    ///
    /// 乱序容忍度（以包为单位）。当连接观察到的乱序超过该值时，
    /// 任何取得前向进展的确认都允许窗口增长，而不仅限于按序交付。
    pub reordering_threshold: u32,
}

/// Which connections a selection change applies to.
///
/// 选择变更作用于哪些连接。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionScope {
    /// Every connection follows the live selection on each event.
    /// 每个连接在每次事件时跟随实时选择。
    Global,
    /// Each connection pins the selection observed at establishment; later
    /// control messages only affect connections created afterwards.
    ///
    /// 每个连接固定建立时观察到的选择；之后的控制消息只影响新建连接。
    PerConnection,
}

/// What happens to a connection's private algorithm state when the active
/// algorithm changes mid-connection.
///
/// 当活动算法在连接中途变更时，连接的算法私有状态如何处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPolicy {
    /// Leave the private slot untouched; the newly active algorithm adopts
    /// it lazily on first use. Switching back before then finds the old
    /// state intact.
    ///
    /// 保留私有槽不动；新激活的算法在首次使用时惰性接管。
    /// 在此之前切换回来仍能找到旧状态。
    Preserve,
    /// Re-run the newly active algorithm's `init` as soon as the switch is
    /// observed on a connection.
    ///
    /// 在连接上观察到切换后立即重新运行新算法的 `init`。
    Reinit,
}

/// Runtime algorithm-selection parameters.
///
/// 运行时算法选择参数。
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// The algorithm selected at engine start.
    /// 引擎启动时选择的算法。
    pub initial: AlgorithmId,
    /// Which connections a selection change applies to.
    /// 选择变更的作用范围。
    pub scope: SelectionScope,
    /// Private-state handling on a mid-connection switch.
    /// 连接中途切换时私有状态的处理方式。
    pub switch_policy: SwitchPolicy,
}

/// Control-channel parameters.
///
/// 控制通道参数。
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// The address the control listener binds to. Port 0 picks an ephemeral
    /// port, which tests rely on.
    ///
    /// 控制监听器绑定的地址。端口 0 表示选择临时端口，测试依赖该行为。
    pub bind_addr: SocketAddr,
    /// The receive buffer size for a single control datagram.
    /// 单个控制数据报的接收缓冲区大小。
    pub recv_buffer_bytes: usize,
}

/// Built-in algorithm tunables.
///
/// 内置算法调节参数。
#[derive(Debug, Clone)]
pub struct AlgorithmConfig {
    /// The reference RTT the RTT-scaling algorithm normalizes against, in
    /// microseconds. Connections with a larger smoothed RTT grow their
    /// window proportionally faster.
    ///
    /// RTT缩放算法归一化所用的参考RTT（微秒）。
    /// 平滑RTT更大的连接将按比例更快地增长窗口。
    pub reference_rtt_us: u64,
    /// The pacing gain the rate model uses while probing for bandwidth at
    /// startup.
    /// 速率模型在启动阶段探测带宽时使用的整形增益。
    pub startup_gain: f64,
    /// The window gain the rate model applies on top of the estimated
    /// bandwidth-delay product.
    /// 速率模型在估计的带宽时延积之上应用的窗口增益。
    pub cwnd_gain: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            pacing: PacingConfig::default(),
            recovery: RecoveryConfig::default(),
            selection: SelectionConfig::default(),
            control: ControlConfig::default(),
            algorithm: AlgorithmConfig::default(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            initial_cwnd_packets: 10,
            min_cwnd_packets: 2,
            initial_ssthresh: u32::MAX,
            mss: 1460,
            max_pacing_rate: u64::MAX,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            slow_start_ratio: 2.0,
            congestion_avoidance_ratio: 1.2,
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            reordering_threshold: 3,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            initial: AlgorithmId::LossBased,
            scope: SelectionScope::Global,
            switch_policy: SwitchPolicy::Preserve,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8425),
            recv_buffer_bytes: 64,
        }
    }
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            reference_rtt_us: 25_000, // 25ms reference path
            startup_gain: 2.885,
            cwnd_gain: 2.0,
        }
    }
}

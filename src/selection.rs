//! 运行时算法选择状态。
//! Runtime algorithm-selection state.
//!
//! The selection is a single process-visible cell written by the control
//! channel and read, with relaxed ordering, by every dispatch on the ack
//! path. The cell stores the raw submitted value; unknown values alias to
//! the fallback algorithm at load time, so a later registration of that
//! identifier would pick up retroactively submitted selections.
//!
//! 选择状态是一个进程可见的单元格，由控制通道写入，并在确认路径的每次分发时
//! 以宽松内存序读取。单元格存储原始提交值；未知值在读取时回退到默认算法。

use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

/// Identifies one of the registered congestion-control algorithms.
///
/// 标识已注册的拥塞控制算法之一。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmId {
    /// The loss-based classic algorithm. This is the fallback and default.
    /// 基于丢包的经典算法。这是回退项和默认项。
    LossBased,
    /// The rate/model-based algorithm.
    /// 基于速率/模型的算法。
    RateBased,
    /// The RTT-scaling algorithm.
    /// RTT缩放算法。
    RttScaling,
}

impl AlgorithmId {
    /// Maps a raw control-channel value onto a registered algorithm.
    /// Unknown or out-of-range identifiers deterministically alias to the
    /// fallback algorithm.
    ///
    /// 将控制通道的原始值映射到已注册的算法。
    /// 未知或越界的标识符确定性地回退到默认算法。
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Self::RateBased,
            2 => Self::RttScaling,
            _ => Self::LossBased,
        }
    }

    /// The stable wire identifier of this algorithm.
    /// 该算法的稳定线上标识符。
    pub fn as_raw(self) -> u32 {
        match self {
            Self::LossBased => 0,
            Self::RateBased => 1,
            Self::RttScaling => 2,
        }
    }
}

/// A cloneable handle to the selection cell.
///
/// Single writer (the control listener task), many relaxed readers (one per
/// connection's ack-processing context). A store is visible to subsequent
/// loads at an unspecified but bounded point; loads never observe a torn
/// value.
///
/// 选择单元格的可克隆句柄。
///
/// 单写者（控制监听任务），多读者（每个连接的确认处理上下文各一个），
/// 均为宽松内存序。写入对后续读取在某个有界时刻可见；读取绝不会观察到撕裂值。
#[derive(Debug, Clone)]
pub struct SelectionHandle(Arc<AtomicU32>);

impl SelectionHandle {
    /// Creates a new selection cell holding the given initial algorithm.
    /// 创建一个持有给定初始算法的选择单元格。
    pub fn new(initial: AlgorithmId) -> Self {
        Self(Arc::new(AtomicU32::new(initial.as_raw())))
    }

    /// Loads the active algorithm. Unknown raw values alias to the fallback
    /// here, on the read side.
    ///
    /// 读取当前活动算法。未知的原始值在读取侧回退到默认算法。
    pub fn load(&self) -> AlgorithmId {
        AlgorithmId::from_raw(i64::from(self.0.load(Ordering::Relaxed)))
    }

    /// Stores a known algorithm identifier.
    /// 存入一个已知的算法标识符。
    pub fn store(&self, id: AlgorithmId) {
        self.0.store(id.as_raw(), Ordering::Relaxed);
    }

    /// Stores a raw submitted value without aliasing it first.
    /// 存入原始提交值，不做回退映射。
    pub(crate) fn store_raw(&self, raw: i64) {
        self.0.store(raw as u32, Ordering::Relaxed);
    }

    /// The raw value currently held by the cell.
    /// 单元格当前持有的原始值。
    pub fn raw(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

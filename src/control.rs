//! 控制通道：接收"选择算法N"命令并更新选择状态。
//! The control channel: receives "select algorithm N" commands and updates
//! the selection state.
//!
//! The channel is narrow by design: a fire-and-forget datagram carrying one
//! ASCII decimal integer, no acknowledgment, no sequencing, no
//! authentication. Malformed payloads are logged and dropped; the previous
//! selection is retained.
//!
//! 控制通道刻意做得很窄：一个携带单个ASCII十进制整数的即发即弃数据报，
//! 无确认、无序号、无鉴权。畸形载荷记录日志后丢弃；之前的选择保持不变。

use crate::error::{Error, Result};
use crate::selection::{AlgorithmId, SelectionHandle};
use bytes::Bytes;
use std::net::SocketAddr;
use tracing::{debug, warn};

pub mod transport;

pub use transport::{BindableControlTransport, ControlTransport};

/// Parses control payloads and stores accepted selections.
///
/// 解析控制载荷并存储被接受的选择。
#[derive(Debug, Clone)]
pub struct ControlChannel {
    selection: SelectionHandle,
}

impl ControlChannel {
    pub fn new(selection: SelectionHandle) -> Self {
        Self { selection }
    }

    /// Submits one raw control payload.
    ///
    /// Parses it as a base-10 signed integer; on success the raw value is
    /// stored atomically and the (possibly aliased) selected algorithm is
    /// returned. On failure the selection is left unchanged.
    ///
    /// 提交一个原始控制载荷。
    ///
    /// 将其解析为带符号十进制整数；成功时原始值被原子地存储，并返回
    /// （可能已回退映射的）所选算法。失败时选择保持不变。
    pub fn submit(&self, payload: &[u8]) -> Result<AlgorithmId> {
        let text = String::from_utf8_lossy(payload);
        let trimmed = text.trim();
        let raw: i64 = trimmed
            .parse()
            .map_err(|_| Error::ControlParse(trimmed.to_string()))?;
        self.selection.store_raw(raw);
        Ok(AlgorithmId::from_raw(raw))
    }
}

/// The actor that owns the control transport and feeds received payloads
/// into the [`ControlChannel`].
///
/// It runs in a dedicated task spawned by the engine; the receive loop is
/// fully separate from the ack-processing path and only ever touches the
/// selection cell.
///
/// 拥有控制传输并将收到的载荷送入 [`ControlChannel`] 的actor。
///
/// 它运行在引擎派生的专用任务中；接收循环与确认处理路径完全分离，
/// 只会触碰选择单元格。
pub struct ControlListener<T: ControlTransport> {
    transport: T,
    channel: ControlChannel,
    recv_buffer_bytes: usize,
}

impl<T: BindableControlTransport> ControlListener<T> {
    /// Binds the control transport. Failure here is fatal to engine start.
    ///
    /// 绑定控制传输。此处的失败对引擎启动是致命的。
    pub async fn bind(
        addr: SocketAddr,
        selection: SelectionHandle,
        recv_buffer_bytes: usize,
    ) -> Result<Self> {
        let transport = T::bind(addr).await?;
        Ok(Self {
            transport,
            channel: ControlChannel::new(selection),
            recv_buffer_bytes,
        })
    }
}

impl<T: ControlTransport> ControlListener<T> {
    /// The address the listener is receiving on.
    /// 监听器正在接收的地址。
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the receive loop until the transport fails or the task is
    /// aborted by engine shutdown.
    ///
    /// 运行接收循环，直到传输失败或任务被引擎关闭中止。
    pub async fn run(self) {
        let mut buf = vec![0u8; self.recv_buffer_bytes];
        loop {
            match self.transport.recv(&mut buf).await {
                Ok(len) => {
                    let payload = Bytes::copy_from_slice(&buf[..len]);
                    match self.channel.submit(&payload) {
                        Ok(id) => {
                            debug!(?id, "Control selection updated");
                        }
                        Err(err) => {
                            warn!(%err, "Discarding malformed control payload");
                        }
                    }
                }
                Err(err) => {
                    warn!(%err, "Control transport receive failed, stopping listener");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;

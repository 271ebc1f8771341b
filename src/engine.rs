//! 引擎：把注册表、分发器与控制通道装配成一个拥塞控制单元。
//! The engine: assembles the registry, the dispatcher and the control
//! channel into one congestion-control unit.
//!
//! Startup creates the control channel and registers the unit together; a
//! channel-creation failure aborts startup with nothing left registered.
//! Shutdown releases resources in reverse order.
//!
//! 启动时一并创建控制通道并注册单元；通道创建失败将中止启动，
//! 不留下任何已注册的部分。关闭时按相反顺序释放资源。

use crate::algorithm::AlgorithmRegistry;
use crate::config::{Config, SelectionScope};
use crate::control::{BindableControlTransport, ControlListener};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::selection::SelectionHandle;
use crate::state::ConnectionState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::info;

/// A running congestion-control unit.
///
/// The host transport stack holds one of these, creates a
/// [`ConnectionState`] per connection through it, and drives the hooks on
/// [`Dispatcher`] from its ack-processing path.
///
/// 一个运行中的拥塞控制单元。
///
/// 宿主传输栈持有它，通过它为每个连接创建 [`ConnectionState`]，
/// 并从其确认处理路径驱动 [`Dispatcher`] 上的钩子。
pub struct CongestionEngine {
    config: Arc<Config>,
    selection: SelectionHandle,
    dispatcher: Dispatcher,
    listener_task: JoinHandle<()>,
    control_addr: SocketAddr,
}

impl CongestionEngine {
    /// Starts the engine with a UDP control channel.
    ///
    /// 以UDP控制通道启动引擎。
    pub async fn start(config: Config) -> Result<Self> {
        Self::start_with_transport::<UdpSocket>(config).await
    }

    /// Starts the engine over a custom control transport.
    ///
    /// The control channel is bound before anything is registered, so a
    /// bind failure surfaces here and leaves no partial state behind.
    ///
    /// 在自定义控制传输上启动引擎。
    ///
    /// 控制通道在任何注册发生之前绑定，因此绑定失败会在此处暴露，
    /// 不会留下部分状态。
    pub async fn start_with_transport<T: BindableControlTransport>(
        config: Config,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let selection = SelectionHandle::new(config.selection.initial);

        let listener = ControlListener::<T>::bind(
            config.control.bind_addr,
            selection.clone(),
            config.control.recv_buffer_bytes,
        )
        .await?;
        let control_addr = listener.local_addr()?;

        let registry = AlgorithmRegistry::new(&config);
        let dispatcher = Dispatcher::new(config.clone(), registry, selection.clone());
        let listener_task = tokio::spawn(listener.run());

        info!(%control_addr, initial = ?config.selection.initial, "Congestion engine started");
        Ok(Self {
            config,
            selection,
            dispatcher,
            listener_task,
            control_addr,
        })
    }

    /// The hook surface the host transport stack drives.
    /// 宿主传输栈驱动的钩子表面。
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The selection cell, shared with the control listener.
    /// 与控制监听器共享的选择单元格。
    pub fn selection(&self) -> &SelectionHandle {
        &self.selection
    }

    /// The address the control listener is receiving on.
    /// 控制监听器正在接收的地址。
    pub fn control_addr(&self) -> SocketAddr {
        self.control_addr
    }

    /// Creates the congestion state for a newly established connection and
    /// runs the active algorithm's `init` on it, exactly once.
    ///
    /// 为新建立的连接创建拥塞状态，并在其上恰好运行一次活动算法的 `init`。
    pub fn new_connection(&self) -> ConnectionState {
        let mut conn = ConnectionState::new(&self.config);
        if self.config.selection.scope == SelectionScope::PerConnection {
            conn.pinned = Some(self.selection.load());
        }
        self.dispatcher.init(&mut conn);
        conn
    }

    /// Stops the engine: the control channel is released first, then the
    /// unit itself goes away — the reverse of startup.
    ///
    /// 停止引擎：先释放控制通道，然后单元本身消失——与启动顺序相反。
    pub async fn shutdown(self) {
        self.listener_task.abort();
        // Cancellation is the expected outcome here.
        let _ = self.listener_task.await;
        info!("Congestion engine stopped");
    }
}

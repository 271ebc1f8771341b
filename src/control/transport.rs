//! Traits for abstracting over the control channel's datagram transport.
//! 用于抽象控制通道数据报传输的trait。

use crate::error::Result;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// An asynchronous datagram source for control messages.
///
/// This trait allows for abstracting over the underlying socket
/// implementation, enabling custom transports for testing or other purposes.
///
/// 控制消息的异步数据报来源。
///
/// 此trait允许对底层套接字实现进行抽象，从而可以为测试或其他目的自定义传输。
#[async_trait]
pub trait ControlTransport: Send + Sync + 'static {
    /// Receives a single control datagram.
    async fn recv(&self, buf: &mut [u8]) -> Result<usize>;

    /// Returns the local address this transport is bound to.
    fn local_addr(&self) -> Result<SocketAddr>;
}

#[async_trait]
impl ControlTransport for UdpSocket {
    async fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        let (len, _peer) = UdpSocket::recv_from(self, buf).await?;
        Ok(len)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        UdpSocket::local_addr(self).map_err(Into::into)
    }
}

/// A control transport that can be created by binding to a local address.
///
/// 可通过绑定本地地址创建的控制传输。
#[async_trait]
pub trait BindableControlTransport: ControlTransport + Sized {
    /// Binds a new transport to the given address.
    /// 将新传输绑定到给定地址。
    async fn bind(addr: SocketAddr) -> Result<Self>;
}

#[async_trait]
impl BindableControlTransport for UdpSocket {
    async fn bind(addr: SocketAddr) -> Result<Self> {
        UdpSocket::bind(addr).await.map_err(Into::into)
    }
}

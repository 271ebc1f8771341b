//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the congestion-control engine.
/// 拥塞控制引擎的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying I/O error occurred.
    /// 发生了底层的I/O错误。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred during address parsing.
    /// 地址解析期间发生错误。
    #[error("Address parsing error: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    /// A control payload could not be parsed as a decimal algorithm identifier.
    /// The previous selection is retained.
    ///
    /// 控制载荷无法解析为十进制算法标识符。之前的选择保持不变。
    #[error("Invalid control payload: {0:?}")]
    ControlParse(String),

    /// The control listener task is no longer running.
    /// 控制监听任务已不再运行。
    #[error("Control channel is closed")]
    ChannelClosed,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(e) => e,
            Error::AddressParse(e) => std::io::Error::new(ErrorKind::InvalidInput, e),
            Error::ControlParse(_) => ErrorKind::InvalidData.into(),
            Error::ChannelClosed => ErrorKind::BrokenPipe.into(),
        }
    }
}

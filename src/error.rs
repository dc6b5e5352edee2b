//! 适配器错误类型定义.
//!
//! 引擎在解码循环内部报告的状态码不在此列 (见 [`EngineStatus`]):
//! 循环把它们折叠为粗粒度的已消费字节数信号, 不做异常式传播.

use thiserror::Error;

use crate::engine::EngineStatus;

/// 适配器错误
#[derive(Debug, Error)]
pub enum AdapterError {
    /// 引擎打开失败 (工厂返回了 None)
    #[error("解码引擎打开失败")]
    EngineOpen,

    /// 适配器未打开
    #[error("适配器未打开")]
    NotOpen,

    /// 引擎返回了非 OK 状态
    #[error("引擎状态异常: {0}")]
    Engine(EngineStatus),

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),
}

/// 适配器统一 Result 类型
pub type AdapterResult<T> = Result<T, AdapterError>;

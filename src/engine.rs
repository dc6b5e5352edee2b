//! 外部解码引擎抽象.
//!
//! 真正的 AAC 变换与熵解码由外部引擎完成 (如 libfdk-aac 的绑定),
//! 本模块只定义其调用契约. 已打开的引擎以 trait 对象形式被适配器
//! 独占持有, 打开操作通过工厂闭包完成, 关闭由 Drop 承担.

use std::fmt;

use crate::flags::DecoderFlags;
use crate::stream_info::StreamInfo;

/// 压缩输入的传输封装格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportType {
    /// 裸 AAC 码流 (无封装, 需要带外配置)
    Raw,
    /// ADIF 封装
    Adif,
    /// ADTS 封装
    #[default]
    Adts,
    /// LATM 封装 (带内 SMC)
    Latm,
    /// LOAS/LATM 封装
    Loas,
}

/// 引擎运行时参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineParam {
    /// 最小输出声道数 (不足时引擎上混)
    MinOutputChannels,
    /// 最大输出声道数 (超出时引擎下混)
    MaxOutputChannels,
    /// 错误隐藏方式
    ConcealMethod,
}

/// 引擎状态码
///
/// 对应 FDK 的 `AAC_DECODER_ERROR` 状态空间. 状态码不是 crate
/// 错误: `NotEnoughBits` 属于增量喂入的正常节奏, 表示当前帧的
/// 位数还不够, 继续喂入即可.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// 正常
    Ok,
    /// 当前帧数据不足, 需要更多输入 (可恢复)
    NotEnoughBits,
    /// 传输层同步失败 (如 ADTS 同步字错误)
    TransportSyncError,
    /// 码流解析失败
    ParseError,
    /// 不支持的码流格式
    UnsupportedFormat,
    /// 输出缓冲区太小
    OutputBufferTooSmall,
    /// 参数设置失败
    SetParamFail,
    /// 无效的引擎句柄
    InvalidHandle,
    /// 引擎自定义状态码
    Unknown(i32),
}

impl EngineStatus {
    /// 是否为正常状态
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// 是否为可恢复状态 (仅表示当前帧位数不足, 不是整体失败)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotEnoughBits)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "正常"),
            Self::NotEnoughBits => write!(f, "当前帧数据不足"),
            Self::TransportSyncError => write!(f, "传输层同步失败"),
            Self::ParseError => write!(f, "码流解析失败"),
            Self::UnsupportedFormat => write!(f, "不支持的码流格式"),
            Self::OutputBufferTooSmall => write!(f, "输出缓冲区太小"),
            Self::SetParamFail => write!(f, "参数设置失败"),
            Self::InvalidHandle => write!(f, "无效的引擎句柄"),
            Self::Unknown(code) => write!(f, "引擎状态码 {code}"),
        }
    }
}

/// fill 操作的结果
#[derive(Debug, Clone, Copy)]
pub struct FillOutcome {
    /// 本次提交中尚未被引擎收下的末尾字节数
    pub bytes_valid: usize,
    /// 状态码
    pub status: EngineStatus,
}

/// 外部解码引擎契约
///
/// 表示一个已打开的引擎句柄. 引擎自带输入缓冲与帧边界解析,
/// 适配器不做任何帧对齐假设, 也不探测帧边界.
pub trait DecodeEngine {
    /// 提交压缩字节
    ///
    /// 引擎把尽可能长的前缀拷入自己的输入缓冲, 未收下的末尾
    /// 字节数通过 [`FillOutcome::bytes_valid`] 报告, 由调用方
    /// 稍后重新提交.
    fn fill(&mut self, input: &[u8]) -> FillOutcome;

    /// 尝试从内部缓冲解码一帧, 写入 `output` (交错 S16)
    ///
    /// 解码出的采样数由随后的 [`Self::stream_info`] 描述
    /// (`frame_size × channels`).
    fn decode_frame(&mut self, output: &mut [i16], flags: DecoderFlags) -> EngineStatus;

    /// 当前流信息快照
    fn stream_info(&self) -> StreamInfo;

    /// 带外配置: AudioSpecificConfig (ASC) 或 StreamMuxConfig (SMC)
    fn config_raw(&mut self, config: &[u8]) -> EngineStatus;

    /// 设置运行时参数
    fn set_param(&mut self, param: EngineParam, value: i32) -> EngineStatus;
}

/// 引擎打开工厂
///
/// 对应引擎 API 的 `open(transport, nr_of_layers) → handle | null`.
/// 返回 `None` 表示打开失败, 适配器保持 Closed.
pub type EngineOpener = Box<dyn FnMut(TransportType, u32) -> Option<Box<dyn DecodeEngine>>>;

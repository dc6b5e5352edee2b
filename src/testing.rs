//! 测试辅助: 确定性的模拟解码引擎与 ADTS 夹具构造.
//!
//! [`AdtsMockEngine`] 按 FDK 的喂入语义模拟外部引擎: 有界的内部
//! 输入缓冲, `bytes_valid` 报告未收下的末尾字节数, 帧边界解析
//! 复用 [`crate::adts`] 模块. 解码输出是以帧序号为种子的确定性
//! 锯齿波, 便于整段喂入与任意切分喂入之间逐采样比对.

use crate::adts::{self, AdtsHeader};
use crate::engine::{DecodeEngine, EngineOpener, EngineParam, EngineStatus, FillOutcome};
use crate::flags::DecoderFlags;
use crate::stream_info::StreamInfo;

/// 模拟引擎内部输入缓冲的默认容量 (字节)
pub const DEFAULT_FEED_CAPACITY: usize = 512;

/// ADTS 模拟解码引擎
pub struct AdtsMockEngine {
    /// 内部输入缓冲 (有界, 对应 FDK 的内部环形缓冲)
    buffer: Vec<u8>,
    /// 内部缓冲容量
    capacity: usize,
    /// 当前流信息
    info: StreamInfo,
    /// 最小输出声道数 (set_param 配置, 0 表示未设置)
    min_output_channels: u32,
    /// 已解码帧计数 (确定性采样的种子)
    frames_decoded: u64,
    /// fill 的固定返回状态 (默认 Ok, 用于模拟 fill 失败)
    fill_status: EngineStatus,
}

impl AdtsMockEngine {
    /// 以指定内部缓冲容量创建
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::new(),
            capacity: capacity.max(AdtsHeader::MIN_HEADER_LEN),
            info: StreamInfo::default(),
            min_output_channels: 0,
            frames_decoded: 0,
            fill_status: EngineStatus::Ok,
        }
    }

    /// 引擎打开工厂, 对应 `open(transport, nr_of_layers) → handle`
    pub fn opener(capacity: usize) -> EngineOpener {
        Box::new(move |_transport, _layers| {
            Some(Box::new(AdtsMockEngine::new(capacity)) as Box<dyn DecodeEngine>)
        })
    }

    /// 产出 fill 恒定失败引擎的工厂
    pub fn opener_fill_error(status: EngineStatus) -> EngineOpener {
        Box::new(move |_transport, _layers| {
            let mut engine = AdtsMockEngine::new(DEFAULT_FEED_CAPACITY);
            engine.fill_status = status;
            Some(Box::new(engine) as Box<dyn DecodeEngine>)
        })
    }
}

/// 始终打开失败的工厂 (模拟引擎 open 返回 null)
pub fn failing_opener() -> EngineOpener {
    Box::new(|_transport, _layers| None)
}

impl DecodeEngine for AdtsMockEngine {
    fn fill(&mut self, input: &[u8]) -> FillOutcome {
        if !self.fill_status.is_ok() {
            return FillOutcome {
                bytes_valid: input.len(),
                status: self.fill_status,
            };
        }

        let space = self.capacity - self.buffer.len();
        let taken = input.len().min(space);
        self.buffer.extend_from_slice(&input[..taken]);
        FillOutcome {
            bytes_valid: input.len() - taken,
            status: EngineStatus::Ok,
        }
    }

    fn decode_frame(&mut self, output: &mut [i16], _flags: DecoderFlags) -> EngineStatus {
        if self.buffer.len() < AdtsHeader::MIN_HEADER_LEN {
            return EngineStatus::NotEnoughBits;
        }

        let header = match AdtsHeader::parse(&self.buffer) {
            Ok(header) => header,
            Err(_) => {
                // 模拟 FDK 的重同步: 丢弃坏字节, 推进到下一个候选同步字
                let skip = self
                    .buffer
                    .iter()
                    .skip(1)
                    .position(|&b| b == 0xFF)
                    .map(|pos| pos + 1)
                    .unwrap_or(self.buffer.len());
                self.buffer.drain(..skip);
                return EngineStatus::TransportSyncError;
            }
        };
        let Some(sample_rate) = header.sample_rate() else {
            return EngineStatus::UnsupportedFormat;
        };

        let frame_length = header.frame_length as usize;
        if self.buffer.len() < frame_length {
            return EngineStatus::NotEnoughBits;
        }

        // 声道配置为 0 时依赖带外配置 (config_raw)
        let coded_channels = if header.channel_configuration > 0 {
            u32::from(header.channel_configuration)
        } else {
            self.info.channels
        };
        if coded_channels == 0 {
            return EngineStatus::UnsupportedFormat;
        }
        let channels = coded_channels.max(self.min_output_channels);

        let frame_size = 1024u32;
        let needed = (frame_size * channels) as usize;
        if output.len() < needed {
            return EngineStatus::OutputBufferTooSmall;
        }

        // 确定性锯齿波, 以帧序号为种子
        for (i, sample) in output[..needed].iter_mut().enumerate() {
            *sample = ((self.frames_decoded as usize * 31 + i) % 4096) as i16 - 2048;
        }

        self.buffer.drain(..frame_length);
        self.frames_decoded += 1;
        self.info = StreamInfo {
            sample_rate,
            channels,
            frame_size,
            aac_sample_rate: sample_rate,
        };
        EngineStatus::Ok
    }

    fn stream_info(&self) -> StreamInfo {
        self.info
    }

    fn config_raw(&mut self, config: &[u8]) -> EngineStatus {
        // AudioSpecificConfig:
        // audioObjectType (5 bits) + samplingFrequencyIndex (4 bits) + channelConfiguration (4 bits)
        if config.len() < 2 {
            return EngineStatus::ParseError;
        }
        let freq_index = ((config[0] & 0x07) << 1) | (config[1] >> 7);
        let chan_config = (config[1] >> 3) & 0x0F;

        let Some(rate) = adts::sample_rate_from_index(freq_index) else {
            return EngineStatus::ParseError;
        };
        self.info.sample_rate = rate;
        self.info.aac_sample_rate = rate;
        if chan_config > 0 {
            self.info.channels = u32::from(chan_config).max(self.min_output_channels);
        }
        EngineStatus::Ok
    }

    fn set_param(&mut self, param: EngineParam, value: i32) -> EngineStatus {
        match param {
            EngineParam::MinOutputChannels => {
                if value < 0 {
                    return EngineStatus::SetParamFail;
                }
                self.min_output_channels = value as u32;
                EngineStatus::Ok
            }
            // 其余参数接受但无行为
            EngineParam::MaxOutputChannels | EngineParam::ConcealMethod => EngineStatus::Ok,
        }
    }
}

/// 构造一个合成 ADTS 帧 (AAC-LC, MPEG-4, 无 CRC), 载荷为循环递增字节
pub fn adts_frame(
    sampling_frequency_index: u8,
    channel_configuration: u8,
    payload_len: usize,
) -> Vec<u8> {
    let frame_length = (AdtsHeader::MIN_HEADER_LEN + payload_len) as u16;
    let mut frame = Vec::with_capacity(frame_length as usize);
    frame.push(0xFF);
    // 同步字低 4 位 + ID=0 (MPEG-4) + layer=0 + protection_absent=1
    frame.push(0xF1);
    frame.push(
        (1 << 6)
            | ((sampling_frequency_index & 0x0F) << 2)
            | ((channel_configuration >> 2) & 0x01),
    );
    frame.push(((channel_configuration & 0x03) << 6) | ((frame_length >> 11) as u8 & 0x03));
    frame.push((frame_length >> 3) as u8);
    frame.push((((frame_length & 0x07) as u8) << 5) | 0x1F);
    // 缓冲充满度低 6 位 (全 1, 可变码率) + 单数据块
    frame.push(0xFC);
    for i in 0..payload_len {
        frame.push((i % 251) as u8);
    }
    frame
}

//! ADTS 帧头位布局 (参考性工具模块).
//!
//! 活动解码路径不解析 ADTS 帧边界 —— 帧长计算是外部引擎的职责.
//! 本模块把固定位布局作为码流检查工具保留, 供测试引擎与离线探测
//! 使用. 13 位帧长与 11 位缓冲充满度都是跨字节拆分的字段, 按
//! `(hi << 11) | (mid << 3) | lo` 的方式重组.

use crate::error::{AdapterError, AdapterResult};

/// AAC 采样率索引表 (索引 13-15 保留)
pub const AAC_SAMPLE_RATES: [u32; 16] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350, 0, 0,
    0,
];

/// 按采样率索引查表
pub fn sample_rate_from_index(index: u8) -> Option<u32> {
    let rate = *AAC_SAMPLE_RATES.get(index as usize)?;
    (rate > 0).then_some(rate)
}

/// ADTS 帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    /// 是否为 MPEG-2 码流 (ID 位)
    pub mpeg2: bool,
    /// 层 (AAC 中恒为 0)
    pub layer: u8,
    /// 是否无 CRC 保护
    pub protection_absent: bool,
    /// profile (0=Main, 1=LC, 2=SSR, 3=LTP)
    pub profile: u8,
    /// 采样率索引 (4 位)
    pub sampling_frequency_index: u8,
    /// 声道配置 (跨字节拆分的 3 位字段)
    pub channel_configuration: u8,
    /// 帧总长含头 (13 位拆分字段)
    pub frame_length: u16,
    /// 缓冲充满度 (11 位拆分字段, 0x7FF 表示可变码率)
    pub buffer_fullness: u16,
    /// 本帧内原始数据块数量减一 (2 位)
    pub raw_data_blocks: u8,
}

impl AdtsHeader {
    /// 无 CRC 时的帧头长度 (字节)
    pub const MIN_HEADER_LEN: usize = 7;
    /// 带 CRC 时的帧头长度 (字节)
    pub const CRC_HEADER_LEN: usize = 9;

    /// 从字节流头部解析 ADTS 帧头
    pub fn parse(data: &[u8]) -> AdapterResult<Self> {
        if data.len() < Self::MIN_HEADER_LEN {
            return Err(AdapterError::InvalidData("ADTS 帧头不足 7 字节".into()));
        }

        // 12 位同步字: 0xFFF
        if data[0] != 0xFF || (data[1] & 0xF0) != 0xF0 {
            return Err(AdapterError::InvalidData(format!(
                "ADTS 同步字错误: {:02X} {:02X}",
                data[0], data[1]
            )));
        }

        let frame_length_hi = u16::from(data[3] & 0x03);
        let frame_length_mid = u16::from(data[4]);
        let frame_length_lo = u16::from(data[5] >> 5);
        let fullness_hi = u16::from(data[5] & 0x1F);
        let fullness_lo = u16::from(data[6] >> 2);

        Ok(Self {
            mpeg2: (data[1] & 0x08) != 0,
            layer: (data[1] >> 1) & 0x03,
            protection_absent: (data[1] & 0x01) != 0,
            profile: data[2] >> 6,
            sampling_frequency_index: (data[2] >> 2) & 0x0F,
            channel_configuration: ((data[2] & 0x01) << 2) | (data[3] >> 6),
            frame_length: (frame_length_hi << 11) | (frame_length_mid << 3) | frame_length_lo,
            buffer_fullness: (fullness_hi << 6) | fullness_lo,
            raw_data_blocks: data[6] & 0x03,
        })
    }

    /// 帧头长度 (带 CRC 时为 9 字节)
    pub fn header_len(&self) -> usize {
        if self.protection_absent {
            Self::MIN_HEADER_LEN
        } else {
            Self::CRC_HEADER_LEN
        }
    }

    /// 载荷长度 (帧总长减去帧头)
    pub fn payload_len(&self) -> usize {
        (self.frame_length as usize).saturating_sub(self.header_len())
    }

    /// 采样率 (Hz), 保留索引返回 None
    pub fn sample_rate(&self) -> Option<u32> {
        sample_rate_from_index(self.sampling_frequency_index)
    }
}

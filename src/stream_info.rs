//! 解码流信息快照.
//!
//! 对标 FDK 的 `CStreamInfo`, 描述当前解码输出流的参数.

/// 流信息快照
///
/// 每成功解码一帧后从引擎整体取回并整体替换, 不做字段级原地修改.
/// `Default` 为全零哨兵值, 表示尚未解码出任何帧.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamInfo {
    /// 输出采样率 (Hz, 含 SBR 等后处理的影响)
    pub sample_rate: u32,
    /// 输出声道数
    pub channels: u32,
    /// 每声道每帧采样数 (AAC-LC 通常为 1024)
    pub frame_size: u32,
    /// 码流自身的 AAC 采样率 (Hz, 不含后处理)
    pub aac_sample_rate: u32,
}

impl StreamInfo {
    /// 本帧解码输出的总采样数 (各声道合计, 交错排列)
    pub fn samples_per_frame(&self) -> usize {
        self.frame_size as usize * self.channels as usize
    }
}

//! PCM 下游输出 (Sink 路径).

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use log::warn;

use crate::stream_info::StreamInfo;

/// PCM 下游接收端
///
/// 解码循环对每个成功解码的帧同步调用一次. 实现方必须在返回前
/// 消费完数据: 输出缓冲在下一次 decode-frame 时就会被覆盖,
/// 适配器不做排队, 也不延长数据生命周期.
pub trait PcmSink {
    /// 接收一帧交错 S16 PCM
    fn write_pcm(&mut self, info: &StreamInfo, pcm: &[i16]);
}

/// 向 Vec 追加采样 (离线处理用)
impl PcmSink for Vec<i16> {
    fn write_pcm(&mut self, _info: &StreamInfo, pcm: &[i16]) {
        self.extend_from_slice(pcm);
    }
}

/// 共享累积缓冲 (测试中常用: 喂入后从外部取回全部采样)
impl PcmSink for Rc<RefCell<Vec<i16>>> {
    fn write_pcm(&mut self, _info: &StreamInfo, pcm: &[i16]) {
        self.borrow_mut().extend_from_slice(pcm);
    }
}

/// 把 PCM 按小端字节序写入任意 `io::Write`
pub struct WriteSink<W: Write> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    /// 包装一个写入端
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// 取回内部写入端
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> PcmSink for WriteSink<W> {
    fn write_pcm(&mut self, _info: &StreamInfo, pcm: &[i16]) {
        for &sample in pcm {
            if let Err(e) = self.inner.write_all(&sample.to_le_bytes()) {
                warn!("PCM sink 写入失败: {e}");
                return;
            }
        }
    }
}

//! # aacfeed
//!
//! 增量喂入式 AAC 解码适配器: 把任意切分的压缩字节流 (ADTS /
//! LOAS/LATM / 裸 MPEG-4) 喂入外部解码引擎, 并把解码出的 PCM 以
//! 同步回调或下游 Sink 的形式分发给消费者.
//!
//! 真正的 AAC 变换与熵解码由外部引擎承担 (见 [`engine::DecodeEngine`]),
//! 本 crate 负责的是喂入/解码循环的缓冲纪律: 部分消费的重新提交、
//! 帧序与采样率变化通知的次序、以及稳定的打开/关闭生命周期.
//!
//! # 使用方式
//!
//! ```
//! use aacfeed::AacStreamDecoder;
//! use aacfeed::testing::{self, AdtsMockEngine};
//!
//! // 生产环境把 opener 换成真实引擎绑定的工厂
//! let mut decoder = AacStreamDecoder::new(AdtsMockEngine::opener(512));
//! decoder.set_data_callback(|info, pcm| {
//!     println!("{} Hz, {} 采样", info.sample_rate, pcm.len());
//! });
//! decoder.begin().unwrap();
//!
//! // 压缩字节无需帧对齐, 任意切分喂入即可
//! let stream = testing::adts_frame(4, 2, 100);
//! assert_eq!(decoder.write(&stream), stream.len());
//! decoder.end();
//! ```

pub mod adts;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod flags;
pub mod sink;
pub mod stream_info;
pub mod testing;

// 重导出常用类型
pub use decoder::{AacStreamDecoder, DEFAULT_OUTPUT_CAPACITY, DataCallback, InfoCallback};
pub use engine::{
    DecodeEngine, EngineOpener, EngineParam, EngineStatus, FillOutcome, TransportType,
};
pub use error::{AdapterError, AdapterResult};
pub use flags::DecoderFlags;
pub use sink::{PcmSink, WriteSink};
pub use stream_info::StreamInfo;

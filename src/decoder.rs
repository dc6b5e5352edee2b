//! 增量喂入式 AAC 解码适配器.
//!
//! 核心是 [`AacStreamDecoder::write`] 的喂入/解码循环: 接受任意
//! 切分的压缩字节 (无需帧对齐), 在一次调用内榨干当前输入允许的
//! 所有完整帧, 并把引擎未收下的末尾剩余重新提交. 真正的半帧残余
//! 始终留在引擎自己的输入缓冲里, 适配器既不复制也不丢弃.
//!
//! 单线程同步模型: 所有操作在调用线程上运行到完成, 数据/信息
//! 回调在 `write` 内部同步地重入调用. 并发解码多路码流时每路
//! 各建一个实例, 引擎句柄与输出缓冲均为实例独占.

use log::{debug, error, warn};

use crate::engine::{DecodeEngine, EngineOpener, EngineParam, EngineStatus, TransportType};
use crate::error::{AdapterError, AdapterResult};
use crate::flags::DecoderFlags;
use crate::sink::PcmSink;
use crate::stream_info::StreamInfo;

/// 默认输出缓冲容量 (采样数, 各声道合计; 容得下一帧 1024 点立体声)
pub const DEFAULT_OUTPUT_CAPACITY: usize = 2048;

/// 数据回调: (流信息快照, 交错 S16 PCM)
///
/// 回调方必须在返回前同步消费数据, 切片在下一帧解码时失效.
pub type DataCallback = Box<dyn FnMut(&StreamInfo, &[i16])>;

/// 流信息回调: 配置 (采样率) 变化时触发
pub type InfoCallback = Box<dyn FnMut(&StreamInfo)>;

/// 结果分发器
///
/// 把解码出的一帧 PCM 连同流信息快照路由给数据回调或 Sink, 并
/// 独立检测采样率变化. 每帧只走一条输出路径, 注册了数据回调时
/// 回调优先; 变化通知只在 Sink 路径发出 (回调路径每次调用都拿到
/// 快照, 自行检查即可).
struct Dispatcher {
    /// 数据回调 (优先路径)
    data_cb: Option<DataCallback>,
    /// 配置变化通知回调
    info_cb: Option<InfoCallback>,
    /// 下游 Sink
    sink: Option<Box<dyn PcmSink>>,
    /// 上一帧的流信息快照 (全零哨兵表示尚无帧)
    last_info: StreamInfo,
}

impl Dispatcher {
    fn dispatch(&mut self, info: StreamInfo, pcm: &[i16]) {
        if pcm.is_empty() {
            return;
        }

        if let Some(cb) = self.data_cb.as_mut() {
            cb(&info, pcm);
        } else {
            // 变化通知必须先于新采样率下的第一帧数据被观察到
            if info.sample_rate != self.last_info.sample_rate {
                if let Some(cb) = self.info_cb.as_mut() {
                    cb(&info);
                }
            }
            if let Some(sink) = self.sink.as_mut() {
                sink.write_pcm(&info, pcm);
            }
        }

        // 无论走哪条路径都整体替换快照, 下次比较针对最新已知配置
        self.last_info = info;
    }
}

/// 增量式 AAC 解码适配器
///
/// 生命周期: **Closed** (初始) → [`begin`](Self::begin) → **Open**
/// → [`end`](Self::end) → **Closed**. 解码操作仅在 Open 状态有效,
/// Closed 状态下 [`write`](Self::write) 是报告零字节的空操作.
/// 引擎句柄与输出缓冲同生共灭: 两者都存在当且仅当 Open.
pub struct AacStreamDecoder {
    /// 引擎打开工厂
    opener: EngineOpener,
    /// 已打开的引擎句柄 (`Some` 当且仅当 Open)
    engine: Option<Box<dyn DecodeEngine>>,
    /// 输出缓冲 (Open 时 len == output_capacity, Closed 时为空)
    output: Vec<i16>,
    /// 输出缓冲容量 (采样数, 构造时固定)
    output_capacity: usize,
    /// 解码标志
    flags: DecoderFlags,
    /// 结果分发
    dispatcher: Dispatcher,
}

impl AacStreamDecoder {
    /// 以默认输出缓冲容量创建
    pub fn new(
        opener: impl FnMut(TransportType, u32) -> Option<Box<dyn DecodeEngine>> + 'static,
    ) -> Self {
        Self::with_output_capacity(opener, DEFAULT_OUTPUT_CAPACITY)
    }

    /// 以指定输出缓冲容量 (采样数) 创建
    pub fn with_output_capacity(
        opener: impl FnMut(TransportType, u32) -> Option<Box<dyn DecodeEngine>> + 'static,
        output_capacity: usize,
    ) -> Self {
        Self {
            opener: Box::new(opener),
            engine: None,
            output: Vec::new(),
            output_capacity: output_capacity.max(1),
            flags: DecoderFlags::empty(),
            dispatcher: Dispatcher {
                data_cb: None,
                info_cb: None,
                sink: None,
                last_info: StreamInfo::default(),
            },
        }
    }

    /// 创建并注册回调
    pub fn with_callbacks(
        opener: impl FnMut(TransportType, u32) -> Option<Box<dyn DecodeEngine>> + 'static,
        data_cb: DataCallback,
        info_cb: Option<InfoCallback>,
    ) -> Self {
        let mut decoder = Self::new(opener);
        decoder.dispatcher.data_cb = Some(data_cb);
        decoder.dispatcher.info_cb = info_cb;
        decoder
    }

    /// 注册数据回调 (注册后优先于 Sink 路径)
    pub fn set_data_callback(&mut self, cb: impl FnMut(&StreamInfo, &[i16]) + 'static) {
        self.dispatcher.data_cb = Some(Box::new(cb));
    }

    /// 注销数据回调 (FDK 风格接口里传 nullptr 的对应物)
    pub fn clear_data_callback(&mut self) {
        self.dispatcher.data_cb = None;
    }

    /// 注册流信息回调
    pub fn set_info_callback(&mut self, cb: impl FnMut(&StreamInfo) + 'static) {
        self.dispatcher.info_cb = Some(Box::new(cb));
    }

    /// 注册下游 Sink
    pub fn set_sink(&mut self, sink: impl PcmSink + 'static) {
        self.dispatcher.sink = Some(Box::new(sink));
    }

    /// 设置解码标志
    pub fn set_decoder_flags(&mut self, flags: DecoderFlags) {
        self.flags = flags;
    }

    /// 打开适配器 (ADTS 封装, 单层)
    pub fn begin(&mut self) -> AdapterResult<()> {
        self.begin_with(TransportType::Adts, 1)
    }

    /// 以指定传输格式与层数打开适配器
    ///
    /// 已打开时为幂等空操作: 不重开引擎, 不重新分配输出缓冲.
    /// 首次打开: 通过工厂打开引擎句柄, 配置最小输出声道数为 2
    /// (单声道内容上混为立体声), 再分配输出缓冲. 引擎打开失败时
    /// 记录日志并保持 Closed.
    pub fn begin_with(&mut self, transport: TransportType, nr_of_layers: u32) -> AdapterResult<()> {
        if self.engine.is_some() {
            debug!("适配器已打开, 忽略重复 begin");
            return Ok(());
        }

        let Some(mut engine) = (self.opener)(transport, nr_of_layers) else {
            error!("解码引擎打开失败: transport={transport:?} layers={nr_of_layers}");
            return Err(AdapterError::EngineOpen);
        };

        // 单声道内容统一上混为双声道输出
        let status = engine.set_param(EngineParam::MinOutputChannels, 2);
        if !status.is_ok() {
            warn!("设置最小输出声道数失败: {status}");
        }

        self.output = vec![0; self.output_capacity];
        // 新会话重置全零哨兵快照, 首帧配置视为一次变化
        self.dispatcher.last_info = StreamInfo::default();
        self.engine = Some(engine);
        debug!(
            "适配器已打开: transport={transport:?} layers={nr_of_layers} 输出容量={} 采样",
            self.output_capacity
        );
        Ok(())
    }

    /// 带外配置: 转发 ASC / SMC 二进制配置块给引擎
    ///
    /// 裸 MPEG-4 / Raw Packets 码流以及无带内 SMC 的 LATM 码流
    /// 必须在喂入数据前调用. 引擎状态原样透传, 不改变生命周期.
    pub fn configure(&mut self, config: &[u8]) -> AdapterResult<()> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(AdapterError::NotOpen);
        };
        let status = engine.config_raw(config);
        if status.is_ok() {
            Ok(())
        } else {
            Err(AdapterError::Engine(status))
        }
    }

    /// [`configure`](Self::configure) 的别名, 与 FDK 风格接口对齐
    pub fn set_raw_config(&mut self, config: &[u8]) -> AdapterResult<()> {
        self.configure(config)
    }

    /// 喂入压缩字节并榨干其中的所有完整帧
    ///
    /// 输入可以跨零帧、一帧或多帧, 无需帧对齐. 返回报告的已消费
    /// 字节数: 整段成功 (含以"当前帧数据不足"正常收尾) 时为
    /// `input.len()`, 出现致命错误时为 0. 一次调用内先成功解码的
    /// 帧在报告失败前仍会全部分发 —— 已产出的音频不会被丢弃.
    pub fn write(&mut self, input: &[u8]) -> usize {
        let Some(engine) = self.engine.as_mut() else {
            debug!("write 忽略: 适配器未打开");
            return 0;
        };
        if input.is_empty() {
            return 0;
        }

        // 首次提交整段输入
        let first = engine.fill(input);
        if !first.status.is_ok() {
            error!("引擎 fill 失败: {}", first.status);
            return 0;
        }
        // 尚未被引擎收下的末尾字节数
        let mut pending = first.bytes_valid;
        let mut failed = false;

        loop {
            let status = engine.decode_frame(&mut self.output, self.flags);
            let mut produced = false;
            match status {
                EngineStatus::Ok => {
                    let info = engine.stream_info();
                    let samples = info.samples_per_frame().min(self.output.len());
                    produced = samples > 0;
                    self.dispatcher.dispatch(info, &self.output[..samples]);
                }
                EngineStatus::NotEnoughBits if pending == 0 => {
                    // 真正的半帧残余留在引擎内部缓冲, 整段视为已消费
                    break;
                }
                EngineStatus::NotEnoughBits => {
                    // 还有未提交的末尾剩余, 先重新喂入再继续
                }
                status => {
                    error!("解码错误: {status}");
                    failed = true;
                    break;
                }
            }

            if pending > 0 {
                // 重新提交引擎未收下的末尾剩余 (偏移 = 总长 - 剩余)
                let offset = input.len() - pending;
                let refill = engine.fill(&input[offset..]);
                if !refill.status.is_ok() {
                    error!("引擎重新 fill 失败: {}", refill.status);
                    failed = true;
                    break;
                }
                if refill.bytes_valid >= pending && !produced {
                    // 引擎既不收数据也不出帧: 违反契约, 终止以防死循环
                    error!("引擎对剩余 {pending} 字节未取得任何进展, 终止本次喂入");
                    failed = true;
                    break;
                }
                pending = refill.bytes_valid;
            }
        }

        if failed { 0 } else { input.len() }
    }

    /// 当前流信息快照 (Closed 时为 None)
    pub fn audio_info(&self) -> Option<StreamInfo> {
        self.engine.as_ref().map(|engine| engine.stream_info())
    }

    /// 关闭适配器, 释放引擎句柄与输出缓冲
    ///
    /// 幂等: 重复调用与对从未打开的实例调用都安全.
    pub fn end(&mut self) {
        if self.engine.take().is_some() {
            debug!("适配器已关闭");
        }
        self.output = Vec::new();
    }

    /// 适配器是否处于 Open 状态
    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    /// 输出缓冲容量 (采样数)
    pub fn output_capacity(&self) -> usize {
        self.output_capacity
    }
}

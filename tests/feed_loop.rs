//! 喂入/解码循环集成测试.
//!
//! 覆盖增量喂入的核心纪律: 任意切分的输入、单次调用内榨干多帧、
//! 末尾剩余的重新提交、采样率变化通知次序, 以及部分成功语义.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::{BufMut, BytesMut};

use aacfeed::testing::{self, AdtsMockEngine};
use aacfeed::{AacStreamDecoder, EngineStatus, PcmSink, StreamInfo};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 把若干帧拼成一段连续码流
fn stream_of(frames: &[Vec<u8>]) -> BytesMut {
    let mut stream = BytesMut::new();
    for frame in frames {
        stream.put_slice(frame);
    }
    stream
}

/// 分发事件序列 (info 通知与 PCM 数据的相对次序)
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    /// info 回调: 新采样率
    Info(u32),
    /// 一帧 PCM: (采样率, 采样数)
    Pcm(u32, usize),
}

/// 把事件推入共享日志的 Sink
struct EventSink(Rc<RefCell<Vec<Event>>>);

impl PcmSink for EventSink {
    fn write_pcm(&mut self, info: &StreamInfo, pcm: &[i16]) {
        self.0
            .borrow_mut()
            .push(Event::Pcm(info.sample_rate, pcm.len()));
    }
}

/// 建一个 sink 路径的解码器, 返回 (解码器, 事件日志)
fn sink_decoder(engine_capacity: usize) -> (AacStreamDecoder, Rc<RefCell<Vec<Event>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut decoder = AacStreamDecoder::new(AdtsMockEngine::opener(engine_capacity));
    let log = Rc::clone(&events);
    decoder.set_info_callback(move |info| log.borrow_mut().push(Event::Info(info.sample_rate)));
    decoder.set_sink(EventSink(Rc::clone(&events)));
    (decoder, events)
}

/// 用数据回调跑完给定的输入切分, 返回每帧 (采样率, PCM)
fn decode_chunks(chunks: &[&[u8]]) -> Vec<(u32, Vec<i16>)> {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let frames_in_cb = Rc::clone(&frames);
    let mut decoder = AacStreamDecoder::new(AdtsMockEngine::opener(512));
    decoder.set_data_callback(move |info, pcm| {
        frames_in_cb
            .borrow_mut()
            .push((info.sample_rate, pcm.to_vec()));
    });
    decoder.begin().unwrap();
    for chunk in chunks {
        assert_eq!(decoder.write(chunk), chunk.len());
    }
    // 释放解码器以丢弃回调里持有的 Rc 克隆, 否则 try_unwrap 失败
    drop(decoder);
    Rc::try_unwrap(frames).unwrap().into_inner()
}

#[test]
fn test_n_个完整帧按序分发() {
    init_logs();
    let stream = stream_of(&[
        testing::adts_frame(4, 2, 40),
        testing::adts_frame(4, 2, 50),
        testing::adts_frame(4, 2, 60),
        testing::adts_frame(4, 2, 70),
        testing::adts_frame(4, 2, 80),
    ]);

    let firsts = Rc::new(RefCell::new(Vec::<i16>::new()));
    let firsts_in_cb = Rc::clone(&firsts);
    let mut decoder = AacStreamDecoder::new(AdtsMockEngine::opener(512));
    decoder.set_data_callback(move |info, pcm| {
        assert_eq!(info.sample_rate, 44100);
        firsts_in_cb.borrow_mut().push(pcm[0]);
    });
    decoder.begin().unwrap();

    assert_eq!(decoder.write(&stream), stream.len());

    // 模拟引擎以帧序号为种子: 首采样单调推进说明帧序未乱
    let firsts = firsts.borrow();
    assert_eq!(firsts.len(), 5);
    for (n, &first) in firsts.iter().enumerate() {
        assert_eq!(first, ((n * 31) % 4096) as i16 - 2048);
    }
}

#[test]
fn test_采样率变化通知次序() {
    init_logs();
    let (mut decoder, events) = sink_decoder(512);
    decoder.begin().unwrap();

    let stream = stream_of(&[
        testing::adts_frame(4, 2, 40), // 44100
        testing::adts_frame(4, 2, 40),
        testing::adts_frame(3, 2, 40), // 48000
        testing::adts_frame(3, 2, 40),
    ]);
    assert_eq!(decoder.write(&stream), stream.len());

    // 首帧配置视为一次变化; 变化通知严格先于新采样率的首帧数据;
    // 未变化的帧不再通知
    assert_eq!(
        *events.borrow(),
        vec![
            Event::Info(44100),
            Event::Pcm(44100, 2048),
            Event::Pcm(44100, 2048),
            Event::Info(48000),
            Event::Pcm(48000, 2048),
            Event::Pcm(48000, 2048),
        ]
    );
}

#[test]
fn test_任意偏移切分等价() {
    init_logs();
    let stream = stream_of(&[
        testing::adts_frame(4, 2, 50),
        testing::adts_frame(4, 2, 60),
        testing::adts_frame(3, 2, 70),
    ]);

    let whole = decode_chunks(&[&stream]);

    // 在既非帧边界也非头边界的偏移处切一刀
    let split_points = [3usize, 13, 57, stream.len() - 2];
    for split in split_points {
        let (a, b) = stream.split_at(split);
        let parts = decode_chunks(&[a, b]);
        assert_eq!(parts, whole, "切分点 {split} 处结果不等价");
    }
}

#[test]
fn test_尾部半帧跨调用保持() {
    init_logs();
    let frame_a = testing::adts_frame(4, 2, 64);
    let frame_b = testing::adts_frame(4, 2, 64);
    let split = frame_b.len() / 2;

    let count = Rc::new(RefCell::new(0usize));
    let count_in_cb = Rc::clone(&count);
    let mut decoder = AacStreamDecoder::new(AdtsMockEngine::opener(512));
    decoder.set_data_callback(move |_, _| *count_in_cb.borrow_mut() += 1);
    decoder.begin().unwrap();

    // 第一次喂入: 一个整帧 + 半个帧, 半帧残余留在引擎内部
    let mut first_chunk = frame_a.clone();
    first_chunk.extend_from_slice(&frame_b[..split]);
    assert_eq!(decoder.write(&first_chunk), first_chunk.len());
    assert_eq!(*count.borrow(), 1);

    // 第二次喂入剩余的半帧, 凑齐后立即出帧
    assert_eq!(decoder.write(&frame_b[split..]), frame_b.len() - split);
    assert_eq!(*count.borrow(), 2);
}

#[test]
fn test_小容量引擎多次重新喂入() {
    init_logs();
    // 引擎内部缓冲只有 100 字节, 单次 write 跨 4 个 64 字节帧,
    // 必须依靠末尾剩余的反复重新提交才能榨干
    let stream = stream_of(&[
        testing::adts_frame(4, 2, 57),
        testing::adts_frame(4, 2, 57),
        testing::adts_frame(4, 2, 57),
        testing::adts_frame(4, 2, 57),
    ]);
    assert_eq!(stream.len(), 256);

    let count = Rc::new(RefCell::new(0usize));
    let count_in_cb = Rc::clone(&count);
    let mut decoder = AacStreamDecoder::new(AdtsMockEngine::opener(100));
    decoder.set_data_callback(move |_, _| *count_in_cb.borrow_mut() += 1);
    decoder.begin().unwrap();

    assert_eq!(decoder.write(&stream), stream.len());
    assert_eq!(*count.borrow(), 4);
}

#[test]
fn test_开头垃圾字节_write_失败但适配器可用() {
    init_logs();
    let count = Rc::new(RefCell::new(0usize));
    let count_in_cb = Rc::clone(&count);
    let mut decoder = AacStreamDecoder::new(AdtsMockEngine::opener(512));
    decoder.set_data_callback(move |_, _| *count_in_cb.borrow_mut() += 1);
    decoder.begin().unwrap();

    assert_eq!(decoder.write(&[0x00; 16]), 0);
    assert_eq!(*count.borrow(), 0);
    assert!(decoder.is_open());

    // 后续喂入正常工作
    let frame = testing::adts_frame(4, 2, 64);
    assert_eq!(decoder.write(&frame), frame.len());
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn test_部分成功后致命错误仍分发已解码帧() {
    init_logs();
    let mut chunk = testing::adts_frame(4, 2, 64);
    chunk.extend_from_slice(&[0x00; 16]); // 帧后跟垃圾

    let count = Rc::new(RefCell::new(0usize));
    let count_in_cb = Rc::clone(&count);
    let mut decoder = AacStreamDecoder::new(AdtsMockEngine::opener(512));
    decoder.set_data_callback(move |_, _| *count_in_cb.borrow_mut() += 1);
    decoder.begin().unwrap();

    // 整体报告失败, 但失败前成功解码的帧已经分发
    assert_eq!(decoder.write(&chunk), 0);
    assert_eq!(*count.borrow(), 1);
    assert!(decoder.is_open());
}

#[test]
fn test_首次_fill_失败返回零() {
    init_logs();
    let count = Rc::new(RefCell::new(0usize));
    let count_in_cb = Rc::clone(&count);
    let mut decoder = AacStreamDecoder::new(AdtsMockEngine::opener_fill_error(
        EngineStatus::TransportSyncError,
    ));
    decoder.set_data_callback(move |_, _| *count_in_cb.borrow_mut() += 1);
    decoder.begin().unwrap();

    let frame = testing::adts_frame(4, 2, 64);
    assert_eq!(decoder.write(&frame), 0);
    assert_eq!(*count.borrow(), 0);
    assert!(decoder.is_open());
}

#[test]
fn test_单声道内容上混为立体声() {
    init_logs();
    // begin 时配置了最小输出声道数 2, 单声道帧应输出双声道
    let infos = Rc::new(RefCell::new(Vec::<StreamInfo>::new()));
    let infos_in_cb = Rc::clone(&infos);
    let mut decoder = AacStreamDecoder::new(AdtsMockEngine::opener(512));
    decoder.set_data_callback(move |info, pcm| {
        assert_eq!(pcm.len(), info.samples_per_frame());
        infos_in_cb.borrow_mut().push(*info);
    });
    decoder.begin().unwrap();

    let frame = testing::adts_frame(4, 1, 64);
    assert_eq!(decoder.write(&frame), frame.len());
    let infos = infos.borrow();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].channels, 2);
    assert_eq!(infos[0].samples_per_frame(), 2048);
}

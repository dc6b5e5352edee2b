//! 解码器行为标志位.

use bitflags::bitflags;

bitflags! {
    /// 解码标志位掩码
    ///
    /// 由消费者在解码前设置, 对解码循环只读, 每次 decode-frame
    /// 调用原样传给引擎. 取值与 FDK 的 `AACDEC_*` 标志一致.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DecoderFlags: u32 {
        /// 错误隐藏: 输出隐藏处理后的音频而非报错
        const CONCEAL = 1 << 0;
        /// 刷新: 丢弃输入, 输出滤波器组中延迟的音频
        const FLUSH   = 1 << 1;
        /// 输入不连续: 引擎按需重新同步内部状态
        const INTR    = 1 << 2;
        /// 清空所有延迟线与历史缓冲
        const CLRHIST = 1 << 3;
    }
}

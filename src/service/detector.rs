//! 告警数据块检测
//!
//! 从摄像头告警流的数据块中识别检测类型

use crate::constants::Detection;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

/// 数据块检测错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkDetectorError {
    /// 未知的事件类型
    #[error("未知的告警事件类型: {0}")]
    UnknownEventType(String),
}

fn event_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<eventType>\s*([^<]+?)\s*</eventType>").expect("eventType 正则表达式无效")
    })
}

fn event_state_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<eventState>\s*([^<]+?)\s*</eventState>").expect("eventState 正则表达式无效")
    })
}

/// 告警记录结束标记
const RECORD_END: &[u8] = b"</EventNotificationAlert>";

/// 缓冲区上限，超过后丢弃未结束的数据
const MAX_PENDING_BYTES: usize = 64 * 1024;

/// 告警流分帧器
///
/// 网络数据块与告警记录没有对应关系：一条记录可能跨越多个数据块，
/// 一个数据块也可能包含多条记录。分帧器跨数据块缓存字节，
/// 只在记录完整后才按 UTF-8 解码输出。
#[derive(Debug, Default)]
pub struct AlertFramer {
    buffer: Vec<u8>,
}

impl AlertFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加数据块，返回其中已完整的告警记录
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(pos) = find(&self.buffer, RECORD_END) {
            let record: Vec<u8> = self.buffer.drain(..pos + RECORD_END.len()).collect();
            records.push(String::from_utf8_lossy(&record).into_owned());
        }

        if self.buffer.len() > MAX_PENDING_BYTES {
            warn!("告警流数据过长且未结束，丢弃 {} 字节", self.buffer.len());
            self.buffer.clear();
        }

        records
    }

    /// 尚未组成完整记录的字节数
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// 告警数据块检测器
pub struct ChunkDetector;

impl ChunkDetector {
    /// 检测数据块中的告警类型
    ///
    /// # 返回
    /// * `Ok(Some(Detection))` - 检测到处于激活状态的告警
    /// * `Ok(None)` - 心跳、非激活事件或不完整的数据块
    /// * `Err(ChunkDetectorError)` - 激活事件的类型无法识别
    pub fn detect_chunk(chunk: &str) -> Result<Option<Detection>, ChunkDetectorError> {
        let Some(event_type) = event_type_regex()
            .captures(chunk)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            return Ok(None);
        };

        let active = event_state_regex()
            .captures(chunk)
            .and_then(|c| c.get(1))
            .is_none_or(|m| m.as_str().eq_ignore_ascii_case("active"));
        if !active {
            return Ok(None);
        }

        // 视频丢失等与侦测无关的事件
        if event_type.eq_ignore_ascii_case("videoloss") {
            return Ok(None);
        }

        Detection::from_event_type(event_type)
            .map(Some)
            .ok_or_else(|| ChunkDetectorError::UnknownEventType(event_type.to_string()))
    }
}

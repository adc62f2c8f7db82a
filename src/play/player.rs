//! 跟踪回放器
//!
//! 按虚拟时钟回放已解析的包事件序列，支持变速、暂停与定位。
//! 调用方以固定节拍调用 [`TracePlayer::advance`]，回放器按
//! 倍速推进时钟并吐出到期事件。

use std::path::Path;
use std::time::Duration;

use crate::trace::{compute_stats, parse_file, parse_str, PacketEvent, TraceParseError, TraceStats};
use tracing::info;

/// 预设回放倍速
pub const SPEEDS: [f64; 8] = [0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 50.0, 100.0];

/// 倍速下限/上限
const MIN_SPEED: f64 = 0.1;
const MAX_SPEED: f64 = 100.0;

/// 回放状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
    Paused,
    Finished,
}

#[derive(Debug)]
pub struct TracePlayer {
    events: Vec<PacketEvent>,
    /// 下一个待吐出事件的下标
    cursor: usize,
    /// 虚拟时钟（纳秒，仿真时间轴）
    clock_ns: u64,
    start_ns: u64,
    end_ns: u64,
    speed: f64,
    state: PlayerState,
    stats: TraceStats,
}

impl TracePlayer {
    /// 从已排序的事件序列构建回放器，空序列报错
    pub fn load_events(events: Vec<PacketEvent>) -> Result<Self, TraceParseError> {
        let (Some(first), Some(last)) = (events.first(), events.last()) else {
            return Err(TraceParseError::Empty);
        };
        let start_ns = first.time_ns;
        let end_ns = last.time_ns;
        let stats = compute_stats(&events);
        Ok(TracePlayer {
            events,
            cursor: 0,
            clock_ns: start_ns,
            start_ns,
            end_ns,
            speed: 1.0,
            state: PlayerState::Idle,
            stats,
        })
    }

    pub fn load_str(text: &str) -> Result<Self, TraceParseError> {
        Self::load_events(parse_str(text)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, TraceParseError> {
        Self::load_events(parse_file(path)?)
    }

    pub fn play(&mut self) {
        if self.state == PlayerState::Finished {
            return;
        }
        if self.state == PlayerState::Idle {
            info!("▶️ 开始回放, 事件数: {}, 倍速: {}x", self.events.len(), self.speed);
        }
        self.state = PlayerState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
    }

    /// 停止并回到起点
    pub fn stop(&mut self) {
        self.cursor = 0;
        self.clock_ns = self.start_ns;
        self.state = PlayerState::Idle;
    }

    /// 推进虚拟时钟，吐出到期事件
    ///
    /// 真实流逝 `elapsed` 按当前倍速换算为仿真时间。
    pub fn advance(&mut self, elapsed: Duration, mut on_event: impl FnMut(&PacketEvent)) {
        if self.state != PlayerState::Playing {
            return;
        }
        let step_ns = (elapsed.as_nanos() as f64 * self.speed).round() as u64;
        self.clock_ns = self.clock_ns.saturating_add(step_ns).min(self.end_ns);
        while self.cursor < self.events.len() && self.events[self.cursor].time_ns <= self.clock_ns {
            on_event(&self.events[self.cursor]);
            self.cursor += 1;
        }
        if self.cursor == self.events.len() {
            self.state = PlayerState::Finished;
            self.clock_ns = self.end_ns;
            info!("✅ 回放完成, 时长: {:.3}s", self.stats.duration_s());
        }
    }

    /// 定位到指定仿真时刻（纳秒），自动夹取到有效区间
    ///
    /// 定位不改变播放/暂停状态；从 Finished 往回定位则转为 Paused。
    pub fn seek(&mut self, time_ns: u64) {
        let target = time_ns.clamp(self.start_ns, self.end_ns);
        self.clock_ns = target;
        self.cursor = self.events.partition_point(|e| e.time_ns <= target);
        if self.state == PlayerState::Finished && self.cursor < self.events.len() {
            self.state = PlayerState::Paused;
        }
        if self.state == PlayerState::Idle {
            self.state = PlayerState::Paused;
        }
    }

    /// 按进度比例定位，`progress` 取 0.0..=1.0
    pub fn seek_progress(&mut self, progress: f64) {
        let progress = progress.clamp(0.0, 1.0);
        let span = (self.end_ns - self.start_ns) as f64;
        self.seek(self.start_ns + (span * progress).round() as u64);
    }

    /// 设置倍速，夹取到 0.1x..=100x
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// 当前进度 0.0..=1.0
    pub fn progress(&self) -> f64 {
        if self.end_ns == self.start_ns {
            return 1.0;
        }
        (self.clock_ns - self.start_ns) as f64 / (self.end_ns - self.start_ns) as f64
    }

    pub fn current_time_ns(&self) -> u64 {
        self.clock_ns
    }

    pub fn duration_ns(&self) -> u64 {
        self.end_ns - self.start_ns
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn stats(&self) -> &TraceStats {
        &self.stats
    }

    /// 时间窗口 `[from_ns, to_ns]` 内的事件切片
    pub fn events_in_range(&self, from_ns: u64, to_ns: u64) -> &[PacketEvent] {
        let lo = self.events.partition_point(|e| e.time_ns < from_ns);
        let hi = self.events.partition_point(|e| e.time_ns <= to_ns);
        &self.events[lo..hi]
    }
}

//! 跟踪事件汇总统计

use serde::{Deserialize, Serialize};

use super::event::{PacketEvent, TraceEventKind};

/// 事件序列的汇总计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    pub total_events: usize,
    pub packets_tx: usize,
    pub packets_rx: usize,
    pub packets_dropped: usize,
    pub bytes_tx: u64,
    pub bytes_rx: u64,
    /// 首末事件间隔（纳秒）
    pub duration_ns: u64,
}

impl TraceStats {
    pub fn duration_s(&self) -> f64 {
        self.duration_ns as f64 / 1e9
    }
}

/// 统计一组已按时间排序的事件
pub fn compute_stats(events: &[PacketEvent]) -> TraceStats {
    let mut stats = TraceStats {
        total_events: events.len(),
        ..TraceStats::default()
    };
    for event in events {
        match event.kind {
            TraceEventKind::Tx => {
                stats.packets_tx += 1;
                stats.bytes_tx += u64::from(event.size);
            }
            TraceEventKind::Rx => {
                stats.packets_rx += 1;
                stats.bytes_rx += u64::from(event.size);
            }
            TraceEventKind::Drop => stats.packets_dropped += 1,
            TraceEventKind::Enqueue | TraceEventKind::Dequeue => {}
        }
    }
    if let (Some(first), Some(last)) = (events.first(), events.last()) {
        stats.duration_ns = last.time_ns.saturating_sub(first.time_ns);
    }
    stats
}

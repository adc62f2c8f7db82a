//! 跟踪解析与统计
//!
//! 将 ns-3 仿真输出（PKT 结构化行 / ASCII 跟踪 / 控制台统计段）
//! 解析为事件序列与统计结构。

mod event;
mod flow_stats;
mod parser;
mod stats;

pub use event::{PacketEvent, TraceEventKind};
pub use flow_stats::{parse_console_stats, FlowStats, SimulationSummary};
pub use parser::{parse_file, parse_line, parse_str, TraceParseError};
pub use stats::{compute_stats, TraceStats};

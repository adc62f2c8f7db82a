//! 跟踪文件解析
//!
//! 支持两种行格式：
//! - 生成脚本回调输出的 `PKT|...` 结构化行（字段严格校验）
//! - ns-3 原生 ASCII 跟踪行（`+ - r d` 前缀）
//!
//! 其余行（调试输出、统计段落）静默跳过。

use std::path::{Path, PathBuf};

use super::event::{PacketEvent, TraceEventKind};

/// PKT 行的固定字段数
const PKT_FIELDS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum TraceParseError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected {expected} '|' fields, found {found}")]
    WrongFieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: bad integer in field '{field}'")]
    ParseInt {
        line: usize,
        field: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("line {line}: unknown event type '{event}'")]
    UnknownEvent { line: usize, event: String },

    #[error("line {line}: bad timestamp '{value}'")]
    ParseTime { line: usize, value: String },

    #[error("line {line}: malformed device path '{path}'")]
    BadDevicePath { line: usize, path: String },

    #[error("trace contains no packet events")]
    Empty,
}

/// 解析单行，无法识别的行返回 `Ok(None)`
pub fn parse_line(line: &str, lineno: usize) -> Result<Option<PacketEvent>, TraceParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.starts_with("PKT|") {
        return parse_pkt_line(line, lineno).map(Some);
    }
    match line.as_bytes()[0] {
        b'+' | b'-' | b'r' | b'd' => parse_ascii_line(line, lineno),
        _ => Ok(None),
    }
}

/// 解析整段文本，按时间稳定排序
pub fn parse_str(text: &str) -> Result<Vec<PacketEvent>, TraceParseError> {
    let mut events = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if let Some(event) = parse_line(line, idx + 1)? {
            events.push(event);
        }
    }
    events.sort_by_key(|e| e.time_ns);
    Ok(events)
}

pub fn parse_file(path: &Path) -> Result<Vec<PacketEvent>, TraceParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| TraceParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&text)
}

/// `PKT|time_ns|EVENT|node|device|size|src|dst|link_id|protocol`
fn parse_pkt_line(line: &str, lineno: usize) -> Result<PacketEvent, TraceParseError> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != PKT_FIELDS {
        return Err(TraceParseError::WrongFieldCount {
            line: lineno,
            expected: PKT_FIELDS,
            found: fields.len(),
        });
    }
    let kind = match fields[2] {
        "TX" => TraceEventKind::Tx,
        "RX" => TraceEventKind::Rx,
        "ENQ" => TraceEventKind::Enqueue,
        "DEQ" => TraceEventKind::Dequeue,
        "DROP" => TraceEventKind::Drop,
        other => {
            return Err(TraceParseError::UnknownEvent {
                line: lineno,
                event: other.to_string(),
            });
        }
    };
    Ok(PacketEvent {
        time_ns: parse_u64(fields[1], "time_ns", lineno)?,
        kind,
        node: parse_u64(fields[3], "node", lineno)?,
        device: parse_u32(fields[4], "device", lineno)?,
        size: parse_u32(fields[5], "size", lineno)?,
        source: parse_optional_node(fields[6], "src_node", lineno)?,
        target: parse_optional_node(fields[7], "dst_node", lineno)?,
        link_id: fields[8].to_string(),
        protocol: fields[9].to_string(),
    })
}

/// `{+,-,r,d} time /NodeList/n/DeviceList/d/... type [size]`
fn parse_ascii_line(line: &str, lineno: usize) -> Result<Option<PacketEvent>, TraceParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Ok(None);
    }
    let kind = match fields[0] {
        "+" => TraceEventKind::Enqueue,
        "-" => TraceEventKind::Dequeue,
        "r" => TraceEventKind::Rx,
        "d" => TraceEventKind::Drop,
        _ => return Ok(None),
    };
    let time_ns = parse_time_ns(fields[1]).ok_or_else(|| TraceParseError::ParseTime {
        line: lineno,
        value: fields[1].to_string(),
    })?;
    let (node, device) =
        parse_device_path(fields[2]).ok_or_else(|| TraceParseError::BadDevicePath {
            line: lineno,
            path: fields[2].to_string(),
        })?;
    let protocol = fields.get(3).copied().unwrap_or("").to_string();
    let size = fields
        .get(4)
        .and_then(|s| s.trim_start_matches("length:").parse().ok())
        .unwrap_or(0);
    Ok(Some(PacketEvent {
        time_ns,
        kind,
        node,
        device,
        size,
        source: None,
        target: None,
        link_id: String::new(),
        protocol,
    }))
}

/// 时间戳转纳秒。支持 `ns`/`us`/`ms`/`s` 后缀，裸数字按秒处理。
fn parse_time_ns(value: &str) -> Option<u64> {
    let (digits, scale) = if let Some(v) = value.strip_suffix("ns") {
        (v, 1.0)
    } else if let Some(v) = value.strip_suffix("us") {
        (v, 1e3)
    } else if let Some(v) = value.strip_suffix("ms") {
        (v, 1e6)
    } else if let Some(v) = value.strip_suffix('s') {
        (v, 1e9)
    } else {
        (value, 1e9)
    };
    let number: f64 = digits.trim_start_matches('+').parse().ok()?;
    if number < 0.0 {
        return None;
    }
    Some((number * scale).round() as u64)
}

/// `/NodeList/3/DeviceList/1/...` -> (3, 1)
fn parse_device_path(path: &str) -> Option<(u64, u32)> {
    let mut parts = path.split('/');
    let mut node = None;
    let mut device = None;
    while let Some(part) = parts.next() {
        match part {
            "NodeList" => node = parts.next()?.parse().ok(),
            "DeviceList" => device = parts.next()?.parse().ok(),
            _ => {}
        }
    }
    Some((node?, device.unwrap_or(0)))
}

fn parse_u64(value: &str, field: &'static str, line: usize) -> Result<u64, TraceParseError> {
    value
        .parse()
        .map_err(|source| TraceParseError::ParseInt { line, field, source })
}

fn parse_u32(value: &str, field: &'static str, line: usize) -> Result<u32, TraceParseError> {
    value
        .parse()
        .map_err(|source| TraceParseError::ParseInt { line, field, source })
}

/// `-1` 表示未知端点
fn parse_optional_node(
    value: &str,
    field: &'static str,
    line: usize,
) -> Result<Option<u64>, TraceParseError> {
    if value == "-1" {
        return Ok(None);
    }
    parse_u64(value, field, line).map(Some)
}

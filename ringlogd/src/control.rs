//! 控制命令解析
//!
//! 控制命令和普通记录走同一条数据流，格式：
//! ```text
//! RINGLOG_SEEKTO:<record_index>,<intra_offset>\n
//! ```
//! 命令本身不写入日志。

/// 控制命令前缀
pub const CONTROL_PREFIX: &[u8] = b"RINGLOG_SEEKTO:";

/// 定位请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekRequest {
    pub record_index: usize,
    pub intra_offset: usize,
}

/// 解析一条完整记录
///
/// 不是控制命令时返回 None；带前缀但参数非法时返回 `Some(Err(..))`。
pub fn parse_control(record: &[u8]) -> Option<Result<SeekRequest, String>> {
    let args = record.strip_prefix(CONTROL_PREFIX)?;
    Some(parse_args(args))
}

fn parse_args(args: &[u8]) -> Result<SeekRequest, String> {
    let text = std::str::from_utf8(args).map_err(|_| "arguments are not UTF-8".to_string())?;
    let text = text.trim_end_matches(['\r', '\n']);

    let (index, offset) = text
        .split_once(',')
        .ok_or_else(|| format!("expected <index>,<offset>, got {:?}", text))?;

    let record_index = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid record index {:?}", index))?;
    let intra_offset = offset
        .trim()
        .parse()
        .map_err(|_| format!("invalid intra offset {:?}", offset))?;

    Ok(SeekRequest {
        record_index,
        intra_offset,
    })
}

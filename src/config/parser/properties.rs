//! properties 格式解析器
//!
//! 行格式 `key=value` / `key:value` / `key value`，支持注释、续行和转义

use crate::config::Snapshot;
use crate::error::FormatError;
use serde_json::Value;
use std::str::Chars;

/// 一个逻辑行及其起始行号
struct LogicalLine {
    number: usize,
    text: String,
}

/// 解析 properties 内容
///
/// 优先按 UTF-8 解码，非法时退回 Latin-1。所有值都作为字符串保存。
///
/// # 参数
/// * `bytes` - 原始内容
///
/// # 返回
/// * `Result<Snapshot, FormatError>` - 扁平键值映射或格式错误
pub fn parse(bytes: &[u8]) -> Result<Snapshot, FormatError> {
    let content = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    };

    let mut map = Snapshot::new();
    for line in logical_lines(&content) {
        let (key, value) = split_key_value(&line.text);
        let key = unescape(key, line.number)?;
        let value = unescape(value, line.number)?;
        map.insert(key, Value::String(value));
    }
    Ok(map)
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\x0c'
}

/// 行尾反斜杠个数为奇数时表示续行
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// 把自然行合并为逻辑行，跳过空行和注释行
fn logical_lines(content: &str) -> Vec<LogicalLine> {
    let natural = content.split('\n').flat_map(|segment| {
        let segment = segment.strip_suffix('\r').unwrap_or(segment);
        segment.split('\r')
    });

    let mut lines = Vec::new();
    let mut pending: Option<LogicalLine> = None;

    for (index, raw) in natural.enumerate() {
        let stripped = raw.trim_start_matches(is_blank);

        let mut current = match pending.take() {
            Some(mut line) => {
                line.text.push_str(stripped);
                line
            }
            None => {
                if stripped.is_empty() || stripped.starts_with('#') || stripped.starts_with('!') {
                    continue;
                }
                LogicalLine {
                    number: index + 1,
                    text: stripped.to_string(),
                }
            }
        };

        if ends_with_continuation(&current.text) {
            current.text.pop();
            pending = Some(current);
        } else {
            lines.push(current);
        }
    }

    if let Some(line) = pending {
        lines.push(line);
    }
    lines
}

/// 按第一个未转义的分隔符拆分键和值
fn split_key_value(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut has_separator = false;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                value_start = i + 1;
                has_separator = true;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                value_start = i + 1;
                break;
            }
            _ => {}
        }
    }

    let mut rest = line[value_start..].trim_start_matches(is_blank);
    if !has_separator {
        if let Some(after) = rest.strip_prefix(['=', ':']) {
            rest = after.trim_start_matches(is_blank);
        }
    }

    (&line[..key_end], rest)
}

/// 处理转义序列
fn unescape(raw: &str, line: usize) -> Result<String, FormatError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => out.push(decode_unicode(&mut chars, line)?),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// 读取 `\u` 之后的四位十六进制码元
fn read_unit(chars: &mut Chars<'_>, line: usize) -> Result<u16, FormatError> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FormatError::Properties {
            line,
            message: format!("无效的 \\u 转义: \\u{hex}"),
        });
    }
    u16::from_str_radix(&hex, 16).map_err(|e| FormatError::Properties {
        line,
        message: format!("无效的 \\u 转义: \\u{hex} ({e})"),
    })
}

/// 解码 `\uXXXX`，高位代理项必须紧跟 `\uXXXX` 形式的低位代理项
fn decode_unicode(chars: &mut Chars<'_>, line: usize) -> Result<char, FormatError> {
    let first = read_unit(chars, line)?;
    let mut units = vec![first];

    if (0xD800..=0xDBFF).contains(&first) && chars.as_str().starts_with("\\u") {
        chars.nth(1);
        units.push(read_unit(chars, line)?);
    }

    let mut decoded = char::decode_utf16(units.iter().copied());
    match (decoded.next(), decoded.next()) {
        (Some(Ok(c)), None) => Ok(c),
        _ => Err(FormatError::Properties {
            line,
            message: format!("不成对的 UTF-16 代理项: \\u{first:04X}"),
        }),
    }
}

/// 把快照写成 properties 文本，每行一个键，按键排序
///
/// 字符串值原样写出，其他值写成 JSON 文本。输出可被 [`parse`] 读回。
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for (key, value) in snapshot {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(&text, false));
        out.push('\n');
    }
    out
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

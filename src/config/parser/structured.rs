//! JSON / YAML 解析器
//!
//! 把结构化文档展开为以 `.` 连接的扁平键，每个终端值对应一个条目

use crate::config::Snapshot;
use crate::error::FormatError;
use serde_json::{Map, Value};

/// 键路径分隔符
const KEY_SEPARATOR: char = '.';

/// 解析 JSON 文档
pub fn parse_json(bytes: &[u8]) -> Result<Snapshot, FormatError> {
    let document: Value = serde_json::from_slice(bytes)?;
    flatten_document(document)
}

/// 解析 YAML 文档
///
/// 空文档视为空映射
pub fn parse_yaml(bytes: &[u8]) -> Result<Snapshot, FormatError> {
    if is_empty_yaml(bytes) {
        return Ok(Snapshot::new());
    }
    let document: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
    if document.is_null() {
        return Ok(Snapshot::new());
    }
    flatten_document(yaml_to_json(document)?)
}

/// 只有空行、注释或文档标记的 YAML
fn is_empty_yaml(bytes: &[u8]) -> bool {
    String::from_utf8_lossy(bytes).lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn flatten_document(document: Value) -> Result<Snapshot, FormatError> {
    match document {
        Value::Object(root) => {
            let mut map = Snapshot::new();
            flatten_into(&mut map, None, root);
            Ok(map)
        }
        other => Err(FormatError::RootNotMapping(kind_of(&other))),
    }
}

fn flatten_into(map: &mut Snapshot, prefix: Option<&str>, object: Map<String, Value>) {
    for (key, value) in object {
        let full_key = match prefix {
            Some(prefix) => format!("{prefix}{KEY_SEPARATOR}{key}"),
            None => key,
        };
        match value {
            Value::Object(nested) => flatten_into(map, Some(&full_key), nested),
            terminal => {
                map.insert(full_key, terminal);
            }
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 把 YAML 值转换为 JSON 值，保留标量类型
fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, FormatError> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                // NaN / inf 无法用 JSON 数字表示
                let f = n.as_f64().unwrap_or(f64::NAN);
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(n.to_string()))
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, FormatError> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(FormatError::UnsupportedKey(format!("{other:?}"))),
    }
}

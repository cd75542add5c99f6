//! 实体校验
//!
//! 所有规则都会执行，违规信息全部收集后统一返回

use serde::Serialize;
use std::fmt;

/// 一次校验的全部违规信息，按自然顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ViolationSet(Vec<String>);

impl ViolationSet {
    /// 是否没有违规
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 违规数量
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 违规信息迭代器
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// 违规信息切片
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for ViolationSet {
    fn from(mut messages: Vec<String>) -> Self {
        messages.sort();
        Self(messages)
    }
}

impl fmt::Display for ViolationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// 违规信息收集器
#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<String>,
}

impl Validator {
    /// 创建收集器
    pub fn new() -> Self {
        Self::default()
    }

    /// 条件不满足时记录 `"<field> <message>"`
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.violations.push(format!("{field} {message}"));
        }
        self
    }

    /// 字符串不能为空白
    pub fn not_blank(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "may not be empty")
    }

    /// 字符串长度上限
    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        let message = format!("length must be at most {max}");
        self.check(value.chars().count() <= max, field, &message)
    }

    /// 集合不能为空
    pub fn non_empty<T>(&mut self, field: &str, items: &[T]) -> &mut Self {
        self.check(!items.is_empty(), field, "may not be empty")
    }

    /// 数值必须在闭区间内
    pub fn in_range<N>(&mut self, field: &str, value: N, min: N, max: N) -> &mut Self
    where
        N: PartialOrd + fmt::Display,
    {
        let message = format!("must be between {min} and {max}");
        self.check(value >= min && value <= max, field, &message)
    }

    /// 结束收集
    pub fn finish(self) -> ViolationSet {
        ViolationSet::from(self.violations)
    }
}

/// 可校验的类型
pub trait Validate {
    /// 把所有规则的结果写入收集器，不在第一个失败处停止
    fn validate(&self, _validator: &mut Validator) {}
}

/// 校验一个值
pub fn validate<T: Validate + ?Sized>(value: &T) -> ViolationSet {
    let mut validator = Validator::new();
    value.validate(&mut validator);
    validator.finish()
}

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 试卷类型：题目卷 / 答案卷
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperType {
    Question,
    Answer,
}

impl PaperType {
    pub fn as_str(self) -> &'static str {
        match self {
            PaperType::Question => "question",
            PaperType::Answer => "answer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "question" | "q" => Some(PaperType::Question),
            "answer" | "a" => Some(PaperType::Answer),
            _ => None,
        }
    }
}

impl fmt::Display for PaperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 可购买 / 下载的章节
///
/// 字段与目录表的行一一对应；一次会话中取回后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub standard: String,
    pub subject: String,
    pub paper_type: PaperType,
    /// 价格（主货币单位，0 表示免费）
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
    /// 源 PDF 地址（URL 或本地路径）
    #[serde(rename = "file_url", deserialize_with = "deserialize_nullable_string", default)]
    pub source_ref: String,
}

impl Chapter {
    pub fn is_free(&self) -> bool {
        self.price <= 0.0
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} / {} / {})",
            self.title, self.standard, self.subject, self.paper_type
        )
    }
}

/// 价格既可能是数字也可能是字符串（numeric 列经 REST 接口返回时两种都见过）
fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct PriceVisitor;

    impl<'de> Visitor<'de> for PriceVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non-negative number or numeric string")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<f64, E> {
            if value < 0.0 || !value.is_finite() {
                return Err(E::custom(format!("invalid price {}", value)));
            }
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<f64, E> {
            self.visit_f64(value as f64)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<f64, E> {
            Ok(value as f64)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<f64, E> {
            let parsed = value
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid price '{}'", value)))?;
            self.visit_f64(parsed)
        }

        fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
            Ok(0.0)
        }
    }

    deserializer.deserialize_any(PriceVisitor)
}

fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

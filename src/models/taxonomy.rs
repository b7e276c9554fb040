//! 年级 / 科目目录
//!
//! 页面下拉框使用的固定选项。目录表里的 `standard` / `subject` 列存的就是这里的 id。

use phf::phf_map;

/// 科目选项：(id, 显示名称)
pub type SubjectOption = (&'static str, &'static str);

/// 年级枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Standard {
    /// 十年级
    Tenth,
    /// 十二年级
    Twelfth,
    MhtCet,
    JeeNeet,
}

static SUBJECTS_BY_STANDARD: phf::Map<&'static str, &'static [SubjectOption]> = phf_map! {
    "10" => &[
        ("marathi", "मराठी"),
        ("hindi", "हिंदी"),
        ("english", "इंग्रजी"),
        ("history", "इतिहास"),
        ("geography", "भूगोल"),
        ("algebra", "बीजगणित"),
        ("geometry", "भूमिती"),
        ("science1", "विज्ञान भाग 1"),
        ("science2", "विज्ञान भाग 2"),
        ("mathematics", "Mathematics"),
        ("geometry-eng", "Geometry"),
        ("science1-eng", "Science 1"),
        ("science2-eng", "Science 2"),
    ],
    "12" => &[
        ("marathi", "मराठी"),
        ("hindi", "हिंदी"),
        ("english", "इंग्रजी"),
        ("history", "इतिहास"),
        ("geography", "भूगोल"),
        ("political-science", "राज्यशास्त्र"),
        ("sociology", "समाजशास्त्र"),
        ("economics", "अर्थशास्त्र"),
        ("cooperation", "सहकार"),
        ("secretarial", "चिटणीस कार्यपद्धती"),
        ("commerce-org", "वाणिज्य संघटन"),
        ("account", "ACCOUNT"),
        ("physics", "PHYSICS"),
        ("chemistry", "CHEMISTRY"),
        ("biology", "BIOLOGY"),
        ("maths", "MATHS"),
    ],
    "mht-cet" => &[
        ("physics", "Physics"),
        ("chemistry", "Chemistry"),
        ("biology", "Biology"),
        ("maths", "Maths"),
    ],
    "jee-neet" => &[
        ("physics", "Physics"),
        ("chemistry", "Chemistry"),
        ("biology", "Biology"),
    ],
};

impl Standard {
    pub const ALL: [Standard; 4] = [
        Standard::Tenth,
        Standard::Twelfth,
        Standard::MhtCet,
        Standard::JeeNeet,
    ];

    /// 目录表中的 id
    pub fn id(self) -> &'static str {
        match self {
            Standard::Tenth => "10",
            Standard::Twelfth => "12",
            Standard::MhtCet => "mht-cet",
            Standard::JeeNeet => "jee-neet",
        }
    }

    /// 显示名称
    pub fn name(self) -> &'static str {
        match self {
            Standard::Tenth => "दहावी",
            Standard::Twelfth => "बारावी",
            Standard::MhtCet => "MHT-CET",
            Standard::JeeNeet => "JEE-NEET",
        }
    }

    /// 从 id 解析年级
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id.trim())
    }

    /// 该年级可选的科目
    pub fn subjects(self) -> &'static [SubjectOption] {
        SUBJECTS_BY_STANDARD.get(self.id()).copied().unwrap_or(&[])
    }

    /// 科目 id 是否属于该年级
    pub fn has_subject(self, subject_id: &str) -> bool {
        self.subjects().iter().any(|(id, _)| *id == subject_id)
    }

    /// 科目显示名称
    pub fn subject_name(self, subject_id: &str) -> Option<&'static str> {
        self.subjects()
            .iter()
            .find(|(id, _)| *id == subject_id)
            .map(|(_, name)| *name)
    }
}

impl std::fmt::Display for Standard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_lookup() {
        assert_eq!(Standard::from_id("12"), Some(Standard::Twelfth));
        assert_eq!(Standard::from_id("11"), None);
        assert!(Standard::Tenth.has_subject("science1-eng"));
        assert!(!Standard::JeeNeet.has_subject("maths"));
        assert_eq!(Standard::MhtCet.subject_name("maths"), Some("Maths"));
        assert_eq!(Standard::Twelfth.subjects().len(), 16);
    }
}

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// 学校名称最少字符数
pub const MIN_INSTITUTION_NAME_LEN: usize = 10;

/// 下载人信息
///
/// 一次提交只采集一次，写入本批所有水印和下载记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// 学校 / 学院名称（水印文字）
    pub institution_name: String,
    pub email: String,
    pub phone: String,
}

impl UserInfo {
    pub fn new(
        institution_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            institution_name: institution_name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// 校验必填字段
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.institution_name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("institution_name"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.phone.trim().is_empty() {
            return Err(ValidationError::MissingField("phone"));
        }
        let actual = name.chars().count();
        if actual < MIN_INSTITUTION_NAME_LEN {
            return Err(ValidationError::InstitutionNameTooShort {
                min: MIN_INSTITUTION_NAME_LEN,
                actual,
            });
        }
        if !self.email.contains('@') {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

//! 支付签名校验 - 业务能力层
//!
//! 只在可信端使用：持有支付商密钥，判断收银台回传的签名是否真实

use crate::error::{AppError, AppResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// 签名校验器
///
/// 期望签名 = hex(HMAC-SHA256(secret, "{order_id}|{payment_id}"))，
/// 与回传签名逐字节比较（区分大小写）。
#[derive(Clone)]
pub struct PaymentVerifier {
    secret: String,
}

impl std::fmt::Debug for PaymentVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentVerifier").finish_non_exhaustive()
    }
}

impl PaymentVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// 计算期望签名
    ///
    /// # 参数
    /// - `order_id`: 支付商订单号
    /// - `payment_id`: 支付商支付号
    ///
    /// # 返回
    /// 小写十六进制字符串
    pub fn expected_signature(&self, order_id: &str, payment_id: &str) -> AppResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::Other(format!("HMAC 初始化失败: {}", e)))?;
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// 校验签名，不一致时返回 `VerificationFailed`
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> AppResult<()> {
        if order_id.is_empty() || payment_id.is_empty() || signature.is_empty() {
            return Err(AppError::verification_failed(order_id, "缺少必要字段"));
        }

        let expected = self.expected_signature(order_id, payment_id)?;
        if expected != signature {
            warn!("⚠️  签名不匹配: 订单 {}", order_id);
            return Err(AppError::verification_failed(order_id, "签名不匹配"));
        }

        debug!("签名校验通过: 订单 {} / 支付 {}", order_id, payment_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTOR: &str = "a23a35a9cc17304682813499f610ed21e20e5e98e04bc2fbe9a198a68b058546";

    #[test]
    fn test_known_vector() {
        let verifier = PaymentVerifier::new("s");
        assert_eq!(verifier.expected_signature("o1", "p1").unwrap(), VECTOR);
        assert!(verifier.verify("o1", "p1", VECTOR).is_ok());
    }

    #[test]
    fn test_any_single_hex_flip_rejected() {
        let verifier = PaymentVerifier::new("s");
        for i in 0..VECTOR.len() {
            let mut flipped: Vec<char> = VECTOR.chars().collect();
            flipped[i] = if flipped[i] == '0' { '1' } else { '0' };
            let flipped: String = flipped.into_iter().collect();
            assert!(verifier.verify("o1", "p1", &flipped).is_err(), "位置 {}", i);
        }
    }

    #[test]
    fn test_uppercase_signature_rejected() {
        let verifier = PaymentVerifier::new("s");
        assert!(verifier.verify("o1", "p1", &VECTOR.to_uppercase()).is_err());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let verifier = PaymentVerifier::new("s");
        assert!(verifier.verify("o1", "", VECTOR).is_err());
        assert!(verifier.verify("o1", "p1", "").is_err());
    }
}

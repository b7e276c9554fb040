/// 支付网关客户端
///
/// 两种接入方式：
/// - [`HttpGatewayClient`]：调用托管的 create-razorpay-order / verify-razorpay-payment 函数，本进程不持有密钥
/// - [`DirectGatewayClient`]：本进程即可信端，直接调用支付商订单接口并本地校验签名
use crate::config::Config;
use crate::error::{AppError, AppResult, ValidationError};
use crate::infrastructure::{checkout_unavailable, CheckoutSession, CheckoutSurface};
use crate::models::payment::{to_minor_units, CURRENCY_INR};
use crate::models::{CheckoutOutcome, PaymentOrder, PaymentStatus, UserInfo};
use crate::services::{DownloadRecorder, PaymentVerifier};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// 创建订单请求
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub chapter_id: String,
    /// 主货币单位
    pub amount: f64,
    /// 本次订单的唯一收据号
    pub receipt: String,
    pub user: UserInfo,
}

/// 签名校验请求
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub chapter_id: String,
    pub user: UserInfo,
}

/// 校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReceipt {
    /// 可信端是否已经写入了下载记录
    pub recorded: bool,
}

/// 支付网关
#[async_trait]
pub trait PaymentGatewayClient: Send + Sync {
    /// 为单个章节创建订单
    async fn create_order(&self, request: &OrderRequest) -> AppResult<PaymentOrder>;

    /// 打开收银台，结果通过返回的 receiver 交付一次
    fn open_checkout(
        &self,
        session: CheckoutSession,
    ) -> AppResult<oneshot::Receiver<CheckoutOutcome>>;

    /// 校验收银台回传的签名
    async fn verify_payment(&self, request: &VerifyRequest) -> AppResult<VerifyReceipt>;
}

fn open_on_surface(
    surface: &dyn CheckoutSurface,
    session: CheckoutSession,
) -> AppResult<oneshot::Receiver<CheckoutOutcome>> {
    let order_id = session.order.order_id.clone();
    let (tx, rx) = oneshot::channel();
    surface
        .open(session, tx)
        .map_err(|e| checkout_unavailable(&order_id, e.to_string()))?;
    Ok(rx)
}

/// 托管函数的返回：成功体或 `{error}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FunctionReply<T> {
    Err { error: String },
    Ok(T),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedOrder {
    order_id: String,
    amount: u64,
    currency: String,
    key_id: String,
}

#[derive(Debug, Deserialize)]
struct VerifiedPayment {
    success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserDetails<'a> {
    college_name: &'a str,
    email: &'a str,
    phone: &'a str,
}

impl<'a> From<&'a UserInfo> for UserDetails<'a> {
    fn from(user: &'a UserInfo) -> Self {
        Self {
            college_name: &user.institution_name,
            email: &user.email,
            phone: &user.phone,
        }
    }
}

/// 托管函数网关
pub struct HttpGatewayClient {
    http: reqwest::Client,
    functions_base_url: String,
    api_key: String,
    surface: Arc<dyn CheckoutSurface>,
}

impl HttpGatewayClient {
    pub fn new(config: &Config, surface: Arc<dyn CheckoutSurface>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            functions_base_url: config.functions_base_url.trim_end_matches('/').to_string(),
            api_key: config.store_api_key.clone(),
            surface,
        })
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        function: &str,
        body: serde_json::Value,
    ) -> Result<T, String> {
        let url = format!("{}/{}", self.functions_base_url, function);
        debug!("调用托管函数: {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let text = response.text().await.map_err(|e| e.to_string())?;
        match serde_json::from_str::<FunctionReply<T>>(&text) {
            Ok(FunctionReply::Ok(value)) if status.is_success() => Ok(value),
            Ok(FunctionReply::Err { error }) => Err(error),
            _ => Err(format!("HTTP {}: {}", status, text)),
        }
    }
}

#[async_trait]
impl PaymentGatewayClient for HttpGatewayClient {
    async fn create_order(&self, request: &OrderRequest) -> AppResult<PaymentOrder> {
        let body = json!({
            "amount": request.amount,
            "chapterId": request.chapter_id,
            "receipt": request.receipt,
            "userDetails": UserDetails::from(&request.user),
        });

        let created: CreatedOrder = self
            .invoke("create-razorpay-order", body)
            .await
            .map_err(|reason| AppError::order_failed(&request.chapter_id, reason))?;

        Ok(PaymentOrder {
            order_id: created.order_id,
            amount: created.amount,
            currency: created.currency,
            chapter_id: request.chapter_id.clone(),
            gateway_key: created.key_id,
            status: PaymentStatus::Created,
        })
    }

    fn open_checkout(
        &self,
        session: CheckoutSession,
    ) -> AppResult<oneshot::Receiver<CheckoutOutcome>> {
        open_on_surface(self.surface.as_ref(), session)
    }

    async fn verify_payment(&self, request: &VerifyRequest) -> AppResult<VerifyReceipt> {
        let body = json!({
            "razorpay_order_id": request.order_id,
            "razorpay_payment_id": request.payment_id,
            "razorpay_signature": request.signature,
            "chapterId": request.chapter_id,
            "userDetails": UserDetails::from(&request.user),
        });

        let verified: VerifiedPayment = self
            .invoke("verify-razorpay-payment", body)
            .await
            .map_err(|reason| AppError::verification_failed(&request.order_id, reason))?;

        if !verified.success {
            return Err(AppError::verification_failed(&request.order_id, "校验未通过"));
        }

        // 托管函数在校验通过后自行写入下载记录
        Ok(VerifyReceipt { recorded: true })
    }
}

/// 支付商订单接口的返回
#[derive(Debug, Deserialize)]
struct ProviderOrder {
    id: String,
    amount: u64,
    currency: String,
}

/// 可信端网关
pub struct DirectGatewayClient {
    http: reqwest::Client,
    api_base_url: String,
    key_id: String,
    key_secret: String,
    verifier: PaymentVerifier,
    recorder: Option<DownloadRecorder>,
    surface: Arc<dyn CheckoutSurface>,
}

impl DirectGatewayClient {
    pub fn new(
        config: &Config,
        surface: Arc<dyn CheckoutSurface>,
        recorder: Option<DownloadRecorder>,
    ) -> AppResult<Self> {
        let (key_id, key_secret) = config.require_gateway_credentials()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            api_base_url: config.razorpay_api_base_url.trim_end_matches('/').to_string(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
            verifier: PaymentVerifier::new(key_secret),
            recorder,
            surface,
        })
    }

    fn validate_order(request: &OrderRequest) -> Result<(), ValidationError> {
        if request.amount.is_nan() || request.amount <= 0.0 {
            return Err(ValidationError::InvalidAmount(request.amount));
        }
        if request.chapter_id.trim().is_empty() {
            return Err(ValidationError::MissingField("chapter_id"));
        }
        if request.user.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGatewayClient for DirectGatewayClient {
    async fn create_order(&self, request: &OrderRequest) -> AppResult<PaymentOrder> {
        Self::validate_order(request)
            .map_err(|e| AppError::order_failed(&request.chapter_id, e.to_string()))?;

        let body = json!({
            "amount": to_minor_units(request.amount),
            "currency": CURRENCY_INR,
            "receipt": request.receipt,
            "notes": {
                "chapter_id": request.chapter_id,
                "email": request.user.email,
                "phone": request.user.phone,
                "college_name": request.user.institution_name,
            },
        });

        let response = self
            .http
            .post(format!("{}/orders", self.api_base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::order_failed(&request.chapter_id, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::order_failed(
                &request.chapter_id,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let order: ProviderOrder = response
            .json()
            .await
            .map_err(|e| AppError::order_failed(&request.chapter_id, e.to_string()))?;

        Ok(PaymentOrder {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            chapter_id: request.chapter_id.clone(),
            gateway_key: self.key_id.clone(),
            status: PaymentStatus::Created,
        })
    }

    fn open_checkout(
        &self,
        session: CheckoutSession,
    ) -> AppResult<oneshot::Receiver<CheckoutOutcome>> {
        open_on_surface(self.surface.as_ref(), session)
    }

    async fn verify_payment(&self, request: &VerifyRequest) -> AppResult<VerifyReceipt> {
        self.verifier
            .verify(&request.order_id, &request.payment_id, &request.signature)?;

        let recorded = match &self.recorder {
            Some(recorder) => {
                recorder
                    .record(&request.chapter_id, &request.user, chrono::Utc::now())
                    .await
            }
            None => false,
        };
        Ok(VerifyReceipt { recorded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::InMemoryDownloadStore;
    use crate::infrastructure::ConsoleCheckout;

    fn direct_client(recorder: Option<DownloadRecorder>) -> DirectGatewayClient {
        let config = Config {
            razorpay_key_id: "rzp_test".to_string(),
            razorpay_key_secret: "s".to_string(),
            ..Config::default()
        };
        DirectGatewayClient::new(&config, Arc::new(ConsoleCheckout::new()), recorder).unwrap()
    }

    fn user() -> UserInfo {
        UserInfo::new("Shivaji Vidyalaya Pune", "t@example.in", "9876543210")
    }

    #[test]
    fn test_function_reply_parsing() {
        let ok: FunctionReply<CreatedOrder> = serde_json::from_str(
            r#"{"orderId":"order_1","amount":5000,"currency":"INR","keyId":"rzp_test"}"#,
        )
        .unwrap();
        assert!(matches!(ok, FunctionReply::Ok(CreatedOrder { amount: 5000, .. })));

        let err: FunctionReply<CreatedOrder> =
            serde_json::from_str(r#"{"error":"Invalid amount"}"#).unwrap();
        assert!(matches!(err, FunctionReply::Err { error } if error == "Invalid amount"));
    }

    #[test]
    fn test_user_details_wire_names() {
        let user = user();
        let value = serde_json::to_value(UserDetails::from(&user)).unwrap();
        assert_eq!(value["collegeName"], "Shivaji Vidyalaya Pune");
        assert_eq!(value["phone"], "9876543210");
    }

    #[test]
    fn test_direct_requires_credentials() {
        let result =
            DirectGatewayClient::new(&Config::default(), Arc::new(ConsoleCheckout::new()), None);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_direct_rejects_zero_amount_without_network() {
        let client = direct_client(None);
        let request = OrderRequest {
            chapter_id: "c1".to_string(),
            amount: 0.0,
            receipt: "chapter_c1_1".to_string(),
            user: user(),
        };
        let err = client.create_order(&request).await.unwrap_err();
        assert!(err.to_string().contains("c1"));
    }

    #[tokio::test]
    async fn test_direct_verify_records_on_success_only() {
        let store = Arc::new(InMemoryDownloadStore::new());
        let client = direct_client(Some(DownloadRecorder::new(store.clone())));
        let good = VerifyRequest {
            order_id: "o1".to_string(),
            payment_id: "p1".to_string(),
            signature: "a23a35a9cc17304682813499f610ed21e20e5e98e04bc2fbe9a198a68b058546"
                .to_string(),
            chapter_id: "c1".to_string(),
            user: user(),
        };
        let bad = VerifyRequest {
            signature: "00".to_string(),
            ..good.clone()
        };

        assert!(client.verify_payment(&bad).await.is_err());
        assert!(store.is_empty().await);

        let receipt = client.verify_payment(&good).await.unwrap();
        assert!(receipt.recorded);
        assert_eq!(store.len().await, 1);
    }
}

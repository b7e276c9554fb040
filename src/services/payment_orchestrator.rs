//! 支付编排服务 - 业务能力层
//!
//! 只负责"一个收费章节从下单到校验"能力：
//!
//! ```text
//! INIT → ORDER_CREATED → AWAITING_USER_ACTION → VERIFYING → VERIFIED
//!                                   │                 └──→ FAILED
//!                                   └──→ CANCELLED
//! ```
//!
//! 不关心盖章、保存和批次。

use crate::clients::{OrderRequest, PaymentGatewayClient, VerifyReceipt, VerifyRequest};
use crate::error::{AppError, AppResult, ValidationError};
use crate::infrastructure::{CheckoutGate, CheckoutSession};
use crate::models::{Chapter, CheckoutOutcome, CheckoutState, PaymentOrder, PaymentStatus, UserInfo};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 单个章节支付的最终结果
#[derive(Debug)]
pub enum PaymentOutcome {
    /// 签名校验通过
    Verified {
        order: PaymentOrder,
        /// 可信端是否已经写入下载记录
        recorded_by_gateway: bool,
    },
    /// 用户关闭了收银台，未调用校验
    Cancelled { order: PaymentOrder },
    /// 下单 / 收银台 / 校验任一环节失败
    ///
    /// 下单失败时还没有订单；其余情况订单状态为 `FAILED`。
    Failed {
        order: Option<PaymentOrder>,
        error: AppError,
    },
}

impl PaymentOutcome {
    pub fn state(&self) -> CheckoutState {
        match self {
            PaymentOutcome::Verified { .. } => CheckoutState::Verified,
            PaymentOutcome::Cancelled { .. } => CheckoutState::Cancelled,
            PaymentOutcome::Failed { .. } => CheckoutState::Failed,
        }
    }
}

/// 状态跟踪（只用于约束转移顺序和记录日志）
struct CheckoutFlow<'a> {
    chapter_id: &'a str,
    state: CheckoutState,
}

impl<'a> CheckoutFlow<'a> {
    fn new(chapter_id: &'a str) -> Self {
        Self {
            chapter_id,
            state: CheckoutState::Init,
        }
    }

    fn advance(&mut self, next: CheckoutState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "非法状态转移 {} → {}",
            self.state,
            next
        );
        debug!("章节 {} 支付状态: {} → {}", self.chapter_id, self.state, next);
        self.state = next;
    }
}

/// 收据号：每个 (章节, 创建时间) 唯一
pub fn receipt_key(chapter_id: &str) -> String {
    format!("chapter_{}_{}", chapter_id, Utc::now().timestamp_millis())
}

/// 支付编排服务
///
/// 职责：
/// - 为单个章节创建订单
/// - 独占收银台并等待用户操作
/// - 请求可信端校验签名
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGatewayClient>,
    gate: CheckoutGate,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGatewayClient>) -> Self {
        Self::with_gate(gateway, CheckoutGate::global())
    }

    /// 使用指定闸门（测试中隔离全局状态）
    pub fn with_gate(gateway: Arc<dyn PaymentGatewayClient>, gate: CheckoutGate) -> Self {
        Self { gateway, gate }
    }

    /// 创建订单
    ///
    /// # 参数
    /// - `amount`: 主货币单位金额，必须大于 0
    /// - `chapter_id`: 章节 id
    /// - `user`: 下载人信息
    pub async fn create_order(
        &self,
        amount: f64,
        chapter_id: &str,
        user: &UserInfo,
    ) -> AppResult<PaymentOrder> {
        if amount.is_nan() || amount <= 0.0 {
            return Err(AppError::order_failed(
                chapter_id,
                ValidationError::InvalidAmount(amount).to_string(),
            ));
        }

        let request = OrderRequest {
            chapter_id: chapter_id.to_string(),
            amount,
            receipt: receipt_key(chapter_id),
            user: user.clone(),
        };
        let order = self.gateway.create_order(&request).await?;
        info!(
            "🧾 订单已创建: {} | {:.2} {}",
            order.order_id,
            order.amount as f64 / 100.0,
            order.currency
        );
        Ok(order)
    }

    /// 打开收银台并等待结果
    ///
    /// 同一时刻最多一个收银台；其他调用方在闸门处等待。
    /// 收银台异常退出（结果通道被丢弃）按用户关闭处理。
    pub async fn present_checkout(
        &self,
        order: &PaymentOrder,
        user: &UserInfo,
        description: &str,
    ) -> AppResult<CheckoutOutcome> {
        let _permit = self.gate.acquire().await?;

        let session = CheckoutSession {
            order: order.clone(),
            user: user.clone(),
            description: description.to_string(),
        };
        let receiver = self.gateway.open_checkout(session)?;

        let outcome = match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("⚠️  收银台已关闭但未返回结果: 订单 {}", order.order_id);
                CheckoutOutcome::Dismissed
            }
        };
        Ok(outcome)
    }

    /// 请求可信端校验签名
    pub async fn verify(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
        chapter_id: &str,
        user: &UserInfo,
    ) -> AppResult<VerifyReceipt> {
        let request = VerifyRequest {
            order_id: order_id.to_string(),
            payment_id: payment_id.to_string(),
            signature: signature.to_string(),
            chapter_id: chapter_id.to_string(),
            user: user.clone(),
        };
        self.gateway.verify_payment(&request).await
    }

    /// 完整跑一遍单个章节的支付流程
    pub async fn run(&self, chapter: &Chapter, user: &UserInfo) -> PaymentOutcome {
        let mut flow = CheckoutFlow::new(&chapter.id);

        let mut order = match self.create_order(chapter.price, &chapter.id, user).await {
            Ok(order) => order,
            Err(e) => {
                flow.advance(CheckoutState::Failed);
                return PaymentOutcome::Failed {
                    order: None,
                    error: e,
                };
            }
        };
        flow.advance(CheckoutState::OrderCreated);

        flow.advance(CheckoutState::AwaitingUserAction);
        let outcome = match self.present_checkout(&order, user, &chapter.title).await {
            Ok(outcome) => outcome,
            Err(e) => {
                flow.advance(CheckoutState::Failed);
                order.status = PaymentStatus::Failed;
                return PaymentOutcome::Failed {
                    order: Some(order),
                    error: e,
                };
            }
        };

        let (payment_id, signature) = match outcome {
            CheckoutOutcome::Dismissed => {
                flow.advance(CheckoutState::Cancelled);
                order.status = PaymentStatus::Cancelled;
                info!("🚫 用户取消支付: 订单 {}", order.order_id);
                return PaymentOutcome::Cancelled { order };
            }
            CheckoutOutcome::Completed {
                payment_id,
                signature,
            } => (payment_id, signature),
        };

        flow.advance(CheckoutState::Verifying);
        match self
            .verify(&order.order_id, &payment_id, &signature, &chapter.id, user)
            .await
        {
            Ok(receipt) => {
                flow.advance(CheckoutState::Verified);
                order.status = PaymentStatus::Verified;
                info!("✅ 支付校验通过: 订单 {}", order.order_id);
                PaymentOutcome::Verified {
                    order,
                    recorded_by_gateway: receipt.recorded,
                }
            }
            Err(e) => {
                flow.advance(CheckoutState::Failed);
                order.status = PaymentStatus::Failed;
                warn!("❌ 支付校验失败: 订单 {}: {}", order.order_id, e);
                PaymentOutcome::Failed {
                    order: Some(order),
                    error: e,
                }
            }
        }
    }
}

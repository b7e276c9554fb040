use serde::{Deserialize, Serialize};
use std::fmt;

/// 订单币种
pub const CURRENCY_INR: &str = "INR";

/// 主货币单位 → 最小货币单位（卢比 → 派士）
pub fn to_minor_units(amount: f64) -> u64 {
    (amount * 100.0).round().max(0.0) as u64
}

/// 支付订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Created,
    Verified,
    Failed,
    Cancelled,
}

/// 支付订单
///
/// 每个收费章节单独创建一个订单，不跨章节复用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
    /// 最小货币单位
    pub amount: u64,
    pub currency: String,
    pub chapter_id: String,
    /// 收银台使用的公开 key id
    pub gateway_key: String,
    pub status: PaymentStatus,
}

/// 收银台回调结果（只会产生一次）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// 支付商回调了支付结果
    Completed { payment_id: String, signature: String },
    /// 用户关闭了收银台
    Dismissed,
}

/// 单个章节支付流程的状态机
///
/// ```text
/// Init → OrderCreated → AwaitingUserAction → Verifying → Verified
///                                 │                 └──→ Failed
///                                 └──→ Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Init,
    OrderCreated,
    AwaitingUserAction,
    Verifying,
    Verified,
    Failed,
    Cancelled,
}

impl CheckoutState {
    /// 状态转移是否合法
    pub fn can_transition_to(self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        matches!(
            (self, next),
            (Init, OrderCreated)
                | (Init, Failed)
                | (OrderCreated, AwaitingUserAction)
                | (OrderCreated, Failed)
                | (AwaitingUserAction, Verifying)
                | (AwaitingUserAction, Cancelled)
                | (AwaitingUserAction, Failed)
                | (Verifying, Verified)
                | (Verifying, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CheckoutState::Verified | CheckoutState::Failed | CheckoutState::Cancelled
        )
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutState::Init => "INIT",
            CheckoutState::OrderCreated => "ORDER_CREATED",
            CheckoutState::AwaitingUserAction => "AWAITING_USER_ACTION",
            CheckoutState::Verifying => "VERIFYING",
            CheckoutState::Verified => "VERIFIED",
            CheckoutState::Failed => "FAILED",
            CheckoutState::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_rounding() {
        assert_eq!(to_minor_units(50.0), 5000);
        assert_eq!(to_minor_units(49.99), 4999);
        assert_eq!(to_minor_units(0.1 + 0.2), 30);
    }

    #[test]
    fn test_state_machine_transitions() {
        use CheckoutState::*;
        assert!(Init.can_transition_to(OrderCreated));
        assert!(AwaitingUserAction.can_transition_to(Cancelled));
        assert!(Verifying.can_transition_to(Verified));
        assert!(!OrderCreated.can_transition_to(Verified));
        assert!(!Cancelled.can_transition_to(Verifying));
        assert!(Verified.is_terminal());
        assert!(!Verifying.is_terminal());
    }
}

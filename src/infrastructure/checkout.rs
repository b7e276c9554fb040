//! 收银台 - 基础设施层
//!
//! 收银台是全局唯一的稀缺资源：同一时刻最多只能打开一个。
//! 本模块持有这个资源，只暴露"打开并等待结果"的能力。

use crate::error::{AppError, AppResult, PaymentError};
use crate::models::{CheckoutOutcome, PaymentOrder, UserInfo};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::{oneshot, Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

/// 打开收银台所需的信息
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub order: PaymentOrder,
    pub user: UserInfo,
    /// 展示给用户的商品描述（章节标题）
    pub description: String,
}

/// 外部托管的收银台
///
/// 职责：
/// - 展示收银台
/// - 把支付商回调或用户关闭事件通过 `responder` 发回，只发一次
/// - 不做签名校验
pub trait CheckoutSurface: Send + Sync {
    fn open(
        &self,
        session: CheckoutSession,
        responder: oneshot::Sender<CheckoutOutcome>,
    ) -> AppResult<()>;
}

/// 收银台单例闸门
///
/// 内部是容量为 1 的信号量；持有 [`CheckoutPermit`] 期间其他调用方只能等待。
#[derive(Debug, Clone)]
pub struct CheckoutGate {
    semaphore: Arc<Semaphore>,
}

/// 收银台占用凭证，drop 时释放
#[derive(Debug)]
pub struct CheckoutPermit {
    _permit: OwnedSemaphorePermit,
}

static GLOBAL_GATE: OnceLock<CheckoutGate> = OnceLock::new();

impl CheckoutGate {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// 进程内共享的闸门
    pub fn global() -> Self {
        GLOBAL_GATE.get_or_init(CheckoutGate::new).clone()
    }

    /// 等待收银台空闲并占用
    pub async fn acquire(&self) -> AppResult<CheckoutPermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Other(format!("收银台闸门已关闭: {}", e)))?;
        Ok(CheckoutPermit { _permit: permit })
    }

    /// 当前是否有收银台处于打开状态
    pub fn is_open(&self) -> bool {
        self.semaphore.available_permits() == 0
    }
}

impl Default for CheckoutGate {
    fn default() -> Self {
        Self::new()
    }
}

/// 终端收银台
///
/// 打印订单信息，然后从标准输入读取一行：
/// `<payment_id> <signature>` 表示支付完成，空行或 `cancel` 表示关闭。
///
/// 整个进程只持有一个行读取器，多次打开收银台依次读取后续行，
/// 缓冲区里已经读入但尚未消费的行不会丢失。
pub struct ConsoleCheckout {
    lines: Arc<Mutex<ReplyLines>>,
}

type ReplyLines = Lines<Box<dyn AsyncBufRead + Send + Unpin>>;

impl ConsoleCheckout {
    /// 从标准输入读取
    pub fn new() -> Self {
        Self::from_reader(tokio::io::stdin())
    }

    /// 从任意输入源读取，每次打开收银台消费一行
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let buffered: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(BufReader::new(reader));
        Self {
            lines: Arc::new(Mutex::new(buffered.lines())),
        }
    }
}

impl Default for ConsoleCheckout {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConsoleCheckout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleCheckout").finish_non_exhaustive()
    }
}

impl CheckoutSurface for ConsoleCheckout {
    fn open(
        &self,
        session: CheckoutSession,
        responder: oneshot::Sender<CheckoutOutcome>,
    ) -> AppResult<()> {
        info!("{}", "─".repeat(60));
        info!("💳 收银台: {}", session.description);
        info!(
            "   订单 {} | 金额 {:.2} {} | key {}",
            session.order.order_id,
            session.order.amount as f64 / 100.0,
            session.order.currency,
            session.order.gateway_key
        );
        info!("   付款人: {} <{}>", session.user.institution_name, session.user.email);
        info!("   请输入 \"<payment_id> <signature>\"，直接回车取消");
        info!("{}", "─".repeat(60));

        let order_id = session.order.order_id.clone();
        let lines = Arc::clone(&self.lines);
        tokio::spawn(async move {
            let mut lines = lines.lock().await;
            let outcome = match lines.next_line().await {
                Ok(Some(line)) => parse_console_reply(&line),
                Ok(None) => CheckoutOutcome::Dismissed,
                Err(e) => {
                    debug!("读取收银台输入失败 (订单 {}): {}", order_id, e);
                    CheckoutOutcome::Dismissed
                }
            };
            // 接收方已放弃等待时忽略
            let _ = responder.send(outcome);
        });

        Ok(())
    }
}

/// 解析终端输入
pub fn parse_console_reply(line: &str) -> CheckoutOutcome {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(cmd), None) if cmd.eq_ignore_ascii_case("cancel") => CheckoutOutcome::Dismissed,
        (Some(payment_id), Some(signature)) => CheckoutOutcome::Completed {
            payment_id: payment_id.to_string(),
            signature: signature.to_string(),
        },
        _ => CheckoutOutcome::Dismissed,
    }
}

/// 收银台无法打开时的错误
pub fn checkout_unavailable(order_id: &str, reason: impl Into<String>) -> AppError {
    AppError::Payment(PaymentError::CheckoutUnavailable {
        order_id: order_id.to_string(),
        reason: reason.into(),
    })
}

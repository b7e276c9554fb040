//! 集成测试共用的替身与样例数据

#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use paper_fulfillment::clients::{
    CatalogFilter, CatalogStore, DocumentSource, DownloadStore, OrderRequest,
    PaymentGatewayClient, VerifyReceipt, VerifyRequest,
};
use paper_fulfillment::error::{AppResult, RecordError};
use paper_fulfillment::infrastructure::{CheckoutGate, CheckoutSession};
use paper_fulfillment::models::payment::{to_minor_units, CURRENCY_INR};
use paper_fulfillment::models::{
    Chapter, CheckoutOutcome, DownloadRecord, NewDownload, PaperType, PaymentOrder, PaymentStatus,
};
use paper_fulfillment::services::{
    ArtifactWriter, DownloadRecorder, PaymentOrchestrator, WatermarkRenderer,
};
use paper_fulfillment::{AppError, ChapterFlow, PaymentVerifier, UserInfo};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub const GATEWAY_SECRET: &str = "rzp_test_secret";

pub fn user() -> UserInfo {
    UserInfo::new("Shivaji Vidyalaya Pune", "office@example.in", "9876543210")
}

pub fn chapter(id: &str, title: &str, price: f64) -> Chapter {
    Chapter {
        id: id.to_string(),
        title: title.to_string(),
        standard: "10".to_string(),
        subject: "algebra".to_string(),
        paper_type: PaperType::Question,
        price,
        source_ref: format!("mem://{}.pdf", id),
    }
}

/// 指定页数的简单 PDF
pub fn sample_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for i in 0..page_count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 14.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Question {}", i + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// 固定目录
pub struct FixedCatalog {
    pub chapters: Vec<Chapter>,
}

#[async_trait]
impl CatalogStore for FixedCatalog {
    async fn query_chapters(&self, filter: &CatalogFilter) -> AppResult<Vec<Chapter>> {
        Ok(self
            .chapters
            .iter()
            .filter(|c| c.standard == filter.standard && filter.subjects.contains(&c.subject))
            .cloned()
            .collect())
    }
}

/// 内存中的源文档；未登记的 source_ref 视为加载失败
#[derive(Default)]
pub struct MemoryDocuments {
    pub documents: HashMap<String, Vec<u8>>,
}

impl MemoryDocuments {
    pub fn for_chapters(chapters: &[Chapter]) -> Self {
        let documents = chapters
            .iter()
            .map(|c| (c.source_ref.clone(), sample_pdf(2)))
            .collect();
        Self { documents }
    }
}

#[async_trait]
impl DocumentSource for MemoryDocuments {
    async fn fetch(&self, source_ref: &str) -> AppResult<Vec<u8>> {
        self.documents
            .get(source_ref)
            .cloned()
            .ok_or_else(|| AppError::document_load_failed(source_ref, "not found"))
    }
}

/// 写入总是失败的下载记录存储
pub struct BrokenDownloadStore;

#[async_trait]
impl DownloadStore for BrokenDownloadStore {
    async fn insert(&self, _record: &NewDownload) -> AppResult<()> {
        Err(RecordError::WriteFailed("connection reset".to_string()).into())
    }

    async fn list_by_email(&self, _email: &str) -> AppResult<Vec<DownloadRecord>> {
        Err(RecordError::QueryFailed("connection reset".to_string()).into())
    }
}

/// 收银台上用户的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payer {
    /// 正常付款，签名由密钥计算
    Pay,
    /// 关闭收银台
    Dismiss,
    /// 回传伪造签名
    Forge,
}

/// 按章节预设用户动作的网关；签名用 [`PaymentVerifier`] 在本地校验
pub struct ScriptedGateway {
    script: HashMap<String, Payer>,
    verifier: PaymentVerifier,
    pub orders: Mutex<Vec<String>>,
    pub verified: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new(script: &[(&str, Payer)]) -> Self {
        Self {
            script: script
                .iter()
                .map(|(id, payer)| (id.to_string(), *payer))
                .collect(),
            verifier: PaymentVerifier::new(GATEWAY_SECRET),
            orders: Mutex::new(Vec::new()),
            verified: Mutex::new(Vec::new()),
        }
    }

    pub fn ordered_chapters(&self) -> Vec<String> {
        self.orders.lock().unwrap().clone()
    }

    pub fn verified_chapters(&self) -> Vec<String> {
        self.verified.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGatewayClient for ScriptedGateway {
    async fn create_order(&self, request: &OrderRequest) -> AppResult<PaymentOrder> {
        self.orders.lock().unwrap().push(request.chapter_id.clone());
        Ok(PaymentOrder {
            order_id: format!("order_{}", request.chapter_id),
            amount: to_minor_units(request.amount),
            currency: CURRENCY_INR.to_string(),
            chapter_id: request.chapter_id.clone(),
            gateway_key: "rzp_test_key".to_string(),
            status: PaymentStatus::Created,
        })
    }

    fn open_checkout(
        &self,
        session: CheckoutSession,
    ) -> AppResult<oneshot::Receiver<CheckoutOutcome>> {
        let (tx, rx) = oneshot::channel();
        let order_id = session.order.order_id.clone();
        let payment_id = format!("pay_{}", session.order.chapter_id);
        let outcome = match self
            .script
            .get(&session.order.chapter_id)
            .copied()
            .unwrap_or(Payer::Pay)
        {
            Payer::Pay => CheckoutOutcome::Completed {
                signature: self.verifier.expected_signature(&order_id, &payment_id)?,
                payment_id,
            },
            Payer::Forge => CheckoutOutcome::Completed {
                signature: "0".repeat(64),
                payment_id,
            },
            Payer::Dismiss => CheckoutOutcome::Dismissed,
        };
        let _ = tx.send(outcome);
        Ok(rx)
    }

    async fn verify_payment(&self, request: &VerifyRequest) -> AppResult<VerifyReceipt> {
        self.verifier
            .verify(&request.order_id, &request.payment_id, &request.signature)?;
        self.verified.lock().unwrap().push(request.chapter_id.clone());
        Ok(VerifyReceipt { recorded: false })
    }
}

/// 组装一个使用替身的章节流程
pub fn build_flow(
    gateway: Arc<ScriptedGateway>,
    documents: Arc<dyn DocumentSource>,
    store: Arc<dyn DownloadStore>,
    output_folder: &Path,
) -> ChapterFlow {
    ChapterFlow::new(
        PaymentOrchestrator::with_gate(gateway, CheckoutGate::new()),
        documents,
        WatermarkRenderer::new(None),
        ArtifactWriter::new(output_folder).unwrap(),
        DownloadRecorder::new(store),
    )
}

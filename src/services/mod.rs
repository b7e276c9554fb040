pub mod artifact_writer;
pub mod catalog_resolver;
pub mod download_recorder;
pub mod payment_orchestrator;
pub mod payment_verifier;
pub mod pricing;
pub mod watermark;

pub use artifact_writer::ArtifactWriter;
pub use catalog_resolver::CatalogResolver;
pub use download_recorder::DownloadRecorder;
pub use payment_orchestrator::{PaymentOrchestrator, PaymentOutcome};
pub use payment_verifier::PaymentVerifier;
pub use watermark::{WatermarkJob, WatermarkRenderer};

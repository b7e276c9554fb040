pub mod catalog_client;
pub mod document_client;
pub mod download_client;
pub mod gateway_client;

pub use catalog_client::{CatalogFilter, CatalogStore, RestCatalogStore};
pub use document_client::{DocumentSource, HttpDocumentSource};
pub use download_client::{DownloadStore, InMemoryDownloadStore, RestDownloadStore};
pub use gateway_client::{
    DirectGatewayClient, HttpGatewayClient, OrderRequest, PaymentGatewayClient, VerifyReceipt,
    VerifyRequest,
};

pub mod chapter;
pub mod download;
pub mod loaders;
pub mod payment;
pub mod taxonomy;
pub mod user;

pub use chapter::{Chapter, PaperType};
pub use download::{ChapterSummary, DownloadRecord, NewDownload};
pub use loaders::{load_batch_request, BatchRequest};
pub use payment::{CheckoutOutcome, CheckoutState, PaymentOrder, PaymentStatus};
pub use taxonomy::Standard;
pub use user::UserInfo;

pub mod http;
pub mod storage;
pub mod toast;

pub use http::ReqwestTransport;
pub use storage::{FileStore, MemoryStore};
pub use toast::ToastHub;

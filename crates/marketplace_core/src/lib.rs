pub mod domain;
pub mod paging;
pub mod ports;

pub use domain::{
    Bank, Car, CarFilters, CarSort, CarStatus, ModerationTarget, PaymentLink, PublicProfile,
    Report, ReportStatus, ReporterSummary, SellerSummary, Session, TagStat, Toast, ToastLevel,
    UploadedFile, UserProfile, WithdrawalRequest,
};
pub use paging::{Identified, PagedCollection};
pub use ports::{
    ApiRequest, ApiResponse, HttpTransport, KeyValueStore, Method, Notifier, PortError,
    PortResult, RequestBody,
};

pub mod dataset;
pub mod repository;
pub mod remote;
pub mod source;

pub use dataset::{AppraisalDataset, AppraisalRecord, AppraisalSummary};
pub use repository::AppraisalRepository;
pub use remote::RemoteRepository;
pub use source::AppraisalSource;

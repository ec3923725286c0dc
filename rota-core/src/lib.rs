pub mod commit;
pub mod payment;
pub mod range;
pub mod repository;

pub use commit::{BookingCommitter, BookingConfirmation, CommitError, CommitRequest};
pub use payment::{MockPaymentGateway, PaymentError, PaymentGateway, PaymentIntent, PaymentStatus};
pub use range::DateRange;
pub use repository::{AttractionDataSource, DataResult, DataSourceError};

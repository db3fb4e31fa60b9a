//! Domain records shared by the service, the document renderer and the client.
//!
//! Records serialise with camelCase keys and `_id` identifiers, the shape the
//! front end and the document store both consume.

mod catalog;
mod fbr;
mod invoice;
mod job;
pub mod money;
mod party;
mod task;
mod user;

pub use catalog::ServiceItem;
pub use fbr::{FbrApiSettings, FbrEnvironment, FbrStatus, FbrSubmission};
pub use invoice::{
    validate_hs_code, Invoice, InvoiceStatus, InvoiceTotals, LineItem, LineItemInput,
};
pub use job::{BulkJob, BulkJobError, BulkJobStatus};
pub use party::{Client, SellerSettings, DEFAULT_SALES_TAX_RATE};
pub use task::{Task, TaskPriority, TaskStatus};
pub use user::User;

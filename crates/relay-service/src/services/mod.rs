//! Service layer - business logic and use cases
//!
//! Services hold a reference to the `ServiceContext` and are constructed per call:
//!
//! ```rust,ignore
//! let outcome = MessageService::new(&ctx).send_message(request, session_user).await;
//! ```

mod context;
mod deadline;
mod error;
mod message;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use message::{
    MessageService, SendFailure, SendStage, NEW_MESSAGE_NOTIFICATION_EVENT, RECEIVE_MESSAGE_EVENT,
};

//! # relay-service
//!
//! Application layer: the dependency container, request/response DTOs and the
//! staged message pipeline.

pub mod dto;
pub mod services;

pub use dto::{ErrorBody, MessageResponse, NotificationPayload, SendMessageRequest, SenderPayload};
pub use services::{
    MessageService, SendFailure, SendStage, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult, NEW_MESSAGE_NOTIFICATION_EVENT, RECEIVE_MESSAGE_EVENT,
};

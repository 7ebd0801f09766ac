//! Message service
//!
//! The send pipeline: validate, authorize, persist, then best-effort pointer update,
//! enrichment and fan-out. Only the first three stages can fail a send; once the store
//! has accepted the message it counts as sent.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument, warn, Instrument};
use validator::Validate;

use relay_core::entities::{Message, NewMessage, UserProfile};
use relay_core::value_objects::{RoomKey, Snowflake};

use crate::dto::{describe_validation_errors, ErrorBody, MessageResponse, NotificationPayload, SendMessageRequest};

use super::context::ServiceContext;
use super::deadline::within;
use super::error::{ServiceError, ServiceResult};

/// Event delivered to the conversation room for every stored message
pub const RECEIVE_MESSAGE_EVENT: &str = "receive_message";

/// Event delivered to the receiver's private room
pub const NEW_MESSAGE_NOTIFICATION_EVENT: &str = "new_message_notification";

/// Pipeline stage that rejected a send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStage {
    Validate,
    Authorize,
    Persist,
}

impl SendStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Authorize => "authorize",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for SendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected send, naming the first stage that failed
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {error}")]
pub struct SendFailure {
    pub stage: SendStage,
    #[source]
    pub error: ServiceError,
}

impl SendFailure {
    pub fn new(stage: SendStage, error: ServiceError) -> Self {
        Self { stage, error }
    }

    fn validate(error: ServiceError) -> Self {
        Self::new(SendStage::Validate, error)
    }

    fn authorize(error: ServiceError) -> Self {
        Self::new(SendStage::Authorize, error)
    }

    fn persist(error: ServiceError) -> Self {
        Self::new(SendStage::Persist, error)
    }

    /// Wire form of this failure
    pub fn body(&self) -> ErrorBody {
        ErrorBody::new(self.stage, &self.error)
    }
}

/// Message service
pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    /// Create a new MessageService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Store a message and deliver it to the conversation room and the receiver
    ///
    /// `session_user` is the identity the calling session authenticated as, if any;
    /// an authenticated session may only send as itself.
    #[instrument(
        skip(self, request),
        fields(conversation_id = %request.conversation_id, sender_id = %request.sender_id)
    )]
    pub async fn send_message(
        &self,
        request: SendMessageRequest,
        session_user: Option<Snowflake>,
    ) -> Result<MessageResponse, SendFailure> {
        let new_message = self.validate(request).map_err(SendFailure::validate)?;

        self.authorize(&new_message, session_user)
            .await
            .map_err(SendFailure::authorize)?;

        let message = within(
            self.ctx.store_timeout(),
            "create_message",
            self.ctx.message_repo().create(&new_message),
        )
        .await
        .map_err(SendFailure::persist)?;

        info!(message_id = %message.id, "Message persisted");

        self.spawn_pointer_update(message.conversation_id, message.id);

        // Dropping the caller (a closing session) must not cancel delivery of a stored message
        let ctx = self.ctx.clone();
        let fallback = message.clone();
        let delivery = tokio::spawn(
            async move { MessageService::new(&ctx).deliver(message).await }.in_current_span(),
        );

        match delivery.await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(message_id = %fallback.id, error = %e, "Message delivery task failed");
                let sender = UserProfile::placeholder(fallback.sender_id);
                Ok(MessageResponse::new(fallback, sender))
            }
        }
    }

    /// Enrich a stored message and fan it out to the conversation and the receiver
    async fn deliver(&self, message: Message) -> MessageResponse {
        let sender = self.enrich(message.sender_id).await;
        let response = MessageResponse::new(message, sender);

        self.fan_out(&response);

        response
    }

    fn validate(&self, request: SendMessageRequest) -> ServiceResult<NewMessage> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(describe_validation_errors(&e)))?;

        let max = self.ctx.max_content_length();
        if request.content.chars().count() > max {
            return Err(ServiceError::validation(format!(
                "content must be at most {max} characters"
            )));
        }

        Ok(NewMessage::new(
            parse_id(&request.conversation_id, "conversationId")?,
            parse_id(&request.sender_id, "senderId")?,
            parse_id(&request.receiver_id, "receiverId")?,
            request.content,
        ))
    }

    async fn authorize(
        &self,
        message: &NewMessage,
        session_user: Option<Snowflake>,
    ) -> ServiceResult<()> {
        if session_user.is_some_and(|user| user != message.sender_id) {
            return Err(ServiceError::authorization(
                "senderId does not match the authenticated user",
            ));
        }

        let conversation = within(
            self.ctx.store_timeout(),
            "find_conversation",
            self.ctx.conversation_repo().find_by_id(message.conversation_id),
        )
        .await?
        .ok_or_else(|| {
            ServiceError::authorization(format!(
                "conversation {} is not accessible",
                message.conversation_id
            ))
        })?;

        if !conversation.admits(message.sender_id, message.receiver_id) {
            return Err(ServiceError::authorization(
                "sender and receiver must both be participants of the conversation",
            ));
        }

        Ok(())
    }

    /// Move the conversation's last-message pointer without holding up the caller
    fn spawn_pointer_update(&self, conversation_id: Snowflake, message_id: Snowflake) {
        let repo = self.ctx.conversation_repo_handle();
        let deadline = self.ctx.store_timeout();

        tokio::spawn(
            async move {
                match within(
                    deadline,
                    "update_last_message",
                    repo.update_last_message(conversation_id, message_id),
                )
                .await
                {
                    Ok(()) => debug!(%message_id, "Last message pointer updated"),
                    Err(e) => warn!(
                        %conversation_id,
                        %message_id,
                        error = %e,
                        "Failed to update last message pointer"
                    ),
                }
            }
            .in_current_span(),
        );
    }

    async fn enrich(&self, sender_id: Snowflake) -> UserProfile {
        match within(
            self.ctx.store_timeout(),
            "find_profile",
            self.ctx.user_repo().find_profile(sender_id),
        )
        .await
        {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!(%sender_id, "Sender profile missing, using placeholder");
                UserProfile::placeholder(sender_id)
            }
            Err(e) => {
                warn!(%sender_id, error = %e, "Sender lookup failed, using placeholder");
                UserProfile::placeholder(sender_id)
            }
        }
    }

    fn fan_out(&self, response: &MessageResponse) {
        let publisher = self.ctx.publisher();

        match serde_json::to_value(response) {
            Ok(payload) => {
                let sent = publisher.publish(
                    &RoomKey::conversation(response.conversation_id),
                    RECEIVE_MESSAGE_EVENT,
                    &payload,
                );
                debug!(message_id = %response.id, sent, "Message broadcast to conversation");
            }
            Err(e) => warn!(error = %e, "Failed to encode message payload"),
        }

        match serde_json::to_value(NotificationPayload::from(response)) {
            Ok(payload) => {
                let sent = publisher.publish(
                    &RoomKey::user(response.receiver_id),
                    NEW_MESSAGE_NOTIFICATION_EVENT,
                    &payload,
                );
                debug!(receiver_id = %response.receiver_id, sent, "Receiver notified");
            }
            Err(e) => warn!(error = %e, "Failed to encode notification payload"),
        }
    }
}

fn parse_id(raw: &str, field: &str) -> ServiceResult<Snowflake> {
    Snowflake::parse(raw).map_err(|e| ServiceError::validation(format!("{field}: {e}")))
}

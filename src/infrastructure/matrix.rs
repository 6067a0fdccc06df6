//! # Matrix Transport Adapter
//!
//! Implements the `Transport` trait for the Matrix protocol using the `matrix_sdk`.
//! This module acts as the bridge between the generic outbound `Action`s produced
//! by the core and the specific implementation details of the Matrix SDK.

use async_trait::async_trait;
use matrix_sdk::ruma::events::room::message::RoomMessageEventContent;
use matrix_sdk::ruma::OwnedRoomId;
use matrix_sdk::Client;

use crate::domain::error::DeliveryError;
use crate::domain::traits::Transport;
use crate::domain::types::Action;

#[derive(Clone)]
pub struct MatrixTransport {
    client: Client,
}

impl MatrixTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for MatrixTransport {
    async fn deliver(&self, action: &Action) -> Result<(), DeliveryError> {
        let room_id: OwnedRoomId = action
            .conversation_id
            .as_str()
            .try_into()
            .map_err(|_| DeliveryError::UnknownConversation(action.conversation_id.clone()))?;
        let room = self
            .client
            .get_room(&room_id)
            .ok_or_else(|| DeliveryError::UnknownConversation(action.conversation_id.clone()))?;

        tracing::info!("Bot sending message to {}: {}", room_id, action.payload);
        room.send(RoomMessageEventContent::text_markdown(&action.payload))
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::Send(e.to_string()))
    }
}

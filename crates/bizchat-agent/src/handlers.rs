// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response handlers, one per route.
//!
//! Handlers compute the replies for a message; the dispatcher delivers
//! them. Only the payment handler changes state.

use bizchat_core::BizchatError;
use bizchat_core::payment::PaymentMethod;
use bizchat_core::types::{Business, ChannelType, Conversation, OutboundMedia, StandardizedMessage};
use bizchat_router::Route;
use tracing::{debug, info};

use crate::context::AppContext;
use crate::replies::{self, CatalogItem};
use crate::sender::Reply;

/// What a handler knows about the message it answers.
#[derive(Debug, Clone, Copy)]
pub struct Inbound<'a> {
    pub message: &'a StandardizedMessage,
    pub conversation: &'a Conversation,
    pub business: &'a Business,
}

pub async fn handle(
    ctx: &AppContext,
    route: &Route,
    inbound: Inbound<'_>,
) -> Result<Vec<Reply>, BizchatError> {
    let channel = inbound.message.channel;
    let replies = match route {
        Route::Payment { amount } => handle_payment(ctx, inbound, *amount).await?,
        Route::Order => vec![Reply::text(replies::order_reply(
            channel,
            &catalogue(ctx, inbound.business).await?,
        ))],
        Route::Price => vec![Reply::text(replies::price_reply(
            channel,
            &catalogue(ctx, inbound.business).await?,
        ))],
        Route::Default => vec![Reply::text(replies::default_reply(channel))],
        Route::InvalidSelection { selection } => {
            debug!(selection = %selection, "menu selection out of range");
            vec![Reply::text(replies::invalid_selection())]
        }
        Route::Image => vec![Reply::text(replies::image_ack())],
        Route::Document => vec![Reply::text(replies::document_ack())],
        Route::Location => vec![Reply::text(replies::location_ack())],
        Route::Button { label } => vec![Reply::text(replies::button_echo(label))],
        Route::Template => vec![Reply::text(replies::template_ack())],
    };
    Ok(replies)
}

/// Products on file for the business, else the built-in catalogue.
async fn catalogue(ctx: &AppContext, business: &Business) -> Result<Vec<CatalogItem>, BizchatError> {
    let products = ctx.storage.list_products(&business.id).await?;
    if products.is_empty() {
        return Ok(replies::builtin_catalogue(&ctx.config.payment.currency));
    }
    Ok(products.into_iter().map(CatalogItem::from).collect())
}

/// Start a payment and answer with a QR code (chat channels paying by UPI)
/// or a payment link.
///
/// `amount` overrides the configured default, in major units.
async fn handle_payment(
    ctx: &AppContext,
    inbound: Inbound<'_>,
    amount: Option<i64>,
) -> Result<Vec<Reply>, BizchatError> {
    let amount = amount.unwrap_or(ctx.config.payment.default_amount);
    let session = ctx
        .payments
        .start_payment(
            inbound.business,
            Some(&inbound.conversation.id),
            &inbound.message.from,
            amount,
        )
        .await?;

    let channel = inbound.message.channel;
    let total = &session.transaction.amount;
    info!(
        transaction_id = %session.transaction.id,
        %channel,
        method = %session.method,
        amount = %total,
        "payment requested"
    );

    let replies = match (&session.qr_url, channel) {
        (Some(qr_url), ChannelType::WhatsApp) if session.method == PaymentMethod::Upi => vec![
            Reply::Media(OutboundMedia::Image {
                url: qr_url.clone(),
                caption: Some(replies::qr_caption(total, &inbound.business.name)),
            }),
            Reply::text(replies::scan_instructions(total)),
        ],
        _ => vec![Reply::text(replies::payment_link(
            channel,
            total,
            &inbound.business.name,
            &session.link,
        ))],
    };
    Ok(replies)
}

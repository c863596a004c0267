//! Checkout - turning a cart into an order payload
//!
//! [`OrderDraft`] is the payload handed to [`OrderBackend::create_order`]. It
//! copies the cart lines, so later cart mutations never reach a placed order.
//!
//! [`OrderBackend::create_order`]: crate::backend::OrderBackend::create_order

use crate::cart::CartSnapshot;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::order::{
    CartLineItem, DeliveryAddress, FeeBreakdown, OrderDocument, OrderStatus, PaymentMethod,
};
use shared::util::{now_millis, snowflake_id};

/// User choices collected at checkout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub payment_method: PaymentMethod,
    pub delivery_address: DeliveryAddress,
    pub courier_notes: String,
    pub tip: Decimal,
    pub discount: Decimal,
}

impl CheckoutDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_delivery_address(mut self, address: DeliveryAddress) -> Self {
        self.delivery_address = address;
        self
    }

    pub fn with_courier_notes(mut self, notes: impl Into<String>) -> Self {
        self.courier_notes = notes.into();
        self
    }

    pub fn with_tip(mut self, tip: Decimal) -> Self {
        self.tip = tip;
        self
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }
}

/// Order creation payload
///
/// Field names match [`OrderDocument`]; `status` is always `pending`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDraft {
    /// Provisional id, known before the backend answers
    pub local_id: i64,
    pub user_id: String,
    pub restaurant_id: String,
    pub items: Vec<CartLineItem>,
    pub payment_method: PaymentMethod,
    pub fees: FeeBreakdown,
    pub eta_minutes: u32,
    pub courier_notes: String,
    pub delivery_address: DeliveryAddress,
    pub status: OrderStatus,
    pub created_at: i64,
}

impl OrderDraft {
    /// Build a draft from the current cart contents
    pub fn from_cart(
        cart: &CartSnapshot,
        user_id: impl Into<String>,
        details: CheckoutDetails,
        config: &ClientConfig,
    ) -> ClientResult<Self> {
        if cart.items.is_empty() {
            return Err(ClientError::EmptyCart);
        }
        let restaurant_id = cart
            .restaurant_id
            .clone()
            .ok_or(ClientError::MissingRestaurant)?;

        let fees = FeeBreakdown::compute(
            cart.total_price,
            config.delivery_fee,
            config.service_fee,
            details.tip,
            details.discount,
        );

        Ok(Self {
            local_id: snowflake_id(),
            user_id: user_id.into(),
            restaurant_id,
            items: cart.items.clone(),
            payment_method: details.payment_method,
            fees,
            eta_minutes: config.eta_minutes,
            courier_notes: details.courier_notes,
            delivery_address: details.delivery_address,
            status: OrderStatus::Pending,
            created_at: now_millis(),
        })
    }

    /// Local copy of the order as the backend will store it under `order_id`
    pub fn echo(&self, order_id: impl Into<String>) -> OrderDocument {
        OrderDocument {
            id: order_id.into(),
            local_id: Some(self.local_id),
            user_id: self.user_id.clone(),
            restaurant_id: self.restaurant_id.clone(),
            items: self.items.clone(),
            display_items: Vec::new(),
            payment_method: self.payment_method,
            fees: self.fees,
            eta_minutes: self.eta_minutes,
            courier_notes: self.courier_notes.clone(),
            delivery_address: self.delivery_address.clone(),
            status: self.status.as_str().to_string(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

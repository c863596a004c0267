//! Order Flow Example
//!
//! Walks one order through the in-memory backend:
//! 1. Fill a cart and hit the restaurant lock
//! 2. Place the order
//! 3. Accept and deliver it from the restaurant board while the user tracks it
//!
//! Run: cargo run -p dish-client --example order_flow

use dish_client::{
    AffinityResolver, CartItemInput, CheckoutDetails, ClientConfig, Customization, FeedKind,
    InMemoryOrderBackend, ItemCatalog, OrderStatus, OrderStatusView, OrderingSession,
    RestaurantAliases, RestaurantOrderFeed,
};
use rust_decimal::Decimal;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = ClientConfig::from_env();
    dish_client::logger::init_logger(&config.log_level, config.log_json)?;

    let backend = InMemoryOrderBackend::new();
    let catalog = ItemCatalog::from_json_str(r#"{ "fries": "ada-pizza", "salad": "lombard-kitchen" }"#)?;
    let aliases = RestaurantAliases::new().with_restaurant("ada-pizza", ["Ada Pizza"]);
    let mut session = OrderingSession::new(
        "demo-user",
        Arc::new(backend.clone()),
        AffinityResolver::new(catalog, aliases),
        config,
    );

    let mut locks = session.cart().subscribe_locks();
    let cart = session.cart_mut();
    cart.add_item(
        CartItemInput::new("burger-1", "Burger", Decimal::from(12))
            .with_restaurant_id("Ada Pizza")
            .with_customizations(vec![Customization::new("bacon", "Bacon", Decimal::new(150, 2))]),
    );
    cart.add_item(CartItemInput::new("fries", "Fries", Decimal::from(4)));
    cart.add_item(CartItemInput::new("salad", "Salad", Decimal::from(9)));
    if let Ok(notice) = locks.try_recv() {
        println!("🔒 {}", notice.message);
    }
    println!(
        "🛒 {} items, {} total",
        session.cart().total_items(),
        session.cart().total_price()
    );

    let board = RestaurantOrderFeed::for_kind(Arc::new(backend.clone()), "ada-pizza", FeedKind::InFlight);
    board.start();

    let placed = session
        .place_order(CheckoutDetails::new().with_courier_notes("Ring twice"))
        .await?;
    println!("✅ Placed {} (local {})", placed.order_id, placed.local_id);

    let mut tracker = session.track_order(&placed);
    let mut updates = tracker.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let status = updates.borrow_and_update().status();
            println!("📦 Order status: {:?}", status);
        }
    });

    for order in board.orders() {
        println!("🍕 Board: {} with {} items, {}", order.id, order.item_count, order.total);
    }

    board.transition_order(&placed.order_id, OrderStatus::Accepted).await;
    tracker.wait_for_status(OrderStatusView::Confirmed).await?;
    board.transition_order(&placed.order_id, OrderStatus::Delivered).await;
    if let Some(error) = board.error() {
        println!("⚠️  {error}");
    }

    drop(tracker);
    printer.await?;
    Ok(())
}

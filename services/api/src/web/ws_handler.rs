//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a shopping session socket.
//! Client messages are handled one at a time against the session's cart; every
//! reply goes through a channel that a writer task drains into the socket.

use crate::web::{
    dto::{ItemDto, ProductDto, ReceiptDto},
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, SessionState},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{SinkExt, StreamExt};
use shopping_list_core::domain::{
    AuthUser, Notification, ShoppingListItem, Store, DEFAULT_LIST_NAME,
};
use shopping_list_core::processor::split_items;
use shopping_list_core::{Cart, CartError, PortError, QuantityChange};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type Outbox = UnboundedSender<ServerMessage>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, user: AuthUser) {
    info!(user_id = %user.id, "New WebSocket connection established");

    let (mut ws_sender, mut receiver) = socket.split();
    let (outbox, mut inbox) = mpsc::unbounded_channel::<ServerMessage>();
    let shutdown = CancellationToken::new();

    // --- 1. Writer Task ---
    let writer = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                let msg = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    msg = inbox.recv() => match msg {
                        Some(msg) => msg,
                        None => break,
                    },
                };
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize server message: {:?}", e);
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    debug!("Socket closed while sending.");
                    break;
                }
            }
        })
    };

    // --- 2. Main Message Loop ---
    let mut session = SessionState::new(&app_state, user);
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                handle_text_message(text.as_str(), &app_state, &mut session, &outbox).await;
            }
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- 3. Cleanup ---
    shutdown.cancel();
    if let Err(e) = writer.await {
        warn!("Writer task ended abnormally: {:?}", e);
    }
    info!(user_id = %session.user.id, "WebSocket connection closed.");
}

//=========================================================================================
// Message Dispatch
//=========================================================================================

fn send(outbox: &Outbox, msg: ServerMessage) {
    // The receiver only goes away once the socket is gone.
    let _ = outbox.send(msg);
}

fn notify(outbox: &Outbox, notification: Notification) {
    send(outbox, ServerMessage::Notification(notification.into()));
}

fn cart_snapshot(cart: &Cart) -> ServerMessage {
    ServerMessage::Cart {
        list_id: cart.list_id(),
        items: cart.items().iter().map(ItemDto::from).collect(),
        total: cart.total(),
    }
}

/// Helper function to handle the logic for different `ClientMessage` variants.
pub(crate) async fn handle_text_message(
    text: &str,
    app_state: &AppState,
    session: &mut SessionState,
    outbox: &Outbox,
) {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            send(
                outbox,
                ServerMessage::Error {
                    message: format!("Unrecognized message: {}", e),
                },
            );
            return;
        }
    };

    match client_msg {
        ClientMessage::SubmitList { text } => {
            submit_list(&text, app_state, session, outbox).await;
        }
        ClientMessage::UpdateQuantity { item_id, quantity } => {
            match session.cart.update_quantity(item_id, quantity) {
                Ok(QuantityChange::Updated) => send_item(&session.cart, item_id, outbox),
                Ok(QuantityChange::Unchanged) => {
                    debug!(item_id = %item_id, quantity, "Ignoring out-of-range quantity");
                }
                Err(e) => send_cart_error(e, outbox),
            }
        }
        ClientMessage::SelectAlternative {
            item_id,
            product_id,
        } => {
            let Some(product) = app_state.catalog().get(&product_id).cloned() else {
                send(
                    outbox,
                    ServerMessage::Error {
                        message: format!("Unknown product {}", product_id),
                    },
                );
                return;
            };
            match session.cart.select_alternative(item_id, product) {
                Ok(()) => send_item(&session.cart, item_id, outbox),
                Err(e) => send_cart_error(e, outbox),
            }
        }
        ClientMessage::RequestAlternatives { item_id } => match session.cart.get(item_id) {
            Some(item) => {
                let products = app_state
                    .processor
                    .matcher()
                    .alternatives(item)
                    .iter()
                    .map(ProductDto::from)
                    .collect();
                send(outbox, ServerMessage::Alternatives { item_id, products });
            }
            None => send_cart_error(CartError::ItemNotFound(item_id), outbox),
        },
        ClientMessage::LoadList { list_id } => {
            load_list(list_id, app_state, session, outbox).await;
        }
        ClientMessage::Reset => {
            session.cart.reset();
            send(outbox, cart_snapshot(&session.cart));
        }
        ClientMessage::Checkout { store } => match store.parse::<Store>() {
            Ok(store) => checkout(store, app_state, session, outbox).await,
            Err(e) => send(
                outbox,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            ),
        },
    }
}

fn send_item(cart: &Cart, item_id: Uuid, outbox: &Outbox) {
    if let Some(item) = cart.get(item_id) {
        send(
            outbox,
            ServerMessage::ItemUpdated {
                item: ItemDto::from(item),
            },
        );
    }
}

fn send_cart_error(e: CartError, outbox: &Outbox) {
    send(
        outbox,
        ServerMessage::Error {
            message: e.to_string(),
        },
    );
}

//=========================================================================================
// Session Operations
//=========================================================================================

async fn submit_list(text: &str, app_state: &AppState, session: &mut SessionState, outbox: &Outbox) {
    let notifier = |n: Notification| notify(outbox, n);

    if split_items(text).is_empty() {
        // Nothing to classify; the processor only reports the empty list.
        app_state.processor.process(text, None, None, &notifier, |_| {}).await;
        return;
    }

    let user_id = session.user.id;
    session.cart.reset();

    // 1. Look up the preferred store for matching
    let preferred_store = match app_state.db.fetch_user_preferences(user_id).await {
        Ok(prefs) => prefs.and_then(|p| p.preferred_store.as_store()),
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Could not load preferences, matching without a store");
            None
        }
    };

    // 2. Create the list the items will be saved under
    match app_state.db.create_shopping_list(user_id, DEFAULT_LIST_NAME).await {
        Ok(list) => session.cart.attach_list(list.id),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to create shopping list");
            notify(
                outbox,
                Notification::error(
                    "Could not save list",
                    "Your items will be processed but not saved.",
                ),
            );
        }
    }

    // 3. Stream every item through the processor
    let cart = &mut session.cart;
    let items = app_state
        .processor
        .process(text, preferred_store, Some(user_id), &notifier, |item: &ShoppingListItem| {
            send(outbox, ServerMessage::ItemUpdated { item: item.into() });
            if cart.apply_update(item.clone()) && !item.is_processing {
                cart.persist_in_background();
            }
        })
        .await;

    info!(user_id = %user_id, count = items.len(), "Shopping list processed");
    send(
        outbox,
        ServerMessage::ListProcessed {
            list_id: session.cart.list_id(),
            items: items.iter().map(ItemDto::from).collect(),
        },
    );
}

async fn fetch_owned_items(
    app_state: &AppState,
    user_id: Uuid,
    list_id: Uuid,
) -> Result<Vec<ShoppingListItem>, PortError> {
    let list = app_state.db.get_shopping_list(list_id).await?;
    if list.user_id != user_id {
        return Err(PortError::NotFound(format!("Shopping list {} not found", list_id)));
    }
    app_state.db.fetch_shopping_list_items(list_id).await
}

async fn load_list(list_id: Uuid, app_state: &AppState, session: &mut SessionState, outbox: &Outbox) {
    let loaded = fetch_owned_items(app_state, session.user.id, list_id).await;

    match loaded {
        Ok(items) => {
            session.cart.load(list_id, items);
            send(outbox, cart_snapshot(&session.cart));
        }
        Err(e) => {
            warn!(list_id = %list_id, error = %e, "Failed to load shopping list");
            notify(
                outbox,
                Notification::error("Could not load list", e.to_string()),
            );
        }
    }
}

async fn checkout(store: Store, app_state: &AppState, session: &mut SessionState, outbox: &Outbox) {
    match app_state.checkout.checkout(session.cart.items(), store).await {
        Ok(receipt) => {
            info!(order_id = %receipt.order_id, user_id = %session.user.id, "Checkout complete");
            notify(
                outbox,
                Notification::info(
                    "Order placed",
                    format!("Your {} order is on its way.", store),
                ),
            );
            send(
                outbox,
                ServerMessage::CheckoutComplete {
                    receipt: ReceiptDto::from(receipt),
                },
            );
            session.cart.reset();
            send(outbox, cart_snapshot(&session.cart));
        }
        Err(e) => {
            warn!(store = %store, error = %e, "Checkout failed");
            notify(outbox, Notification::error("Checkout failed", e.to_string()));
        }
    }
}

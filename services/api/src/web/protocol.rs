//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for an interactive shopping session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::web::dto::{ItemDto, NotificationDto, ProductDto, ReceiptDto};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Raw list text; items are separated by commas or newlines.
    SubmitList { text: String },

    /// Sets the quantity of one item. Values below 1 or above the cap are
    /// ignored, so the field accepts any integer.
    UpdateQuantity { item_id: Uuid, quantity: i64 },

    /// Swaps the matched product of an item for another catalog product.
    SelectAlternative { item_id: Uuid, product_id: String },

    RequestAlternatives { item_id: Uuid },

    /// Replaces the cart with a previously saved list.
    LoadList { list_id: Uuid },

    /// Clears the cart and starts over.
    Reset,

    Checkout { store: String },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// An item was added or changed. Sent once pending and once settled while
    /// a list is being processed, and after every user edit.
    ItemUpdated { item: ItemDto },

    /// Every item of the submitted list has settled.
    ListProcessed {
        list_id: Option<Uuid>,
        items: Vec<ItemDto>,
    },

    Alternatives {
        item_id: Uuid,
        products: Vec<ProductDto>,
    },

    /// A full snapshot of the cart.
    Cart {
        list_id: Option<Uuid>,
        items: Vec<ItemDto>,
        total: f64,
    },

    CheckoutComplete { receipt: ReceiptDto },

    /// A user-visible toast.
    Notification(NotificationDto),

    /// Reports a problem with a client message that did not change any state.
    Error { message: String },
}

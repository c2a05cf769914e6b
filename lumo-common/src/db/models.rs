//! Row types for the shop collections.

use serde::{Deserialize, Serialize};

/// One slot of a product's image gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub id: String,
    pub product_id: String,
    pub slot: i64,
    pub image_url: String,
    pub caption: Option<String>,
}

/// One slide of the storefront slideshow.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideshowSlide {
    pub id: String,
    pub position: i64,
    pub image_url: String,
}

/// One line item inside `orders.items` (stored as a JSON array).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i64,
    /// Snapshot of the product image at order time, when one was attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

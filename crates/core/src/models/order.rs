//! Orders placed through checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{OrderId, OrderStatus, Price, ProductId, Size, UserId};

/// A product line frozen into an order at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Price,
    pub size: Size,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user_id: UserId,
    pub products: Vec<OrderLine>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub address: String,
    #[serde(default)]
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

/// A line of an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub size: Size,
    pub quantity: u32,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub products: Vec<NewOrderLine>,
    pub address: String,
}

/// Shipping address as entered at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

impl ShippingAddress {
    /// The single-line form the backend stores.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{}, {}, {}",
            self.street.trim(),
            self.city.trim(),
            self.postal_code.trim()
        )
    }

    /// True when any part is blank.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        [&self.street, &self.city, &self.postal_code]
            .iter()
            .any(|part| part.trim().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_line() {
        let address = ShippingAddress {
            street: " 12 Mall Road ".to_string(),
            city: "Lahore".to_string(),
            postal_code: "54000".to_string(),
        };
        assert_eq!(address.to_line(), "12 Mall Road, Lahore, 54000");
        assert!(!address.is_incomplete());

        let blank_city = ShippingAddress {
            city: "  ".to_string(),
            ..address
        };
        assert!(blank_city.is_incomplete());
    }

    #[test]
    fn test_order_deserialize() {
        let json = r#"{
            "_id": "o1",
            "userId": "u1",
            "products": [{"productId": "p1", "productName": "Tee", "quantity": 2, "price": 1500, "size": "Small"}],
            "totalAmount": 3000,
            "status": "Delivered",
            "address": "12 Mall Road, Lahore, 54000",
            "paymentMethod": "Cash on Delivery",
            "createdAt": "2024-06-01T12:00:00.000Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.products[0].size, Size::Small);
        assert_eq!(order.total_amount, Price::from_rupees(3000));
    }

    #[test]
    fn test_new_order_wire_shape() {
        let order = NewOrder {
            products: vec![NewOrderLine {
                product_id: ProductId::new("p1"),
                size: Size::ExtraLarge,
                quantity: 1,
            }],
            address: "a, b, c".to_string(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["products"][0]["productId"], "p1");
        assert_eq!(json["products"][0]["size"], "Extra Large");
    }
}

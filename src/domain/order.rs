//! Order confirmation payload and message rendering.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: Option<String>,
    pub image: Option<String>,
    pub image_url: Option<String>,
}

impl OrderItem {
    fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Item")
    }

    fn image(&self) -> &str {
        self.image
            .as_deref()
            .or(self.image_url.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub name: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Order confirmation request. Fields are optional on the wire so that
/// every missing one can be reported at once.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    #[schema(example = "buyer@example.com")]
    pub email: Option<String>,
    #[schema(example = "ORD-10293")]
    pub order_id: Option<String>,
    pub items: Option<Vec<OrderItem>>,
    pub address: Option<DeliveryAddress>,
}

/// Rendered confirmation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl OrderConfirmation {
    /// List every problem with the payload; empty when valid.
    pub fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if blank(&self.email) {
            problems.push("email is required");
        }
        if blank(&self.order_id) {
            problems.push("orderId is required");
        }
        if self.items.as_ref().map_or(true, Vec::is_empty) {
            problems.push("items are required");
        }
        problems
    }

    /// Validate and render the confirmation email.
    pub fn render(&self) -> AppResult<ConfirmationMessage> {
        let problems = self.problems();
        if !problems.is_empty() {
            return Err(AppError::validation(format!(
                "Invalid payload: {}",
                problems.join(", ")
            )));
        }

        let email = self.email.as_deref().unwrap_or_default().trim();
        let order_id = self.order_id.as_deref().unwrap_or_default().trim();
        let items = self.items.as_deref().unwrap_or_default();

        let rows: String = items
            .iter()
            .map(|item| {
                let name = escape_html(item.display_name());
                format!(
                    "<tr><td><img src=\"{}\" alt=\"{}\" width=\"64\" height=\"64\" /></td><td>{}</td></tr>",
                    escape_html(item.image()),
                    name,
                    name
                )
            })
            .collect();

        let address = self
            .address
            .as_ref()
            .map(render_address)
            .unwrap_or_default();

        let html = format!(
            "<div style=\"font-family:Arial,Helvetica,sans-serif;\">\
             <h2>Your order is confirmed</h2>\
             <p>Thanks for shopping with us. Your order has been placed successfully.</p>\
             <p>Order ID: <strong>{}</strong></p>{}\
             <table><thead><tr><th>Image</th><th>Product</th></tr></thead><tbody>{}</tbody></table>\
             <p>We'll notify you when your order ships.</p></div>",
            escape_html(order_id),
            address,
            rows
        );

        Ok(ConfirmationMessage {
            to: email.to_string(),
            subject: format!("Order Confirmed • {}", order_id),
            html,
            text: format!("Your order {} is confirmed.", order_id),
        })
    }
}

fn render_address(address: &DeliveryAddress) -> String {
    let part = |v: &Option<String>| escape_html(v.as_deref().unwrap_or_default());
    let mut lines = Vec::new();
    if let Some(name) = address.name.as_deref().filter(|n| !n.is_empty()) {
        lines.push(escape_html(name));
    }
    let mut street = part(&address.line1);
    if let Some(line2) = address.line2.as_deref().filter(|l| !l.is_empty()) {
        street.push_str(", ");
        street.push_str(&escape_html(line2));
    }
    lines.push(street);
    let mut city = part(&address.city);
    if let Some(state) = address.state.as_deref().filter(|s| !s.is_empty()) {
        city.push_str(", ");
        city.push_str(&escape_html(state));
    }
    city.push(' ');
    city.push_str(&part(&address.postal_code));
    lines.push(city.trim().to_string());
    lines.push(part(&address.country));

    format!(
        "<p><strong>Delivery Address</strong><br/>{}</p>",
        lines.join("<br/>")
    )
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Minimal HTML escaping for user-supplied text.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> OrderConfirmation {
        serde_json::from_value(serde_json::json!({
            "email": "buyer@example.com",
            "orderId": "ORD-1",
            "items": [{"name": "Ruby <Ring>", "imageUrl": "https://img/r.png"}, {}],
            "address": {"name": "Sam", "line1": "1 Main St", "city": "Springfield", "postalCode": "12345", "country": "US"}
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_payload_reports_all_problems() {
        let problems = OrderConfirmation::default().problems();
        assert_eq!(
            problems,
            vec!["email is required", "orderId is required", "items are required"]
        );
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut o = order();
        o.items = Some(Vec::new());
        let err = o.render().unwrap_err();
        assert_eq!(err.to_string(), "Invalid payload: items are required");
    }

    #[test]
    fn test_render_escapes_and_fills_defaults() {
        let msg = order().render().unwrap();
        assert_eq!(msg.to, "buyer@example.com");
        assert_eq!(msg.subject, "Order Confirmed • ORD-1");
        assert_eq!(msg.text, "Your order ORD-1 is confirmed.");
        assert!(msg.html.contains("Ruby &lt;Ring&gt;"));
        assert!(msg.html.contains("https://img/r.png"));
        assert!(msg.html.contains("<td>Item</td>"));
        assert!(msg.html.contains("Springfield 12345"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a&b\"'"), "a&amp;b&quot;&#39;");
    }
}

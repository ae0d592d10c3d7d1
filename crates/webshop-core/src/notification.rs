//! # Order Notifications
//!
//! Builds the status emails sent when an order is created, paid or shipped.
//! Composition only: delivery is the API layer's fire-and-forget task.

use serde::Serialize;

use crate::types::{Order, OrderLineItem, OrderStatus};

/// An outgoing email: subject, plaintext body, recipients, optional HTML body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub subject: String,
    pub text_body: String,
    pub recipients: Vec<String>,
    pub html_body: Option<String>,
}

impl EmailMessage {
    /// Drops blank recipients. Delivery is skipped when none remain.
    pub fn deliverable_recipients(&self) -> Vec<&str> {
        self.recipients
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect()
    }
}

/// Composes the email matching the order's current status, with the
/// subject `Order #<id>`.
pub fn order_status_email(order: &Order, items: &[OrderLineItem]) -> EmailMessage {
    let subject = format!("Order #{}", order.id);

    let headline = match order.status() {
        OrderStatus::Paid => "We have received your payment.",
        OrderStatus::Shipped => "Your order is on its way.",
        OrderStatus::Created => "Thank you for your order.",
    };

    let mut text_body = format!("{subject}\n\n{headline}\n\n");
    let mut rows = String::new();
    for item in items {
        text_body.push_str(&format!(
            "{} x {} @ {}\n",
            item.quantity, item.name, item.price
        ));
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            item.quantity,
            escape_html(&item.name),
            item.price
        ));
    }
    text_body.push_str(&format!(
        "\nSubtotal: {}\nVAT: {}\nTotal: {}\n",
        order.subtotal, order.vat, order.total
    ));

    let html_body = format!(
        "<h1>{}</h1><p>{}</p><table>{}</table>\
         <p>Subtotal: {}<br>VAT: {}<br>Total: {}</p>",
        escape_html(&subject),
        headline,
        rows,
        order.subtotal,
        order.vat,
        order.total
    );

    EmailMessage {
        subject,
        text_body,
        recipients: order.email.iter().cloned().collect(),
        html_body: Some(html_body),
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

//! Order service - transactional confirmation emails.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::OrderConfirmation;
use crate::errors::AppResult;
use crate::infra::{Mailer, OutgoingEmail};

#[async_trait]
pub trait OrderService: Send + Sync {
    /// Validate the order payload and mail the confirmation.
    async fn send_order_confirmation(&self, order: OrderConfirmation) -> AppResult<()>;
}

pub struct OrderNotifier {
    mailer: Arc<dyn Mailer>,
}

impl OrderNotifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl OrderService for OrderNotifier {
    async fn send_order_confirmation(&self, order: OrderConfirmation) -> AppResult<()> {
        let message = order.render()?;
        tracing::debug!(to = %message.to, "Sending order confirmation");
        self.mailer.send(OutgoingEmail::from(message)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderItem;
    use crate::errors::AppError;
    use crate::infra::MockMailer;

    fn order() -> OrderConfirmation {
        OrderConfirmation {
            email: Some("buyer@example.com".to_string()),
            order_id: Some("ORD-42".to_string()),
            items: Some(vec![OrderItem {
                name: Some("Pearl Necklace".to_string()),
                image: None,
                image_url: Some("https://cdn.example.com/pearl.jpg".to_string()),
            }]),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_sends_rendered_confirmation() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| {
                email.to == "buyer@example.com"
                    && email.subject.contains("ORD-42")
                    && email.html.contains("Pearl Necklace")
            })
            .times(1)
            .returning(|_| Ok(()));

        OrderNotifier::new(Arc::new(mailer))
            .send_order_confirmation(order())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_payload_is_not_sent() {
        let mut mailer = MockMailer::new();
        mailer.expect_send().never();

        let err = OrderNotifier::new(Arc::new(mailer))
            .send_order_confirmation(OrderConfirmation {
                items: Some(Vec::new()),
                ..order()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("items are required")));
    }

    #[tokio::test]
    async fn test_mail_failure_propagates() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_| Err(AppError::internal("smtp down")));

        let err = OrderNotifier::new(Arc::new(mailer))
            .send_order_confirmation(order())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}

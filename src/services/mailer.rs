use async_trait::async_trait;

use crate::errors::AppResult;

/// Outbound mail. Delivery itself lives outside this service.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_link: &str) -> AppResult<()>;
}

/// Writes reset links to the log instead of sending them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, reset_link: &str) -> AppResult<()> {
        log::info!("Password reset link for {}: {}", to, reset_link);
        Ok(())
    }
}

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Environment;
use crate::database::models::User;

#[derive(Debug, Error)]
#[error("failed to deliver reset code: {0}")]
pub struct DeliveryError(pub String);

/// Delivers password reset codes to users out of band
#[async_trait]
pub trait ResetCodeNotifier: Send + Sync {
    async fn send_reset_code(&self, user: &User, code: &str) -> Result<(), DeliveryError>;
}

/// Records code issuance in the application log. Used until a mail transport
/// is configured. The code itself is only logged, at `debug`, in development.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier {
    reveal_codes: bool,
}

impl LogNotifier {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            reveal_codes: environment == Environment::Development,
        }
    }

    fn shown_code<'a>(&self, code: &'a str) -> Option<&'a str> {
        self.reveal_codes.then_some(code)
    }
}

#[async_trait]
impl ResetCodeNotifier for LogNotifier {
    async fn send_reset_code(&self, user: &User, code: &str) -> Result<(), DeliveryError> {
        tracing::info!(user_id = %user.id, "Password reset code issued");
        if let Some(code) = self.shown_code(code) {
            tracing::debug!(email = %user.email, code = %code, "Reset code for local delivery");
        }
        Ok(())
    }
}

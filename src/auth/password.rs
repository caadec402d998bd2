use thiserror::Error;
use tokio::task::{self, JoinError};

use crate::config;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error(transparent)]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Join(#[from] JoinError),
}

// bcrypt runs on the blocking pool

pub async fn hash_password(password: String) -> Result<String, PasswordError> {
    let cost = config::config().security.bcrypt_cost;
    Ok(task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    Ok(task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("correct horse".to_string()).await.unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("battery staple".to_string(), hash).await.unwrap());
    }
}

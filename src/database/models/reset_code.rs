use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

pub const RESET_CODE_LEN: usize = 6;

/// Wrong guesses a code survives; the next one discards it
pub const MAX_RESET_ATTEMPTS: i32 = 5;

/// One outstanding password reset code per user, stored as a SHA-256 digest
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ResetCode {
    pub user_id: Uuid,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    /// Wrong guesses so far
    pub attempts: i32,
}

/// Outcome of presenting a code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    Accepted,
    /// Wrong guess; the code stays usable with its attempt count bumped
    Rejected,
    /// Expired or out of attempts; the code must be discarded
    Spent,
}

impl ResetCode {
    pub fn new(user_id: Uuid, code: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id,
            code_hash: digest(code),
            expires_at: now + ttl,
            attempts: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True when `code` matches and the code has not expired
    pub fn accepts(&self, code: &str, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && digest(code) == self.code_hash
    }

    /// Judge one guess, counting it against the code when wrong
    pub fn redeem(&mut self, code: &str, now: DateTime<Utc>) -> Redemption {
        if self.is_expired(now) || self.attempts >= MAX_RESET_ATTEMPTS {
            return Redemption::Spent;
        }
        if self.accepts(code, now) {
            return Redemption::Accepted;
        }

        self.attempts += 1;
        if self.attempts >= MAX_RESET_ATTEMPTS {
            Redemption::Spent
        } else {
            Redemption::Rejected
        }
    }
}

/// Six random decimal digits
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

fn digest(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), RESET_CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn accepts_matching_code_until_expiry() {
        let now = Utc::now();
        let code = ResetCode::new(Uuid::new_v4(), "123456", now, Duration::minutes(10));

        assert_ne!(code.code_hash, "123456");
        assert!(code.accepts("123456", now));
        assert!(!code.accepts("654321", now));
        assert!(!code.accepts("123456", now + Duration::minutes(10)));
    }

    #[test]
    fn wrong_guesses_use_up_the_code() {
        let now = Utc::now();
        let mut code = ResetCode::new(Uuid::new_v4(), "123456", now, Duration::minutes(10));

        for _ in 1..MAX_RESET_ATTEMPTS {
            assert_eq!(code.redeem("000000", now), Redemption::Rejected);
        }
        assert_eq!(code.redeem("000000", now), Redemption::Spent);
        assert_eq!(code.attempts, MAX_RESET_ATTEMPTS);
        assert_eq!(code.redeem("123456", now), Redemption::Spent);
    }

    #[test]
    fn correct_guess_is_accepted_after_a_few_misses() {
        let now = Utc::now();
        let mut code = ResetCode::new(Uuid::new_v4(), "123456", now, Duration::minutes(10));

        assert_eq!(code.redeem("111111", now), Redemption::Rejected);
        assert_eq!(code.redeem("123456", now), Redemption::Accepted);
        assert_eq!(code.redeem("123456", now + Duration::minutes(11)), Redemption::Spent);
    }
}

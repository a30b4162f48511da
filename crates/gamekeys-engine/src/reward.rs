//! Balance credits for trivia rewards.

use gamekeys_core::{apply_delta, Account, Result, ShopError, TriviaQuestion, UserId};
use gamekeys_store::AccountLedger;

use crate::cas::{read_modify_write, Change};

/// Credits rewards to accounts.
///
/// Every call pays out. Callers that must not reward the same answer twice
/// have to track answer events themselves.
#[derive(Debug, Clone)]
pub struct RewardEngine {
    accounts: AccountLedger,
    trivia_reward: u32,
    max_attempts: u32,
}

impl RewardEngine {
    /// Create an engine paying `trivia_reward` per correct answer.
    #[must_use]
    pub fn new(accounts: AccountLedger, trivia_reward: u32, max_attempts: u32) -> Self {
        Self {
            accounts,
            trivia_reward,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Add `amount` to the user's balance.
    ///
    /// Purchase history and total spend are untouched.
    ///
    /// # Errors
    ///
    /// - `ShopError::UnknownUser` if the account does not exist.
    /// - `ShopError::Contention` / `ShopError::StoreFailure` from the store.
    pub fn credit_reward(&self, user_id: &UserId, amount: u32) -> Result<Account> {
        let account = read_modify_write(&self.accounts, self.max_attempts, |accounts| {
            let current = accounts
                .get(user_id)
                .ok_or_else(|| ShopError::UnknownUser {
                    user_id: user_id.to_string(),
                })?;
            let updated = apply_delta(current, i64::from(amount), None)?;
            accounts.put(updated.clone());
            Ok(Change::Write(updated))
        })?;

        tracing::info!(
            user_id = %user_id,
            amount,
            balance = account.balance,
            "Reward credited"
        );

        Ok(account)
    }

    /// Grade an answer and credit the trivia reward if it is correct.
    ///
    /// Returns `Ok(None)` for a wrong answer; nothing is written.
    ///
    /// # Errors
    ///
    /// Same as [`RewardEngine::credit_reward`].
    pub fn reward_answer(
        &self,
        user_id: &UserId,
        question: &TriviaQuestion,
        answer: &str,
    ) -> Result<Option<Account>> {
        if !question.is_correct(answer) {
            tracing::debug!(user_id = %user_id, "Wrong trivia answer, no reward");
            return Ok(None);
        }

        self.credit_reward(user_id, self.trivia_reward).map(Some)
    }

    /// The reward paid per correct answer.
    #[must_use]
    pub const fn trivia_reward(&self) -> u32 {
        self.trivia_reward
    }
}

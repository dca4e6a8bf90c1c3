//! Nullable treasury: records fee transfers, optionally refuses them.

use crate::lock;
use civitas_governance::{Treasury, TreasuryError};
use civitas_types::{Address, Amount};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

#[derive(Debug, Default)]
pub struct NullTreasury {
    transfers: Mutex<Vec<Transfer>>,
    rejection: Mutex<Option<String>>,
    /// Accounts with a tracked balance. Accounts missing here are unlimited.
    balances: Mutex<HashMap<Address, Amount>>,
}

impl NullTreasury {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every transfer with `reason` until [`accept`](Self::accept).
    pub fn reject_with(&self, reason: impl Into<String>) {
        *lock(&self.rejection) = Some(reason.into());
    }

    pub fn accept(&self) {
        *lock(&self.rejection) = None;
    }

    /// Give `account` a finite balance; transfers from it beyond that fail.
    pub fn set_balance(&self, account: Address, amount: Amount) {
        lock(&self.balances).insert(account, amount);
    }

    /// Tracked balance of `account`, `None` when unlimited.
    pub fn balance_of(&self, account: &Address) -> Option<Amount> {
        lock(&self.balances).get(account).copied()
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        lock(&self.transfers).clone()
    }

    /// Total forwarded to `account`.
    pub fn received_by(&self, account: &Address) -> Amount {
        lock(&self.transfers)
            .iter()
            .filter(|t| &t.to == account)
            .fold(Amount::ZERO, |sum, t| sum.checked_add(t.amount).unwrap_or(sum))
    }
}

impl Treasury for NullTreasury {
    fn forward(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TreasuryError> {
        if let Some(reason) = lock(&self.rejection).clone() {
            return Err(TreasuryError::Rejected(reason));
        }
        {
            let mut balances = lock(&self.balances);
            if let Some(available) = balances.get(from).copied() {
                let rest = available
                    .checked_sub(amount)
                    .ok_or(TreasuryError::InsufficientBalance {
                        needed: amount,
                        available,
                    })?;
                balances.insert(*from, rest);
            }
            if let Some(held) = balances.get_mut(to) {
                *held = held.checked_add(amount).unwrap_or(*held);
            }
        }
        lock(&self.transfers).push(Transfer {
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_balance_limits_transfers() {
        let treasury = NullTreasury::new();
        let (payer, sink) = (Address::from_low_u64(1), Address::from_low_u64(2));
        treasury.set_balance(payer, Amount::new(10));
        treasury.set_balance(sink, Amount::ZERO);

        treasury.forward(&payer, &sink, Amount::new(6)).unwrap();
        assert_eq!(treasury.balance_of(&payer), Some(Amount::new(4)));
        assert_eq!(treasury.balance_of(&sink), Some(Amount::new(6)));

        match treasury.forward(&payer, &sink, Amount::new(5)) {
            Err(TreasuryError::InsufficientBalance { needed, available }) => {
                assert_eq!(needed, Amount::new(5));
                assert_eq!(available, Amount::new(4));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(treasury.transfers().len(), 1);
        assert_eq!(treasury.balance_of(&payer), Some(Amount::new(4)));
    }

    #[test]
    fn untracked_accounts_are_unlimited() {
        let treasury = NullTreasury::new();
        let (payer, sink) = (Address::from_low_u64(1), Address::from_low_u64(2));
        treasury.forward(&payer, &sink, Amount::new(u128::MAX)).unwrap();
        assert_eq!(treasury.balance_of(&payer), None);
        assert_eq!(treasury.received_by(&sink), Amount::new(u128::MAX));
    }
}

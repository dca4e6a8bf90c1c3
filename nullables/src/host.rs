//! Nullable call host: stages calls per transaction and records what was
//! committed.

use crate::lock;
use civitas_governance::{CallError, CallHost};
use civitas_types::{Address, Amount};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub target: Address,
    pub value: Amount,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct NullCallHost {
    staged: Mutex<Vec<RecordedCall>>,
    committed: Mutex<Vec<RecordedCall>>,
    reverting: Mutex<HashSet<Address>>,
    rollbacks: Mutex<usize>,
    /// Value the host can still send; `None` is unlimited.
    funds: Mutex<Option<Amount>>,
}

impl NullCallHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `target` revert.
    pub fn revert_calls_to(&self, target: Address) {
        lock(&self.reverting).insert(target);
    }

    pub fn allow_calls_to(&self, target: &Address) {
        lock(&self.reverting).remove(target);
    }

    /// Limit the total value committed calls may carry.
    pub fn fund(&self, amount: Amount) {
        *lock(&self.funds) = Some(amount);
    }

    pub fn funds(&self) -> Option<Amount> {
        *lock(&self.funds)
    }

    /// Calls whose transaction was committed, in order.
    pub fn committed(&self) -> Vec<RecordedCall> {
        lock(&self.committed).clone()
    }

    pub fn rollbacks(&self) -> usize {
        *lock(&self.rollbacks)
    }
}

impl CallHost for NullCallHost {
    fn begin(&self) {
        lock(&self.staged).clear();
    }

    fn call(&self, target: &Address, value: Amount, payload: &[u8]) -> Result<(), CallError> {
        if lock(&self.reverting).contains(target) {
            return Err(CallError::Reverted(format!("{target} reverted")));
        }
        let mut staged = lock(&self.staged);
        if let Some(funds) = *lock(&self.funds) {
            let available = funds
                .checked_sub(staged_value(&staged))
                .unwrap_or(Amount::ZERO);
            if value > available {
                return Err(CallError::InsufficientValue {
                    needed: value,
                    available,
                });
            }
        }
        staged.push(RecordedCall {
            target: *target,
            value,
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn commit(&self) {
        let staged = std::mem::take(&mut *lock(&self.staged));
        if let Some(funds) = lock(&self.funds).as_mut() {
            *funds = funds
                .checked_sub(staged_value(&staged))
                .unwrap_or(Amount::ZERO);
        }
        lock(&self.committed).extend(staged);
    }

    fn rollback(&self) {
        lock(&self.staged).clear();
        *lock(&self.rollbacks) += 1;
    }
}

fn staged_value(calls: &[RecordedCall]) -> Amount {
    calls
        .iter()
        .fold(Amount::ZERO, |sum, c| sum.checked_add(c.value).unwrap_or(sum))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolled_back_calls_never_commit() {
        let host = NullCallHost::new();
        let target = Address::from_low_u64(1);

        host.begin();
        host.call(&target, Amount::new(5), b"a").unwrap();
        host.rollback();
        assert!(host.committed().is_empty());
        assert_eq!(host.rollbacks(), 1);

        host.begin();
        host.call(&target, Amount::new(5), b"b").unwrap();
        host.commit();
        assert_eq!(host.committed().len(), 1);
        assert_eq!(host.committed()[0].payload, b"b".to_vec());
    }

    #[test]
    fn reverting_target_fails() {
        let host = NullCallHost::new();
        let target = Address::from_low_u64(1);
        host.revert_calls_to(target);
        assert!(host.call(&target, Amount::ZERO, &[]).is_err());
        host.allow_calls_to(&target);
        assert!(host.call(&target, Amount::ZERO, &[]).is_ok());
    }

    #[test]
    fn funds_limit_value_across_a_transaction() {
        let host = NullCallHost::new();
        let target = Address::from_low_u64(1);
        host.fund(Amount::new(10));

        host.begin();
        host.call(&target, Amount::new(6), &[]).unwrap();
        match host.call(&target, Amount::new(5), &[]) {
            Err(CallError::InsufficientValue { needed, available }) => {
                assert_eq!(needed, Amount::new(5));
                assert_eq!(available, Amount::new(4));
            }
            other => panic!("unexpected: {other:?}"),
        }
        host.rollback();
        assert_eq!(host.funds(), Some(Amount::new(10)));

        host.begin();
        host.call(&target, Amount::new(6), &[]).unwrap();
        host.commit();
        assert_eq!(host.funds(), Some(Amount::new(4)));
    }
}

//! Stake-weighted tally and the two-thirds quorum rule.
//!
//! The tally is computed once, at finalize time, from each voter's latest
//! record and the stake the staking oracle reports at that moment.

use crate::error::GovernanceError;
use crate::oracle::StakingOracle;
use crate::voting::{VoteBook, VoteChoice};
use civitas_types::{Amount, ProposalId};
use serde::{Deserialize, Serialize};

/// Count and summed stake for one choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceTally {
    pub count: u64,
    pub stake: Amount,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingResult {
    pub yes: ChoiceTally,
    pub no: ChoiceTally,
    pub abstain: ChoiceTally,
}

impl VotingResult {
    fn bucket_mut(&mut self, choice: VoteChoice) -> &mut ChoiceTally {
        match choice {
            VoteChoice::Yes => &mut self.yes,
            VoteChoice::No => &mut self.no,
            VoteChoice::Abstain => &mut self.abstain,
        }
    }

    fn add(&mut self, choice: VoteChoice, stake: Amount) -> Result<(), GovernanceError> {
        let bucket = self.bucket_mut(choice);
        bucket.count = bucket.count.saturating_add(1);
        bucket.stake = bucket
            .stake
            .checked_add(stake)
            .ok_or(GovernanceError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn voter_count(&self) -> u64 {
        self.yes.count + self.no.count + self.abstain.count
    }

    /// Stake of everyone who voted, abstentions included.
    pub fn total_stake(&self) -> Result<Amount, GovernanceError> {
        self.yes
            .stake
            .checked_add(self.no.stake)
            .and_then(|s| s.checked_add(self.abstain.stake))
            .ok_or(GovernanceError::ArithmeticOverflow)
    }

    /// `yes * 3 >= total * 2`. Zero turnout passes (0 >= 0).
    pub fn quorum_reached(&self) -> Result<bool, GovernanceError> {
        let total = self.total_stake()?;
        let yes_weighted = self
            .yes
            .stake
            .checked_mul(3)
            .ok_or(GovernanceError::ArithmeticOverflow)?;
        let required = total
            .checked_mul(2)
            .ok_or(GovernanceError::ArithmeticOverflow)?;
        Ok(yes_weighted >= required)
    }
}

/// Sum the current stake of every distinct voter into their latest choice.
pub fn tally(
    book: &VoteBook,
    proposal: &ProposalId,
    staking: &dyn StakingOracle,
) -> Result<VotingResult, GovernanceError> {
    let mut result = VotingResult::default();
    for (voter, record) in book.ballots(proposal) {
        result.add(record.choice, staking.total_stake_of(voter))?;
    }
    Ok(result)
}

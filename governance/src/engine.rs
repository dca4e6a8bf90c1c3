//! The governance engine: every lifecycle operation, committed all-or-nothing.
//!
//! Operations are synchronous and take the caller and the current time
//! explicitly. Phase-gated operations first roll the scheduler forward if the
//! current window has ended; if the operation then fails, that rollover is
//! undone so the call leaves no trace. Events are staged while an operation
//! runs and only published once it has committed.

use crate::config::GovernanceConfig;
use crate::error::GovernanceError;
use crate::events::{EventBus, GovernanceEvent};
use crate::execution::{CallHost, Privileged};
use crate::oracle::{is_active_validator, StakingOracle, ValidatorOracle};
use crate::phase::{DaoPhase, Phase, PhaseScheduler, Rollover};
use crate::proposal::{GovernanceCall, Payload, Proposal, ProposalRequest, ProposalState};
use crate::registry::{ProposalRegistry, ProposalStatistic};
use crate::snapshot::GovernanceSnapshot;
use crate::tally::{tally, VotingResult};
use crate::treasury::Treasury;
use crate::voting::{VoteBook, VoteChoice, VoteRecord};
use civitas_store::GovernanceStore;
use civitas_types::{Address, Amount, ProposalId, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// External services the engine consults or drives.
#[derive(Clone)]
pub struct Collaborators {
    pub validators: Arc<dyn ValidatorOracle>,
    pub staking: Arc<dyn StakingOracle>,
    pub treasury: Arc<dyn Treasury>,
    pub host: Arc<dyn CallHost>,
}

pub struct GovernanceEngine {
    config: GovernanceConfig,
    create_proposal_fee: Amount,
    scheduler: PhaseScheduler,
    registry: ProposalRegistry,
    votes: VoteBook,
    results: HashMap<ProposalId, VotingResult>,
    collaborators: Collaborators,
    events: EventBus,
    /// Events of the operation in progress.
    pending: Vec<GovernanceEvent>,
}

impl GovernanceEngine {
    /// One-time setup. The first proposal window opens at `config.start_time`.
    pub fn initialize(
        config: GovernanceConfig,
        collaborators: Collaborators,
        now: Timestamp,
    ) -> Result<Self, GovernanceError> {
        config.validate(now)?;
        let scheduler = PhaseScheduler::new(
            config.start_time,
            config.phase_duration_secs,
            config.max_proposals_per_window,
        );
        info!(
            start = %config.start_time,
            duration_secs = config.phase_duration_secs,
            fee = %config.create_proposal_fee,
            fee_sink = %config.fee_sink,
            "governance initialized"
        );
        Ok(Self {
            create_proposal_fee: config.create_proposal_fee,
            scheduler,
            registry: ProposalRegistry::new(),
            votes: VoteBook::new(),
            results: HashMap::new(),
            collaborators,
            events: EventBus::new(),
            pending: Vec::new(),
            config,
        })
    }

    /// Rebuild an engine from persisted state.
    ///
    /// Fails when the persisted window or tracked list does not fit `config`.
    pub fn restore(
        config: GovernanceConfig,
        snapshot: GovernanceSnapshot,
        collaborators: Collaborators,
    ) -> Result<Self, GovernanceError> {
        let window = snapshot.phase;
        if window.start.saturating_add(config.phase_duration_secs) != window.end {
            return Err(GovernanceError::Config(format!(
                "persisted window {}..{} does not match phase_duration_secs {}",
                window.start, window.end, config.phase_duration_secs
            )));
        }
        if snapshot.tracked.len() > config.max_proposals_per_window {
            return Err(GovernanceError::Config(format!(
                "{} tracked proposals exceed max_proposals_per_window {}",
                snapshot.tracked.len(),
                config.max_proposals_per_window
            )));
        }

        let scheduler = PhaseScheduler::restore(
            window,
            snapshot.tracked,
            config.phase_duration_secs,
            config.max_proposals_per_window,
        );
        info!(phase = %window.phase, end = %window.end, "governance restored");
        Ok(Self {
            create_proposal_fee: snapshot.create_proposal_fee,
            scheduler,
            registry: ProposalRegistry::restore(snapshot.proposals, snapshot.statistic),
            votes: VoteBook::restore(snapshot.ballots),
            results: snapshot.results.into_iter().collect(),
            collaborators,
            events: EventBus::new(),
            pending: Vec::new(),
            config,
        })
    }

    pub fn load_from_store(
        config: GovernanceConfig,
        store: &dyn GovernanceStore,
        collaborators: Collaborators,
    ) -> Result<Self, GovernanceError> {
        let snapshot = GovernanceSnapshot::load(store)?;
        Self::restore(config, snapshot, collaborators)
    }

    pub fn snapshot(&self) -> GovernanceSnapshot {
        GovernanceSnapshot {
            phase: self.scheduler.current(),
            tracked: self.scheduler.tracked().to_vec(),
            statistic: self.registry.statistic(),
            create_proposal_fee: self.create_proposal_fee,
            proposals: self
                .registry
                .iter()
                .map(|(id, proposal)| (*id, proposal.clone()))
                .collect(),
            ballots: self
                .votes
                .proposals()
                .map(|id| {
                    let ballots = self
                        .votes
                        .ballots(id)
                        .map(|(voter, record)| (*voter, record.clone()))
                        .collect();
                    (*id, ballots)
                })
                .collect(),
            results: self.results.iter().map(|(id, r)| (*id, *r)).collect(),
        }
    }

    pub fn save_to_store(&self, store: &dyn GovernanceStore) -> Result<(), GovernanceError> {
        self.snapshot().save(store)
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&GovernanceEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    // ── Operations ─────────────────────────────────────────────────────────

    /// Create a proposal. `fee_paid` must equal the current creation fee
    /// exactly; it is forwarded to the fee sink.
    pub fn propose(
        &mut self,
        caller: Address,
        request: ProposalRequest,
        fee_paid: Amount,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        self.gated(now, |engine| {
            engine.scheduler.require(Phase::Proposal)?;
            request.validate(&engine.config.engine_address)?;
            if fee_paid != engine.create_proposal_fee {
                return Err(GovernanceError::InsufficientFunds {
                    paid: fee_paid,
                    required: engine.create_proposal_fee,
                });
            }
            if !engine.scheduler.has_capacity() {
                return Err(GovernanceError::ProposalsLimitExceeded {
                    limit: engine.scheduler.max_tracked(),
                });
            }
            let id = request.id();
            if engine.registry.exists(&id) {
                return Err(GovernanceError::AlreadyExists(id));
            }
            engine
                .collaborators
                .treasury
                .forward(&caller, &engine.config.fee_sink, fee_paid)
                .map_err(|e| GovernanceError::TransferFailed(e.to_string()))?;

            let proposal = request.into_proposal(caller);
            engine.pending.push(GovernanceEvent::ProposalCreated {
                id,
                proposer: caller,
                targets: proposal.targets.clone(),
                values: proposal.values.clone(),
                payloads: proposal.payloads.clone(),
                description: proposal.description.clone(),
            });
            let actions = proposal.targets.len();
            engine.registry.insert(id, proposal)?;
            engine.scheduler.track(id);

            info!(%id, proposer = %caller, actions, "proposal created");
            Ok(id)
        })
    }

    /// Withdraw a proposal before voting opens. Only its proposer may.
    pub fn cancel(
        &mut self,
        caller: Address,
        id: ProposalId,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        let reason = reason.into();
        self.gated(now, |engine| {
            let proposal = engine.registry.require(&id)?;
            if proposal.proposer != caller {
                return Err(GovernanceError::OnlyProposer);
            }
            let state = proposal.state;
            engine.scheduler.require(Phase::Proposal)?;
            expect_state(state, ProposalState::Created)?;

            engine.registry.set_state(&id, ProposalState::Canceled);
            engine.registry.record_canceled();
            info!(%id, reason = %reason, "proposal canceled");
            engine.pending.push(GovernanceEvent::ProposalCanceled {
                id,
                proposer: caller,
                reason,
            });
            Ok(())
        })
    }

    pub fn vote(
        &mut self,
        caller: Address,
        id: ProposalId,
        choice: VoteChoice,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        self.vote_with_reason(caller, id, choice, String::new(), now)
    }

    /// Record or replace the caller's vote. Only active validators may vote.
    pub fn vote_with_reason(
        &mut self,
        caller: Address,
        id: ProposalId,
        choice: VoteChoice,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        let reason = reason.into();
        self.gated(now, |engine| {
            let state = engine.registry.require(&id)?.state;
            engine.scheduler.require(Phase::Voting)?;
            if !is_active_validator(engine.collaborators.validators.as_ref(), &caller) {
                return Err(GovernanceError::OnlyValidators(caller));
            }
            expect_state(state, ProposalState::Active)?;

            let first = engine.votes.cast(
                id,
                caller,
                VoteRecord {
                    timestamp: now,
                    choice,
                    reason: reason.clone(),
                },
            );
            debug!(%id, voter = %caller, %choice, first, "vote cast");
            engine.pending.push(GovernanceEvent::VoteCast {
                id,
                voter: caller,
                choice,
                reason,
            });
            Ok(())
        })
    }

    /// Tally a proposal whose voting window has ended and resolve it.
    pub fn finalize(
        &mut self,
        caller: Address,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<ProposalState, GovernanceError> {
        self.gated(now, |engine| {
            let state = engine.registry.require(&id)?.state;
            engine.scheduler.require(Phase::Proposal)?;
            expect_state(state, ProposalState::VotingFinished)?;

            let result = tally(&engine.votes, &id, engine.collaborators.staking.as_ref())?;
            let accepted = result.quorum_reached()?;
            let outcome = if accepted {
                ProposalState::Accepted
            } else {
                ProposalState::Declined
            };

            engine.registry.set_state(&id, outcome);
            engine.registry.record_outcome(accepted);
            engine.results.insert(id, result);
            info!(
                %id,
                by = %caller,
                %outcome,
                voters = result.voter_count(),
                yes = %result.yes.stake,
                no = %result.no.stake,
                abstain = %result.abstain.stake,
                "proposal finalized"
            );
            engine.pending.push(GovernanceEvent::ProposalFinalized {
                id,
                state: outcome,
                result,
            });
            Ok(outcome)
        })
    }

    /// Run an accepted proposal's actions in order, as one unit.
    ///
    /// The proposal is marked `Executed` before the first call. If any action
    /// fails, the call host is rolled back, staged configuration changes are
    /// discarded and the proposal returns to `Accepted` so it can be retried.
    pub fn execute(&mut self, caller: Address, id: ProposalId) -> Result<(), GovernanceError> {
        let proposal = self.registry.require(&id)?;
        expect_state(proposal.state, ProposalState::Accepted)?;
        let actions: Vec<(Address, Amount, Payload)> = proposal
            .actions()
            .map(|a| (*a.target, a.value, a.payload.clone()))
            .collect();

        self.registry.set_state(&id, ProposalState::Executed);
        let fee_before = self.create_proposal_fee;
        let host = Arc::clone(&self.collaborators.host);
        let privileged = Privileged::issue();

        host.begin();
        for (index, (target, value, payload)) in actions.iter().enumerate() {
            let outcome = match payload {
                Payload::Call(data) => host.call(target, *value, data).map_err(|e| e.to_string()),
                Payload::Governance(call) => {
                    self.dispatch(&privileged, call).map_err(|e| e.to_string())
                }
            };
            if let Err(reason) = outcome {
                host.rollback();
                self.create_proposal_fee = fee_before;
                self.registry.set_state(&id, ProposalState::Accepted);
                self.pending.clear();
                warn!(%id, index, %target, reason = %reason, "execution rolled back");
                return Err(GovernanceError::ExecutionFailed { index, reason });
            }
        }
        host.commit();

        info!(%id, executor = %caller, actions = actions.len(), "proposal executed");
        self.pending.push(GovernanceEvent::ProposalExecuted {
            id,
            executor: caller,
        });
        self.publish();
        Ok(())
    }

    /// Roll the scheduler forward if the current window has ended. Returns
    /// whether a switch happened.
    pub fn advance(&mut self, now: Timestamp) -> bool {
        let rollover = self.roll(now);
        let switched = rollover.is_some();
        self.commit(rollover.as_ref());
        switched
    }

    /// Change the proposal creation fee. Only reachable from proposal
    /// execution.
    pub fn set_create_proposal_fee(
        &mut self,
        _privileged: &Privileged,
        fee: Amount,
    ) -> Result<(), GovernanceError> {
        if fee.is_zero() {
            return Err(GovernanceError::InvalidArgument(
                "create proposal fee must be greater than zero".into(),
            ));
        }
        let old = std::mem::replace(&mut self.create_proposal_fee, fee);
        info!(%old, new = %fee, "create proposal fee changed");
        self.pending
            .push(GovernanceEvent::CreateProposalFeeChanged { old, new: fee });
        Ok(())
    }

    fn dispatch(
        &mut self,
        privileged: &Privileged,
        call: &GovernanceCall,
    ) -> Result<(), GovernanceError> {
        match call {
            GovernanceCall::SetCreateProposalFee(fee) => {
                self.set_create_proposal_fee(privileged, *fee)
            }
        }
    }

    // ── Commit plumbing ────────────────────────────────────────────────────

    fn gated<T>(
        &mut self,
        now: Timestamp,
        op: impl FnOnce(&mut Self) -> Result<T, GovernanceError>,
    ) -> Result<T, GovernanceError> {
        let rollover = self.roll(now);
        match op(self) {
            Ok(value) => {
                self.commit(rollover.as_ref());
                Ok(value)
            }
            Err(err) => {
                if let Some(rollover) = rollover {
                    self.scheduler.revert(rollover, &mut self.registry);
                }
                self.pending.clear();
                debug!(error = %err, kind = ?err.kind(), "operation rejected");
                Err(err)
            }
        }
    }

    fn roll(&mut self, now: Timestamp) -> Option<Rollover> {
        let rollover = self.scheduler.advance(now, &mut self.registry)?;
        let DaoPhase { start, end, phase } = rollover.current;
        self.pending
            .push(GovernanceEvent::PhaseSwitched { phase, start, end });
        Some(rollover)
    }

    fn commit(&mut self, rollover: Option<&Rollover>) {
        if let Some(rollover) = rollover {
            info!(
                phase = %rollover.current.phase,
                start = %rollover.current.start,
                end = %rollover.current.end,
                moved = rollover.moved().count(),
                "phase switched"
            );
        }
        self.publish();
    }

    fn publish(&mut self) {
        for event in self.pending.drain(..) {
            self.events.emit(&event);
        }
    }

    // ── Queries ────────────────────────────────────────────────────────────

    pub fn proposal(&self, id: &ProposalId) -> Option<&Proposal> {
        self.registry.get(id)
    }

    pub fn exists(&self, id: &ProposalId) -> bool {
        self.registry.exists(id)
    }

    pub fn state_of(&self, id: &ProposalId) -> ProposalState {
        self.registry.state_of(id)
    }

    pub fn voters(&self, id: &ProposalId) -> &[Address] {
        self.votes.voters(id)
    }

    pub fn voter_count(&self, id: &ProposalId) -> usize {
        self.votes.voter_count(id)
    }

    pub fn vote_of(&self, id: &ProposalId, voter: &Address) -> Option<&VoteRecord> {
        self.votes.record(id, voter)
    }

    /// Available once the proposal has been finalized.
    pub fn voting_result(&self, id: &ProposalId) -> Option<&VotingResult> {
        self.results.get(id)
    }

    pub fn phase(&self) -> DaoPhase {
        self.scheduler.current()
    }

    pub fn statistic(&self) -> ProposalStatistic {
        self.registry.statistic()
    }

    pub fn create_proposal_fee(&self) -> Amount {
        self.create_proposal_fee
    }

    pub fn tracked_proposals(&self) -> &[ProposalId] {
        self.scheduler.tracked()
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }
}

fn expect_state(actual: ProposalState, expected: ProposalState) -> Result<(), GovernanceError> {
    if actual == expected {
        Ok(())
    } else {
        Err(GovernanceError::UnexpectedState { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::CallError;
    use crate::treasury::TreasuryError;
    use std::sync::Mutex;

    const WEEK: u64 = 604_800;

    /// Everyone is a validator with stake 1; transfers and calls succeed
    /// unless the target is `fail_target`.
    #[derive(Default)]
    struct Permissive {
        fail_target: Option<Address>,
        calls: Mutex<Vec<Address>>,
    }

    impl ValidatorOracle for Permissive {
        fn mining_identity_of(&self, staker: &Address) -> Option<Address> {
            Some(*staker)
        }

        fn active_validator_since(&self, _miner: &Address) -> Option<Timestamp> {
            Some(Timestamp::new(1))
        }
    }

    impl StakingOracle for Permissive {
        fn total_stake_of(&self, _account: &Address) -> Amount {
            Amount::new(1)
        }
    }

    impl Treasury for Permissive {
        fn forward(&self, _from: &Address, _to: &Address, _amount: Amount) -> Result<(), TreasuryError> {
            Ok(())
        }
    }

    impl CallHost for Permissive {
        fn begin(&self) {}

        fn call(&self, target: &Address, _value: Amount, _payload: &[u8]) -> Result<(), CallError> {
            if Some(*target) == self.fail_target {
                return Err(CallError::Reverted("boom".into()));
            }
            self.calls.lock().unwrap().push(*target);
            Ok(())
        }

        fn commit(&self) {}

        fn rollback(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    fn engine_address() -> Address {
        Address::from_low_u64(0xe0)
    }

    fn engine_with(fake: Arc<Permissive>) -> GovernanceEngine {
        let config = GovernanceConfig {
            engine_address: engine_address(),
            validator_oracle: Address::from_low_u64(0xa1),
            staking_oracle: Address::from_low_u64(0xa2),
            fee_sink: Address::from_low_u64(0xa3),
            create_proposal_fee: Amount::new(10),
            start_time: Timestamp::EPOCH,
            ..GovernanceConfig::default()
        };
        let collaborators = Collaborators {
            validators: fake.clone(),
            staking: fake.clone(),
            treasury: fake.clone(),
            host: fake,
        };
        GovernanceEngine::initialize(config, collaborators, Timestamp::EPOCH).unwrap()
    }

    fn request(payloads: Vec<(Address, Payload)>) -> ProposalRequest {
        let values = vec![Amount::ZERO; payloads.len()];
        let (targets, payloads) = payloads.into_iter().unzip();
        ProposalRequest {
            targets,
            values,
            payloads,
            description: "test".into(),
        }
    }

    /// Drive a proposal to `Accepted` with one yes vote.
    fn accepted(engine: &mut GovernanceEngine, req: ProposalRequest) -> ProposalId {
        let proposer = Address::from_low_u64(1);
        let id = engine.propose(proposer, req, Amount::new(10), Timestamp::new(1)).unwrap();
        assert!(engine.advance(Timestamp::new(WEEK)));
        engine
            .vote(proposer, id, VoteChoice::Yes, Timestamp::new(WEEK + 2))
            .unwrap();
        let end = engine.phase().end;
        let outcome = engine.finalize(proposer, id, end).unwrap();
        assert_eq!(outcome, ProposalState::Accepted);
        id
    }

    #[test]
    fn privileged_fee_change_applies_on_success() {
        let mut engine = engine_with(Arc::new(Permissive::default()));
        let id = accepted(
            &mut engine,
            request(vec![(
                engine_address(),
                Payload::Governance(GovernanceCall::SetCreateProposalFee(Amount::new(25))),
            )]),
        );
        engine.execute(Address::from_low_u64(7), id).unwrap();
        assert_eq!(engine.create_proposal_fee(), Amount::new(25));
        assert_eq!(engine.state_of(&id), ProposalState::Executed);
    }

    #[test]
    fn zero_fee_change_fails_execution() {
        let mut engine = engine_with(Arc::new(Permissive::default()));
        let id = accepted(
            &mut engine,
            request(vec![(
                engine_address(),
                Payload::Governance(GovernanceCall::SetCreateProposalFee(Amount::ZERO)),
            )]),
        );
        let err = engine.execute(Address::from_low_u64(7), id).unwrap_err();
        assert!(matches!(err, GovernanceError::ExecutionFailed { index: 0, .. }));
        assert_eq!(engine.state_of(&id), ProposalState::Accepted);
        assert_eq!(engine.create_proposal_fee(), Amount::new(10));
    }

    #[test]
    fn later_failure_discards_earlier_fee_change() {
        let failing = Address::from_low_u64(0xbad);
        let fake = Arc::new(Permissive {
            fail_target: Some(failing),
            ..Permissive::default()
        });
        let mut engine = engine_with(fake.clone());
        let id = accepted(
            &mut engine,
            request(vec![
                (
                    engine_address(),
                    Payload::Governance(GovernanceCall::SetCreateProposalFee(Amount::new(99))),
                ),
                (Address::from_low_u64(2), Payload::Call(vec![1])),
                (failing, Payload::Call(vec![2])),
            ]),
        );
        let err = engine.execute(Address::from_low_u64(7), id).unwrap_err();
        assert!(matches!(err, GovernanceError::ExecutionFailed { index: 2, .. }));
        assert_eq!(engine.create_proposal_fee(), Amount::new(10));
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_operation_reverts_its_rollover() {
        let mut engine = engine_with(Arc::new(Permissive::default()));
        let before = engine.phase();
        // window is due, but voting on a missing proposal fails
        let err = engine
            .vote(
                Address::from_low_u64(1),
                ProposalId::new([9; 32]),
                VoteChoice::Yes,
                Timestamp::new(WEEK),
            )
            .unwrap_err();
        assert!(matches!(err, GovernanceError::NotExist(_)));
        assert_eq!(engine.phase(), before);
    }

    #[test]
    fn events_are_published_after_commit_only() {
        let mut engine = engine_with(Arc::new(Permissive::default()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine.subscribe(Box::new(move |e: &GovernanceEvent| sink.lock().unwrap().push(e.clone())));

        let bad = ProposalRequest {
            targets: vec![Address::from_low_u64(2)],
            values: vec![],
            payloads: vec![],
            description: "broken".into(),
        };
        assert!(engine
            .propose(Address::from_low_u64(1), bad, Amount::new(10), Timestamp::new(1))
            .is_err());
        assert!(seen.lock().unwrap().is_empty());

        engine.advance(Timestamp::new(WEEK));
        let seen = seen.lock().unwrap();
        assert!(matches!(
            seen.as_slice(),
            [GovernanceEvent::PhaseSwitched {
                phase: Phase::Voting,
                ..
            }]
        ));
    }
}

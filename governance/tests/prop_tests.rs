use civitas_governance::*;
use civitas_nullables::{NullClock, NullEnvironment};
use civitas_types::{Address, Amount, ProposalId, Timestamp};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

fn arb_request() -> impl Strategy<Value = ProposalRequest> {
    (1usize..4)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(1u64..1_000, n),
                prop::collection::vec(any::<u128>(), n),
                prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), n),
                ".{0,32}",
            )
        })
        .prop_map(|(targets, values, payloads, description)| ProposalRequest {
            targets: targets.into_iter().map(addr).collect(),
            values: values.into_iter().map(Amount::new).collect(),
            payloads: payloads.into_iter().map(Payload::Call).collect(),
            description,
        })
}

proptest! {
    #[test]
    fn hash_is_deterministic(request in arb_request()) {
        let copy = request.clone();
        prop_assert_eq!(request.id(), copy.id());
    }

    #[test]
    fn flipping_a_payload_bit_changes_the_id(
        request in arb_request(),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut changed = request.clone();
        let slot = index.index(changed.payloads.len());
        match &mut changed.payloads[slot] {
            Payload::Call(data) if !data.is_empty() => {
                let at = index.index(data.len());
                data[at] ^= 1 << bit;
            }
            Payload::Call(data) => data.push(bit),
            Payload::Governance(_) => unreachable!(),
        }
        prop_assert_ne!(request.id(), changed.id());
    }

    #[test]
    fn changing_a_value_changes_the_id(request in arb_request(), delta in 1u128..1_000) {
        let mut changed = request.clone();
        changed.values[0] = Amount::new(changed.values[0].raw().wrapping_add(delta));
        prop_assert_ne!(request.id(), changed.id());
    }

    #[test]
    fn swapping_distinct_targets_changes_the_id(request in arb_request()) {
        prop_assume!(request.targets.len() >= 2 && request.targets[0] != request.targets[1]);
        let mut changed = request.clone();
        changed.targets.swap(0, 1);
        prop_assert_ne!(request.id(), changed.id());
    }

    #[test]
    fn quorum_matches_two_thirds_rule(yes in 0u128..1_000_000, no in 0u128..1_000_000, abstain in 0u128..1_000_000) {
        let result = VotingResult {
            yes: ChoiceTally { count: 1, stake: Amount::new(yes) },
            no: ChoiceTally { count: 1, stake: Amount::new(no) },
            abstain: ChoiceTally { count: 1, stake: Amount::new(abstain) },
        };
        let total = yes + no + abstain;
        prop_assert_eq!(result.quorum_reached().unwrap(), yes * 3 >= total * 2);
    }
}

// ── Random operation sequences ─────────────────────────────────────────────

const DURATION: u64 = 100;
const VALIDATORS: u64 = 4;

#[derive(Clone, Debug)]
enum Op {
    Propose(u8),
    Cancel(usize),
    Vote { proposal: usize, voter: u64, choice: u8 },
    Finalize(usize),
    Execute(usize),
    Wait(u64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::Propose),
        any::<usize>().prop_map(Op::Cancel),
        (any::<usize>(), 0..=VALIDATORS, 0u8..3)
            .prop_map(|(proposal, voter, choice)| Op::Vote { proposal, voter, choice }),
        any::<usize>().prop_map(Op::Finalize),
        any::<usize>().prop_map(Op::Execute),
        (0..DURATION * 2).prop_map(Op::Wait),
    ]
}

fn pick(ids: &[ProposalId], index: usize) -> ProposalId {
    if ids.is_empty() {
        ProposalId::new([0xff; 32])
    } else {
        ids[index % ids.len()]
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn states_only_move_forward(ops in prop::collection::vec(arb_op(), 1..80)) {
        let env = NullEnvironment::new();
        let clock = NullClock::new(10);
        let config = GovernanceConfig {
            engine_address: addr(0xe0),
            validator_oracle: addr(0xa1),
            staking_oracle: addr(0xa2),
            fee_sink: addr(0xa3),
            create_proposal_fee: Amount::new(1),
            start_time: clock.now(),
            phase_duration_secs: DURATION,
            max_proposals_per_window: 5,
        };
        for n in 0..VALIDATORS {
            env.validators.add_validator(addr(n + 1), addr(n + 100), Timestamp::new(1));
            env.staking.set_stake(addr(n + 1), Amount::new(u128::from(n) * 10 + 5));
        }
        let mut engine = GovernanceEngine::initialize(config, env.collaborators(), clock.now()).unwrap();

        let mut ids: Vec<ProposalId> = Vec::new();
        let mut ranks: HashMap<ProposalId, u8> = HashMap::new();
        let mut distinct_voters: HashMap<ProposalId, HashSet<Address>> = HashMap::new();

        for op in ops {
            let now = clock.now();
            match op {
                Op::Propose(seed) => {
                    let request = ProposalRequest {
                        targets: vec![addr(0x1000 + u64::from(seed))],
                        values: vec![Amount::ZERO],
                        payloads: vec![Payload::Call(vec![seed])],
                        description: String::new(),
                    };
                    if let Ok(id) = engine.propose(addr(1), request, Amount::new(1), now) {
                        ids.push(id);
                    }
                }
                Op::Cancel(i) => {
                    let _ = engine.cancel(addr(1), pick(&ids, i), "", now);
                }
                Op::Vote { proposal, voter, choice } => {
                    let id = pick(&ids, proposal);
                    let choice = [VoteChoice::Yes, VoteChoice::No, VoteChoice::Abstain][choice as usize];
                    // voter 0 is not a validator
                    if engine.vote(addr(voter), id, choice, now).is_ok() {
                        distinct_voters.entry(id).or_default().insert(addr(voter));
                    }
                }
                Op::Finalize(i) => {
                    let _ = engine.finalize(addr(1), pick(&ids, i), now);
                }
                Op::Execute(i) => {
                    let _ = engine.execute(addr(1), pick(&ids, i));
                }
                Op::Wait(secs) => {
                    clock.advance(secs);
                    engine.advance(clock.now());
                }
            }

            for id in &ids {
                let rank = engine.state_of(id).rank();
                let previous = ranks.insert(*id, rank).unwrap_or(0);
                prop_assert!(rank >= previous, "{} moved backward", id);
                let expected = distinct_voters.get(id).map_or(0, HashSet::len);
                prop_assert_eq!(engine.voter_count(id), expected);
            }
            prop_assert!(engine.tracked_proposals().len() <= 5);
        }
    }
}

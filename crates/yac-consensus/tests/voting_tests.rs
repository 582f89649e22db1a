//! Voting engine integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use yac_consensus::{
    leader_for, Answer, BlockBuilder, CommitMessage, OutcomeSink, ProposalStorage, RejectMessage,
    Validator, Yac, YacConfig,
};
use yac_core::{
    hash_blake3, Block, BlockHash, KeyPair, Peer, Proposal, ProposalHash, Round, Transaction,
    VoteMessage, YacHash,
};
use yac_ledger::{Chain, Ledger, MemoryStorage, SharedChain};

#[derive(Default)]
struct CountingSink {
    commits: AtomicUsize,
    rejects: AtomicUsize,
    committed: Mutex<Vec<BlockHash>>,
}

impl OutcomeSink for CountingSink {
    fn on_commit(&self, block: &Block, _commit: &CommitMessage) {
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.committed.lock().push(block.hash().unwrap());
    }

    fn on_reject(&self, _round: Round, _next: Round, _reject: &RejectMessage) {
        self.rejects.fetch_add(1, Ordering::SeqCst);
    }
}

struct Node {
    validator: Validator,
    chain: SharedChain<MemoryStorage>,
    yac: Arc<Yac>,
    sink: Arc<CountingSink>,
}

/// One node per key, all sharing the same genesis peer list
fn setup_network(n: u8) -> (Vec<Peer>, Vec<Node>) {
    let keys: Vec<KeyPair> = (1..=n).map(KeyPair::from_seed).collect();
    let peers: Vec<Peer> = keys
        .iter()
        .enumerate()
        .map(|(i, kp)| Peer::new(kp.public, format!("http://127.0.0.1:{}", 9100 + i)))
        .collect();

    let nodes = keys
        .into_iter()
        .map(|kp| {
            let mut chain = Chain::new(MemoryStorage::new());
            chain.init_genesis(peers.clone()).unwrap();
            let chain = SharedChain::new(chain);

            let yac = Arc::new(Yac::new(
                YacConfig::default(),
                Arc::new(chain.clone()),
                Arc::new(chain.clone()),
            ));
            let sink = Arc::new(CountingSink::default());
            yac.set_outcome_sink(sink.clone());

            Node {
                validator: Validator::new(kp, BlockBuilder::default()),
                chain,
                yac,
                sink,
            }
        })
        .collect();

    (peers, nodes)
}

fn transactions(count: u64) -> Vec<Transaction> {
    let creator = KeyPair::from_seed(200);
    (1..=count)
        .map(|nonce| {
            Transaction::new_signed(creator.public, nonce, vec![nonce as u8], &creator.secret)
                .unwrap()
        })
        .collect()
}

/// Every node votes on `proposal`; returns all votes
fn vote_round(nodes: &[Node], round: Round, proposal: &Proposal) -> Vec<VoteMessage> {
    nodes
        .iter()
        .map(|node| {
            let (block, vote) = node
                .validator
                .vote_on_proposal(
                    round,
                    proposal,
                    node.chain.top_height(),
                    node.chain.top_hash(),
                )
                .unwrap();
            node.yac.add_candidate(block).unwrap();
            vote
        })
        .collect()
}

#[test]
fn test_network_commits_same_block() {
    let (peers, nodes) = setup_network(4);
    let round = nodes[0].yac.current_round();

    let leader = leader_for(&round, &peers).unwrap();
    assert_eq!(leader.public_key, peers[1].public_key);

    let proposal = nodes[1]
        .validator
        .block_builder()
        .build_proposal(round.height, 1000, transactions(3))
        .unwrap();
    let votes = vote_round(&nodes, round, &proposal);

    for node in &nodes {
        let answer = node.yac.submit_votes(votes.clone());
        assert!(matches!(answer, Some(Answer::Commit(_))));
        assert_eq!(node.chain.top_height(), 1);
        assert_eq!(node.yac.current_round(), Round::new(2, 0));
        assert_eq!(node.sink.commits.load(Ordering::SeqCst), 1);
    }

    let heads: Vec<BlockHash> = nodes.iter().map(|n| n.chain.top_hash()).collect();
    assert!(heads.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(
        nodes[0].chain.read().block_at(1).unwrap().transactions.len(),
        3
    );
}

#[test]
fn test_reject_then_reproposal_commits() {
    let (peers, nodes) = setup_network(4);
    let round = nodes[0].yac.current_round();
    let node = &nodes[0];

    // two peers built one block, two peers another: nothing can reach three
    let proposal = Proposal::new(1, 1000, transactions(1));
    let (block, _) = node
        .validator
        .vote_on_proposal(round, &proposal, 0, node.chain.top_hash())
        .unwrap();
    let mut other = block.clone();
    other.header.created_time += 1;
    let a = YacHash::new(block.header.proposal_hash, block.hash().unwrap());
    let b = YacHash::new(block.header.proposal_hash, other.hash().unwrap());

    let votes: Vec<VoteMessage> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let hash = if i < 2 { a } else { b };
            n.validator.signer().sign(round, hash).unwrap()
        })
        .collect();

    let answer = node.yac.submit_votes(votes);
    assert!(matches!(answer, Some(Answer::Reject(_))));
    let next = node.yac.current_round();
    assert_eq!(next, round.next_reject());
    assert_eq!(node.sink.rejects.load(Ordering::SeqCst), 1);
    assert_eq!(node.chain.top_height(), 0);

    // the next leader re-proposes
    assert_ne!(
        leader_for(&round, &peers).unwrap().public_key,
        leader_for(&next, &peers).unwrap().public_key
    );
    let retry = Proposal::new(1, 3000, transactions(2));
    let votes = vote_round(&nodes, next, &retry);
    let answer = node.yac.submit_votes(votes);

    assert!(matches!(answer, Some(Answer::Commit(_))));
    assert_eq!(node.chain.top_height(), 1);
    assert_eq!(node.yac.current_round(), Round::new(2, 0));
}

#[test]
fn test_split_between_proposals_ends_by_timeout() {
    let (_, nodes) = setup_network(4);
    let round = nodes[0].yac.current_round();
    let node = &nodes[0];

    // each proposal is counted on its own and neither is decided
    let mut votes = vote_round(&nodes[..2], round, &Proposal::new(1, 1000, transactions(1)));
    votes.extend(vote_round(&nodes[2..], round, &Proposal::new(1, 2000, transactions(2))));
    assert_eq!(node.yac.submit_votes(votes), None);
    assert_eq!(node.yac.vote_storage().len(), 2);

    assert_eq!(node.yac.on_round_timeout(round), Some(round.next_reject()));
    assert_eq!(node.yac.current_round(), Round::new(1, 1));
    assert_eq!(node.chain.top_height(), 0);
}

#[test]
fn test_consecutive_heights() {
    let (_, nodes) = setup_network(4);

    for height in 1..=3u64 {
        let round = nodes[0].yac.current_round();
        assert_eq!(round, Round::new(height, 0));

        let proposal = Proposal::new(height, height * 1000, transactions(height));
        let votes = vote_round(&nodes, round, &proposal);
        for node in &nodes {
            node.yac.submit_votes(votes.clone());
        }
    }

    for node in &nodes {
        assert_eq!(node.chain.top_height(), 3);
        assert_eq!(node.sink.commits.load(Ordering::SeqCst), 3);
    }
}

#[test]
fn test_equivocating_peer_cannot_commit_alone() {
    let proposal_hash = ProposalHash(hash_blake3(b"proposal"));
    let a = YacHash::new(proposal_hash, BlockHash(hash_blake3(b"a")));
    let b = YacHash::new(proposal_hash, BlockHash(hash_blake3(b"b")));
    let round = Round::new(1, 0);
    let keys: Vec<KeyPair> = (1..=4).map(KeyPair::from_seed).collect();

    let mut storage = ProposalStorage::new(proposal_hash, 4).unwrap();
    storage.insert(VoteMessage::new_signed(round, a, &keys[0]).unwrap());
    storage.insert(VoteMessage::new_signed(round, a, &keys[1]).unwrap());
    // peer 2 tries to vote for both blocks
    storage.insert(VoteMessage::new_signed(round, b, &keys[1]).unwrap());
    storage.insert(VoteMessage::new_signed(round, b, &keys[2]).unwrap());

    assert!(storage.answer().is_none());
    assert_eq!(storage.equivocations().count(), 1);

    let answer = storage.insert(VoteMessage::new_signed(round, a, &keys[3]).unwrap());
    let Some(Answer::Commit(commit)) = answer else {
        panic!("expected commit, got {:?}", answer);
    };
    assert_eq!(commit.hash, a);
}

fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut result = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            result.push(tail);
        }
    }
    result
}

#[test]
fn test_answer_independent_of_insertion_order() {
    let proposal_hash = ProposalHash(hash_blake3(b"proposal"));
    let a = YacHash::new(proposal_hash, BlockHash(hash_blake3(b"a")));
    let b = YacHash::new(proposal_hash, BlockHash(hash_blake3(b"b")));
    let round = Round::new(1, 0);
    let vote = |seed, hash| VoteMessage::new_signed(round, hash, &KeyPair::from_seed(seed)).unwrap();

    let committing = vec![vote(1, a), vote(2, b), vote(3, a), vote(4, a), vote(5, a)];
    let rejecting = vec![vote(1, a), vote(2, b), vote(3, a), vote(4, b)];

    for (votes, peers) in [(committing, 5), (rejecting, 4)] {
        let mut outcomes = Vec::new();
        for order in permutations(&votes) {
            let mut storage = ProposalStorage::new(proposal_hash, peers).unwrap();
            storage.insert_batch(order);
            let kind = match storage.answer() {
                Some(Answer::Commit(commit)) => format!("commit {}", commit.hash),
                Some(Answer::Reject(_)) => "reject".to_string(),
                None => "open".to_string(),
            };
            outcomes.push(kind);
        }
        outcomes.dedup();
        assert_eq!(outcomes.len(), 1, "outcomes: {:?}", outcomes);
    }
}

#[test]
fn test_random_delivery_never_commits_twice() {
    let proposal_hash = ProposalHash(hash_blake3(b"proposal"));
    let hashes: Vec<YacHash> = (0..3u8)
        .map(|i| YacHash::new(proposal_hash, BlockHash(hash_blake3(&[i]))))
        .collect();
    let keys: Vec<KeyPair> = (1..=7).map(KeyPair::from_seed).collect();
    let round = Round::new(1, 0);
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let mut votes: Vec<VoteMessage> = (0..12)
            .map(|_| {
                let kp = &keys[rng.gen_range(0..keys.len())];
                let hash = hashes[rng.gen_range(0..hashes.len())];
                VoteMessage::new_signed(round, hash, kp).unwrap()
            })
            .collect();
        votes.shuffle(&mut rng);

        let mut storage = ProposalStorage::new(proposal_hash, keys.len() as u64).unwrap();
        let mut first_final: Option<Answer> = None;
        for vote in votes {
            let answer = storage.insert(vote);
            if let Some(expected) = &first_final {
                assert_eq!(answer.as_ref(), Some(expected));
            } else {
                first_final = answer;
            }
        }

        let committed = storage
            .block_storages()
            .filter(|block| block.is_committed())
            .count();
        assert!(committed <= 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_vote_delivery() {
    let (_, nodes) = setup_network(7);
    let round = nodes[0].yac.current_round();
    let proposal = Proposal::new(1, 1000, transactions(2));
    let votes = vote_round(&nodes, round, &proposal);

    let target = nodes[0].yac.clone();
    let mut handles = Vec::new();
    for copy in 0..3 {
        for vote in votes.clone() {
            let yac = target.clone();
            handles.push(tokio::spawn(async move {
                if copy > 0 {
                    tokio::task::yield_now().await;
                }
                yac.submit_vote(vote)
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(nodes[0].chain.top_height(), 1);
    assert_eq!(nodes[0].sink.commits.load(Ordering::SeqCst), 1);
    assert_eq!(target.current_round(), Round::new(2, 0));
    assert_eq!(nodes[0].sink.committed.lock().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_proposals_are_independent() {
    let proposal_hashes: Vec<ProposalHash> = (0..8u8)
        .map(|i| ProposalHash(hash_blake3(&[b'p', i])))
        .collect();
    let keys: Vec<KeyPair> = (1..=4).map(KeyPair::from_seed).collect();

    let storages: Vec<Arc<Mutex<ProposalStorage>>> = proposal_hashes
        .iter()
        .map(|hash| Arc::new(Mutex::new(ProposalStorage::new(*hash, 4).unwrap())))
        .collect();

    let mut handles = Vec::new();
    for (storage, hash) in storages.iter().zip(&proposal_hashes) {
        for kp in &keys {
            let storage = storage.clone();
            let vote = VoteMessage::new_signed(
                Round::new(1, 0),
                YacHash::new(*hash, BlockHash(hash_blake3(b"block"))),
                kp,
            )
            .unwrap();
            handles.push(tokio::spawn(async move {
                let answer = storage.lock().insert(vote);
                answer
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for storage in &storages {
        let storage = storage.lock();
        assert!(matches!(storage.answer(), Some(Answer::Commit(_))));
        assert_eq!(storage.voter_count(), 4);
    }
}

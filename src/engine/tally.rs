//! Tally and tie resolution
//!
//! A tally is a pure function of the candidate and ballot sets at the
//! moment of computation. Nothing is cached and nothing is mutated, so the
//! ballot ledger stays the only source of truth and repeated computation
//! over the same data yields identical results.

use std::collections::HashMap;

use crate::types::{Ballot, Candidate, CandidateId, CandidateStanding, TallyResult, Verdict};

/// Aggregate ballots into per-candidate standings and classify the outcome.
///
/// Standings are ordered by vote count descending, ties broken by candidate
/// name ascending. Total distinct voters equals the ballot count, since the
/// ledger holds at most one ballot per voter.
pub fn compute(candidates: &[Candidate], ballots: &[Ballot]) -> TallyResult {
    let mut counts: HashMap<CandidateId, u64> =
        candidates.iter().map(|c| (c.id, 0)).collect();
    for ballot in ballots {
        if let Some(count) = counts.get_mut(&ballot.candidate_id) {
            *count += 1;
        }
    }

    let mut standings: Vec<CandidateStanding> = candidates
        .iter()
        .map(|candidate| CandidateStanding {
            candidate_id: candidate.id,
            name: candidate.name.clone(),
            votes: counts.get(&candidate.id).copied().unwrap_or(0),
        })
        .collect();
    standings.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.name.cmp(&b.name)));

    let verdict = classify(&standings);

    TallyResult {
        standings,
        total_voters: ballots.len() as u64,
        verdict,
    }
}

/// Winner-or-tie classification over already-sorted standings.
///
/// Let `max` be the highest vote count and `S` the set of candidates at
/// `max`: one candidate in `S` is a clear winner (even at zero votes), more
/// than one is a tie among exactly `S`. No candidates, no verdict.
fn classify(standings: &[CandidateStanding]) -> Option<Verdict> {
    let top = standings.first()?;
    let tied: Vec<CandidateStanding> = standings
        .iter()
        .filter(|standing| standing.votes == top.votes)
        .cloned()
        .collect();

    if tied.len() == 1 {
        Some(Verdict::Winner(top.clone()))
    } else {
        Some(Verdict::Tie {
            votes: top.votes,
            candidates: tied,
        })
    }
}

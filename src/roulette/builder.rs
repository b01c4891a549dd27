use super::dictionary::DistractorDictionary;
use crate::models::RouletteOption;
use crate::utils::strings::normalize_token;
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::Range;

pub const DISTRACTOR_COUNT: usize = 4;

// the real token always looks likely, never certain
const CORRECT_PROBABILITY: Range<f64> = 0.45..0.80;

/// Builds one roulette snapshot for `correct_token`.
///
/// The real token is kept exactly as written and marked chosen. Up to
/// [`DISTRACTOR_COUNT`] distractors come from the dictionary entry for the
/// normalized token, topped up from the shuffled generic pool. The whole list
/// is shuffled so the real token's position carries no information.
pub fn build_options(
    correct_token: &str,
    dictionary: &DistractorDictionary,
    rng: &mut impl Rng,
) -> Vec<RouletteOption> {
    let base = normalize_token(correct_token);
    let distractors = pick_distractors(&base, dictionary, rng);

    let correct_probability = if distractors.is_empty() {
        1.0
    } else {
        rng.random_range(CORRECT_PROBABILITY)
    };
    let leftover = 1.0 - correct_probability;

    let weights: Vec<f64> = distractors.iter().map(|_| rng.random::<f64>()).collect();
    let total: f64 = weights.iter().sum();

    let mut options = Vec::with_capacity(distractors.len() + 1);
    options.push(RouletteOption {
        token: correct_token.to_string(),
        probability: correct_probability,
        is_chosen: true,
    });

    let count = distractors.len() as f64;
    for (token, weight) in distractors.into_iter().zip(weights) {
        let share = if total > 0.0 { weight / total } else { 1.0 / count };
        options.push(RouletteOption {
            token,
            probability: share * leftover,
            is_chosen: false,
        });
    }

    options.shuffle(rng);
    options
}

fn pick_distractors(
    base: &str,
    dictionary: &DistractorDictionary,
    rng: &mut impl Rng,
) -> Vec<String> {
    let mut picked: Vec<String> = Vec::with_capacity(DISTRACTOR_COUNT);

    if let Some(similar) = dictionary.similar_to(base) {
        for candidate in similar {
            if picked.len() == DISTRACTOR_COUNT {
                break;
            }
            if is_admissible(candidate, base, &picked) {
                picked.push(candidate.clone());
            }
        }
    }

    if picked.len() < DISTRACTOR_COUNT {
        let mut extra: Vec<&String> = dictionary
            .generic_pool()
            .iter()
            .filter(|w| is_admissible(w, base, &picked))
            .collect();
        extra.shuffle(rng);

        for word in extra {
            if picked.len() == DISTRACTOR_COUNT {
                break;
            }
            // the pool itself may repeat a word
            if !picked.contains(word) {
                picked.push(word.clone());
            }
        }
    }

    picked
}

fn is_admissible(candidate: &str, base: &str, picked: &[String]) -> bool {
    normalize_token(candidate) != base && !picked.iter().any(|p| p == candidate)
}

/// Owns the random source and borrows the dictionary, so callers that spin
/// repeatedly don't have to thread both around.
pub struct Roulette<'d, R> {
    dictionary: &'d DistractorDictionary,
    rng: R,
}

impl<'d, R: Rng> Roulette<'d, R> {
    pub fn new(dictionary: &'d DistractorDictionary, rng: R) -> Self {
        Self { dictionary, rng }
    }

    pub fn spin(&mut self, correct_token: &str) -> Vec<RouletteOption> {
        build_options(correct_token, self.dictionary, &mut self.rng)
    }
}

// src/engine/shuffle.rs

use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::question::{OptionKey, QuestionDefinition, QuestionView, ShuffledOption};

/// Returns a uniform random permutation of the question views (Fisher–Yates
/// via `SliceRandom::shuffle`). The input is left untouched.
pub fn shuffle_questions<R: Rng>(questions: &[QuestionView], rng: &mut R) -> Vec<QuestionView> {
    let mut shuffled = questions.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

/// Shuffles a question's options and relabels them A.. in the new order.
///
/// Each (key, text) pair moves as one unit, and the pair that was correct is
/// marked *before* permuting, so the correct text stays correct even when two
/// option texts are equal.
pub fn shuffle_options<R: Rng>(question: &QuestionDefinition, rng: &mut R) -> QuestionView {
    let mut pairs: Vec<(bool, &str)> = question
        .options
        .iter()
        .map(|(key, text)| (*key == question.correct_key, text.as_str()))
        .collect();
    pairs.shuffle(rng);

    let mut correct_key = question.correct_key;
    let options = OptionKey::ALL
        .iter()
        .zip(pairs.iter())
        .map(|(key, (was_correct, text))| {
            if *was_correct {
                correct_key = *key;
            }
            ShuffledOption {
                key: *key,
                text: (*text).to_string(),
            }
        })
        .collect();

    QuestionView {
        question_id: question.id,
        prompt: question.prompt.clone(),
        options,
        correct_key,
    }
}

/// Builds the per-attempt question list: options shuffled per question, then
/// the question order itself shuffled.
pub fn build_attempt_questions<R: Rng>(
    questions: &[QuestionDefinition],
    rng: &mut R,
) -> Vec<QuestionView> {
    let views: Vec<QuestionView> = questions.iter().map(|q| shuffle_options(q, rng)).collect();
    shuffle_questions(&views, rng)
}

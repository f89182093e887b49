//! Static pool of multiple-choice questions rooms sample from.

use std::{collections::HashSet, fs, io::ErrorKind, path::Path};

use tracing::{info, warn};

use crate::state::{codes::shuffled, room::Question};

/// Read-only, ordered collection of validated questions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from raw questions, dropping entries that break the question invariants.
    pub fn new(questions: Vec<Question>) -> Self {
        let mut seen_ids = HashSet::new();
        let questions = questions
            .into_iter()
            .filter(|question| match check_question(question) {
                Ok(()) if seen_ids.insert(question.id) => true,
                Ok(()) => {
                    warn!(id = question.id, "duplicate question id; skipping");
                    false
                }
                Err(reason) => {
                    warn!(id = question.id, reason, "invalid question; skipping");
                    false
                }
            })
            .collect();

        Self { questions }
    }

    /// Load the bank from a JSON array on disk, falling back to the built-in questions.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Vec<Question>>(&contents) {
                Ok(raw) => {
                    let bank = Self::new(raw);
                    info!(
                        path = %path.display(),
                        count = bank.len(),
                        "loaded question bank"
                    );
                    bank
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse question bank; falling back to built-in questions"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "question bank not found; using built-in questions"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read question bank; falling back to built-in questions"
                );
                Self::default()
            }
        }
    }

    /// Total number of questions available.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the bank holds no question at all.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Draw `count` distinct questions in random order.
    ///
    /// Callers validate `count` against [`QuestionBank::len`]; a larger value simply yields the
    /// whole bank shuffled.
    pub fn sample(&self, count: usize) -> Vec<Question> {
        let mut picked = shuffled(&self.questions);
        picked.truncate(count);
        picked
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::new(default_questions())
    }
}

fn check_question(question: &Question) -> Result<(), &'static str> {
    if question.question.trim().is_empty() {
        return Err("empty prompt");
    }
    if question.options.len() < 2 {
        return Err("fewer than two options");
    }
    let distinct = question.options.iter().collect::<HashSet<_>>();
    if distinct.len() != question.options.len() {
        return Err("duplicate options");
    }
    if !question.options.contains(&question.correct_answer) {
        return Err("correct answer is not one of the options");
    }
    Ok(())
}

fn mc(id: u32, prompt: &str, options: [&str; 4], correct: &str, explanation: &str) -> Question {
    Question {
        id,
        question: prompt.to_string(),
        options: options.iter().map(|option| option.to_string()).collect(),
        correct_answer: correct.to_string(),
        explanation: Some(explanation.to_string()),
    }
}

/// Built-in questions shipped with the binary.
fn default_questions() -> Vec<Question> {
    vec![
        mc(
            1,
            "She has lived in Paris ___ 2015.",
            ["for", "since", "from", "during"],
            "since",
            "Use 'since' with a point in time.",
        ),
        mc(
            2,
            "If I ___ more time, I would learn the piano.",
            ["have", "had", "will have", "am having"],
            "had",
            "Second conditional uses the past simple in the if-clause.",
        ),
        mc(
            3,
            "The report ___ by the committee last week.",
            ["approved", "was approved", "has approved", "is approving"],
            "was approved",
            "Past simple passive: was/were + past participle.",
        ),
        mc(
            4,
            "Choose the synonym of 'reluctant'.",
            ["eager", "unwilling", "curious", "confident"],
            "unwilling",
            "'Reluctant' means unwilling or hesitant.",
        ),
        mc(
            5,
            "Neither the manager nor the employees ___ aware of the change.",
            ["was", "were", "is", "has been"],
            "were",
            "With 'neither...nor' the verb agrees with the nearer subject.",
        ),
        mc(
            6,
            "He apologized ___ being late.",
            ["for", "about", "of", "to"],
            "for",
            "'Apologize for' something.",
        ),
        mc(
            7,
            "By the time we arrived, the film ___.",
            ["started", "has started", "had started", "was starting"],
            "had started",
            "Past perfect for an action completed before another past action.",
        ),
        mc(
            8,
            "Choose the antonym of 'scarce'.",
            ["rare", "plentiful", "limited", "expensive"],
            "plentiful",
            "'Scarce' means in short supply; 'plentiful' is the opposite.",
        ),
        mc(
            9,
            "I'm looking forward to ___ you soon.",
            ["see", "seeing", "saw", "be seeing"],
            "seeing",
            "'Look forward to' is followed by a gerund.",
        ),
        mc(
            10,
            "This is the ___ book I have ever read.",
            ["more interesting", "most interesting", "interestingest", "much interesting"],
            "most interesting",
            "Superlative of long adjectives uses 'most'.",
        ),
        mc(
            11,
            "She suggested that he ___ a doctor.",
            ["sees", "see", "saw", "will see"],
            "see",
            "The subjunctive uses the base form after 'suggest that'.",
        ),
        mc(
            12,
            "The meeting was called ___ because of the storm.",
            ["off", "up", "out", "over"],
            "off",
            "'Call off' means cancel.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bank_is_valid() {
        let bank = QuestionBank::default();
        assert_eq!(bank.len(), default_questions().len());
    }

    #[test]
    fn invalid_questions_are_skipped() {
        let mut bad_answer = mc(2, "Q", ["a", "b", "c", "d"], "a", "");
        bad_answer.correct_answer = "z".into();
        let mut duplicate_options = mc(3, "Q", ["a", "b", "c", "d"], "a", "");
        duplicate_options.options = vec!["a".into(), "a".into()];
        let mut single_option = mc(4, "Q", ["a", "b", "c", "d"], "a", "");
        single_option.options = vec!["a".into()];

        let bank = QuestionBank::new(vec![
            mc(1, "Q", ["a", "b", "c", "d"], "a", ""),
            bad_answer,
            duplicate_options,
            single_option,
            mc(1, "Duplicate id", ["a", "b", "c", "d"], "b", ""),
        ]);
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn sample_draws_distinct_questions() {
        let bank = QuestionBank::default();
        let picked = bank.sample(5);
        assert_eq!(picked.len(), 5);
        let ids = picked.iter().map(|q| q.id).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 5);
        assert!(picked.iter().all(|q| bank.questions.contains(q)));
    }

    #[test]
    fn sample_whole_bank() {
        let bank = QuestionBank::default();
        assert_eq!(bank.sample(bank.len()).len(), bank.len());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let bank = QuestionBank::load(Path::new("does/not/exist.json"));
        assert_eq!(bank.len(), default_questions().len());
    }
}

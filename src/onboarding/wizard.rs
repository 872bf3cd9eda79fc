//! Onboarding questionnaire state machine.
//!
//! A linear pointer over an ordered list of steps. Each step declares its
//! prompt, its option set, and whether it accepts multiple selections.
//! Advancing requires a non-empty answer at the current step; the final
//! advance hands the accumulated answer map to signup. `back()` at step
//! zero is a documented no-op.

use std::collections::BTreeMap;

/// Answer map handed off to signup, keyed by question prompt.
pub type OnboardingAnswers = BTreeMap<String, Vec<String>>;

/// A single questionnaire step.
pub struct Step {
    pub prompt: &'static str,
    pub options: &'static [&'static str],
    pub multi: bool,
}

/// The onboarding question bank.
pub const QUESTIONS: &[Step] = &[
    Step {
        prompt: "What part of your English do you want to improve the most?",
        options: &[
            "Speaking with confidence",
            "Improving pronunciation",
            "Expanding vocabulary",
            "Using grammar correctly",
            "Understanding native speakers",
            "Writing more fluently",
        ],
        multi: true,
    },
    Step {
        prompt: "How often do you speak English in your daily life?",
        options: &[
            "Every day",
            "A few times a week",
            "A few times a month",
            "Rarely or never",
        ],
        multi: false,
    },
    Step {
        prompt: "When do you usually use English?",
        options: &[
            "At work",
            "While studying",
            "While traveling",
            "On social media",
            "With friends or family",
        ],
        multi: true,
    },
    Step {
        prompt: "What is your current English level?",
        options: &["Beginner", "Intermediate", "Advanced", "I'm not sure"],
        multi: false,
    },
    Step {
        prompt: "How confident are you when speaking English?",
        options: &[
            "Very confident",
            "Somewhat confident",
            "Not confident at all",
        ],
        multi: false,
    },
    Step {
        prompt: "Do you struggle with understanding native English speakers?",
        options: &["Yes, often", "Sometimes", "Rarely", "Not at all"],
        multi: false,
    },
    Step {
        prompt: "What kind of English content do you consume?",
        options: &[
            "YouTube videos",
            "News articles",
            "Podcasts",
            "Movies/TV shows",
            "Books or novels",
        ],
        multi: true,
    },
    Step {
        prompt: "Do you ever write in English?",
        options: &[
            "Yes, regularly",
            "Occasionally",
            "Only when necessary",
            "Not really",
        ],
        multi: false,
    },
    Step {
        prompt: "What is your goal with this app?",
        options: &[
            "Improve speaking fluency",
            "Prepare for exams (IELTS, TOEFL)",
            "Better job opportunities",
            "General self-improvement",
        ],
        multi: true,
    },
    Step {
        prompt: "Are you comfortable recording your voice for pronunciation feedback?",
        options: &["Yes", "Maybe later", "No"],
        multi: false,
    },
];

/// Answer accumulated at one step. Multi-select answers keep selection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Single(String),
    Multi(Vec<String>),
}

impl Answer {
    fn is_empty(&self) -> bool {
        match self {
            Answer::Single(value) => value.is_empty(),
            Answer::Multi(values) => values.is_empty(),
        }
    }

    fn values(&self) -> Vec<String> {
        match self {
            Answer::Single(value) => vec![value.clone()],
            Answer::Multi(values) => values.clone(),
        }
    }
}

/// Outcome of a `next()` call.
#[derive(Debug, PartialEq, Eq)]
pub enum Advance {
    /// The current answer is empty; the pointer did not move
    Stayed,
    /// Moved to the following step
    Advanced,
    /// The final step was answered; the answer map is ready for signup
    Completed(OnboardingAnswers),
}

/// Linear pointer over the questionnaire steps.
pub struct Wizard {
    steps: &'static [Step],
    index: usize,
    answers: Vec<Option<Answer>>,
}

impl Wizard {
    pub fn new() -> Self {
        Self::with_steps(QUESTIONS)
    }

    pub fn with_steps(steps: &'static [Step]) -> Self {
        Self {
            steps,
            index: 0,
            answers: steps.iter().map(|_| None).collect(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn current_step(&self) -> &Step {
        &self.steps[self.index]
    }

    /// The answer recorded at the current step, if any.
    pub fn current_answer(&self) -> Option<&Answer> {
        self.answers[self.index].as_ref()
    }

    /// Records the answer for a single-select step.
    pub fn select(&mut self, option: &str) {
        debug_assert!(!self.current_step().multi);
        self.answers[self.index] = Some(Answer::Single(option.to_string()));
    }

    /// Toggles an option on a multi-select step.
    pub fn toggle(&mut self, option: &str) {
        debug_assert!(self.current_step().multi);
        let answer = self.answers[self.index]
            .get_or_insert_with(|| Answer::Multi(Vec::new()));
        if let Answer::Multi(values) = answer {
            if let Some(pos) = values.iter().position(|v| v == option) {
                values.remove(pos);
            } else {
                values.push(option.to_string());
            }
        }
    }

    /// Replaces the multi-select answer wholesale (for prompt widgets that
    /// return the full selection).
    pub fn set_multi(&mut self, options: Vec<String>) {
        debug_assert!(self.current_step().multi);
        self.answers[self.index] = Some(Answer::Multi(options));
    }

    /// Advances past the current step if its answer is non-empty.
    pub fn next(&mut self) -> Advance {
        let answered = self.answers[self.index]
            .as_ref()
            .is_some_and(|answer| !answer.is_empty());
        if !answered {
            return Advance::Stayed;
        }

        if self.index + 1 == self.steps.len() {
            let answers = self
                .steps
                .iter()
                .zip(&self.answers)
                .filter_map(|(step, answer)| {
                    answer
                        .as_ref()
                        .map(|a| (step.prompt.to_string(), a.values()))
                })
                .collect();
            return Advance::Completed(answers);
        }

        self.index += 1;
        Advance::Advanced
    }

    /// Moves back one step. At step zero this is a no-op and returns false.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_is_gated_on_an_answer() {
        let mut wizard = Wizard::new();
        assert_eq!(wizard.next(), Advance::Stayed);
        assert_eq!(wizard.index(), 0);
    }

    #[test]
    fn empty_multi_selection_does_not_advance() {
        let mut wizard = Wizard::new();
        assert!(wizard.current_step().multi);
        wizard.set_multi(Vec::new());
        assert_eq!(wizard.next(), Advance::Stayed);
        assert_eq!(wizard.index(), 0);
    }

    #[test]
    fn single_selection_advances_exactly_one_step() {
        let mut wizard = Wizard::new();
        wizard.toggle("Expanding vocabulary");
        assert_eq!(wizard.next(), Advance::Advanced);
        assert_eq!(wizard.index(), 1);

        // "Every day" at the single-select frequency step
        wizard.select("Every day");
        assert_eq!(wizard.next(), Advance::Advanced);
        assert_eq!(wizard.index(), 2);
    }

    #[test]
    fn toggling_twice_clears_the_selection() {
        let mut wizard = Wizard::new();
        wizard.toggle("Podcasts");
        wizard.toggle("Podcasts");
        assert_eq!(wizard.next(), Advance::Stayed);
    }

    #[test]
    fn back_at_step_zero_is_a_noop() {
        let mut wizard = Wizard::new();
        assert!(!wizard.back());
        assert_eq!(wizard.index(), 0);

        wizard.toggle("Podcasts");
        wizard.next();
        assert!(wizard.back());
        assert_eq!(wizard.index(), 0);
        // The answer at the revisited step is retained
        assert!(wizard.current_answer().is_some());
    }

    #[test]
    fn completing_all_steps_yields_the_answer_map() {
        let mut wizard = Wizard::new();
        let total = wizard.len();

        for step_index in 0..total {
            assert_eq!(wizard.index(), step_index);
            let (multi, first_option) = {
                let step = wizard.current_step();
                (step.multi, step.options[0])
            };
            if multi {
                wizard.toggle(first_option);
            } else {
                wizard.select(first_option);
            }

            match wizard.next() {
                Advance::Advanced => assert!(step_index + 1 < total),
                Advance::Completed(answers) => {
                    assert_eq!(step_index + 1, total);
                    assert_eq!(answers.len(), total);
                    assert_eq!(
                        answers["How often do you speak English in your daily life?"],
                        vec!["Every day".to_string()]
                    );
                }
                Advance::Stayed => panic!("answered step did not advance"),
            }
        }
    }
}

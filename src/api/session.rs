//! Purpose: Grade answer submissions for one worksheet and persist them through a store.
//! Exports: `AnswerStore`, `MemoryStore`, `Session`, `Submission`, `ANSWER_CATEGORY`.
//! Role: Explicitly constructed per page/request; replaces a process-wide tracker.
//! Invariants: A question accepts one submission per session.
//! Invariants: Only answers naming an existing option are saved or restored.
use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::worksheet::{Question, Worksheet, WorksheetId};
use crate::core::error::{Error, ErrorKind};

/// Category recorded with every saved answer.
pub const ANSWER_CATEGORY: &str = "maintenance";

/// External key-value store for answers and completion flags.
///
/// `Session::submit` calls `set_completed` before `save_answer`. A failed
/// completion therefore never leaves a saved answer behind.
pub trait AnswerStore {
    fn answer(&self, worksheet: &WorksheetId, question: u64) -> Result<Option<String>, Error>;

    fn save_answer(
        &mut self,
        worksheet: &WorksheetId,
        question: u64,
        answer: &str,
        category: &str,
    ) -> Result<(), Error>;

    fn set_completed(
        &mut self,
        worksheet: &WorksheetId,
        question: u64,
        correct: bool,
    ) -> Result<(), Error>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SavedAnswer {
    pub answer: String,
    pub category: String,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    answers: HashMap<(WorksheetId, u64), SavedAnswer>,
    completed: HashMap<(WorksheetId, u64), bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self, worksheet: &WorksheetId, question: u64) -> Option<&SavedAnswer> {
        self.answers.get(&(worksheet.clone(), question))
    }

    pub fn completed(&self, worksheet: &WorksheetId, question: u64) -> Option<bool> {
        self.completed.get(&(worksheet.clone(), question)).copied()
    }
}

impl AnswerStore for MemoryStore {
    fn answer(&self, worksheet: &WorksheetId, question: u64) -> Result<Option<String>, Error> {
        Ok(self
            .saved(worksheet, question)
            .map(|saved| saved.answer.clone()))
    }

    fn save_answer(
        &mut self,
        worksheet: &WorksheetId,
        question: u64,
        answer: &str,
        category: &str,
    ) -> Result<(), Error> {
        self.answers.insert(
            (worksheet.clone(), question),
            SavedAnswer {
                answer: answer.to_string(),
                category: category.to_string(),
            },
        );
        Ok(())
    }

    fn set_completed(
        &mut self,
        worksheet: &WorksheetId,
        question: u64,
        correct: bool,
    ) -> Result<(), Error> {
        self.completed.insert((worksheet.clone(), question), correct);
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Submission {
    pub question_id: u64,
    pub answer: String,
    pub correct: bool,
    pub correct_answer: String,
    pub correct_answer_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

pub struct Session<'a, S: AnswerStore> {
    worksheet: &'a Worksheet,
    store: &'a mut S,
    submitted: BTreeSet<u64>,
    correct: usize,
}

impl<'a, S: AnswerStore> Session<'a, S> {
    pub fn new(worksheet: &'a Worksheet, store: &'a mut S) -> Self {
        Self {
            worksheet,
            store,
            submitted: BTreeSet::new(),
            correct: 0,
        }
    }

    pub fn worksheet(&self) -> &Worksheet {
        self.worksheet
    }

    pub fn submit(&mut self, question_id: u64, answer: &str) -> Result<Submission, Error> {
        let question = self.lookup(question_id)?;
        if self.submitted.contains(&question_id) {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("question {question_id} was already submitted")));
        }
        if question.option(answer).is_none() {
            let keys = question
                .options
                .iter()
                .map(|option| option.key.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!(
                    "`{answer}` is not an option for question {question_id}"
                ))
                .with_hint(format!("Select one of: {keys}.")));
        }

        let correct = question.correct_answer == answer;
        let worksheet_id = &self.worksheet.id;
        self.store.set_completed(worksheet_id, question_id, correct)?;
        self.store
            .save_answer(worksheet_id, question_id, answer, ANSWER_CATEGORY)?;

        self.submitted.insert(question_id);
        if correct {
            self.correct += 1;
        }
        tracing::debug!(
            worksheet = %worksheet_id,
            question = question_id,
            answer,
            correct,
            "answer submitted"
        );

        Ok(Submission {
            question_id,
            answer: answer.to_string(),
            correct,
            correct_answer: question.correct_answer.clone(),
            correct_answer_text: question.correct_answer_text.clone(),
            explanation: question.explanation.clone(),
        })
    }

    /// Saved answers for this worksheet, in question order.
    pub fn restore(&self) -> Result<Vec<(u64, String)>, Error> {
        let mut restored = Vec::new();
        for question in &self.worksheet.questions {
            let Some(answer) = self.store.answer(&self.worksheet.id, question.id)? else {
                continue;
            };
            if question.option(&answer).is_some() {
                restored.push((question.id, answer));
            } else {
                tracing::warn!(
                    worksheet = %self.worksheet.id,
                    question = question.id,
                    answer = %answer,
                    "ignoring saved answer that matches no option"
                );
            }
        }
        Ok(restored)
    }

    pub fn is_submitted(&self, question_id: u64) -> bool {
        self.submitted.contains(&question_id)
    }

    /// `(correct, submitted)` for this session.
    pub fn score(&self) -> (usize, usize) {
        (self.correct, self.submitted.len())
    }

    fn lookup(&self, question_id: u64) -> Result<&'a Question, Error> {
        let worksheet: &'a Worksheet = self.worksheet;
        worksheet.question(question_id).ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message(format!("question {question_id} not found"))
        })
    }
}

//! Purpose: Produce the static question markup for a worksheet page.
//! Exports: `render_worksheet`, `render_question`, `escape_html`.
//! Role: Pure markup builder; the page script wires up submit handlers by class name.
//! Invariants: Every interpolated value goes through maud's escaping.
//! Invariants: The correct-answer panel is emitted hidden.
use maud::{Markup, html};

use super::worksheet::{Question, Worksheet};

/// Escapes text for use in element content or a quoted attribute.
pub fn escape_html(input: &str) -> String {
    html! { (input) }.into_string()
}

pub fn render_worksheet(worksheet: &Worksheet) -> String {
    html! {
        @for question in &worksheet.questions {
            (question_markup(question))
        }
    }
    .into_string()
}

pub fn render_question(question: &Question) -> String {
    question_markup(question).into_string()
}

fn question_markup(question: &Question) -> Markup {
    let id = question.id;
    html! {
        div.question-item data-question=(id) {
            h4 { "Question " (id) ": " (question.question) }
            div.multiple-choice-options {
                @for option in &question.options {
                    label.option-label {
                        input.option-radio type="radio" name={ "question-" (id) }
                            value=(option.key);
                        span.option-text { (option.key) ") " (option.text) }
                    }
                }
            }
            div.question-actions {
                button.submit-question-btn data-submit=(id) { "Submit Answer" }
            }
            div.correct-answer hidden {
                strong { "Correct Answer:" }
                " " (question.correct_answer_text)
                @if let Some(explanation) = &question.explanation {
                    br;
                    br;
                    em { "Explanation:" }
                    " " (explanation)
                }
            }
        }
    }
}

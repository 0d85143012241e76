//! Answer tallies for a single question, and their CSV export.

use crate::orm::{attendee_answers, event_questions};
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use serde::Serialize;
use std::collections::HashMap;

/// How many attendees gave one distinct answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnswerCount {
    pub answer: String,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerSummary {
    pub question_id: i32,
    pub label: String,
    pub total: usize,
    /// Most frequent first; ties by answer text.
    pub counts: Vec<AnswerCount>,
}

/// Tally the stored answers of `question_id`. `None` when the question does
/// not exist.
///
/// Answers are grouped by their stored text, so a multi-select answer counts
/// as one combination.
pub async fn answer_summary(
    db: &DatabaseConnection,
    question_id: i32,
) -> Result<Option<AnswerSummary>, DbErr> {
    let question = match event_questions::Entity::find_by_id(question_id).one(db).await? {
        Some(question) => question,
        None => return Ok(None),
    };

    let answers = attendee_answers::Entity::find()
        .filter(attendee_answers::Column::QuestionId.eq(question_id))
        .all(db)
        .await?;

    Ok(Some(tally(
        question.id,
        question.label,
        answers.into_iter().map(|a| a.answer),
    )))
}

fn tally(question_id: i32, label: String, answers: impl Iterator<Item = String>) -> AnswerSummary {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0;
    for answer in answers {
        *counts.entry(answer).or_default() += 1;
        total += 1;
    }

    let mut counts: Vec<AnswerCount> = counts
        .into_iter()
        .map(|(answer, count)| AnswerCount { answer, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.answer.cmp(&b.answer)));

    AnswerSummary {
        question_id,
        label,
        total,
        counts,
    }
}

impl AnswerSummary {
    /// Download name: the label with anything outside `[A-Za-z0-9_-]`
    /// replaced by `_`.
    pub fn csv_filename(&self) -> String {
        let stem: String = self
            .label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}_summary.csv", stem)
    }

    /// `Answer,Count` rows, one per distinct answer, CRLF line endings.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("Answer,Count\r\n");
        for row in &self.counts {
            out.push_str(&csv_field(&row.answer));
            out.push(',');
            out.push_str(&row.count.to_string());
            out.push_str("\r\n");
        }
        out
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Instruction block placed ahead of the caller's text.
pub const EXTRACTION_PREAMBLE: &str = "\
You are the world's best scientist specializing in human biology and in how body metrics \
affect a person's productivity, their ability to accomplish tasks efficiently and to plan \
the day correctly.
You are given a scientific paper and your goal is to extract key insights from the text.
For each insight, provide a numerical ID and the insight text.
Format your response EXACTLY like this:

1: [insight text]
2: [insight text]
3: [insight text]

";

pub fn build_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(EXTRACTION_PREAMBLE.len() + text.len());
    prompt.push_str(EXTRACTION_PREAMBLE);
    prompt.push_str(text);
    prompt
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub id: i64,
    pub text: String,
}

/// Recovers `id: text` records from free-form model output.
///
/// Lines without a colon, with a non-integer prefix, or with nothing after
/// the colon are dropped. Order follows the input; ids are neither sorted
/// nor deduplicated.
pub fn parse_insights(response: &str) -> Vec<Insight> {
    let mut insights = Vec::new();

    for (index, line) in response.split('\n').enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((id, text)) = line.split_once(':') else {
            trace!(line = index, "skipping line without a colon");
            continue;
        };

        let id = match id.trim().parse::<i64>() {
            Ok(id) => id,
            Err(err) => {
                trace!(line = index, %err, "skipping line with non-numeric id");
                continue;
            }
        };

        let text = text.trim();
        if text.is_empty() {
            trace!(line = index, id, "skipping line with empty text");
            continue;
        }

        insights.push(Insight {
            id,
            text: text.to_string(),
        });
    }

    debug!(count = insights.len(), "parsed insights");
    insights
}

/// Writes records back out as `id: text` lines.
pub fn render_insights(insights: &[Insight]) -> String {
    insights
        .iter()
        .map(|insight| format!("{}: {}\n", insight.id, insight.text))
        .collect()
}

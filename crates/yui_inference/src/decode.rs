use yui_core::{Article, Error, Result, TopicDraft};
use crate::prompts::{BODY_MARKER, TITLE_MARKER};

const ASCII_TITLE_MARKER: &str = "タイトル:";
const ASCII_BODY_MARKER: &str = "質問:";

fn split_marker<'a>(text: &'a str, markers: &[&str]) -> Option<(&'a str, &'a str)> {
    markers
        .iter()
        .filter_map(|m| text.find(m).map(|i| (i, m.len())))
        .min_by_key(|(i, _)| *i)
        .map(|(i, len)| (&text[..i], &text[i + len..]))
}

/// Split a `タイトル：… 質問：…` completion into a draft.
///
/// Only the wrapper format is checked here; lengths are the validator's job.
pub fn parse_topic(text: &str) -> Result<TopicDraft> {
    let (_, rest) = split_marker(text, &[TITLE_MARKER, ASCII_TITLE_MARKER])
        .ok_or_else(|| Error::Inference("missing title marker".to_string()))?;
    let (title, body) = split_marker(rest, &[BODY_MARKER, ASCII_BODY_MARKER])
        .ok_or_else(|| Error::Inference("missing question marker".to_string()))?;
    Ok(TopicDraft::new(title.trim(), body.trim()))
}

/// Decode the outermost JSON object in a completion, ignoring any chatter
/// or code fences around it.
pub fn parse_article(text: &str) -> Result<Article> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str(&text[start..=end])
                .map_err(|e| Error::Inference(format!("undecodable article payload: {}", e)))
        }
        _ => Err(Error::Inference("no JSON object in article output".to_string())),
    }
}

// Results view: the emotion result travels to the view as a JSON-encoded
// query parameter, exactly like a page navigation would carry it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

/// Location of the results view, without the query string.
pub const RESULTS_PATH: &str = "/results/emotionResult";

const EMOTION_PARAM: &str = "emotion";

/// Result returned by the inference provider. The shape belongs to the
/// provider, so it is carried as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionResult(pub Value);

impl EmotionResult {
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// `(label, score)` pairs, highest score first, when the result has
    /// the usual classifier shape.
    pub fn ranked_labels(&self) -> Option<Vec<(String, f64)>> {
        let items = match &self.0 {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            single @ Value::Object(_) => vec![single],
            _ => return None,
        };
        let mut ranked = items
            .into_iter()
            .map(|item| {
                let label = item.get("label")?.as_str()?.to_string();
                let score = item.get("score")?.as_f64()?;
                Some((label, score))
            })
            .collect::<Option<Vec<_>>>()?;
        if ranked.is_empty() {
            return None;
        }
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Some(ranked)
    }
}

/// Build the results view location carrying `result`.
pub fn results_location(result: &EmotionResult) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(EMOTION_PARAM, &result.0.to_string())
        .finish();
    format!("{}?{}", RESULTS_PATH, query)
}

/// Recover the result carried by a results view location.
pub fn result_from_location(location: &str) -> Option<EmotionResult> {
    let (_, query) = location.split_once('?')?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == EMOTION_PARAM)
        .and_then(|(_, value)| serde_json::from_str(&value).ok())
}

/// Render the results view.
pub fn render(result: Option<&EmotionResult>) -> String {
    let Some(result) = result else {
        return "No emotion data available.".to_string();
    };

    let mut out = String::from("Emotion Detection Result\n");
    match result.ranked_labels() {
        Some(ranked) => {
            let width = ranked.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
            for (label, score) in ranked {
                out.push_str(&format!("  {:<width$}  {:>5.1}%\n", label, score * 100.0));
            }
        }
        None => {
            out.push_str(&result.0.to_string());
            out.push('\n');
        }
    }
    out
}

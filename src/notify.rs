use crate::config::Config;
use crate::scoring::ResultDocument;

const PREVIEW_CHARS: usize = 300;

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Markdown summary of a submission, mirroring what lands in the result
/// document: per-stage scores, the overall line, and task previews.
pub fn summary_message(result: &ResultDocument) -> String {
    format!(
        "*FULL MOCK TEST SUBMISSION*\n\n\
         *Candidate:* {candidate}\n\
         *Test:* {title} ({test_id})\n\
         *Submitted:* {submitted}\n\n\
         *SCORES*\n\
         *Listening:* {ls}/{lt} ({lp}%)\n\
         *Reading:* {rs}/{rt} ({rp}%)\n\
         *Overall:* {os}/{ot} ({op}%)\n\n\
         *TASK 1 ({w1} words)*\n{t1}\n\n\
         *TASK 2 ({w2} words)*\n{t2}",
        candidate = result.candidate,
        title = result.test_title,
        test_id = result.test_id,
        submitted = result.submitted_at.format("%Y-%m-%d %H:%M:%S UTC"),
        ls = result.listening.score,
        lt = result.listening.total,
        lp = result.listening.percentage,
        rs = result.reading.score,
        rt = result.reading.total,
        rp = result.reading.percentage,
        os = result.total_score,
        ot = result.total_possible,
        op = result.overall_percentage,
        w1 = result.writing.task1_words,
        t1 = preview(&result.writing.task1),
        w2 = result.writing.task2_words,
        t2 = preview(&result.writing.task2),
    )
}

/// Best-effort submission notification. Returns whether a message was
/// delivered; failure never blocks the submission itself.
pub fn notify_submission(config: &Config, result: &ResultDocument) -> bool {
    if !config.telegram_enabled() {
        return false;
    }
    send(
        &config.telegram_bot_token,
        &config.telegram_chat_id,
        &summary_message(result),
    )
}

#[cfg(feature = "network")]
fn send(token: &str, chat_id: &str, text: &str) -> bool {
    let client = match reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };
    let url = format!("https://api.telegram.org/bot{token}/sendMessage");

    let response = client
        .post(&url)
        .json(&serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        }))
        .send();

    match response {
        Ok(resp) if resp.status().is_success() => true,
        // Markdown parse failures come back as 400; retry once as plain
        // text with the formatting stripped.
        Ok(resp) if resp.status() == reqwest::StatusCode::BAD_REQUEST => {
            let plain = text.replace('*', "");
            client
                .post(&url)
                .json(&serde_json::json!({
                    "chat_id": chat_id,
                    "text": plain,
                }))
                .send()
                .map(|r| r.status().is_success())
                .unwrap_or(false)
        }
        _ => false,
    }
}

#[cfg(not(feature = "network"))]
fn send(_token: &str, _chat_id: &str, _text: &str) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::exam::load_from_str;
    use crate::scoring::build_result;
    use crate::session::answers::AnswerStore;

    fn result() -> ResultDocument {
        let doc = load_from_str(
            r#"{
            "id": "test-1",
            "title": "Mock One",
            "listening": {"sections": [{"title": "S1", "content": [
                {"type": "question", "number": 1, "format": "gap-fill", "text": "a", "answer": "x"}
            ]}]},
            "reading": {"passages": [{"title": "P1", "text": "t", "questions": [
                {"type": "gap-fill", "question": "q ...", "answer": "a"}
            ]}]},
            "writing": {
                "task1": {"prompt": "p", "min_words": 150},
                "task2": {"prompt": "p", "min_words": 250}
            }
        }"#,
        )
        .unwrap();
        let mut store = AnswerStore::new();
        store.task1 = "word ".repeat(400);
        build_result(&doc, &store, "aziza", Utc::now())
    }

    #[test]
    fn test_summary_contains_scores_and_candidate() {
        let message = summary_message(&result());
        assert!(message.contains("aziza"));
        assert!(message.contains("*Listening:* 0/1 (0%)"));
        assert!(message.contains("Mock One"));
    }

    #[test]
    fn test_long_tasks_are_previewed() {
        let message = summary_message(&result());
        assert!(message.contains("..."));
        // The full 2000-char task must not be embedded verbatim.
        assert!(message.len() < 1500);
    }

    #[test]
    fn test_disabled_without_credentials() {
        let config = Config::default();
        assert!(!notify_submission(&config, &result()));
    }
}

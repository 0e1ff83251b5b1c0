//! Writes a schema-valid full mock test skeleton for authors to fill in.
//!
//! Usage: `generate_sample_test [PATH]` — prints to stdout when no path is
//! given. The skeleton passes the loader's validation as-is, so authors can
//! check their edits with `fullmock --test-id <id>` at any point.

use std::env;
use std::fs;
use std::process::ExitCode;

use serde_json::json;

use fullmock::exam::load_from_str;

fn skeleton() -> serde_json::Value {
    json!({
        "id": "my-test",
        "title": "IELTS Full Mock Test (skeleton)",
        "listening": {
            "sections": [
                {
                    "title": "Section 1",
                    "instructions": {
                        "heading": "Questions 1-3",
                        "details": "Complete the notes below."
                    },
                    "audio": { "url": "listening-audio/my-test/part1.mp3", "duration_secs": 420 },
                    "content": [
                        { "type": "text", "value": "Scene-setting line shown above the questions." },
                        {
                            "type": "question", "number": 1, "format": "gap-fill",
                            "text": "The caller's name is", "postfix": ".",
                            "answer": "example"
                        },
                        {
                            "type": "question", "number": 2, "format": "multiple-choice",
                            "text": "The office opens at",
                            "options": { "A": "eight", "B": "nine", "C": "ten" },
                            "answer": "B"
                        },
                        {
                            "type": "table",
                            "title": "Details",
                            "columns": ["Item", "Detail"],
                            "rows": [
                                { "item": "Price", "detail": "___q3___ pounds" }
                            ],
                            "answers": { "3": "twelve" }
                        }
                    ]
                },
                {
                    "title": "Section 2",
                    "audio": { "url": "listening-audio/my-test/part2.mp3", "duration_secs": 400 },
                    "content": [
                        {
                            "type": "question-group",
                            "kind": "multi-select",
                            "instructions": "Choose TWO letters, A-D.",
                            "text": "Which TWO things are mentioned?",
                            "options": { "A": "one", "B": "two", "C": "three", "D": "four" },
                            "max_selections": 2,
                            "questions": [
                                { "number": 4, "answer": "A" },
                                { "number": 5, "answer": "C" }
                            ]
                        },
                        {
                            "type": "question-group",
                            "kind": "matching",
                            "instructions": "Match each speaker with an opinion A-C.",
                            "text": "Opinions",
                            "options": { "A": "for", "B": "against", "C": "undecided" },
                            "questions": [
                                { "number": 6, "text": "first speaker", "answer": "A" },
                                { "number": 7, "text": "second speaker", "answer": "C" }
                            ]
                        }
                    ]
                }
            ]
        },
        "reading": {
            "passages": [
                {
                    "title": "Passage title",
                    "instructions": "You should spend about 20 minutes on these questions.",
                    "text": "First paragraph.\n\nSecond paragraph.",
                    "questions": [
                        { "type": "note", "title": "Questions 1-2", "text": "Complete the sentences." },
                        { "type": "gap-fill", "question": "The passage mentions ...", "answer": "example" },
                        { "type": "true-false-notgiven", "question": "A checkable claim.", "answer": "TRUE" },
                        {
                            "type": "multiple-choice",
                            "question": "The writer argues that",
                            "options": [
                                { "label": "A", "text": "first option" },
                                { "label": "B", "text": "second option" }
                            ],
                            "answer": "A"
                        }
                    ]
                }
            ]
        },
        "writing": {
            "task1": {
                "prompt": "Describe the chart below.",
                "image_url": "writing/my-test/task1.png",
                "min_words": 150
            },
            "task2": {
                "prompt": "Discuss the statement below.",
                "min_words": 250
            }
        }
    })
}

fn main() -> ExitCode {
    let value = skeleton();
    let pretty = match serde_json::to_string_pretty(&value) {
        Ok(pretty) => pretty,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    // The skeleton must always pass its own loader.
    if let Err(err) = load_from_str(&pretty) {
        eprintln!("Error: generated skeleton failed validation: {err}");
        return ExitCode::FAILURE;
    }

    match env::args().nth(1) {
        Some(path) => {
            if let Err(err) = fs::write(&path, pretty) {
                eprintln!("Error writing {path}: {err}");
                return ExitCode::FAILURE;
            }
            eprintln!("Wrote {path}");
        }
        None => println!("{pretty}"),
    }
    ExitCode::SUCCESS
}

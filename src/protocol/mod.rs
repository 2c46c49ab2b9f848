//! JSON lines protocol: one request object per input line, one response
//! object per output line.
//!
//! Request: `{"id": any, "cmd": "translate", "payload": {...}}`.
//! Response: `{"id", "status": "ok", "payload"}` or
//! `{"id", "status": "error", "code", "message"}`.

use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::CoreError;
use crate::model::contribution::{ContributionFilter, ContributionStatus, NewContribution};
use crate::services::engine::Engine;

mod command;
use command::Command;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

/// First non-null string among `keys`; accepts the camelCase names older
/// clients send.
fn get_str<'a>(payload: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|k| payload.get(*k).and_then(|v| v.as_str()))
        .unwrap_or("")
}

fn get_opt(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, code: &str, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "code": code,
        "message": message.into()
    })
    .to_string()
}

fn fail(id: Value, e: CoreError) -> String {
    match &e {
        CoreError::Storage(_) | CoreError::Config(_) => {
            tracing::error!(error = %e, "request failed");
        }
        _ => tracing::debug!(error = %e, "request rejected"),
    }
    err(id, e.code(), e.to_string())
}

fn respond<T: Serialize>(id: Value, result: Result<T, CoreError>) -> String {
    match result.and_then(|v| serde_json::to_value(v).map_err(CoreError::from)) {
        Ok(v) => ok(id, v),
        Err(e) => fail(id, e),
    }
}

pub fn handle(engine: &Engine, input: &str) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => return err(Value::Null, "invalid_request", "invalid json"),
    };

    let id = get_id(&req);
    let cmd_str = get_cmd(&req);
    let payload = get_payload(&req);

    match Command::from(cmd_str) {
        Command::Ping => ok(id, json!({ "message": "dico-core alive" })),

        Command::Translate => {
            let text = get_str(payload, &["text"]);
            let source_lang = get_str(payload, &["source_lang", "sourceLang"]);
            let target_lang = get_str(payload, &["target_lang", "targetLang"]);
            respond(id, engine.translate(text, source_lang, target_lang))
        }

        Command::Languages => respond(id, Ok(engine.languages())),

        Command::Stats => respond(id, engine.stats()),

        Command::Contribute => {
            let fields = NewContribution {
                source_text: get_str(payload, &["source_text"]).to_string(),
                target_text: get_str(payload, &["target_text"]).to_string(),
                source_language: get_str(payload, &["source_language"]).to_string(),
                target_language: get_str(payload, &["target_language"]).to_string(),
                source_example: get_opt(payload, "source_example"),
                target_example: get_opt(payload, "target_example"),
            };

            match engine.contributions().submit(fields) {
                Ok(c) => ok(
                    id,
                    json!({
                        "contribution": c,
                        "message": "Contribution received and pending review"
                    }),
                ),
                Err(e) => fail(id, e),
            }
        }

        Command::ContributionsList => {
            let status = match get_opt(payload, "status") {
                Some(s) => match s.parse::<ContributionStatus>() {
                    Ok(s) => Some(s),
                    Err(e) => return fail(id, e),
                },
                None => None,
            };

            let filter = ContributionFilter {
                status,
                source_language: get_opt(payload, "source_language"),
                target_language: get_opt(payload, "target_language"),
            };

            match engine.contributions().list(filter) {
                Ok(list) => {
                    let count = list.len();
                    ok(id, json!({ "contributions": list, "count": count }))
                }
                Err(e) => fail(id, e),
            }
        }

        Command::ContributionStatus => {
            let contribution_id = get_str(payload, &["id", "contribution_id"]);
            let status = get_str(payload, &["status"]);
            if contribution_id.is_empty() {
                return err(id, "validation_error", "payload.id is required");
            }

            match engine.contributions().apply_transition(contribution_id, status) {
                Ok(t) => {
                    let message = if t.changed() {
                        format!("Contribution status updated to {}", t.contribution.status)
                    } else {
                        format!("Status already set to {}", t.contribution.status)
                    };
                    ok(
                        id,
                        json!({
                            "contribution": t.contribution,
                            "changed": t.changed(),
                            "message": message
                        }),
                    )
                }
                Err(e) => fail(id, e),
            }
        }

        Command::Unknown => err(id, "unknown_command", "unknown command"),
    }
}

/// Serves requests from `input` until EOF. A panicking request is answered
/// with an error line and the loop keeps going.
pub fn serve<R: BufRead, W: Write>(engine: &Engine, input: R, mut output: W) -> io::Result<()> {
    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| handle(engine, &line)));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => {
                tracing::error!("request handler panicked");
                err(Value::Null, "internal_error", "internal core error")
            }
        };

        writeln!(output, "{response}")?;
        output.flush()?;
    }

    Ok(())
}

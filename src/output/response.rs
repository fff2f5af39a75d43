//! JSON envelope printed by every command, and error code to exit code
//! mapping.

use launchpad::error::Hint;
use launchpad::{Error, ErrorCode, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

/// `{success, data?, error?}` borrowed from a command result.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
    details: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    hints: Option<&'a [Hint]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl<'a> Envelope<'a> {
    fn new(result: &'a Result<Value>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(ErrorBody {
                    code: err.code.as_str(),
                    message: &err.message,
                    details: &err.details,
                    hints: (!err.hints.is_empty()).then_some(err.hints.as_slice()),
                    retryable: err.retryable,
                }),
            },
        }
    }
}

/// Serialize a command's output and pick the process exit code.
pub fn map_cmd_result_to_json<T: Serialize>(result: Result<(T, i32)>) -> (Result<Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (
                Err(Error::internal_json(
                    err.to_string(),
                    Some("serialize command output".to_string()),
                )),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(err.code);
            (Err(err), exit_code)
        }
    }
}

fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigInvalidValue
        | ErrorCode::ConfigParseFailed
        | ErrorCode::ValidationInvalidArgument
        | ErrorCode::TaskDuplicate
        | ErrorCode::HookInvalidPayload
        | ErrorCode::HookInvalidPhase => 2,

        ErrorCode::TaskNotFound => 4,

        ErrorCode::RemoteCommandFailed => 20,

        ErrorCode::InternalIoError | ErrorCode::InternalJsonError | ErrorCode::InternalUnexpected => 1,
    }
}

/// Print the envelope for `result` on stdout. A closed pipe is not an error.
pub fn print_json_result(result: Result<Value>) -> Result<()> {
    let payload = serde_json::to_string_pretty(&Envelope::new(&result))
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize envelope".to_string())))?;

    match writeln!(io::stdout().lock(), "{}", payload) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_not_found_maps_to_exit_code_4() {
        let err = Error::task_not_found("deploy", Vec::new());
        let (result, exit_code) = map_cmd_result_to_json::<()>(Err(err));
        assert!(result.is_err());
        assert_eq!(exit_code, 4);
    }

    #[test]
    fn remote_failure_maps_to_exit_code_20() {
        assert_eq!(exit_code_for_error(ErrorCode::RemoteCommandFailed), 20);
        assert_eq!(exit_code_for_error(ErrorCode::HookInvalidPhase), 2);
    }

    #[test]
    fn success_envelope_carries_data_and_exit_code() {
        let (result, exit_code) = map_cmd_result_to_json(Ok((json!({ "task": "deploy" }), 0)));
        assert_eq!(exit_code, 0);

        let value = serde_json::to_value(Envelope::new(&result)).unwrap();
        assert_eq!(value, json!({ "success": true, "data": { "task": "deploy" } }));
    }

    #[test]
    fn error_envelope_omits_empty_hints() {
        let result = Err(Error::hook_invalid_phase("during"));
        let value = serde_json::to_value(Envelope::new(&result)).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "hook.invalid_phase");
        assert!(value["error"].get("hints").is_none());
        assert!(value.get("data").is_none());
    }

    #[test]
    fn error_envelope_keeps_hints() {
        let result = Err(Error::task_not_found("deploy", Vec::new()));
        let value = serde_json::to_value(Envelope::new(&result)).unwrap();
        assert_eq!(value["error"]["code"], "task.not_found");
        assert!(value["error"]["hints"][0]["message"]
            .as_str()
            .unwrap()
            .contains("launchpad tasks"));
    }
}

pub mod alternatives;
pub mod config;
pub mod doctor;
pub mod match_item;
pub mod migrate;
pub mod recommend;
pub mod seed;

mod context;

use labquote_core::config::LoadOptions;
use serde::Serialize;
use serde_json::Value;

/// Per-process inputs shared by every command.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub options: LoadOptions,
    pub correlation_id: String,
}

impl Invocation {
    pub fn new(options: LoadOptions) -> Self {
        Self { options, correlation_id: uuid::Uuid::new_v4().to_string() }
    }
}

impl Default for Invocation {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Failure triple threaded through async command bodies: class, message, exit code.
pub(crate) type Failure = (&'static str, String, u8);

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::emit(CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        })
    }

    /// Success carrying a structured payload under `data`.
    pub fn success_with_data<T: Serialize>(
        command: &str,
        message: impl Into<String>,
        data: &T,
    ) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self::emit(CommandOutcome {
                command: command.to_string(),
                status: "ok".to_string(),
                error_class: None,
                message: message.into(),
                data: Some(data),
            }),
            Err(error) => Self::failure(command, "serialization", error.to_string(), 3),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let mut result = Self::emit(CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        });
        result.exit_code = exit_code;
        result
    }

    pub(crate) fn from_failure(command: &str, (error_class, message, exit_code): Failure) -> Self {
        Self::failure(command, error_class, message, exit_code)
    }

    fn emit(payload: CommandOutcome) -> Self {
        Self { exit_code: 0, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

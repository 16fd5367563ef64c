pub mod config;
pub mod doctor;
pub mod insights;
pub mod migrate;
pub mod seed;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a, D: Serialize> {
    command: &'a str,
    status: &'static str,
    error_class: Option<&'a str>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a D>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data::<()>(command, message, None)
    }

    /// Successful outcome carrying a structured `data` payload next to the message.
    pub fn success_with_data<D: Serialize>(
        command: &str,
        message: impl Into<String>,
        data: Option<&D>,
    ) -> Self {
        let payload = CommandOutcome {
            command,
            status: "ok",
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(&payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome::<()> {
            command,
            status: "error",
            error_class: Some(error_class),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(&payload) }
    }
}

fn serialize_payload<D: Serialize>(payload: &CommandOutcome<'_, D>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

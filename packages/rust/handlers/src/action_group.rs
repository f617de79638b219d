//! Bedrock Agent action-group handler for title ratings.
//!
//! Input:
//! ```json
//! {"actionGroup": "ratings", "function": "get_title_rating",
//!  "messageVersion": "1.0", "parameters": [{"name": "title_id", "type": "string", "value": "aws567890"}]}
//! ```

use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use newsdesk_shared::{NewsdeskError, Result};

use crate::ratings::lookup_rating;

const DEFAULT_MESSAGE_VERSION: &str = "1.0";

/// Name of the parameter holding the title id; the first parameter is used
/// when none carries this name.
const TITLE_PARAMETER: &str = "title_id";

/// Handle one action-group event. Always produces a response document.
#[instrument(skip_all)]
pub fn handle_action_group(event: &Value) -> Value {
    match respond(event) {
        Ok(response) => response,
        Err(NewsdeskError::MalformedRequest { field }) => {
            warn!(%field, "action group event is missing a field");
            json!({
                "statusCode": 400,
                "body": format!("Error: missing required field: {field}"),
            })
        }
        Err(err) => {
            error!(error = %err, "action group handler failed");
            json!({"statusCode": 500, "body": "Internal server error"})
        }
    }
}

fn required_str<'a>(event: &'a Value, field: &str) -> Result<&'a str> {
    event
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| NewsdeskError::malformed(field))
}

fn title_id(event: &Value) -> Result<&str> {
    let parameters = event
        .get("parameters")
        .and_then(Value::as_array)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| NewsdeskError::malformed("parameters"))?;

    let parameter = parameters
        .iter()
        .find(|p| p.get("name").and_then(Value::as_str) == Some(TITLE_PARAMETER))
        .unwrap_or(&parameters[0]);

    parameter
        .get("value")
        .and_then(Value::as_str)
        .ok_or_else(|| NewsdeskError::malformed("value"))
}

fn respond(event: &Value) -> Result<Value> {
    let action_group = required_str(event, "actionGroup")?;
    let function = required_str(event, "function")?;
    let message_version = event
        .get("messageVersion")
        .cloned()
        .unwrap_or_else(|| Value::String(DEFAULT_MESSAGE_VERSION.into()));
    let title_id = title_id(event)?;

    info!(action_group, function, %message_version, title_id, "action group invoked");
    let rating = lookup_rating(title_id);

    Ok(json!({
        "response": {
            "actionGroup": action_group,
            "function": function,
            "functionResponse": {
                "responseBody": {
                    "TEXT": {
                        "body": format!("The function {function} was called successfully, ratings are {rating}!")
                    }
                }
            }
        },
        "messageVersion": message_version,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(title: &str) -> Value {
        json!({
            "actionGroup": "ratings-group",
            "function": "get_title_rating",
            "messageVersion": "1.0",
            "parameters": [{"name": "title_id", "type": "string", "value": title}]
        })
    }

    #[test]
    fn known_title_response_shape() {
        let response = handle_action_group(&event("aws567890"));
        assert_eq!(response["messageVersion"], "1.0");
        assert_eq!(response["response"]["actionGroup"], "ratings-group");
        assert_eq!(response["response"]["function"], "get_title_rating");
        assert_eq!(
            response["response"]["functionResponse"]["responseBody"]["TEXT"]["body"],
            "The function get_title_rating was called successfully, ratings are {'title_id': 'aws567890', 'rating': '8.91'}!"
        );
    }

    #[test]
    fn unknown_title_reports_not_available() {
        let response = handle_action_group(&event("aws999999"));
        assert_eq!(
            response["response"]["functionResponse"]["responseBody"]["TEXT"]["body"],
            "The function get_title_rating was called successfully, ratings are not available!"
        );
    }

    #[test]
    fn missing_function_is_bad_request() {
        let mut e = event("aws567890");
        e.as_object_mut().unwrap().remove("function");
        let response = handle_action_group(&e);
        assert_eq!(response["statusCode"], 400);
        assert_eq!(response["body"], "Error: missing required field: function");
    }

    #[test]
    fn missing_parameters_is_bad_request() {
        let response = handle_action_group(&json!({"actionGroup": "g", "function": "f"}));
        assert_eq!(response["statusCode"], 400);
        assert_eq!(response["body"], "Error: missing required field: parameters");
    }

    #[test]
    fn message_version_defaults_and_first_parameter_is_used() {
        let response = handle_action_group(&json!({
            "actionGroup": "g",
            "function": "f",
            "parameters": [{"name": "id", "type": "string", "value": "aws123123"}]
        }));
        assert_eq!(response["messageVersion"], "1.0");
        let body = response["response"]["functionResponse"]["responseBody"]["TEXT"]["body"]
            .as_str()
            .unwrap();
        assert!(body.contains("6.25"));
    }
}

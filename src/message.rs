use anyhow::Result;

use crate::broadcast::Event;
use crate::config::ScheduleConfig;
use crate::error::ControlError;

/// Parse a start-request body into a run configuration.
///
/// # Examples
///
/// ```
/// use matchclock::message::parse_start_request;
///
/// let result = parse_start_request(br#"{"day":"2099-01-01","timestamp":"10:00:00"}"#);
/// assert!(result.is_ok());
/// ```
pub fn parse_start_request(body: &[u8]) -> Result<ScheduleConfig, ControlError> {
    serde_json::from_slice(body)
        .map_err(|err| ControlError::MalformedConfiguration(err.to_string()))
}

/// Serialize a pushed event to JSON for the live feed.
pub fn serialize_event(event: &Event) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

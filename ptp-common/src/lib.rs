//! Shared message types between linuxptp log producers and the parser
//!
//! A producer (the subprocess supervisor, or the stdin forwarder in
//! `ptp-telemetry`) wraps every captured log line in a [`Message`] and
//! hands it to the parser over a channel. Messages are plain values:
//! - immutable once built
//! - consumed exactly once
//! - compared structurally

use std::fmt;

/// The linuxptp subprocess a log line came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProcessType {
    Ptp4l,
    Phc2sys,
    /// Any process name the parser does not know how to handle
    Other(String),
}

impl ProcessType {
    /// Map a process name to its type. Unknown names are kept as [`ProcessType::Other`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "ptp4l" => ProcessType::Ptp4l,
            "phc2sys" => ProcessType::Phc2sys,
            other => ProcessType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProcessType::Ptp4l => "ptp4l",
            ProcessType::Phc2sys => "phc2sys",
            ProcessType::Other(name) => name,
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for ProcessType {
    fn from(name: &str) -> Self {
        ProcessType::from_name(name)
    }
}

/// One classified log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    name: String,
    process: ProcessType,
    content: String,
}

impl Message {
    /// Build a message for the monitored link `name`
    pub fn new(
        name: impl Into<String>,
        process: ProcessType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            process,
            content: content.into(),
        }
    }

    /// Identifier of the monitored link or instance, used as the `network` label
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn process(&self) -> &ProcessType {
        &self.process
    }

    /// Raw log text
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_type_from_name() {
        assert_eq!(ProcessType::from_name("ptp4l"), ProcessType::Ptp4l);
        assert_eq!(ProcessType::from_name("phc2sys"), ProcessType::Phc2sys);
        assert_eq!(
            ProcessType::from_name("ts2phc"),
            ProcessType::Other("ts2phc".to_string())
        );
    }

    #[test]
    fn test_process_type_display_round_trip() {
        for name in ["ptp4l", "phc2sys", "chronyd"] {
            assert_eq!(ProcessType::from(name).to_string(), name);
        }
    }

    #[test]
    fn test_message_accessors() {
        let msg = Message::new("eth0", ProcessType::Ptp4l, "ptp4l[1.0]: rms 3");

        assert_eq!(msg.name(), "eth0");
        assert_eq!(msg.process(), &ProcessType::Ptp4l);
        assert_eq!(msg.content(), "ptp4l[1.0]: rms 3");
        assert_eq!(msg.clone(), msg);
    }
}

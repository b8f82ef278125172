//! Tool-action logging.
//!
//! Tools record domain-level actions through a caller-supplied
//! [`ActionLogger`]; the orchestrator adds one [`ToolExecutionRecord`] per
//! dispatch. Logging is best effort everywhere and never fails the call.

use parking_lot::Mutex;

/// A record of something a tool did.
pub trait ToolAction: Send + Sync {
    /// Human-readable description of the action, suitable for a bulleted
    /// list.
    fn description(&self) -> String;
}

/// Receives tool actions.
pub trait ActionLogger: Send + Sync {
    /// Log one action.
    fn log(&self, action: Box<dyn ToolAction>);

    /// Log several actions at once.
    fn log_all(&self, actions: Vec<Box<dyn ToolAction>>) {
        for action in actions {
            self.log(action);
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullActionLogger;

impl ActionLogger for NullActionLogger {
    fn log(&self, _action: Box<dyn ToolAction>) {}

    fn log_all(&self, _actions: Vec<Box<dyn ToolAction>>) {}
}

/// Buffers actions so a tool can withhold them until its work commits.
///
/// Intended for tools whose actions may roll back: accumulate during the
/// transaction, then [`send_to`](ActionAccumulator::send_to) the real logger
/// after the commit, or [`clear`](ActionAccumulator::clear) on abort.
#[derive(Default)]
pub struct ActionAccumulator {
    entries: Mutex<Vec<Box<dyn ToolAction>>>,
}

impl ActionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Descriptions of the buffered entries, oldest first.
    pub fn descriptions(&self) -> Vec<String> {
        self.entries.lock().iter().map(|a| a.description()).collect()
    }

    /// Forward all buffered entries to `target`, leaving the buffer empty.
    pub fn send_to(&self, target: &dyn ActionLogger) {
        let entries: Vec<_> = std::mem::take(&mut *self.entries.lock());
        if !entries.is_empty() {
            target.log_all(entries);
        }
    }

    /// Drop the buffered entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl ActionLogger for ActionAccumulator {
    fn log(&self, action: Box<dyn ToolAction>) {
        self.entries.lock().push(action);
    }

    fn log_all(&self, actions: Vec<Box<dyn ToolAction>>) {
        self.entries.lock().extend(actions);
    }
}

/// The orchestrator's per-dispatch record of a tool execution.
///
/// Arguments and results are present only when the orchestrator's verbose
/// flag is set, keeping sensitive payloads out of logs by default.
#[derive(Debug, Clone)]
pub struct ToolExecutionRecord {
    pub tool_name: String,
    pub call_id: String,
    pub arguments: Option<String>,
    pub result: Option<String>,
}

impl ToolAction for ToolExecutionRecord {
    fn description(&self) -> String {
        let mut out = format!("ran tool {} (call {})", self.tool_name, self.call_id);
        if let Some(arguments) = &self.arguments {
            out.push_str(&format!(" with {arguments}"));
        }
        if let Some(result) = &self.result {
            out.push_str(&format!(" -> {result}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note(&'static str);

    impl ToolAction for Note {
        fn description(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_accumulator_buffers_in_order() {
        let accumulator = ActionAccumulator::new();
        accumulator.log(Box::new(Note("first")));
        accumulator.log_all(vec![Box::new(Note("second")), Box::new(Note("third"))]);

        assert_eq!(accumulator.len(), 3);
        assert_eq!(accumulator.descriptions(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_send_to_forwards_and_empties() {
        let accumulator = ActionAccumulator::new();
        accumulator.log(Box::new(Note("queued")));

        let target = ActionAccumulator::new();
        accumulator.send_to(&target);

        assert!(accumulator.is_empty());
        assert_eq!(target.descriptions(), vec!["queued"]);

        // An empty accumulator sends nothing.
        accumulator.send_to(&target);
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn test_clear_drops_entries() {
        let accumulator = ActionAccumulator::new();
        accumulator.log(Box::new(Note("gone")));
        accumulator.clear();
        assert!(accumulator.is_empty());
    }

    #[test]
    fn test_execution_record_description() {
        let terse = ToolExecutionRecord {
            tool_name: "lookup".to_string(),
            call_id: "c1".to_string(),
            arguments: None,
            result: None,
        };
        assert_eq!(terse.description(), "ran tool lookup (call c1)");

        let verbose = ToolExecutionRecord {
            tool_name: "lookup".to_string(),
            call_id: "c1".to_string(),
            arguments: Some(r#"{"key":"a"}"#.to_string()),
            result: Some("found".to_string()),
        };
        let description = verbose.description();
        assert!(description.contains(r#"{"key":"a"}"#));
        assert!(description.contains("found"));
    }
}

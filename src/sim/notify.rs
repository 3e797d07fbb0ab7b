//! Outbound warning and terminal notifications.

/// A notification raised by the simulation for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// Advisory message (overload, shortfall, demand spike, obstacle).
    Warning(String),
    /// The session ended. `success` is `true` only for a win.
    Terminal { message: String, success: bool },
}

/// Receiver of fire-and-forget notifications.
///
/// The simulation never waits on the receiver and ignores what it does
/// with the message.
pub trait Notifier {
    fn on_warning(&mut self, message: &str);

    fn on_terminal(&mut self, message: &str, success: bool);

    /// Routes an event to the matching callback.
    fn dispatch(&mut self, event: &GridEvent) {
        match event {
            GridEvent::Warning(message) => self.on_warning(message),
            GridEvent::Terminal { message, success } => self.on_terminal(message, *success),
        }
    }
}

/// Keeps every notification in order. Used by tests and the report.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub events: Vec<GridEvent>,
}

impl RecordingNotifier {
    /// Warning messages in the order they were raised.
    pub fn warnings(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::Warning(m) => Some(m.as_str()),
                GridEvent::Terminal { .. } => None,
            })
            .collect()
    }

    /// Terminal notifications as `(message, success)` pairs.
    pub fn terminals(&self) -> Vec<(&str, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::Terminal { message, success } => Some((message.as_str(), *success)),
                GridEvent::Warning(_) => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn on_warning(&mut self, message: &str) {
        self.events.push(GridEvent::Warning(message.to_string()));
    }

    fn on_terminal(&mut self, message: &str, success: bool) {
        self.events.push(GridEvent::Terminal {
            message: message.to_string(),
            success,
        });
    }
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn on_warning(&mut self, message: &str) {
        tracing::warn!(message, "warning");
    }

    fn on_terminal(&mut self, message: &str, success: bool) {
        if success {
            tracing::info!(message, "session won");
        } else {
            tracing::error!(message, "session lost");
        }
    }
}

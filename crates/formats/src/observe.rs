use std::sync::{Mutex, PoisonError};

use css::Declaration;

/// Receives every style rule the CSS adapter turns into an element, in parse
/// order. Observation never changes what the adapter returns.
pub trait RuleObserver: Send + Sync {
    fn on_rule(&self, selector: &str, declarations: &[Declaration]);
}

/// Logs each rule at `debug` under the `formats.css` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl RuleObserver for LogObserver {
    fn on_rule(&self, selector: &str, declarations: &[Declaration]) {
        if !log::log_enabled!(target: "formats.css", log::Level::Debug) {
            return;
        }
        log::debug!(target: "formats.css", "rule {selector}");
        for declaration in declarations {
            log::debug!(
                target: "formats.css",
                "  {}: {}{}",
                declaration.name,
                declaration.value,
                if declaration.important { " !important" } else { "" }
            );
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedRule {
    pub selector: String,
    pub properties: Vec<(String, String)>,
}

/// Keeps every observed rule in memory.
///
/// A panic in another observing thread does not lose what was recorded: the
/// lock is taken over rather than reported as poisoned.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    rules: Mutex<Vec<ObservedRule>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> Vec<ObservedRule> {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RuleObserver for RecordingObserver {
    fn on_rule(&self, selector: &str, declarations: &[Declaration]) {
        let rule = ObservedRule {
            selector: selector.to_string(),
            properties: declarations
                .iter()
                .map(|d| (d.name.clone(), d.value.clone()))
                .collect(),
        };
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(rule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn recording_survives_a_panicking_holder() {
        let observer = Arc::new(RecordingObserver::new());
        observer.on_rule("a", &[]);

        let held = Arc::clone(&observer);
        let joined = thread::spawn(move || {
            let _guard = held.rules.lock().unwrap();
            panic!("observer thread died");
        })
        .join();
        assert!(joined.is_err());
        assert!(observer.rules.is_poisoned());

        observer.on_rule("b", &[]);
        let selectors: Vec<_> = observer.rules().into_iter().map(|r| r.selector).collect();
        assert_eq!(selectors, ["a", "b"]);
    }
}

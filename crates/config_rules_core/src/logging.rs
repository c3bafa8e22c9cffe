//! Structured JSON log lines routed through the `log` facade.

use serde_json::{json, Value};

pub fn log_rule_info(component: &str, event: &str, details: Value) {
    log::info!("{}", rule_log_line(component, "info", event, details));
}

pub fn log_rule_error(component: &str, event: &str, details: Value) {
    log::error!("{}", rule_log_line(component, "error", event, details));
}

fn rule_log_line(component: &str, level: &str, event: &str, details: Value) -> Value {
    json!({
        "component": component,
        "level": level,
        "event": event,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "details": details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_line_carries_component_and_event() {
        let line = rule_log_line("alb_redirection", "error", "resource_failed", json!({"id": 1}));

        assert_eq!(line["component"], "alb_redirection");
        assert_eq!(line["level"], "error");
        assert_eq!(line["event"], "resource_failed");
        assert_eq!(line["details"]["id"], 1);
        assert!(line["timestamp"].as_str().is_some());
    }
}

pub const ALERT_SUBJECT: &str = "Lambda Error Notification";

/// Invoked once for every handled invocation failure.
pub trait FailureObserver {
    fn on_failure(&self, error_message: &str) -> Result<(), String>;
}

pub fn alert_message(error_message: &str) -> String {
    format!("Lambda Function Error: {error_message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_alert_message() {
        assert_eq!(
            alert_message("Missing 'features' in input file: requests/a.json"),
            "Lambda Function Error: Missing 'features' in input file: requests/a.json"
        );
    }
}

//! Urgency classification for alert messages
//!
//! - HIGH: the pump reported INACTIVE, someone should look at the boiler
//! - LOW: informational status (anything else reaching the dispatcher)

/// Urgency level for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Urgency {
    High,
    Low,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::High => "HIGH",
            Urgency::Low => "LOW",
        }
    }
}

/// Classify urgency from the event status; only an exact `INACTIVE` is urgent
pub fn get_urgency(status: &str) -> Urgency {
    if status == "INACTIVE" {
        Urgency::High
    } else {
        Urgency::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_urgency_high() {
        assert_eq!(get_urgency("INACTIVE"), Urgency::High);
    }

    #[test]
    fn test_get_urgency_low() {
        assert_eq!(get_urgency("ACTIVE"), Urgency::Low);
        assert_eq!(get_urgency("HEARTBEAT_OK"), Urgency::Low);
        assert_eq!(get_urgency("UNKNOWN"), Urgency::Low);
        assert_eq!(get_urgency(""), Urgency::Low);
        assert_eq!(get_urgency("inactive"), Urgency::Low);
    }

    #[test]
    fn test_urgency_display() {
        assert_eq!(format!("{}", Urgency::High), "HIGH");
        assert_eq!(Urgency::Low.as_str(), "LOW");
    }
}

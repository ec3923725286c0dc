use serde::{Deserialize, Serialize};

/// Position in the booking wizard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    Date,
    Time,
    Staff,
    Addons,
    Requirements,
    Details,
    Payment,
    Confirmation,
}

impl BookingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStep::Date => "date",
            BookingStep::Time => "time",
            BookingStep::Staff => "staff",
            BookingStep::Addons => "addons",
            BookingStep::Requirements => "requirements",
            BookingStep::Details => "details",
            BookingStep::Payment => "payment",
            BookingStep::Confirmation => "confirmation",
        }
    }
}

impl std::fmt::Display for BookingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an attraction offers, which decides the optional steps
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepCapabilities {
    pub requires_staff: bool,
    pub has_addons: bool,
    pub has_packages: bool,
    pub has_requirements: bool,
}

/// Ordered step sequence for a session
pub fn build_steps(capabilities: &StepCapabilities) -> Vec<BookingStep> {
    let mut steps = vec![BookingStep::Date, BookingStep::Time];

    if capabilities.requires_staff {
        steps.push(BookingStep::Staff);
    }
    if capabilities.has_addons || capabilities.has_packages {
        steps.push(BookingStep::Addons);
    }
    if capabilities.has_requirements {
        steps.push(BookingStep::Requirements);
    }

    steps.extend([
        BookingStep::Details,
        BookingStep::Payment,
        BookingStep::Confirmation,
    ]);
    steps
}

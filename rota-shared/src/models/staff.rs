use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable staff member or unit, as shown on the widget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffProfile {
    pub id: Uuid,
    pub attraction_id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub capacity: i32,
    #[serde(default)]
    pub display_order: i32,
    pub is_active: bool,
    pub show_on_widget: bool,
    /// Filled from the reviews aggregate
    #[serde(default)]
    pub rating_average: Option<f64>,
    #[serde(default)]
    pub booking_count: Option<u32>,
}

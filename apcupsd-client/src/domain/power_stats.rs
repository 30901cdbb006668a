use serde::{Deserialize, Serialize};

/// Summary statistics over a window of readings with a positive watt value.
///
/// All fields are zero when no qualifying readings exist; an empty window is
/// not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerStats {
    pub count: i64,
    pub avg_watts: f64,
    pub min_watts: f64,
    pub max_watts: f64,
    pub avg_load_pct: f64,
    pub cost_per_hour: f64,
    pub cost_per_day: f64,
    pub cost_per_month: f64,
    pub cost_per_year: f64,
}

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaceCategory {
    Home,
    Work,
    Food,
    Shop,
    Gym,
    Health,
    Social,
    Other,
}

impl PlaceCategory {
    pub fn code(&self) -> &'static str {
        match self {
            PlaceCategory::Home => "home",
            PlaceCategory::Work => "work",
            PlaceCategory::Food => "food",
            PlaceCategory::Shop => "shop",
            PlaceCategory::Gym => "gym",
            PlaceCategory::Health => "health",
            PlaceCategory::Social => "social",
            PlaceCategory::Other => "other",
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        self.code()
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "home" => Some(PlaceCategory::Home),
            "work" => Some(PlaceCategory::Work),
            "food" => Some(PlaceCategory::Food),
            "shop" => Some(PlaceCategory::Shop),
            "gym" => Some(PlaceCategory::Gym),
            "health" => Some(PlaceCategory::Health),
            "social" => Some(PlaceCategory::Social),
            "other" => Some(PlaceCategory::Other),
            _ => None,
        }
    }

    /// Helper: convert input code from CLI (lowercase or uppercase)
    pub fn from_code(code: &str) -> Option<Self> {
        PlaceCategory::from_db_str(&code.trim().to_lowercase())
    }
}

/// A place the user saved on the map. Visits reference it by id.
#[derive(Debug, Clone, Serialize)]
pub struct SavedPlace {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub category: PlaceCategory,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub created_at: String, // RFC 3339
}

impl SavedPlace {
    pub fn new(
        user_id: &str,
        name: &str,
        category: PlaceCategory,
        latitude: f64,
        longitude: f64,
        address: &str,
    ) -> Self {
        Self {
            id: 0,
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            category,
            latitude,
            longitude,
            address: address.trim().to_string(),
            created_at: chrono::Local::now().to_rfc3339(),
        }
    }
}

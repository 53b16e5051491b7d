// College records and the built-in seed catalog

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// COLLEGE TYPE
// ============================================================================

/// Kind of institution. Unknown labels from imported files are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CollegeType {
    Medical,
    Engineering,
    Nursing,
    Dental,
    Pharmacy,
    Other(String),
}

impl CollegeType {
    pub fn name(&self) -> &str {
        match self {
            CollegeType::Medical => "Medical",
            CollegeType::Engineering => "Engineering",
            CollegeType::Nursing => "Nursing",
            CollegeType::Dental => "Dental",
            CollegeType::Pharmacy => "Pharmacy",
            CollegeType::Other(label) => label,
        }
    }

    /// Parse a free-text label, case-insensitively.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "medical" | "mbbs" => CollegeType::Medical,
            "engineering" | "b.tech" | "btech" => CollegeType::Engineering,
            "nursing" => CollegeType::Nursing,
            "dental" | "bds" => CollegeType::Dental,
            "pharmacy" => CollegeType::Pharmacy,
            _ => CollegeType::Other(trimmed.to_string()),
        }
    }
}

impl Default for CollegeType {
    fn default() -> Self {
        CollegeType::Other(String::new())
    }
}

impl From<String> for CollegeType {
    fn from(label: String) -> Self {
        CollegeType::parse(&label)
    }
}

impl From<CollegeType> for String {
    fn from(college_type: CollegeType) -> Self {
        college_type.name().to_string()
    }
}

impl fmt::Display for CollegeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// COLLEGE RECORD
// ============================================================================

/// One college entry. Immutable once it is part of a loaded catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollegeRecord {
    pub id: String,
    pub name: String,
    pub location: String,
    pub state: String,

    #[serde(rename = "type")]
    pub college_type: CollegeType,

    /// 0 when unknown
    pub established_year: u32,

    /// 0.0 - 5.0
    pub rating: f64,

    /// Display string, never parsed
    pub fees: String,

    pub branches: Vec<String>,

    /// Admission cutoff rank, lower is better. `None` or 0 means unranked.
    #[serde(alias = "cutoffRank")]
    pub rank: Option<u32>,

    pub quota: String,
    pub category: String,
    pub hostel_available: bool,

    pub phone: String,
    pub website: String,
    pub image: String,
}

impl CollegeRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        CollegeRecord {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Effective rank for ordering; zero counts as unranked.
    pub fn effective_rank(&self) -> Option<u32> {
        self.rank.filter(|r| *r > 0)
    }

    pub fn is_ranked(&self) -> bool {
        self.effective_rank().is_some()
    }

    pub fn with_place(mut self, location: &str, state: &str) -> Self {
        self.location = location.to_string();
        self.state = state.to_string();
        self
    }

    pub fn with_type(mut self, college_type: CollegeType) -> Self {
        self.college_type = college_type;
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_established(mut self, year: u32) -> Self {
        self.established_year = year;
        self
    }

    pub fn with_fees(mut self, fees: &str) -> Self {
        self.fees = fees.to_string();
        self
    }

    pub fn with_branches(mut self, branches: &[&str]) -> Self {
        self.branches = branches.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn with_classification(mut self, quota: &str, category: &str) -> Self {
        self.quota = quota.to_string();
        self.category = category.to_string();
        self
    }

    pub fn with_hostel(mut self, available: bool) -> Self {
        self.hostel_available = available;
        self
    }

    pub fn with_contact(mut self, phone: &str, website: &str) -> Self {
        self.phone = phone.to_string();
        self.website = website.to_string();
        self
    }
}

// ============================================================================
// SEED CATALOG
// ============================================================================

/// Built-in catalog used when no data file is configured.
pub fn seed_colleges() -> Vec<CollegeRecord> {
    vec![
        CollegeRecord::new("1", "All India Institute of Medical Sciences")
            .with_place("New Delhi", "Delhi")
            .with_type(CollegeType::Medical)
            .with_established(1956)
            .with_rating(4.9)
            .with_fees("₹1,628/year")
            .with_branches(&["MBBS", "MD", "MS", "B.Sc Nursing"])
            .with_rank(50)
            .with_classification("All India", "Government")
            .with_hostel(true)
            .with_contact("+91-11-26588500", "https://www.aiims.edu"),
        CollegeRecord::new("2", "Christian Medical College")
            .with_place("Vellore", "Tamil Nadu")
            .with_type(CollegeType::Medical)
            .with_established(1900)
            .with_rating(4.8)
            .with_fees("₹52,000/year")
            .with_branches(&["MBBS", "MD", "BDS"])
            .with_rank(120)
            .with_classification("State", "Private")
            .with_hostel(true)
            .with_contact("+91-416-2281000", "https://www.cmch-vellore.edu"),
        CollegeRecord::new("3", "Indian Institute of Technology Bombay")
            .with_place("Mumbai", "Maharashtra")
            .with_type(CollegeType::Engineering)
            .with_established(1958)
            .with_rating(4.9)
            .with_fees("₹2,20,000/year")
            .with_branches(&["Computer Science", "Electrical", "Mechanical", "Civil"])
            .with_rank(66)
            .with_classification("All India", "Government")
            .with_hostel(true)
            .with_contact("+91-22-25722545", "https://www.iitb.ac.in"),
        CollegeRecord::new("4", "Kasturba Medical College")
            .with_place("Manipal", "Karnataka")
            .with_type(CollegeType::Medical)
            .with_established(1953)
            .with_rating(4.5)
            .with_fees("₹17,50,000/year")
            .with_branches(&["MBBS", "MD", "MS"])
            .with_rank(4500)
            .with_classification("Management", "Private")
            .with_hostel(true)
            .with_contact("+91-820-2922367", "https://manipal.edu/kmc-manipal.html"),
        CollegeRecord::new("5", "Birla Institute of Technology and Science")
            .with_place("Pilani", "Rajasthan")
            .with_type(CollegeType::Engineering)
            .with_established(1964)
            .with_rating(4.6)
            .with_fees("₹5,00,000/year")
            .with_branches(&["Computer Science", "Electronics", "Chemical"])
            .with_rank(900)
            .with_classification("All India", "Private")
            .with_hostel(true)
            .with_contact("+91-1596-242192", "https://www.bits-pilani.ac.in"),
        CollegeRecord::new("6", "National Institute of Technology Tiruchirappalli")
            .with_place("Tiruchirappalli", "Tamil Nadu")
            .with_type(CollegeType::Engineering)
            .with_established(1964)
            .with_rating(4.5)
            .with_fees("₹1,50,000/year")
            .with_branches(&["Computer Science", "Electrical", "Production"])
            .with_rank(1200)
            .with_classification("Home State", "Government")
            .with_hostel(true)
            .with_contact("+91-431-2503000", "https://www.nitt.edu"),
        CollegeRecord::new("7", "Medical College and Hospital Kolkata")
            .with_place("Kolkata", "West Bengal")
            .with_type(CollegeType::Medical)
            .with_established(1835)
            .with_rating(4.3)
            .with_fees("₹12,000/year")
            .with_branches(&["MBBS", "MD"])
            .with_rank(3100)
            .with_classification("State", "Government")
            .with_hostel(false)
            .with_contact("+91-33-22123853", "https://www.medicalcollegekolkata.in"),
        CollegeRecord::new("8", "Armed Forces Medical College")
            .with_place("Pune", "Maharashtra")
            .with_type(CollegeType::Medical)
            .with_established(1948)
            .with_rating(4.7)
            .with_fees("₹50,000/year")
            .with_branches(&["MBBS", "B.Sc Nursing"])
            .with_rank(700)
            .with_classification("All India", "Government")
            .with_hostel(true)
            .with_contact("+91-20-26334100", "https://afmc.nic.in"),
        CollegeRecord::new("9", "King George's Medical University")
            .with_place("Lucknow", "Uttar Pradesh")
            .with_type(CollegeType::Medical)
            .with_established(1905)
            .with_rating(4.4)
            .with_fees("₹54,000/year")
            .with_branches(&["MBBS", "BDS", "MD"])
            .with_rank(2400)
            .with_classification("State", "Government")
            .with_hostel(true)
            .with_contact("+91-522-2257450", "https://www.kgmu.org"),
        CollegeRecord::new("10", "Rajkumari Amrit Kaur College of Nursing")
            .with_place("New Delhi", "Delhi")
            .with_type(CollegeType::Nursing)
            .with_established(1946)
            .with_rating(4.2)
            .with_fees("₹20,000/year")
            .with_branches(&["B.Sc Nursing", "M.Sc Nursing"])
            .with_classification("All India", "Government")
            .with_hostel(true)
            .with_contact("+91-11-26918540", "https://rakcon.com"),
    ]
}

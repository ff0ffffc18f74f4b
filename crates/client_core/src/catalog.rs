//! Closed option sets backing the three form inputs.

use shared::domain::Field;

pub const LOCATIONS: &[&str] = &[
    "Karachi",
    "Lahore",
    "Faisalabad",
    "Rawalpindi",
    "Gujranwala",
    "Peshawar",
    "Multan",
    "Hyderabad",
    "Islamabad",
    "Quetta",
    "Bahawalpur",
    "Sargodha",
    "Sialkot",
    "Sukkur",
    "Larkana",
    "Sheikhupura",
    "Rahim Yar Khan",
    "Jhang",
    "Dera Ghazi Khan",
    "Gujrat",
    "Sahiwal",
    "Wah Cantonment",
    "Mardan",
    "Kasur",
    "Okara",
    "Mingora",
    "Nawabshah",
    "Chiniot",
    "Kotri",
    "Kamoke",
    "Hafizabad",
    "Sadiqabad",
    "Mirpur Khas",
    "Burewala",
    "Kohat",
    "Khanewal",
    "Dera Ismail Khan",
    "Turbat",
    "Muzaffargarh",
    "Abbottabad",
    "Mandi Bahauddin",
    "Shikarpur",
    "Jacobabad",
    "Jhelum",
    "Khanpur",
    "Khairpur",
    "Khuzdar",
    "Pakpattan",
    "Hub",
    "Daska",
    "Gojra",
    "Dadu",
    "Muridke",
    "Bahawalnagar",
    "Samundri",
    "Tando Allahyar",
    "Tando Adam",
    "Jaranwala",
    "Chishtian",
    "Muzaffarabad",
    "Attock",
    "Vehari",
    "Kot Abdul Malik",
    "Ferozwala",
    "Chakwal",
    "Kamalia",
    "Umerkot",
    "Ahmedpur East",
    "Kot Addu",
    "Wazirabad",
    "Mansehra",
    "Layyah",
    "Mirpur",
    "Swabi",
    "Chaman",
    "Taxila",
    "Nowshera",
    "Khushab",
    "Shahdadkot",
    "Mianwali",
    "Kabal",
    "Lodhran",
    "Hasilpur",
    "Charsadda",
    "Bhakkar",
    "Badin",
    "Arifwala",
    "Ghotki",
    "Sambrial",
    "Jatoi",
    "Haroonabad",
    "Daharki",
    "Narowal",
    "Tando Muhammad Khan",
    "Kamber Ali Khan",
    "Mirpur Mathelo",
    "Kandhkot",
    "Bhalwal",
    "Jampur",
    "Kharian",
    "Rajanpur",
    "Pasrur",
    "Shujabad",
    "Toba Tek Singh",
    "Kot Radha Kishan",
    "Sanghar",
    "Chichawatni",
    "Talagang",
    "Gwadar",
    "Sibi",
    "Zhob",
    "Loralai",
    "Gilgit",
    "Skardu",
    "Chitral",
    "Bannu",
    "Parachinar",
    "Thatta",
    "Haripur",
    "Battagram",
    "Dera Allah Yar",
    "Kotli",
    "Bagh",
    "Rawalakot",
    "Hangu",
    "Lakki Marwat",
    "Tank",
    "Karak",
    "Timergara",
    "Matiari",
    "Moro",
    "Mehrabpur",
    "Kashmore",
    "Pishin",
    "Dera Murad Jamali",
    "Panjgur",
    "Kharan",
    "Mastung",
    "Kalat",
    "Nushki",
    "Usta Muhammad",
    "Hala",
    "Sehwan",
    "Jhudo",
    "Naushahro Feroze",
    "Jauharabad",
    "Pind Dadan Khan",
    "Renala Khurd",
    "Depalpur",
    "Pattoki",
    "Chunian",
    "Raiwind",
    "Lala Musa",
];

pub const ROLES: &[&str] = &[
    "Farmer",
    "Student",
    "Healthcare Worker",
    "Outdoor Worker",
    "Businessperson",
    "General Citizen",
];

pub const CONCERNS: &[&str] = &["Flood", "Drought", "Heatwave", "Air Quality"];

#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    entries: &'static [&'static str],
}

impl Catalog {
    pub const fn new(entries: &'static [&'static str]) -> Self {
        Self { entries }
    }

    pub fn for_field(field: Field) -> Self {
        match field {
            Field::City => Self::new(LOCATIONS),
            Field::Profession => Self::new(ROLES),
            Field::Concern => Self::new(CONCERNS),
        }
    }

    pub fn entries(&self) -> &'static [&'static str] {
        self.entries
    }

    /// Catalog spelling of `raw`, matched case-insensitively after trimming.
    pub fn canonical(&self, raw: &str) -> Option<&'static str> {
        let needle = raw.trim();
        if needle.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .copied()
            .find(|entry| entry.eq_ignore_ascii_case(needle))
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.canonical(raw).is_some()
    }

    /// Entries containing `input` anywhere, case-insensitively, in catalog
    /// order. An empty input lists everything up to `limit`.
    pub fn suggest(&self, input: &str, limit: usize) -> Vec<&'static str> {
        let needle = input.trim().to_lowercase();
        self.entries
            .iter()
            .copied()
            .filter(|entry| needle.is_empty() || entry.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;

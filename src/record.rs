// 🧑 Roster Record - one contract line of the roster
// Names are normalized on construction so identity matching is accent-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::UnicodeNormalization;

/// Number of columns a roster row carries (feed and storage share the order)
pub const COLUMN_COUNT: usize = 11;

// ============================================================================
// LEAGUE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum League {
    Pacific,
    Emea,
    Americas,
    Cn,
}

impl League {
    pub const ALL: [League; 4] = [League::Pacific, League::Emea, League::Americas, League::Cn];

    /// Code as it appears in the feed and in storage
    pub fn code(&self) -> &'static str {
        match self {
            League::Pacific => "PACIFIC",
            League::Emea => "EMEA",
            League::Americas => "AMERICAS",
            League::Cn => "CN",
        }
    }

    /// Exact, case-sensitive code match
    pub fn from_code(code: &str) -> Option<League> {
        League::ALL.into_iter().find(|league| league.code() == code)
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// COMPOSITE KEY
// ============================================================================

/// Identity of a person across snapshots: (first_name, family_name) after normalization
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CompositeKey {
    pub first_name: String,
    pub family_name: String,
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.family_name)
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// One roster entry.
///
/// Fields are private so the normalization invariant on the names cannot be
/// broken after construction. Deserialization goes through [`Record::new`].
/// Equality compares every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredRecord")]
pub struct Record {
    league: League,
    team_name: String,
    handle_name: String,
    role: String,
    first_name: String,
    family_name: String,
    end_date: i32,
    resident: String,
    roster_status: String,
    team_tag: String,
    team_contact_info: String,
}

/// Builder input for [`Record::new`], in storage column order
#[derive(Debug, Clone, Default)]
pub struct RecordFields {
    pub team_name: String,
    pub handle_name: String,
    pub role: String,
    pub first_name: String,
    pub family_name: String,
    pub end_date: String,
    pub resident: String,
    pub roster_status: String,
    pub team_tag: String,
    pub team_contact_info: String,
}

/// Serialized shape of a [`Record`], normalized again on the way in
#[derive(Deserialize)]
struct StoredRecord {
    league: League,
    team_name: String,
    handle_name: String,
    role: String,
    first_name: String,
    family_name: String,
    end_date: i32,
    resident: String,
    roster_status: String,
    team_tag: String,
    team_contact_info: String,
}

impl From<StoredRecord> for Record {
    fn from(stored: StoredRecord) -> Self {
        Record::new(
            stored.league,
            RecordFields {
                team_name: stored.team_name,
                handle_name: stored.handle_name,
                role: stored.role,
                first_name: stored.first_name,
                family_name: stored.family_name,
                end_date: stored.end_date.to_string(),
                resident: stored.resident,
                roster_status: stored.roster_status,
                team_tag: stored.team_tag,
                team_contact_info: stored.team_contact_info,
            },
        )
    }
}

impl Record {
    pub fn new(league: League, fields: RecordFields) -> Self {
        Record {
            league,
            team_name: fields.team_name,
            handle_name: fields.handle_name,
            role: fields.role,
            first_name: normalize_name(&fields.first_name),
            family_name: normalize_name(&fields.family_name),
            end_date: parse_end_date(&fields.end_date),
            resident: fields.resident,
            roster_status: fields.roster_status,
            team_tag: fields.team_tag,
            team_contact_info: fields.team_contact_info,
        }
    }

    /// Build from a positional row (league, team, handle, role, first, family,
    /// end_date, resident, roster_status, team_tag, team_contact_info).
    ///
    /// Returns `None` when the row is short or the league code is unknown.
    /// Columns past the eleventh are ignored.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Option<Record> {
        if fields.len() < COLUMN_COUNT {
            return None;
        }
        let col = |i: usize| fields[i].as_ref().to_string();
        let league = League::from_code(fields[0].as_ref())?;

        Some(Record::new(
            league,
            RecordFields {
                team_name: col(1),
                handle_name: col(2),
                role: col(3),
                first_name: col(4),
                family_name: col(5),
                end_date: col(6),
                resident: col(7),
                roster_status: col(8),
                team_tag: col(9),
                team_contact_info: col(10),
            },
        ))
    }

    pub fn key(&self) -> CompositeKey {
        CompositeKey {
            first_name: self.first_name.clone(),
            family_name: self.family_name.clone(),
        }
    }

    pub fn league(&self) -> League {
        self.league
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn handle_name(&self) -> &str {
        &self.handle_name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Contract end year, 0 when unknown
    pub fn end_date(&self) -> i32 {
        self.end_date
    }

    pub fn resident(&self) -> &str {
        &self.resident
    }

    pub fn roster_status(&self) -> &str {
        &self.roster_status
    }

    pub fn team_tag(&self) -> &str {
        &self.team_tag
    }

    pub fn team_contact_info(&self) -> &str {
        &self.team_contact_info
    }

    /// The 11 columns as text, in storage order
    pub fn values(&self) -> [String; COLUMN_COUNT] {
        [
            self.league.code().to_string(),
            self.team_name.clone(),
            self.handle_name.clone(),
            self.role.clone(),
            self.first_name.clone(),
            self.family_name.clone(),
            self.end_date.to_string(),
            self.resident.clone(),
            self.roster_status.clone(),
            self.team_tag.clone(),
            self.team_contact_info.clone(),
        ]
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Canonical decomposition with every non-spacing mark removed ("José" → "Jose")
pub fn normalize_name(name: &str) -> String {
    name.nfd()
        .filter(|c| get_general_category(*c) != GeneralCategory::NonspacingMark)
        .collect()
}

/// Integer year, 0 for empty or non-numeric input
pub fn parse_end_date(raw: &str) -> i32 {
    raw.trim().parse().unwrap_or(0)
}

// ============================================================================
// TESTS
// ============================================================================

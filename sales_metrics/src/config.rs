// ********* Input data structures ***********

use std::collections::HashMap;
use std::fmt::Display;

use chrono::NaiveDate;

/// A calendar month, in the order of the reporting year.
///
/// The canonical display names are the Portuguese month names used by the
/// feed and the quota table. `parse` also accepts the English spellings,
/// which is what the month-translation step of the original reports amounts
/// to.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Month {
    Janeiro,
    Fevereiro,
    Marco,
    Abril,
    Maio,
    Junho,
    Julho,
    Agosto,
    Setembro,
    Outubro,
    Novembro,
    Dezembro,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Janeiro,
        Month::Fevereiro,
        Month::Marco,
        Month::Abril,
        Month::Maio,
        Month::Junho,
        Month::Julho,
        Month::Agosto,
        Month::Setembro,
        Month::Outubro,
        Month::Novembro,
        Month::Dezembro,
    ];

    pub const FIRST_SEMESTER: [Month; 6] = [
        Month::Janeiro,
        Month::Fevereiro,
        Month::Marco,
        Month::Abril,
        Month::Maio,
        Month::Junho,
    ];

    pub const SECOND_SEMESTER: [Month; 6] = [
        Month::Julho,
        Month::Agosto,
        Month::Setembro,
        Month::Outubro,
        Month::Novembro,
        Month::Dezembro,
    ];

    /// The month number, 1 for January through 12 for December.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_number(n: u32) -> Option<Month> {
        match n {
            1..=12 => Some(Month::ALL[(n - 1) as usize]),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::Janeiro => "Janeiro",
            Month::Fevereiro => "Fevereiro",
            Month::Marco => "Março",
            Month::Abril => "Abril",
            Month::Maio => "Maio",
            Month::Junho => "Junho",
            Month::Julho => "Julho",
            Month::Agosto => "Agosto",
            Month::Setembro => "Setembro",
            Month::Outubro => "Outubro",
            Month::Novembro => "Novembro",
            Month::Dezembro => "Dezembro",
        }
    }

    fn english_name(self) -> &'static str {
        match self {
            Month::Janeiro => "January",
            Month::Fevereiro => "February",
            Month::Marco => "March",
            Month::Abril => "April",
            Month::Maio => "May",
            Month::Junho => "June",
            Month::Julho => "July",
            Month::Agosto => "August",
            Month::Setembro => "September",
            Month::Outubro => "October",
            Month::Novembro => "November",
            Month::Dezembro => "December",
        }
    }

    /// Parses a month name, Portuguese or English, case-insensitive.
    /// "Março" is also accepted without the cedilla.
    pub fn parse(s: &str) -> Option<Month> {
        let lowered = s.trim().to_lowercase();
        if lowered == "marco" {
            return Some(Month::Marco);
        }
        Month::ALL.iter().copied().find(|m| {
            m.name().to_lowercase() == lowered || m.english_name().to_lowercase() == lowered
        })
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One of the eight canonical sales representatives.
///
/// The order of `ALL` follows the alias table and is the stable iteration
/// order used everywhere a deterministic order over representatives is
/// needed.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Representative {
    Werbet,
    Pamela,
    AnaClara,
    Danilo,
    Natalie,
    Andressa,
    Rafael,
    Thais,
}

impl Representative {
    pub const ALL: [Representative; 8] = [
        Representative::Werbet,
        Representative::Pamela,
        Representative::AnaClara,
        Representative::Danilo,
        Representative::Natalie,
        Representative::Andressa,
        Representative::Rafael,
        Representative::Thais,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Representative::Werbet => "Werbet",
            Representative::Pamela => "Pamela",
            Representative::AnaClara => "Ana Clara",
            Representative::Danilo => "Danilo",
            Representative::Natalie => "Natalie",
            Representative::Andressa => "Andressa",
            Representative::Rafael => "Rafael",
            Representative::Thais => "Thaís",
        }
    }

    /// Parses a canonical representative name, case-insensitive. Accented
    /// names are also accepted in their plain ASCII spelling.
    pub fn parse(s: &str) -> Option<Representative> {
        let lowered = s.trim().to_lowercase();
        if lowered == "thais" {
            return Some(Representative::Thais);
        }
        Representative::ALL
            .iter()
            .copied()
            .find(|r| r.name().to_lowercase() == lowered)
    }
}

impl Display for Representative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The normalized unit everything downstream consumes. One completed card.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CanonicalRecord {
    pub completed_on: NaiveDate,
    pub year: i32,
    pub month: Month,
    pub representative: Representative,
}

// ******** Output data structures *********

/// One row of the realized-vs-quota comparison for a representative.
#[derive(PartialEq, Debug, Clone)]
pub struct AggregateRow {
    pub representative: Representative,
    pub realized: u32,
    pub quota: u32,
    pub attainment_pct: f64,
    pub delta: i64,
}

/// The summary-card numbers over a set of aggregate rows.
#[derive(PartialEq, Debug, Clone)]
pub struct Totals {
    pub realized: u32,
    pub quota: u32,
    pub attainment_pct: f64,
    pub delta: i64,
}

// ********* Configuration tables **********

/// An ordered list of (pattern, representative) pairs mapping free-text
/// name spellings to canonical identities.
///
/// Matching is case-insensitive substring containment of the pattern in the
/// raw value, and the first matching pattern wins. The order of the entries
/// is therefore part of the contract and is preserved as given.
#[derive(PartialEq, Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(String, Representative)>,
}

impl AliasTable {
    pub fn new(entries: Vec<(String, Representative)>) -> AliasTable {
        AliasTable { entries }
    }

    /// The fixed production alias table, in the order the spellings were
    /// collected from the feed.
    pub fn default_table() -> AliasTable {
        let entries: Vec<(&str, Representative)> = vec![
            ("Werbet", Representative::Werbet),
            ("Werker Alencar", Representative::Werbet),
            ("Werbet Alencar", Representative::Werbet),
            ("Pamela", Representative::Pamela),
            ("Pamela Crédita", Representative::Pamela),
            ("Pamela Cri", Representative::Pamela),
            ("Pamela Cristina", Representative::Pamela),
            ("Ana Clara", Representative::AnaClara),
            ("Ana Clara Souza", Representative::AnaClara),
            ("Danilo", Representative::Danilo),
            ("Danilo Neder", Representative::Danilo),
            ("Natalie", Representative::Natalie),
            ("Natalie Lopes", Representative::Natalie),
            ("Andressa", Representative::Andressa),
            ("Rafael", Representative::Rafael),
            ("Rafael Miguel", Representative::Rafael),
            ("Thaís", Representative::Thais),
            ("Thais Mendonca", Representative::Thais),
            ("Thais", Representative::Thais),
            ("Thaki", Representative::Thais),
        ];
        AliasTable::new(
            entries
                .iter()
                .map(|(p, r)| (p.to_string(), *r))
                .collect(),
        )
    }

    /// Appends an alias. Appended entries lose against earlier patterns.
    pub fn push(&mut self, pattern: String, representative: Representative) {
        self.entries.push((pattern, representative));
    }

    /// Maps a raw free-text name to a canonical identity, or None when no
    /// alias pattern is contained in the raw value.
    pub fn normalize(&self, raw: &str) -> Option<Representative> {
        let lowered = raw.to_lowercase();
        self.entries
            .iter()
            .find(|(pattern, _)| lowered.contains(&pattern.to_lowercase()))
            .map(|(_, representative)| *representative)
    }

    pub fn entries(&self) -> &[(String, Representative)] {
        &self.entries
    }
}

/// The static monthly quota table: (month, representative) -> expected
/// count of completed cards. Immutable for the life of the process once
/// built; pass it explicitly to the functions that need it.
#[derive(PartialEq, Debug, Clone)]
pub struct QuotaTable {
    entries: HashMap<(Month, Representative), u32>,
}

// Base quota per month. The three-person senior track carries the base
// value, the five-person track twice that.
const MONTHLY_BASE: [(Month, u32); 12] = [
    (Month::Janeiro, 22),
    (Month::Fevereiro, 20),
    (Month::Marco, 21),
    (Month::Abril, 22),
    (Month::Maio, 22),
    (Month::Junho, 21),
    (Month::Julho, 23),
    (Month::Agosto, 21),
    (Month::Setembro, 22),
    (Month::Outubro, 23),
    (Month::Novembro, 21),
    (Month::Dezembro, 22),
];

impl Representative {
    fn quota_factor(self) -> u32 {
        match self {
            Representative::Andressa | Representative::Rafael | Representative::Thais => 1,
            _ => 2,
        }
    }
}

impl QuotaTable {
    pub fn empty() -> QuotaTable {
        QuotaTable {
            entries: HashMap::new(),
        }
    }

    /// The fixed production quota table: 96 entries, twelve months for each
    /// of the eight representatives.
    pub fn default_table() -> QuotaTable {
        let mut table = QuotaTable::empty();
        for (month, base) in MONTHLY_BASE {
            for rep in Representative::ALL {
                table.set(month, rep, base * rep.quota_factor());
            }
        }
        table
    }

    pub fn set(&mut self, month: Month, representative: Representative, quota: u32) {
        self.entries.insert((month, representative), quota);
    }

    /// The quota for a single (month, representative) pair. An absent entry
    /// counts as zero.
    pub fn get(&self, month: Month, representative: Representative) -> u32 {
        self.entries
            .get(&(month, representative))
            .copied()
            .unwrap_or(0)
    }

    /// The total quota for a representative over the given months. Total
    /// over all inputs, never fails.
    pub fn quota_for(&self, representative: Representative, months: &[Month]) -> u32 {
        months
            .iter()
            .map(|m| self.get(*m, representative))
            .sum()
    }
}

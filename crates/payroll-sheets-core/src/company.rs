//! Company identifiers
//!
//! Hours and tips are billed to one of three operating companies
//! ([`BilledCompany`]). Employees are employed by one of four home companies
//! ([`HomeCompany`]); both Scanio home companies bill as Scanio.

use std::fmt;
use std::ops::{AddAssign, Index, IndexMut};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Company a block of hours or tips is billed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BilledCompany {
    Scanio,
    SeaAndAir,
    FlatPrice,
}

impl BilledCompany {
    /// All billed companies, in column order
    pub const ALL: [BilledCompany; 3] = [
        BilledCompany::Scanio,
        BilledCompany::SeaAndAir,
        BilledCompany::FlatPrice,
    ];

    /// Classify a free-text company label from an hours report
    ///
    /// ```
    /// use payroll_sheets_core::BilledCompany;
    ///
    /// assert_eq!(BilledCompany::classify("Sea and Air Intl"), Some(BilledCompany::SeaAndAir));
    /// assert_eq!(BilledCompany::classify("office"), None);
    /// ```
    pub fn classify(label: &str) -> Option<Self> {
        let text = label.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        if text.is_empty() {
            return None;
        }
        if text.contains("SCANIO") {
            Some(BilledCompany::Scanio)
        } else if text.contains("SEA") && text.contains("AIR") {
            Some(BilledCompany::SeaAndAir)
        } else if text.contains("FLAT") {
            Some(BilledCompany::FlatPrice)
        } else {
            None
        }
    }

    /// Stable snake_case key
    pub fn key(self) -> &'static str {
        match self {
            BilledCompany::Scanio => "scanio",
            BilledCompany::SeaAndAir => "sea_and_air",
            BilledCompany::FlatPrice => "flat_price",
        }
    }

    /// Display label used in worksheet text
    pub fn label(self) -> &'static str {
        match self {
            BilledCompany::Scanio => "Scanio",
            BilledCompany::SeaAndAir => "Sea & Air",
            BilledCompany::FlatPrice => "Flat Price",
        }
    }

    /// Label used in report column headers
    pub fn column_label(self) -> &'static str {
        match self {
            BilledCompany::Scanio => "Scanio",
            BilledCompany::SeaAndAir => "Sea and Air",
            BilledCompany::FlatPrice => "Flat Price",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BilledCompany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BilledCompany {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BilledCompany::ALL
            .into_iter()
            .find(|company| company.key() == s)
            .ok_or_else(|| Error::UnknownCompany(s.to_string()))
    }
}

/// Company an employee belongs to (one worksheet section each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HomeCompany {
    ScanioMoving,
    ScanioStorage,
    SeaAndAirIntl,
    FlatPrice,
}

impl HomeCompany {
    /// All home companies, in worksheet section order
    pub const ALL: [HomeCompany; 4] = [
        HomeCompany::ScanioMoving,
        HomeCompany::ScanioStorage,
        HomeCompany::SeaAndAirIntl,
        HomeCompany::FlatPrice,
    ];

    /// Classify a worksheet section label such as "SCANIO MOVING"
    pub fn classify_label(label: &str) -> Option<Self> {
        let text = label.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        if text.is_empty() {
            return None;
        }
        if text.contains("SCANIO MOVING") {
            Some(HomeCompany::ScanioMoving)
        } else if text.contains("SCANIO STORAGE") {
            Some(HomeCompany::ScanioStorage)
        } else if text.contains("SEA") && text.contains("AIR") {
            Some(HomeCompany::SeaAndAirIntl)
        } else if text.contains("FLAT") {
            Some(HomeCompany::FlatPrice)
        } else {
            None
        }
    }

    /// Stable snake_case key
    pub fn key(self) -> &'static str {
        match self {
            HomeCompany::ScanioMoving => "scanio_moving",
            HomeCompany::ScanioStorage => "scanio_storage",
            HomeCompany::SeaAndAirIntl => "sea_and_air_intl",
            HomeCompany::FlatPrice => "flat_price",
        }
    }

    /// Section label as printed on the template
    pub fn label(self) -> &'static str {
        match self {
            HomeCompany::ScanioMoving => "Scanio Moving",
            HomeCompany::ScanioStorage => "Scanio Storage",
            HomeCompany::SeaAndAirIntl => "Sea & Air International",
            HomeCompany::FlatPrice => "Flat Price",
        }
    }

    /// Company this home company's own work is billed to
    pub fn billed(self) -> BilledCompany {
        match self {
            HomeCompany::ScanioMoving | HomeCompany::ScanioStorage => BilledCompany::Scanio,
            HomeCompany::SeaAndAirIntl => BilledCompany::SeaAndAir,
            HomeCompany::FlatPrice => BilledCompany::FlatPrice,
        }
    }
}

impl fmt::Display for HomeCompany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for HomeCompany {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HomeCompany::ALL
            .into_iter()
            .find(|company| company.key() == s)
            .ok_or_else(|| Error::UnknownCompany(s.to_string()))
    }
}

/// One amount per billed company (hours or tip dollars)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompanyAmounts([f64; 3]);

impl CompanyAmounts {
    /// All zeros
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum across companies
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Iterate `(company, amount)` in column order
    pub fn iter(&self) -> impl Iterator<Item = (BilledCompany, f64)> + '_ {
        BilledCompany::ALL.into_iter().map(move |c| (c, self[c]))
    }

    /// Company with the largest non-zero amount
    ///
    /// Ties go to the earlier company in column order.
    pub fn dominant(&self) -> Option<BilledCompany> {
        let mut best: Option<(BilledCompany, f64)> = None;
        for (company, amount) in self.iter() {
            if amount.abs() <= 1e-9 {
                continue;
            }
            if best.map_or(true, |(_, top)| amount > top) {
                best = Some((company, amount));
            }
        }
        best.map(|(company, _)| company)
    }
}

impl Index<BilledCompany> for CompanyAmounts {
    type Output = f64;

    fn index(&self, company: BilledCompany) -> &f64 {
        &self.0[company.slot()]
    }
}

impl IndexMut<BilledCompany> for CompanyAmounts {
    fn index_mut(&mut self, company: BilledCompany) -> &mut f64 {
        &mut self.0[company.slot()]
    }
}

impl AddAssign for CompanyAmounts {
    fn add_assign(&mut self, other: Self) {
        for company in BilledCompany::ALL {
            self[company] += other[company];
        }
    }
}

//! Invoice numbers
//!
//! An order number is `INV` followed by the order day as `YYYYMMDD` and a
//! four digit sequence within that day, e.g. `INV202405010001`. It is kept as
//! its two components and only rendered to text at the edges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed prefix of every order number
pub const ORDER_NUMBER_PREFIX: &str = "INV";

/// Highest sequence a single day can reach
pub const MAX_SEQUENCE: u16 = 9999;

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_WIDTH: usize = 8;
const SEQUENCE_WIDTH: usize = 4;

/// A date-scoped sequential order number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber {
    date: NaiveDate,
    sequence: u16,
}

impl OrderNumber {
    /// Build an order number, checking the sequence range
    pub fn new(date: NaiveDate, sequence: u16) -> Result<Self, OrderNumberParseError> {
        if sequence == 0 || sequence > MAX_SEQUENCE {
            return Err(OrderNumberParseError::SequenceOutOfRange(sequence.into()));
        }
        Ok(Self { date, sequence })
    }

    /// The first order number of a day
    pub fn first_of(date: NaiveDate) -> Self {
        Self { date, sequence: 1 }
    }

    /// The day this number belongs to
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The sequence within the day
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// The following number on the same day, or None once the day is full
    pub fn next(&self) -> Option<Self> {
        if self.sequence >= MAX_SEQUENCE {
            return None;
        }
        Some(Self {
            date: self.date,
            sequence: self.sequence + 1,
        })
    }

    /// Text prefix shared by every order number of `date`, e.g. `INV20240501`
    pub fn prefix_for(date: NaiveDate) -> String {
        format!("{}{}", ORDER_NUMBER_PREFIX, date.format(DATE_FORMAT))
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            Self::prefix_for(self.date),
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl FromStr for OrderNumber {
    type Err = OrderNumberParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OrderNumberParseError::InvalidFormat(s.to_string());

        let body = s.strip_prefix(ORDER_NUMBER_PREFIX).ok_or_else(invalid)?;
        if body.len() != DATE_WIDTH + SEQUENCE_WIDTH || !body.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let (date_part, sequence_part) = body.split_at(DATE_WIDTH);
        let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT).map_err(|_| invalid())?;
        let sequence: u16 = sequence_part.parse().map_err(|_| invalid())?;

        Self::new(date, sequence)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.to_string()
    }
}

/// Errors from parsing or building order numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberParseError {
    InvalidFormat(String),
    SequenceOutOfRange(u32),
}

impl fmt::Display for OrderNumberParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(s) => write!(f, "Invalid order number: {}", s),
            Self::SequenceOutOfRange(n) => write!(
                f,
                "Order number sequence {} is outside 1..={}",
                n, MAX_SEQUENCE
            ),
        }
    }
}

impl std::error::Error for OrderNumberParseError {}

use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::{format_description, offset};
use time::{Date, OffsetDateTime};

use crate::ValidationError;

const TRADE_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar date of an exchange session, carried on the wire as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate(Date);

impl TradeDate {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        Date::parse(trimmed, TRADE_DATE_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidTradeDate {
                value: input.to_owned(),
            })
    }

    pub const fn from_date(date: Date) -> Self {
        Self(date)
    }

    /// Current date on the Shanghai/Shenzhen exchange clock (UTC+8).
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().to_offset(offset!(+8)).date())
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }

    pub fn format(self) -> String {
        self.0
            .format(TRADE_DATE_FORMAT)
            .unwrap_or_else(|_| String::from("<unformattable>"))
    }
}

impl Display for TradeDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

impl TryFrom<&str> for TradeDate {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for TradeDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for TradeDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

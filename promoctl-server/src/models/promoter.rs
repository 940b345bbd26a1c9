//! Promoter payload validation

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::fields::{self, MAX_PHONE_LEN, MAX_TEXT_LEN};
use super::{ValidationError, ValidationErrors};

/// Promoter gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }

    /// Parse from the exact lowercase name.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(ValidationError::InvalidVariant {
                field: "gender",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Gender {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Raw promoter body for create and update.
///
/// Every field is optional here so that missing values are reported
/// through [`ValidationErrors`] rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromoterInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday_date: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub availabilities: Option<Vec<String>>,
}

/// Validated promoter fields, written wholesale on create and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPromoter {
    pub first_name: String,
    pub last_name: String,
    pub birthday_date: NaiveDate,
    pub gender: Gender,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub availabilities: Vec<String>,
}

impl PromoterInput {
    /// Validate every field, collecting all failures.
    ///
    /// `today` is the day birthdays must precede. Email uniqueness is not
    /// checked here; the store reports it on write.
    pub fn validate(self, today: NaiveDate) -> Result<NewPromoter, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let first_name =
            errors.check(fields::required_text("first_name", self.first_name, MAX_TEXT_LEN));
        let last_name =
            errors.check(fields::required_text("last_name", self.last_name, MAX_TEXT_LEN));
        let birthday_date =
            errors.check(fields::date_before("birthday_date", self.birthday_date, today));
        let gender = errors.check(
            fields::normalize(self.gender)
                .ok_or(ValidationError::Required { field: "gender" })
                .and_then(|g| Gender::parse(&g)),
        );
        let email = errors.check(fields::email(self.email));
        let phone = errors.check(fields::optional_text("phone", self.phone, MAX_PHONE_LEN));
        let address = errors.check(fields::optional_text("address", self.address, MAX_TEXT_LEN));
        let availabilities = availabilities(self.availabilities.unwrap_or_default(), &mut errors);

        match (first_name, last_name, birthday_date, gender, email, phone, address) {
            (
                Some(first_name),
                Some(last_name),
                Some(birthday_date),
                Some(gender),
                Some(email),
                Some(phone),
                Some(address),
            ) if errors.is_empty() => Ok(NewPromoter {
                first_name,
                last_name,
                birthday_date,
                gender,
                email,
                phone,
                address,
                availabilities,
            }),
            _ => Err(errors),
        }
    }
}

/// Trimmed, de-duplicated weekday strings. Order of first occurrence is kept.
fn availabilities(raw: Vec<String>, errors: &mut ValidationErrors) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        let value = value.trim().to_owned();
        if value.chars().count() > MAX_TEXT_LEN {
            errors.push_at(
                format!("availabilities.{}", index),
                &ValidationError::TooLong {
                    field: "availabilities",
                    max: MAX_TEXT_LEN,
                },
            );
            continue;
        }
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

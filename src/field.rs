//! Column identifiers for the cleaned GSS dataset
//!
//! Every column the dashboard reads is named by a closed enumeration. String
//! names coming from a UI or a query string are parsed once into
//! [`AttitudeField`] / [`GroupField`]; nothing downstream indexes the data
//! frame with an unchecked string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DashError, Result};

/// A column of the cleaned dataset, by canonical name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Weight,
    Sex,
    Education,
    Region,
    Age,
    Income,
    JobPrestige,
    MotherJobPrestige,
    FatherJobPrestige,
    SocioeconomicIndex,
    Satjob,
    Relationship,
    MaleBreadwinner,
    MenBettersuited,
    ChildSuffer,
    MenOverwork,
}

impl Field {
    /// All fields in dataset column order
    pub const ALL: [Field; 17] = [
        Field::Id,
        Field::Weight,
        Field::Sex,
        Field::Education,
        Field::Region,
        Field::Age,
        Field::Income,
        Field::JobPrestige,
        Field::MotherJobPrestige,
        Field::FatherJobPrestige,
        Field::SocioeconomicIndex,
        Field::Satjob,
        Field::Relationship,
        Field::MaleBreadwinner,
        Field::MenBettersuited,
        Field::ChildSuffer,
        Field::MenOverwork,
    ];

    /// Canonical column name in the cleaned dataset
    pub fn name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Weight => "weight",
            Field::Sex => "sex",
            Field::Education => "education",
            Field::Region => "region",
            Field::Age => "age",
            Field::Income => "income",
            Field::JobPrestige => "job_prestige",
            Field::MotherJobPrestige => "mother_job_prestige",
            Field::FatherJobPrestige => "father_job_prestige",
            Field::SocioeconomicIndex => "socioeconomic_index",
            Field::Satjob => "satjob",
            Field::Relationship => "relationship",
            Field::MaleBreadwinner => "male_breadwinner",
            Field::MenBettersuited => "men_bettersuited",
            Field::ChildSuffer => "child_suffer",
            Field::MenOverwork => "men_overwork",
        }
    }

    /// GSS variable code in the raw survey file
    pub fn raw_name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Weight => "wtss",
            Field::Sex => "sex",
            Field::Education => "educ",
            Field::Region => "region",
            Field::Age => "age",
            Field::Income => "coninc",
            Field::JobPrestige => "prestg10",
            Field::MotherJobPrestige => "mapres10",
            Field::FatherJobPrestige => "papres10",
            Field::SocioeconomicIndex => "sei10",
            Field::Satjob => "satjob",
            Field::Relationship => "fechld",
            Field::MaleBreadwinner => "fefam",
            Field::MenBettersuited => "fepol",
            Field::ChildSuffer => "fepresch",
            Field::MenOverwork => "meovrwrk",
        }
    }

    /// Whether the column is coerced to `f64` at load time
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Field::Id
                | Field::Weight
                | Field::Education
                | Field::Age
                | Field::Income
                | Field::JobPrestige
                | Field::MotherJobPrestige
                | Field::FatherJobPrestige
                | Field::SocioeconomicIndex
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Field {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| DashError::InvalidFieldError(format!("Unknown column '{}'", s)))
    }
}

/// Attitude question selectable as the primary breakdown field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttitudeField {
    #[default]
    Satjob,
    Relationship,
    MaleBreadwinner,
    MenBettersuited,
    ChildSuffer,
    MenOverwork,
}

impl AttitudeField {
    pub const ALL: [AttitudeField; 6] = [
        AttitudeField::Satjob,
        AttitudeField::Relationship,
        AttitudeField::MaleBreadwinner,
        AttitudeField::MenBettersuited,
        AttitudeField::ChildSuffer,
        AttitudeField::MenOverwork,
    ];

    pub fn field(&self) -> Field {
        match self {
            AttitudeField::Satjob => Field::Satjob,
            AttitudeField::Relationship => Field::Relationship,
            AttitudeField::MaleBreadwinner => Field::MaleBreadwinner,
            AttitudeField::MenBettersuited => Field::MenBettersuited,
            AttitudeField::ChildSuffer => Field::ChildSuffer,
            AttitudeField::MenOverwork => Field::MenOverwork,
        }
    }

    pub fn name(&self) -> &'static str {
        self.field().name()
    }

    /// Survey wording behind the column
    pub fn description(&self) -> &'static str {
        match self {
            AttitudeField::Satjob => {
                "On the whole, how satisfied are you with the work you do?"
            }
            AttitudeField::Relationship => {
                "A working mother can establish just as warm and secure a relationship with her children as a mother who does not work."
            }
            AttitudeField::MaleBreadwinner => {
                "It is much better for everyone involved if the man is the achiever outside the home and the woman takes care of the home and family."
            }
            AttitudeField::MenBettersuited => {
                "Most men are better suited emotionally for politics than are most women."
            }
            AttitudeField::ChildSuffer => {
                "A preschool child is likely to suffer if his or her mother works."
            }
            AttitudeField::MenOverwork => {
                "Family life often suffers because men concentrate too much on their work."
            }
        }
    }
}

impl fmt::Display for AttitudeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AttitudeField {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        AttitudeField::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| {
                DashError::InvalidFieldError(format!(
                    "'{}' is not a selectable feature (expected one of: {})",
                    s,
                    join_names(AttitudeField::ALL.iter().map(|f| f.name()))
                ))
            })
    }
}

/// Categorical column selectable as the breakdown grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    #[default]
    Sex,
    Region,
    Education,
}

impl GroupField {
    pub const ALL: [GroupField; 3] = [GroupField::Sex, GroupField::Region, GroupField::Education];

    pub fn field(&self) -> Field {
        match self {
            GroupField::Sex => Field::Sex,
            GroupField::Region => Field::Region,
            GroupField::Education => Field::Education,
        }
    }

    pub fn name(&self) -> &'static str {
        self.field().name()
    }

    pub fn description(&self) -> &'static str {
        match self {
            GroupField::Sex => "male or female",
            GroupField::Region => "region of the country where the respondent lives",
            GroupField::Education => "years of formal education",
        }
    }
}

impl fmt::Display for GroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GroupField {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        GroupField::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| {
                DashError::InvalidFieldError(format!(
                    "'{}' is not a selectable grouping (expected one of: {})",
                    s,
                    join_names(GroupField::ALL.iter().map(|f| f.name()))
                ))
            })
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// One user interaction: which attitude to count and how to split it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BreakdownRequest {
    pub feature: AttitudeField,
    pub group: GroupField,
}

impl BreakdownRequest {
    pub fn new(feature: AttitudeField, group: GroupField) -> Self {
        Self { feature, group }
    }

    /// Validate a pair of raw field names against the allow-lists
    pub fn parse(feature: &str, group: &str) -> Result<Self> {
        Ok(Self {
            feature: feature.parse()?,
            group: group.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
    }

    #[test]
    fn test_raw_names_are_unique() {
        let mut raw: Vec<_> = Field::ALL.iter().map(|f| f.raw_name()).collect();
        raw.sort();
        raw.dedup();
        assert_eq!(raw.len(), Field::ALL.len());
    }

    #[test]
    fn test_allow_lists_map_to_categorical_fields() {
        for field in AttitudeField::ALL {
            assert!(!field.field().is_numeric());
        }
        assert!(!GroupField::Sex.field().is_numeric());
        assert!(!GroupField::Region.field().is_numeric());
        // education is numeric years but still a valid grouping
        assert!(GroupField::Education.field().is_numeric());
    }

    #[test]
    fn test_breakdown_request_parse() {
        let request = BreakdownRequest::parse("male_breadwinner", "region").unwrap();
        assert_eq!(request.feature, AttitudeField::MaleBreadwinner);
        assert_eq!(request.group, GroupField::Region);
    }

    #[test]
    fn test_breakdown_request_rejects_fields_outside_allow_list() {
        let err = BreakdownRequest::parse("income", "sex").unwrap_err();
        assert!(matches!(err, DashError::InvalidFieldError(_)));
        assert!(err.to_string().contains("income"));

        let err = BreakdownRequest::parse("satjob", "satjob").unwrap_err();
        assert!(matches!(err, DashError::InvalidFieldError(_)));

        let err = BreakdownRequest::parse("satjob; DROP TABLE", "sex").unwrap_err();
        assert!(matches!(err, DashError::InvalidFieldError(_)));
    }

    #[test]
    fn test_default_request() {
        let request = BreakdownRequest::default();
        assert_eq!(request.feature, AttitudeField::Satjob);
        assert_eq!(request.group, GroupField::Sex);
    }

    #[test]
    fn test_serde_names_match_column_names() {
        let json = serde_json::to_string(&AttitudeField::MenBettersuited).unwrap();
        assert_eq!(json, "\"men_bettersuited\"");
        let json = serde_json::to_string(&Field::SocioeconomicIndex).unwrap();
        assert_eq!(json, "\"socioeconomic_index\"");
    }
}

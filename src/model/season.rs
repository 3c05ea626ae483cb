use crate::model::form::{timestamp_format, FieldErrors, FormDecoder, FormSchema, FormValues};
use crate::model::schema::seasons;
use crate::model::Entity;
use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable};
use serde::Serialize;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
pub struct Season {
    pub id: i32,
    pub name: String,
    #[serde(rename = "start", serialize_with = "timestamp_format::serialize")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "end", serialize_with = "timestamp_format::serialize")]
    pub ends_at: DateTime<Utc>,
}

/// A new season and the existing fixtures it takes over.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct SeasonSchema {
    #[validate(length(min = 2, max = 191, message = "Must be between 2 and 191 characters"))]
    pub name: String,
    #[serde(serialize_with = "timestamp_format::serialize")]
    pub start: DateTime<Utc>,
    #[serde(serialize_with = "timestamp_format::serialize")]
    pub end: DateTime<Utc>,
    pub fixtures: Vec<i32>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = seasons)]
pub struct NewSeason<'a> {
    pub name: &'a str,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl SeasonSchema {
    pub fn new_season(&self) -> NewSeason<'_> {
        NewSeason {
            name: &self.name,
            starts_at: self.start,
            ends_at: self.end,
        }
    }
}

impl FormSchema for SeasonSchema {
    const LIST_FIELDS: &'static [&'static str] = &["fixtures", "selectedFixtures"];

    fn decode(form: &FormValues) -> Result<Self, FieldErrors> {
        let mut decoder = FormDecoder::new(form);
        let name = decoder.text("name");
        let start = decoder.timestamp("start");
        let end = decoder.timestamp("end");
        let fixtures = decoder.ids(Self::LIST_FIELDS, "fixtures");
        decoder.finish(SeasonSchema {
            name,
            start,
            end,
            fixtures,
        })
    }
}

impl Entity for Season {
    const LABEL: &'static str = "season";
    const ID_FIELD: &'static str = "seasonId";

    type Create = SeasonSchema;
    type Listing = Season;

    fn id(&self) -> i32 {
        self.id
    }
}

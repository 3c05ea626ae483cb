use crate::model::division::Division;
use crate::model::form::{timestamp_format, FieldErrors, FormDecoder, FormSchema, FormValues};
use crate::model::schema::fixtures;
use crate::model::team::Team;
use crate::model::Entity;
use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable};
use serde::Serialize;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: i32,
    #[serde(serialize_with = "timestamp_format::serialize")]
    pub date: DateTime<Utc>,
    pub season_id: i32,
    pub division_id: i32,
    pub home_team_id: i32,
    pub away_team_id: i32,
}

#[derive(Debug, Clone, Serialize, Insertable, Validate)]
#[diesel(table_name = fixtures)]
#[serde(rename_all = "camelCase")]
pub struct FixtureSchema {
    #[serde(serialize_with = "timestamp_format::serialize")]
    pub date: DateTime<Utc>,
    pub season_id: i32,
    pub division_id: i32,
    pub home_team_id: i32,
    pub away_team_id: i32,
}

/// A fixture with the teams and division it is displayed with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureListing {
    #[serde(flatten)]
    pub fixture: Fixture,
    pub home_team: Team,
    pub away_team: Team,
    pub division: Division,
}

impl FormSchema for FixtureSchema {
    fn decode(form: &FormValues) -> Result<Self, FieldErrors> {
        let mut decoder = FormDecoder::new(form);
        let date = decoder.timestamp("date");
        let season_id = decoder.id("seasonId");
        let division_id = decoder.id("divisionId");
        let home_team_id = decoder.id("homeTeamId");
        let away_team_id = decoder.id("awayTeamId");
        decoder.finish(FixtureSchema {
            date,
            season_id,
            division_id,
            home_team_id,
            away_team_id,
        })
    }
}

impl Entity for Fixture {
    const LABEL: &'static str = "fixture";
    const ID_FIELD: &'static str = "fixtureId";

    type Create = FixtureSchema;
    type Listing = FixtureListing;

    fn id(&self) -> i32 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_form(date: &str) -> FormValues {
        FormValues::from_pairs(&[
            ("date", date),
            ("seasonId", "1"),
            ("divisionId", "1"),
            ("homeTeamId", "1"),
            ("awayTeamId", "2"),
        ])
    }

    #[test]
    fn accepts_strict_utc_dates() {
        let fixture = FixtureSchema::decode(&fixture_form("2023-02-18T10:30:00.000Z")).unwrap();
        assert_eq!(fixture.date.to_rfc3339(), "2023-02-18T10:30:00+00:00");
        assert_eq!(fixture.away_team_id, 2);
    }

    #[test]
    fn rejects_dates_without_milliseconds() {
        let errors = FixtureSchema::decode(&fixture_form("2023-02-18T10:30:00Z")).unwrap_err();
        assert_eq!(errors.get("date"), Some("Invalid datetime"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn all_four_ids_are_required() {
        let errors = FixtureSchema::decode(&FormValues::from_pairs(&[(
            "date",
            "2023-02-18T10:30:00.000Z",
        )]))
        .unwrap_err();

        for field in ["seasonId", "divisionId", "homeTeamId", "awayTeamId"] {
            assert_eq!(errors.get(field), Some("Required"), "{field}");
        }
    }
}

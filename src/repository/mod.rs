pub mod database;
#[cfg(test)]
pub mod memory;

use crate::model::division::Division;
use crate::model::fixture::{Fixture, FixtureListing};
use crate::model::league::League;
use crate::model::player::Player;
use crate::model::season::Season;
use crate::model::team::Team;
use crate::model::venue::Venue;
use crate::model::Entity;
use async_trait::async_trait;
use diesel::result::DatabaseErrorKind;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{entity} with id {id} does not exist")]
    NotFound { entity: &'static str, id: i32 },
    #[error("{entity} {id} is referenced but does not exist")]
    Dangling { entity: &'static str, id: i32 },
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("could not get database connection from pool: {0}")]
    Pool(String),
    #[error("database error: {0}")]
    Query(#[source] diesel::result::Error),
}

impl From<diesel::result::Error> for StorageError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation,
                ref info,
            ) => StorageError::Constraint(info.message().to_string()),
            other => StorageError::Query(other),
        }
    }
}

/// Create/read/delete access to one entity's rows.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Inserts one record and returns the stored row, id included.
    async fn create(&self, record: E::Create) -> Result<E, StorageError>;
    /// Removes the row with `id`; a missing row is [`StorageError::NotFound`].
    async fn delete(&self, id: i32) -> Result<(), StorageError>;
    /// Every row in insertion order, with its display relations.
    async fn list(&self) -> Result<Vec<E::Listing>, StorageError>;
}

/// The persistence handle the admin routes are built on.
pub trait Store:
    Repository<League>
    + Repository<Division>
    + Repository<Team>
    + Repository<Player>
    + Repository<Season>
    + Repository<Fixture>
    + Repository<Venue>
{
}

impl<T> Store for T where
    T: Repository<League>
        + Repository<Division>
        + Repository<Team>
        + Repository<Player>
        + Repository<Season>
        + Repository<Fixture>
        + Repository<Venue>
        + ?Sized
{
}

pub fn ensure_deleted<E: Entity>(affected: usize, id: i32) -> Result<(), StorageError> {
    if affected == 0 {
        Err(StorageError::NotFound {
            entity: E::LABEL,
            id,
        })
    } else {
        Ok(())
    }
}

/// Pairs each fixture with its teams and division.
pub fn attach_fixture_relations(
    fixtures: Vec<Fixture>,
    teams: Vec<Team>,
    divisions: Vec<Division>,
) -> Result<Vec<FixtureListing>, StorageError> {
    let teams: HashMap<i32, Team> = teams.into_iter().map(|team| (team.id, team)).collect();
    let divisions: HashMap<i32, Division> = divisions
        .into_iter()
        .map(|division| (division.id, division))
        .collect();

    let team = |id: i32| {
        teams
            .get(&id)
            .cloned()
            .ok_or(StorageError::Dangling { entity: Team::LABEL, id })
    };

    fixtures
        .into_iter()
        .map(|fixture| {
            let division = divisions
                .get(&fixture.division_id)
                .cloned()
                .ok_or(StorageError::Dangling {
                    entity: Division::LABEL,
                    id: fixture.division_id,
                })?;
            Ok(FixtureListing {
                home_team: team(fixture.home_team_id)?,
                away_team: team(fixture.away_team_id)?,
                division,
                fixture,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn zero_affected_rows_is_not_found() {
        assert!(ensure_deleted::<League>(1, 3).is_ok());
        match ensure_deleted::<League>(0, 3) {
            Err(StorageError::NotFound { entity, id }) => {
                assert_eq!(entity, "league");
                assert_eq!(id, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fixtures_pick_up_their_relations() {
        let fixture = Fixture {
            id: 1,
            date: Utc.with_ymd_and_hms(2023, 2, 18, 10, 30, 0).unwrap(),
            season_id: 1,
            division_id: 5,
            home_team_id: 1,
            away_team_id: 2,
        };
        let teams = vec![
            Team { id: 1, name: "Mountain Lions".to_string(), division_id: Some(5) },
            Team { id: 2, name: "Night Hawks".to_string(), division_id: Some(5) },
        ];
        let divisions = vec![Division { id: 5, name: "Division One".to_string(), league_id: 1 }];

        let listed =
            attach_fixture_relations(vec![fixture.clone()], teams.clone(), divisions).unwrap();
        assert_eq!(listed[0].home_team.name, "Mountain Lions");
        assert_eq!(listed[0].away_team.name, "Night Hawks");
        assert_eq!(listed[0].division.id, 5);

        let missing = attach_fixture_relations(vec![fixture], teams, Vec::new());
        assert!(matches!(missing, Err(StorageError::Dangling { entity: "division", id: 5 })));
    }
}

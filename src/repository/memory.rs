//! In-process [`Store`](crate::repository::Store) mirroring the Postgres
//! constraints, used to exercise the pipeline and routes in tests.

use crate::model::division::{Division, DivisionSchema};
use crate::model::fixture::{Fixture, FixtureListing, FixtureSchema};
use crate::model::league::{League, LeagueSchema};
use crate::model::player::{Player, PlayerSchema};
use crate::model::season::{Season, SeasonSchema};
use crate::model::team::{Team, TeamSchema};
use crate::model::venue::{Facility, Venue, VenueListing, VenueSchema};
use crate::model::Entity;
use crate::repository::{attach_fixture_relations, Repository, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_facility_writes: bool,
}

#[derive(Default)]
struct Tables {
    sequences: HashMap<&'static str, i32>,
    leagues: Vec<League>,
    divisions: Vec<Division>,
    teams: Vec<Team>,
    players: Vec<Player>,
    seasons: Vec<Season>,
    fixtures: Vec<Fixture>,
    venues: Vec<Venue>,
    facilities: Vec<Facility>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i32 {
        let sequence = self.sequences.entry(table).or_insert(0);
        *sequence += 1;
        *sequence
    }
}

fn foreign_key<E: Entity>(exists: bool, id: i32) -> Result<(), StorageError> {
    if exists {
        Ok(())
    } else {
        Err(StorageError::Constraint(format!(
            "foreign key references missing {} {}",
            E::LABEL,
            id
        )))
    }
}

fn restrict<E: Entity>(referenced: bool, id: i32, by: &str) -> Result<(), StorageError> {
    if referenced {
        Err(StorageError::Constraint(format!(
            "{} {} is still referenced by {}",
            E::LABEL,
            id,
            by
        )))
    } else {
        Ok(())
    }
}

fn remove<T>(rows: &mut Vec<T>, id: i32, id_of: impl Fn(&T) -> i32) -> bool {
    let before = rows.len();
    rows.retain(|row| id_of(row) != id);
    rows.len() != before
}

fn removed<E: Entity>(found: bool, id: i32) -> Result<(), StorageError> {
    if found {
        Ok(())
    } else {
        Err(StorageError::NotFound {
            entity: E::LABEL,
            id,
        })
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// A store whose facility batch insert fails after the venue row is
    /// written.
    pub fn with_failing_facility_writes() -> Self {
        MemoryStore {
            fail_facility_writes: true,
            ..MemoryStore::default()
        }
    }
}

#[async_trait]
impl Repository<League> for MemoryStore {
    async fn create(&self, league: LeagueSchema) -> Result<League, StorageError> {
        let mut tables = self.tables.lock().await;
        let created = League {
            id: tables.next_id("leagues"),
            name: league.name,
        };
        tables.leagues.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut tables = self.tables.lock().await;
        let referenced = tables.divisions.iter().any(|d| d.league_id == id);
        restrict::<League>(referenced, id, "a division")?;
        let found = remove(&mut tables.leagues, id, |l| l.id);
        removed::<League>(found, id)
    }

    async fn list(&self) -> Result<Vec<League>, StorageError> {
        Ok(self.tables.lock().await.leagues.clone())
    }
}

#[async_trait]
impl Repository<Division> for MemoryStore {
    async fn create(&self, division: DivisionSchema) -> Result<Division, StorageError> {
        let mut tables = self.tables.lock().await;
        let league_exists = tables.leagues.iter().any(|l| l.id == division.league_id);
        foreign_key::<League>(league_exists, division.league_id)?;
        let created = Division {
            id: tables.next_id("divisions"),
            name: division.name,
            league_id: division.league_id,
        };
        tables.divisions.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut tables = self.tables.lock().await;
        let referenced = tables.teams.iter().any(|t| t.division_id == Some(id))
            || tables.fixtures.iter().any(|f| f.division_id == id);
        restrict::<Division>(referenced, id, "a team or fixture")?;
        let found = remove(&mut tables.divisions, id, |d| d.id);
        removed::<Division>(found, id)
    }

    async fn list(&self) -> Result<Vec<Division>, StorageError> {
        Ok(self.tables.lock().await.divisions.clone())
    }
}

#[async_trait]
impl Repository<Team> for MemoryStore {
    async fn create(&self, team: TeamSchema) -> Result<Team, StorageError> {
        let mut tables = self.tables.lock().await;
        if let Some(division_id) = team.division_id {
            let exists = tables.divisions.iter().any(|d| d.id == division_id);
            foreign_key::<Division>(exists, division_id)?;
        }
        let created = Team {
            id: tables.next_id("teams"),
            name: team.name,
            division_id: team.division_id,
        };
        tables.teams.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut tables = self.tables.lock().await;
        let referenced = tables.players.iter().any(|p| p.team_id == Some(id))
            || tables
                .fixtures
                .iter()
                .any(|f| f.home_team_id == id || f.away_team_id == id);
        restrict::<Team>(referenced, id, "a player or fixture")?;
        let found = remove(&mut tables.teams, id, |t| t.id);
        removed::<Team>(found, id)
    }

    async fn list(&self) -> Result<Vec<Team>, StorageError> {
        Ok(self.tables.lock().await.teams.clone())
    }
}

#[async_trait]
impl Repository<Player> for MemoryStore {
    async fn create(&self, player: PlayerSchema) -> Result<Player, StorageError> {
        let mut tables = self.tables.lock().await;
        if let Some(team_id) = player.team_id {
            let exists = tables.teams.iter().any(|t| t.id == team_id);
            foreign_key::<Team>(exists, team_id)?;
        }
        let created = Player {
            id: tables.next_id("players"),
            first_name: player.first_name,
            last_name: player.last_name,
            middle_name: player.middle_name,
            team_id: player.team_id,
        };
        tables.players.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut tables = self.tables.lock().await;
        let found = remove(&mut tables.players, id, |p| p.id);
        removed::<Player>(found, id)
    }

    async fn list(&self) -> Result<Vec<Player>, StorageError> {
        Ok(self.tables.lock().await.players.clone())
    }
}

#[async_trait]
impl Repository<Season> for MemoryStore {
    async fn create(&self, season: SeasonSchema) -> Result<Season, StorageError> {
        let mut tables = self.tables.lock().await;
        for fixture_id in &season.fixtures {
            let exists = tables.fixtures.iter().any(|f| f.id == *fixture_id);
            foreign_key::<Fixture>(exists, *fixture_id)?;
        }
        let created = Season {
            id: tables.next_id("seasons"),
            name: season.name,
            starts_at: season.start,
            ends_at: season.end,
        };
        for fixture in tables
            .fixtures
            .iter_mut()
            .filter(|f| season.fixtures.contains(&f.id))
        {
            fixture.season_id = created.id;
        }
        tables.seasons.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut tables = self.tables.lock().await;
        let referenced = tables.fixtures.iter().any(|f| f.season_id == id);
        restrict::<Season>(referenced, id, "a fixture")?;
        let found = remove(&mut tables.seasons, id, |s| s.id);
        removed::<Season>(found, id)
    }

    async fn list(&self) -> Result<Vec<Season>, StorageError> {
        Ok(self.tables.lock().await.seasons.clone())
    }
}

#[async_trait]
impl Repository<Fixture> for MemoryStore {
    async fn create(&self, fixture: FixtureSchema) -> Result<Fixture, StorageError> {
        let mut tables = self.tables.lock().await;
        let season_exists = tables.seasons.iter().any(|s| s.id == fixture.season_id);
        foreign_key::<Season>(season_exists, fixture.season_id)?;
        let division_exists = tables.divisions.iter().any(|d| d.id == fixture.division_id);
        foreign_key::<Division>(division_exists, fixture.division_id)?;
        for team_id in [fixture.home_team_id, fixture.away_team_id] {
            let exists = tables.teams.iter().any(|t| t.id == team_id);
            foreign_key::<Team>(exists, team_id)?;
        }
        let created = Fixture {
            id: tables.next_id("fixtures"),
            date: fixture.date,
            season_id: fixture.season_id,
            division_id: fixture.division_id,
            home_team_id: fixture.home_team_id,
            away_team_id: fixture.away_team_id,
        };
        tables.fixtures.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut tables = self.tables.lock().await;
        let found = remove(&mut tables.fixtures, id, |f| f.id);
        removed::<Fixture>(found, id)
    }

    async fn list(&self) -> Result<Vec<FixtureListing>, StorageError> {
        let tables = self.tables.lock().await;
        attach_fixture_relations(
            tables.fixtures.clone(),
            tables.teams.clone(),
            tables.divisions.clone(),
        )
    }
}

#[async_trait]
impl Repository<Venue> for MemoryStore {
    async fn create(&self, venue: VenueSchema) -> Result<Venue, StorageError> {
        let mut tables = self.tables.lock().await;
        let created = Venue {
            id: tables.next_id("venues"),
            name: venue.name.clone(),
            address: venue.address.clone(),
            city: venue.city.clone(),
            postcode: venue.postcode.clone(),
            long: venue.long,
            lat: venue.lat,
            image: venue.image.clone(),
        };
        tables.venues.push(created.clone());

        if !venue.facilities.is_empty() {
            if self.fail_facility_writes {
                return Err(StorageError::Constraint(
                    "facility batch insert rejected".to_string(),
                ));
            }
            for row in venue.new_facilities(created.id) {
                let facility = Facility {
                    id: tables.next_id("facilities"),
                    venue_id: row.venue_id,
                    facility: row.facility,
                    description: None,
                };
                tables.facilities.push(facility);
            }
        }
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut tables = self.tables.lock().await;
        let found = remove(&mut tables.venues, id, |v| v.id);
        if found {
            tables.facilities.retain(|f| f.venue_id != id);
        }
        removed::<Venue>(found, id)
    }

    async fn list(&self) -> Result<Vec<VenueListing>, StorageError> {
        let tables = self.tables.lock().await;
        let listings = tables
            .venues
            .iter()
            .map(|venue| VenueListing {
                venue: venue.clone(),
                facilities: tables
                    .facilities
                    .iter()
                    .filter(|f| f.venue_id == venue.id)
                    .cloned()
                    .collect(),
            })
            .collect();
        Ok(listings)
    }
}

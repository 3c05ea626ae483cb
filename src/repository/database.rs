use crate::config::config::Config;
use crate::model::division::{Division, DivisionSchema};
use crate::model::fixture::{Fixture, FixtureListing, FixtureSchema};
use crate::model::league::{League, LeagueSchema};
use crate::model::player::{Player, PlayerSchema};
use crate::model::schema::{
    divisions, facilities, fixtures, leagues, players, seasons, teams, venues,
};
use crate::model::season::{Season, SeasonSchema};
use crate::model::team::{Team, TeamSchema};
use crate::model::venue::{Facility, Venue, VenueListing, VenueSchema};
use crate::repository::{attach_fixture_relations, ensure_deleted, Repository, StorageError};
use async_trait::async_trait;
use deadpool::managed::Object;
use diesel::prelude::*;
use diesel::{ConnectionError, ConnectionResult};
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use log::{error, info};
use openssl::ssl::{SslConnector, SslMethod};
use postgres_openssl::MakeTlsConnector;

pub type DBPool = Pool<AsyncPgConnection>;
type DBConn = Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Postgres-backed [`Repository`] for every entity.
pub struct Database {
    pool: DBPool,
}

impl Database {
    pub fn new(config: &Config) -> Result<Self, StorageError> {
        let manager = match &config.database_ca_file {
            Some(ca_file) => {
                let ca_file = ca_file.clone();
                AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_setup(
                    config.database_url.clone(),
                    move |url| Box::pin(Self::establish_tls(url, ca_file.clone())),
                )
            }
            None => AsyncDieselConnectionManager::<AsyncPgConnection>::new(
                config.database_url.clone(),
            ),
        };
        let pool = Pool::builder(manager)
            .max_size(config.database_pool_size)
            .build()
            .map_err(|e| StorageError::Pool(e.to_string()))?;
        info!(
            "database pool ready (max {} connections, tls: {})",
            config.database_pool_size,
            config.database_ca_file.is_some()
        );
        Ok(Database { pool })
    }

    async fn establish_tls(
        database_url: &str,
        ca_file: String,
    ) -> ConnectionResult<AsyncPgConnection> {
        let mut builder = SslConnector::builder(SslMethod::tls())
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
        builder
            .set_ca_file(&ca_file)
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
        let connector = MakeTlsConnector::new(builder.build());
        let (client, connection) = tokio_postgres::connect(database_url, connector)
            .await
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("database connection error: {e}");
            }
        });
        AsyncPgConnection::try_from(client).await
    }

    async fn get_db_conn(&self) -> Result<DBConn, StorageError> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::Pool(e.to_string()))
    }
}

#[async_trait]
impl Repository<League> for Database {
    async fn create(&self, league: LeagueSchema) -> Result<League, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let created = diesel::insert_into(leagues::table)
            .values(&league)
            .get_result::<League>(&mut conn)
            .await?;
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut conn = self.get_db_conn().await?;
        let affected = diesel::delete(leagues::table.find(id))
            .execute(&mut conn)
            .await?;
        ensure_deleted::<League>(affected, id)
    }

    async fn list(&self) -> Result<Vec<League>, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let rows = leagues::table
            .order(leagues::id.asc())
            .load::<League>(&mut conn)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Repository<Division> for Database {
    async fn create(&self, division: DivisionSchema) -> Result<Division, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let created = diesel::insert_into(divisions::table)
            .values(&division)
            .get_result::<Division>(&mut conn)
            .await?;
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut conn = self.get_db_conn().await?;
        let affected = diesel::delete(divisions::table.find(id))
            .execute(&mut conn)
            .await?;
        ensure_deleted::<Division>(affected, id)
    }

    async fn list(&self) -> Result<Vec<Division>, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let rows = divisions::table
            .order(divisions::id.asc())
            .load::<Division>(&mut conn)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Repository<Team> for Database {
    async fn create(&self, team: TeamSchema) -> Result<Team, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let created = diesel::insert_into(teams::table)
            .values(&team)
            .get_result::<Team>(&mut conn)
            .await?;
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut conn = self.get_db_conn().await?;
        let affected = diesel::delete(teams::table.find(id))
            .execute(&mut conn)
            .await?;
        ensure_deleted::<Team>(affected, id)
    }

    async fn list(&self) -> Result<Vec<Team>, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let rows = teams::table
            .order(teams::id.asc())
            .load::<Team>(&mut conn)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Repository<Player> for Database {
    async fn create(&self, player: PlayerSchema) -> Result<Player, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let created = diesel::insert_into(players::table)
            .values(&player)
            .get_result::<Player>(&mut conn)
            .await?;
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut conn = self.get_db_conn().await?;
        let affected = diesel::delete(players::table.find(id))
            .execute(&mut conn)
            .await?;
        ensure_deleted::<Player>(affected, id)
    }

    async fn list(&self) -> Result<Vec<Player>, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let rows = players::table
            .order(players::id.asc())
            .load::<Player>(&mut conn)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Repository<Season> for Database {
    /// Inserts the season and moves the listed fixtures onto it in one
    /// transaction.
    async fn create(&self, season: SeasonSchema) -> Result<Season, StorageError> {
        let mut conn = self.get_db_conn().await?;
        conn.transaction::<Season, StorageError, _>(|conn| {
            async move {
                let created = diesel::insert_into(seasons::table)
                    .values(season.new_season())
                    .get_result::<Season>(conn)
                    .await?;

                if !season.fixtures.is_empty() {
                    let connected = diesel::update(
                        fixtures::table.filter(fixtures::id.eq_any(season.fixtures.clone())),
                    )
                    .set(fixtures::season_id.eq(created.id))
                    .execute(conn)
                    .await?;
                    if connected != season.fixtures.len() {
                        return Err(StorageError::Constraint(format!(
                            "only {} of {} fixtures exist to connect to season {}",
                            connected,
                            season.fixtures.len(),
                            season.name
                        )));
                    }
                }
                Ok(created)
            }
            .scope_boxed()
        })
        .await
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut conn = self.get_db_conn().await?;
        let affected = diesel::delete(seasons::table.find(id))
            .execute(&mut conn)
            .await?;
        ensure_deleted::<Season>(affected, id)
    }

    async fn list(&self) -> Result<Vec<Season>, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let rows = seasons::table
            .order(seasons::id.asc())
            .load::<Season>(&mut conn)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Repository<Fixture> for Database {
    async fn create(&self, fixture: FixtureSchema) -> Result<Fixture, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let created = diesel::insert_into(fixtures::table)
            .values(&fixture)
            .get_result::<Fixture>(&mut conn)
            .await?;
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut conn = self.get_db_conn().await?;
        let affected = diesel::delete(fixtures::table.find(id))
            .execute(&mut conn)
            .await?;
        ensure_deleted::<Fixture>(affected, id)
    }

    async fn list(&self) -> Result<Vec<FixtureListing>, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let rows = fixtures::table
            .order(fixtures::id.asc())
            .load::<Fixture>(&mut conn)
            .await?;

        let team_ids: Vec<i32> = rows
            .iter()
            .flat_map(|fixture| [fixture.home_team_id, fixture.away_team_id])
            .collect();
        let division_ids: Vec<i32> = rows.iter().map(|fixture| fixture.division_id).collect();

        let related_teams = teams::table
            .filter(teams::id.eq_any(team_ids))
            .load::<Team>(&mut conn)
            .await?;
        let related_divisions = divisions::table
            .filter(divisions::id.eq_any(division_ids))
            .load::<Division>(&mut conn)
            .await?;

        attach_fixture_relations(rows, related_teams, related_divisions)
    }
}

#[async_trait]
impl Repository<Venue> for Database {
    /// Two sequential writes: the venue, then its facilities. A failure in
    /// the second write leaves the venue without facilities.
    async fn create(&self, venue: VenueSchema) -> Result<Venue, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let created = diesel::insert_into(venues::table)
            .values(venue.new_venue())
            .get_result::<Venue>(&mut conn)
            .await?;

        if !venue.facilities.is_empty() {
            if let Err(err) = diesel::insert_into(facilities::table)
                .values(venue.new_facilities(created.id))
                .execute(&mut conn)
                .await
            {
                error!(
                    "venue {} was created but its facilities were not. The error: {:?}",
                    created.id, err
                );
                return Err(err.into());
            }
        }
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), StorageError> {
        let mut conn = self.get_db_conn().await?;
        let affected = diesel::delete(venues::table.find(id))
            .execute(&mut conn)
            .await?;
        ensure_deleted::<Venue>(affected, id)
    }

    async fn list(&self) -> Result<Vec<VenueListing>, StorageError> {
        let mut conn = self.get_db_conn().await?;
        let rows = venues::table
            .order(venues::id.asc())
            .load::<Venue>(&mut conn)
            .await?;
        let all_facilities = Facility::belonging_to(&rows)
            .order(facilities::id.asc())
            .load::<Facility>(&mut conn)
            .await?;

        let listings = all_facilities
            .grouped_by(&rows)
            .into_iter()
            .zip(rows)
            .map(|(facilities, venue)| VenueListing { venue, facilities })
            .collect();
        Ok(listings)
    }
}

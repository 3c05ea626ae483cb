use crate::model::division::Division;
use crate::model::fixture::Fixture;
use crate::model::league::League;
use crate::model::player::Player;
use crate::model::season::Season;
use crate::model::team::Team;
use crate::model::venue::Venue;
use crate::model::Entity;
use crate::repository::{Repository, StorageError, Store};
use crate::service::mutation::{self, RouteFailure, Submission};
use crate::AppState;
use actix_web::web::{Data, Form};
use actix_web::{web, HttpResponse};
use serde_json::json;

fn failure<E: Entity>(err: StorageError) -> RouteFailure {
    RouteFailure::new::<E>(err.into())
}

/// POST handler shared by every admin form.
async fn submit<E: Entity>(
    data: Data<AppState>,
    form: Form<Vec<(String, String)>>,
) -> Result<HttpResponse, RouteFailure>
where
    dyn Store: Repository<E>,
{
    let submission = Submission::decode::<E>(form.into_inner()).map_err(RouteFailure::new::<E>)?;
    let response = mutation::apply::<E, dyn Store>(data.store.as_ref(), submission)
        .await
        .map_err(RouteFailure::new::<E>)?;

    if response.is_rejected() {
        Ok(HttpResponse::UnprocessableEntity().json(response))
    } else {
        Ok(HttpResponse::Ok().json(response))
    }
}

async fn load_leagues(data: Data<AppState>) -> Result<HttpResponse, RouteFailure> {
    let store = data.store.as_ref();
    let leagues = Repository::<League>::list(store)
        .await
        .map_err(failure::<League>)?;
    Ok(HttpResponse::Ok().json(json!({ "leagues": leagues })))
}

async fn load_divisions(data: Data<AppState>) -> Result<HttpResponse, RouteFailure> {
    let store = data.store.as_ref();
    let divisions = Repository::<Division>::list(store)
        .await
        .map_err(failure::<Division>)?;
    let leagues = Repository::<League>::list(store)
        .await
        .map_err(failure::<Division>)?;
    Ok(HttpResponse::Ok().json(json!({ "divisions": divisions, "leagues": leagues })))
}

async fn load_teams(data: Data<AppState>) -> Result<HttpResponse, RouteFailure> {
    let store = data.store.as_ref();
    let teams = Repository::<Team>::list(store).await.map_err(failure::<Team>)?;
    let divisions = Repository::<Division>::list(store)
        .await
        .map_err(failure::<Team>)?;
    Ok(HttpResponse::Ok().json(json!({ "teams": teams, "divisions": divisions })))
}

async fn load_players(data: Data<AppState>) -> Result<HttpResponse, RouteFailure> {
    let store = data.store.as_ref();
    let players = Repository::<Player>::list(store)
        .await
        .map_err(failure::<Player>)?;
    let teams = Repository::<Team>::list(store).await.map_err(failure::<Player>)?;
    Ok(HttpResponse::Ok().json(json!({ "players": players, "teams": teams })))
}

async fn load_seasons(data: Data<AppState>) -> Result<HttpResponse, RouteFailure> {
    let store = data.store.as_ref();
    let seasons = Repository::<Season>::list(store)
        .await
        .map_err(failure::<Season>)?;
    let fixtures = Repository::<Fixture>::list(store)
        .await
        .map_err(failure::<Season>)?;
    Ok(HttpResponse::Ok().json(json!({ "seasons": seasons, "fixtures": fixtures })))
}

async fn load_fixtures(data: Data<AppState>) -> Result<HttpResponse, RouteFailure> {
    let store = data.store.as_ref();
    let fixtures = Repository::<Fixture>::list(store)
        .await
        .map_err(failure::<Fixture>)?;
    let seasons = Repository::<Season>::list(store)
        .await
        .map_err(failure::<Fixture>)?;
    let divisions = Repository::<Division>::list(store)
        .await
        .map_err(failure::<Fixture>)?;
    let teams = Repository::<Team>::list(store)
        .await
        .map_err(failure::<Fixture>)?;
    Ok(HttpResponse::Ok().json(json!({
        "fixtures": fixtures,
        "seasons": seasons,
        "divisions": divisions,
        "teams": teams
    })))
}

async fn load_venues(data: Data<AppState>) -> Result<HttpResponse, RouteFailure> {
    let venues = Repository::<Venue>::list(data.store.as_ref())
        .await
        .map_err(failure::<Venue>)?;
    Ok(HttpResponse::Ok().json(json!({ "venues": venues })))
}

pub fn config(conf: &mut web::ServiceConfig) {
    let scope = web::scope("/admin")
        .service(
            web::resource("/leagues")
                .route(web::get().to(load_leagues))
                .route(web::post().to(submit::<League>)),
        )
        .service(
            web::resource("/divisions")
                .route(web::get().to(load_divisions))
                .route(web::post().to(submit::<Division>)),
        )
        .service(
            web::resource("/teams")
                .route(web::get().to(load_teams))
                .route(web::post().to(submit::<Team>)),
        )
        .service(
            web::resource("/players")
                .route(web::get().to(load_players))
                .route(web::post().to(submit::<Player>)),
        )
        .service(
            web::resource("/seasons")
                .route(web::get().to(load_seasons))
                .route(web::post().to(submit::<Season>)),
        )
        .service(
            web::resource("/fixtures")
                .route(web::get().to(load_fixtures))
                .route(web::post().to(submit::<Fixture>)),
        )
        .service(
            web::resource("/venues")
                .route(web::get().to(load_venues))
                .route(web::post().to(submit::<Venue>)),
        );

    conf.service(scope);
}

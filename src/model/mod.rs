pub mod division;
pub mod fixture;
pub mod form;
pub mod league;
pub mod player;
pub mod response;
pub mod schema;
pub mod season;
pub mod team;
pub mod venue;

use crate::model::form::FormSchema;
use serde::Serialize;
use std::fmt::Debug;

/// A persisted record type managed through an admin form.
pub trait Entity: Serialize + Debug + Send + Sync + Sized + 'static {
    /// Lowercase singular name, used in logs and failure titles.
    const LABEL: &'static str;
    /// Form field carrying the id on delete submissions.
    const ID_FIELD: &'static str;
    /// Routes that predate intents treat a missing `_action` as a create and
    /// reply with the new id.
    const SINGLE_PURPOSE: bool = false;

    type Create: FormSchema + Debug + Send + 'static;
    type Listing: Serialize + Send + 'static;

    fn id(&self) -> i32;
}

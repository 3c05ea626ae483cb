use crate::model::form::{FieldErrors, FormDecoder, FormSchema, FormValues};
use crate::model::schema::players;
use crate::model::Entity;
use diesel::{Insertable, Queryable};
use serde::Serialize;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub team_id: Option<i32>,
}

// Explicit renames keep validator error keys in the form's camelCase.
#[derive(Debug, Clone, Serialize, Insertable, Validate)]
#[diesel(table_name = players)]
pub struct PlayerSchema {
    #[serde(rename = "firstName")]
    #[validate(length(min = 2, max = 191, message = "Must be between 2 and 191 characters"))]
    pub first_name: String,
    #[serde(rename = "lastName")]
    #[validate(length(min = 2, max = 191, message = "Must be between 2 and 191 characters"))]
    pub last_name: String,
    #[serde(rename = "middleName")]
    #[validate(length(max = 191, message = "Must be at most 191 characters"))]
    pub middle_name: Option<String>,
    #[serde(rename = "teamId")]
    pub team_id: Option<i32>,
}

impl FormSchema for PlayerSchema {
    fn decode(form: &FormValues) -> Result<Self, FieldErrors> {
        let mut decoder = FormDecoder::new(form);
        let first_name = decoder.text("firstName");
        let last_name = decoder.text("lastName");
        let middle_name = decoder.optional_text("middleName");
        let team_id = decoder.optional_id("teamId");
        decoder.finish(PlayerSchema {
            first_name,
            last_name,
            middle_name,
            team_id,
        })
    }
}

impl Entity for Player {
    const LABEL: &'static str = "player";
    const ID_FIELD: &'static str = "playerId";

    type Create = PlayerSchema;
    type Listing = Player;

    fn id(&self) -> i32 {
        self.id
    }
}

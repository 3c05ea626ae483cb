use crate::model::form::{FieldErrors, FormDecoder, FormSchema, FormValues};
use crate::model::schema::teams;
use crate::model::Entity;
use diesel::{Insertable, Queryable};
use serde::Serialize;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub division_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Insertable, Validate)]
#[diesel(table_name = teams)]
#[serde(rename_all = "camelCase")]
pub struct TeamSchema {
    #[validate(length(min = 2, max = 191, message = "Must be between 2 and 191 characters"))]
    pub name: String,
    pub division_id: Option<i32>,
}

impl FormSchema for TeamSchema {
    fn decode(form: &FormValues) -> Result<Self, FieldErrors> {
        let mut decoder = FormDecoder::new(form);
        let name = decoder.text("name");
        let division_id = decoder.optional_id("divisionId");
        decoder.finish(TeamSchema { name, division_id })
    }
}

impl Entity for Team {
    const LABEL: &'static str = "team";
    const ID_FIELD: &'static str = "teamId";
    const SINGLE_PURPOSE: bool = true;

    type Create = TeamSchema;
    type Listing = Team;

    fn id(&self) -> i32 {
        self.id
    }
}

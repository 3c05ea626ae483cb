use crate::model::form::{FieldErrors, FormDecoder, FormSchema, FormValues};
use crate::model::schema::leagues;
use crate::model::Entity;
use diesel::{Insertable, Queryable};
use serde::Serialize;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
pub struct League {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Insertable, Validate)]
#[diesel(table_name = leagues)]
pub struct LeagueSchema {
    #[validate(length(min = 2, max = 191, message = "Must be between 2 and 191 characters"))]
    pub name: String,
}

impl FormSchema for LeagueSchema {
    fn decode(form: &FormValues) -> Result<Self, FieldErrors> {
        let mut decoder = FormDecoder::new(form);
        let name = decoder.text("name");
        decoder.finish(LeagueSchema { name })
    }
}

impl Entity for League {
    const LABEL: &'static str = "league";
    const ID_FIELD: &'static str = "leagueId";
    const SINGLE_PURPOSE: bool = true;

    type Create = LeagueSchema;
    type Listing = League;

    fn id(&self) -> i32 {
        self.id
    }
}

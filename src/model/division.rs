use crate::model::form::{FieldErrors, FormDecoder, FormSchema, FormValues};
use crate::model::schema::divisions;
use crate::model::Entity;
use diesel::{Insertable, Queryable};
use serde::Serialize;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: i32,
    pub name: String,
    pub league_id: i32,
}

#[derive(Debug, Clone, Serialize, Insertable, Validate)]
#[diesel(table_name = divisions)]
#[serde(rename_all = "camelCase")]
pub struct DivisionSchema {
    #[validate(length(min = 2, max = 191, message = "Must be between 2 and 191 characters"))]
    pub name: String,
    pub league_id: i32,
}

impl FormSchema for DivisionSchema {
    fn decode(form: &FormValues) -> Result<Self, FieldErrors> {
        let mut decoder = FormDecoder::new(form);
        let name = decoder.text("name");
        let league_id = decoder.id("leagueId");
        decoder.finish(DivisionSchema { name, league_id })
    }
}

impl Entity for Division {
    const LABEL: &'static str = "division";
    const ID_FIELD: &'static str = "divisionId";
    const SINGLE_PURPOSE: bool = true;

    type Create = DivisionSchema;
    type Listing = Division;

    fn id(&self) -> i32 {
        self.id
    }
}

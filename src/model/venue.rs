use crate::model::form::{FieldErrors, FormDecoder, FormSchema, FormValues};
use crate::model::schema::{facilities, venues};
use crate::model::Entity;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{Associations, Identifiable, Insertable, Queryable};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Identifiable)]
#[diesel(table_name = venues)]
pub struct Venue {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postcode: String,
    pub long: Option<f64>,
    pub lat: Option<f64>,
    pub image: Option<String>,
}

/// Amenity a venue can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacilityKind {
    Parking,
    Bar,
    Drinks,
    Snacks,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid enum value. Expected 'PARKING' | 'BAR' | 'DRINKS' | 'SNACKS', received '{0}'")]
pub struct UnknownFacility(pub String);

impl FacilityKind {
    pub const ALL: [FacilityKind; 4] = [
        FacilityKind::Parking,
        FacilityKind::Bar,
        FacilityKind::Drinks,
        FacilityKind::Snacks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityKind::Parking => "PARKING",
            FacilityKind::Bar => "BAR",
            FacilityKind::Drinks => "DRINKS",
            FacilityKind::Snacks => "SNACKS",
        }
    }
}

impl fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacilityKind {
    type Err = UnknownFacility;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        FacilityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| UnknownFacility(raw.to_string()))
    }
}

impl ToSql<Text, Pg> for FacilityKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for FacilityKind {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(raw.parse::<FacilityKind>()?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Venue))]
#[diesel(table_name = facilities)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: i32,
    pub venue_id: i32,
    pub facility: FacilityKind,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = facilities)]
pub struct NewFacility {
    pub venue_id: i32,
    pub facility: FacilityKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueListing {
    #[serde(flatten)]
    pub venue: Venue,
    pub facilities: Vec<Facility>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct VenueSchema {
    #[validate(length(min = 2, max = 191, message = "Must be between 2 and 191 characters"))]
    pub name: String,
    #[validate(length(min = 2, max = 191, message = "Must be between 2 and 191 characters"))]
    pub address: String,
    #[validate(length(min = 2, max = 191, message = "Must be between 2 and 191 characters"))]
    pub city: String,
    #[validate(length(min = 2, max = 16, message = "Must be between 2 and 16 characters"))]
    pub postcode: String,
    pub long: Option<f64>,
    pub lat: Option<f64>,
    #[validate(
        url(message = "Invalid url"),
        length(max = 2048, message = "Must be at most 2048 characters")
    )]
    pub image: Option<String>,
    pub facilities: Vec<FacilityKind>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = venues)]
pub struct NewVenue<'a> {
    pub name: &'a str,
    pub address: &'a str,
    pub city: &'a str,
    pub postcode: &'a str,
    pub long: Option<f64>,
    pub lat: Option<f64>,
    pub image: Option<&'a str>,
}

impl VenueSchema {
    pub fn new_venue(&self) -> NewVenue<'_> {
        NewVenue {
            name: &self.name,
            address: &self.address,
            city: &self.city,
            postcode: &self.postcode,
            long: self.long,
            lat: self.lat,
            image: self.image.as_deref(),
        }
    }

    /// One row per selected facility, tagged with the created venue.
    pub fn new_facilities(&self, venue_id: i32) -> Vec<NewFacility> {
        self.facilities
            .iter()
            .map(|facility| NewFacility {
                venue_id,
                facility: *facility,
            })
            .collect()
    }
}

impl FormSchema for VenueSchema {
    const LIST_FIELDS: &'static [&'static str] = &["facilities", "selectedFacilities"];

    fn decode(form: &FormValues) -> Result<Self, FieldErrors> {
        let mut decoder = FormDecoder::new(form);
        let name = decoder.text("name");
        let address = decoder.text("address");
        let city = decoder.text("city");
        let postcode = decoder.text("postcode");
        let long = decoder.optional_number("long");
        if long.is_some_and(|long| !(-180.0..=180.0).contains(&long)) {
            decoder.reject("long", "Longitude must be between -180 and 180");
        }
        let lat = decoder.optional_number("lat");
        if lat.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
            decoder.reject("lat", "Latitude must be between -90 and 90");
        }
        let image = decoder.optional_text("image");

        // The browser form joins the checkbox group into `selectedFacilities`.
        let mut facilities = Vec::new();
        let selected = decoder.list(Self::LIST_FIELDS);
        for (index, raw) in selected.iter().enumerate() {
            match raw.parse::<FacilityKind>() {
                Ok(facility) => facilities.push(facility),
                Err(err) => decoder.reject(format!("facilities.{index}"), err.to_string()),
            }
        }

        decoder.finish(VenueSchema {
            name,
            address,
            city,
            postcode,
            long,
            lat,
            image,
            facilities,
        })
    }
}

impl Entity for Venue {
    const LABEL: &'static str = "venue";
    const ID_FIELD: &'static str = "venueId";

    type Create = VenueSchema;
    type Listing = VenueListing;

    fn id(&self) -> i32 {
        self.id
    }
}

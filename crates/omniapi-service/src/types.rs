//! Record types shared by every protocol adapter.
//!
//! Records are plain serde structs. Adapters treat them as JSON objects
//! (field access by declared JSON name), so the serde names below are the
//! wire names on every protocol.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A named category of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Pet,
    Dinosaur,
    Car,
    Movie,
    Plant,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Pet,
        EntityKind::Dinosaur,
        EntityKind::Car,
        EntityKind::Movie,
        EntityKind::Plant,
    ];

    /// Singular PascalCase name (`Pet`), used for GraphQL/SOAP operation names.
    pub fn singular(self) -> &'static str {
        match self {
            Self::Pet => "Pet",
            Self::Dinosaur => "Dinosaur",
            Self::Car => "Car",
            Self::Movie => "Movie",
            Self::Plant => "Plant",
        }
    }

    /// Plural PascalCase name (`Pets`), also the OData entity set name.
    pub fn plural(self) -> &'static str {
        match self {
            Self::Pet => "Pets",
            Self::Dinosaur => "Dinosaurs",
            Self::Car => "Cars",
            Self::Movie => "Movies",
            Self::Plant => "Plants",
        }
    }

    /// Lowercase REST path segment (`pets`).
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Pet => "pets",
            Self::Dinosaur => "dinosaurs",
            Self::Car => "cars",
            Self::Movie => "movies",
            Self::Plant => "plants",
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.path_segment() == segment)
    }

    pub fn from_entity_set(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.plural() == name)
    }

    /// JSON name of the identifier field.
    pub fn id_field(self) -> &'static str {
        match self {
            Self::Movie => "ID",
            _ => "id",
        }
    }

    /// Field receiving the primary part of a compact `"Name (Secondary)"` value.
    pub fn name_field(self) -> &'static str {
        match self {
            Self::Movie => "Title",
            _ => "name",
        }
    }

    /// Field receiving the parenthesised part of a compact name.
    pub fn secondary_field(self) -> &'static str {
        match self {
            Self::Pet => "breed",
            Self::Dinosaur | Self::Plant => "species",
            Self::Car => "make",
            Self::Movie => "Genre",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

/// A storable record type.
///
/// `Default` provides the template new records are merged onto, so every
/// declared field is always present in the JSON form.
pub trait Entity: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

macro_rules! impl_entity {
    ($ty:ty, $kind:expr) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Pets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct Owner {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct MedicalRecord {
    /// ISO-8601 date of the visit.
    pub date: String,
    pub description: String,
    pub vet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub breed: String,
    pub age: u32,
    pub owner: Owner,
    pub medical: Vec<MedicalRecord>,
    pub tags: Vec<String>,
}

impl_entity!(Pet, EntityKind::Pet);

// ---------------------------------------------------------------------------
// Dinosaurs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct Discovery {
    pub year: i32,
    pub location: String,
    pub paleontologist: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct Dinosaur {
    pub id: String,
    pub name: String,
    pub species: String,
    pub period: String,
    pub diet: String,
    pub discovered: Discovery,
    pub features: Vec<String>,
}

impl_entity!(Dinosaur, EntityKind::Dinosaur);

// ---------------------------------------------------------------------------
// Cars, movies, plants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct Car {
    pub id: String,
    pub name: String,
    pub make: String,
    pub year: i32,
    pub price: f64,
    pub electric: bool,
}

impl_entity!(Car, EntityKind::Car);

/// Movies use PascalCase field names, following OData conventions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default, rename_all = "PascalCase")]
pub struct Movie {
    #[serde(rename = "ID")]
    pub id: String,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub rating: f64,
    pub director: String,
}

impl_entity!(Movie, EntityKind::Movie);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct Plant {
    pub id: String,
    pub name: String,
    pub species: String,
    pub family: String,
    pub sunlight: String,
    pub watering_days: u32,
}

impl_entity!(Plant, EntityKind::Plant);

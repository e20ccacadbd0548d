use serde::Deserialize;

use super::model::{DbError, DbResult, Movie, Person};

/// A movie catalog as read from a JSON fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub movies: Vec<CatalogMovie>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogMovie {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub actors: Vec<CastMember>,
    /// `tmdbId`s of the directors.
    #[serde(default)]
    pub directors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    pub tmdb_id: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl Catalog {
    pub fn from_json(content: &str) -> DbResult<Self> {
        serde_json::from_str(content).map_err(|e| DbError::Catalog(e.to_string()))
    }

    pub async fn from_file(path: &str) -> DbResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DbError::Catalog(format!("{}: {}", path, e)))?;
        Self::from_json(&content)
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub tmdb_id: String,
    #[serde(default)]
    pub imdb_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub runtime: Option<i64>,
    #[serde(default)]
    pub imdb_rating: Option<f64>,
    #[serde(default)]
    pub imdb_votes: Option<i64>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub budget: Option<i64>,
    #[serde(default)]
    pub revenue: Option<i64>,
    #[serde(default)]
    #[sqlx(json)]
    pub languages: Vec<String>,
    #[serde(default)]
    #[sqlx(json)]
    pub countries: Vec<String>,
}

/// A movie in a list, flagged when the acting user has favorited it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MovieListItem {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movie: Movie,
    pub favorite: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SimilarMovie {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movie: Movie,
    pub score: f64,
    pub favorite: bool,
}

/// The movie returned after a rating was stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RatedMovie {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movie: Movie,
    pub rating: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    pub actors: Vec<Actor>,
    pub directors: Vec<Person>,
    pub genres: Vec<GenreName>,
    pub rating_count: i64,
    pub favorite: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Actor {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub person: Person,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GenreName {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub tmdb_id: String,
    pub name: String,
    #[serde(default)]
    pub born: Option<String>,
    #[serde(default)]
    pub died: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PersonListItem {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub person: Person,
    pub movie_count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PersonDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub person: Person,
    pub acted_count: i64,
    pub directed_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarPerson {
    #[serde(flatten)]
    pub person: PersonDetails,
    pub in_common: Vec<SharedMovie>,
}

/// A movie two people both worked on, and how the other person was involved.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SharedMovie {
    pub tmdb_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Genre {
    pub name: String,
    pub movies: i64,
    pub poster: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub rating: i64,
    pub timestamp: i64,
    #[sqlx(flatten)]
    pub user: Reviewer,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub created: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid catalog: {0}")]
    Catalog(String),
}

pub type DbResult<T> = Result<T, DbError>;

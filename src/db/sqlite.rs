use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::{debug, info};

use super::catalog::Catalog;
use super::model::*;
use super::query::{self, MovieFilter, MOVIE_COLUMNS, PERSON_COLUMNS};
use super::repo::*;
use crate::paging::Paging;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    /// A private database that lives as long as the repository. The pool
    /// keeps exactly one connection open, since every connection to
    /// `:memory:` would otherwise see its own empty database.
    pub async fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.init_schema().await?;
        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }

    async fn list_movies(
        &self,
        filter: MovieFilter<'_>,
        user_id: &str,
        page: &Paging,
    ) -> DbResult<Vec<MovieListItem>> {
        let mut tx = self.pool.begin().await?;
        let favorites = user_favorites(&mut tx, user_id).await?;

        let mut qb = query::movie_list(filter, &favorites, page);
        let movies = qb
            .build_query_as::<MovieListItem>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(?filter, count = movies.len(), "listed movies");
        Ok(movies)
    }
}

/// The ids of the movies `user_id` has favorited. Anonymous callers have none.
async fn user_favorites(tx: &mut Transaction<'_, Sqlite>, user_id: &str) -> DbResult<Vec<String>> {
    if user_id.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT movie_id FROM favorites WHERE user_id = ? ORDER BY created, movie_id",
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

async fn movie_by_id(conn: &mut SqliteConnection, movie_id: &str) -> DbResult<Movie> {
    sqlx::query_as::<_, Movie>(&format!(
        "SELECT {} FROM movies m WHERE m.tmdb_id = ?",
        MOVIE_COLUMNS
    ))
    .bind(movie_id)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => DbError::NotFound(format!("Movie not found: {}", movie_id)),
        _ => DbError::Sqlx(e),
    })
}

async fn ensure_user(conn: &mut SqliteConnection, user_id: &str) -> DbResult<()> {
    sqlx::query_as::<_, (String,)>("SELECT user_id FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| DbError::NotFound(format!("User not found: {}", user_id)))
}

#[async_trait]
impl MovieRepo for SqliteRepository {
    async fn find_all_movies(&self, user_id: &str, page: &Paging) -> DbResult<Vec<MovieListItem>> {
        self.list_movies(MovieFilter::All, user_id, page).await
    }

    async fn find_movies_by_genre(
        &self,
        genre: &str,
        user_id: &str,
        page: &Paging,
    ) -> DbResult<Vec<MovieListItem>> {
        self.list_movies(MovieFilter::Genre(genre), user_id, page).await
    }

    async fn find_movies_by_actor(
        &self,
        person_id: &str,
        user_id: &str,
        page: &Paging,
    ) -> DbResult<Vec<MovieListItem>> {
        self.list_movies(MovieFilter::Actor(person_id), user_id, page).await
    }

    async fn find_movies_by_director(
        &self,
        person_id: &str,
        user_id: &str,
        page: &Paging,
    ) -> DbResult<Vec<MovieListItem>> {
        self.list_movies(MovieFilter::Director(person_id), user_id, page).await
    }

    async fn find_movie(&self, id: &str, user_id: &str) -> DbResult<MovieDetails> {
        let mut tx = self.pool.begin().await?;
        let favorites = user_favorites(&mut tx, user_id).await?;

        let movie = movie_by_id(&mut tx, id).await?;

        let actors = sqlx::query_as::<_, Actor>(&format!(
            "SELECT {}, a.role FROM acted_in a JOIN people p ON p.tmdb_id = a.person_id
             WHERE a.movie_id = ? ORDER BY p.name, p.tmdb_id",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let directors = sqlx::query_as::<_, Person>(&format!(
            "SELECT {} FROM directed d JOIN people p ON p.tmdb_id = d.person_id
             WHERE d.movie_id = ? ORDER BY p.name, p.tmdb_id",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let genres = sqlx::query_as::<_, GenreName>(
            "SELECT genre AS name FROM movie_genres WHERE movie_id = ? ORDER BY genre",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let (rating_count,) =
            sqlx::query_as::<_, (i64,)>("SELECT count(*) FROM ratings WHERE movie_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        let favorite = favorites.iter().any(|f| f == &movie.tmdb_id);
        Ok(MovieDetails {
            movie,
            actors,
            directors,
            genres,
            rating_count,
            favorite,
        })
    }

    async fn find_similar_movies(
        &self,
        id: &str,
        user_id: &str,
        page: &Paging,
    ) -> DbResult<Vec<SimilarMovie>> {
        let mut tx = self.pool.begin().await?;
        let favorites = user_favorites(&mut tx, user_id).await?;

        let mut qb = query::similar_movies(id, &favorites, page);
        let movies = qb
            .build_query_as::<SimilarMovie>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(movies)
    }
}

const GENRE_SELECT: &str = "SELECT g.name,
        (SELECT count(*) FROM movie_genres mg WHERE mg.genre = g.name) AS movies,
        (SELECT m.poster FROM movie_genres mg JOIN movies m ON m.tmdb_id = mg.movie_id
         WHERE mg.genre = g.name AND m.imdb_rating IS NOT NULL AND m.poster IS NOT NULL
         ORDER BY m.imdb_rating DESC, m.tmdb_id LIMIT 1) AS poster
    FROM genres g
    WHERE g.name <> '(no genres listed)'";

#[async_trait]
impl GenreRepo for SqliteRepository {
    async fn find_all_genres(&self) -> DbResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(&format!("{} ORDER BY g.name ASC", GENRE_SELECT))
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn find_genre(&self, name: &str) -> DbResult<Genre> {
        sqlx::query_as::<_, Genre>(&format!("{} AND g.name = ?", GENRE_SELECT))
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => DbError::NotFound(format!("Genre not found: {}", name)),
                _ => DbError::Sqlx(e),
            })
    }
}

#[async_trait]
impl PeopleRepo for SqliteRepository {
    async fn find_all_people(&self, page: &Paging) -> DbResult<Vec<PersonListItem>> {
        let mut qb = query::people_list(page);
        let people = qb
            .build_query_as::<PersonListItem>()
            .fetch_all(&self.pool)
            .await?;
        Ok(people)
    }

    async fn find_person(&self, id: &str) -> DbResult<PersonDetails> {
        sqlx::query_as::<_, PersonDetails>(&format!(
            "SELECT {},
                (SELECT count(*) FROM acted_in a WHERE a.person_id = p.tmdb_id) AS acted_count,
                (SELECT count(*) FROM directed d WHERE d.person_id = p.tmdb_id) AS directed_count
             FROM people p WHERE p.tmdb_id = ?",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("Person not found: {}", id)),
            _ => DbError::Sqlx(e),
        })
    }

    async fn find_similar_people(&self, id: &str, page: &Paging) -> DbResult<Vec<SimilarPerson>> {
        let mut tx = self.pool.begin().await?;

        let mut qb = query::similar_people(id, page);
        let people = qb
            .build_query_as::<PersonDetails>()
            .fetch_all(&mut *tx)
            .await?;

        let mut similar = Vec::with_capacity(people.len());
        for person in people {
            let in_common = sqlx::query_as::<_, SharedMovie>(
                "SELECT m.tmdb_id, m.title, l.kind FROM (
                    SELECT person_id, movie_id, 'ACTED_IN' AS kind FROM acted_in
                    UNION ALL
                    SELECT person_id, movie_id, 'DIRECTED' AS kind FROM directed
                 ) l JOIN movies m ON m.tmdb_id = l.movie_id
                 WHERE l.person_id = ? AND l.movie_id IN (
                    SELECT movie_id FROM acted_in WHERE person_id = ?
                    UNION
                    SELECT movie_id FROM directed WHERE person_id = ?
                 )
                 ORDER BY m.title, l.kind",
            )
            .bind(&person.person.tmdb_id)
            .bind(id)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

            similar.push(SimilarPerson { person, in_common });
        }

        tx.commit().await?;
        Ok(similar)
    }
}

#[async_trait]
impl RatingRepo for SqliteRepository {
    async fn find_ratings(&self, movie_id: &str, page: &Paging) -> DbResult<Vec<Review>> {
        let mut qb = query::rating_list(movie_id, page);
        let reviews = qb.build_query_as::<Review>().fetch_all(&self.pool).await?;
        Ok(reviews)
    }

    async fn save_rating(&self, user_id: &str, movie_id: &str, rating: i64) -> DbResult<RatedMovie> {
        let mut tx = self.pool.begin().await?;

        ensure_user(&mut tx, user_id).await?;
        let movie = movie_by_id(&mut tx, movie_id).await?;

        sqlx::query(
            "INSERT INTO ratings (user_id, movie_id, rating, timestamp) VALUES (?, ?, ?, ?)
             ON CONFLICT (user_id, movie_id)
             DO UPDATE SET rating = excluded.rating, timestamp = excluded.timestamp",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(rating)
        .bind(Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(user_id, movie_id, rating, "saved rating");

        Ok(RatedMovie { movie, rating })
    }
}

#[async_trait]
impl FavoriteRepo for SqliteRepository {
    async fn find_favorites(&self, user_id: &str, page: &Paging) -> DbResult<Vec<MovieListItem>> {
        let mut qb = query::favorite_list(user_id, page);
        let movies = qb
            .build_query_as::<MovieListItem>()
            .fetch_all(&self.pool)
            .await?;
        Ok(movies)
    }

    async fn save_favorite(&self, user_id: &str, movie_id: &str) -> DbResult<MovieListItem> {
        let mut tx = self.pool.begin().await?;

        ensure_user(&mut tx, user_id).await?;
        let movie = movie_by_id(&mut tx, movie_id).await?;

        sqlx::query("INSERT OR IGNORE INTO favorites (user_id, movie_id, created) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(movie_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(user_id, movie_id, "added favorite");

        Ok(MovieListItem { movie, favorite: true })
    }

    async fn delete_favorite(&self, user_id: &str, movie_id: &str) -> DbResult<MovieListItem> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND movie_id = ?")
            .bind(user_id)
            .bind(movie_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!(
                "Favorite not found: {}/{}",
                user_id, movie_id
            )));
        }

        let movie = movie_by_id(&mut tx, movie_id).await?;
        tx.commit().await?;
        info!(user_id, movie_id, "removed favorite");

        Ok(MovieListItem { movie, favorite: false })
    }
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, email, password, name, created FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", email)),
            _ => DbError::Sqlx(e),
        })
    }

    async fn create_user(&self, user: &User) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO users (user_id, email, password, name, created) VALUES (?, ?, ?, ?, ?)")
            .bind(&user.user_id)
            .bind(&user.email)
            .bind(&user.password)
            .bind(&user.name)
            .bind(&user.created)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => DbError::AlreadyExists(
                    format!("An account already exists with the email address {}", user.email),
                ),
                _ => DbError::Sqlx(e),
            })?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepo for SqliteRepository {
    async fn import_catalog(&self, catalog: &Catalog) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        for person in &catalog.people {
            sqlx::query(
                "INSERT INTO people (tmdb_id, name, born, died, bio, poster, url)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (tmdb_id) DO UPDATE SET
                    name = excluded.name, born = excluded.born, died = excluded.died,
                    bio = excluded.bio, poster = excluded.poster, url = excluded.url",
            )
            .bind(&person.tmdb_id)
            .bind(&person.name)
            .bind(&person.born)
            .bind(&person.died)
            .bind(&person.bio)
            .bind(&person.poster)
            .bind(&person.url)
            .execute(&mut *tx)
            .await?;
        }

        for entry in &catalog.movies {
            let movie = &entry.movie;
            sqlx::query(
                "INSERT INTO movies
                 (tmdb_id, imdb_id, title, plot, released, year, runtime, imdb_rating,
                  imdb_votes, poster, budget, revenue, languages, countries)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (tmdb_id) DO UPDATE SET
                    imdb_id = excluded.imdb_id, title = excluded.title, plot = excluded.plot,
                    released = excluded.released, year = excluded.year,
                    runtime = excluded.runtime, imdb_rating = excluded.imdb_rating,
                    imdb_votes = excluded.imdb_votes, poster = excluded.poster,
                    budget = excluded.budget, revenue = excluded.revenue,
                    languages = excluded.languages, countries = excluded.countries",
            )
            .bind(&movie.tmdb_id)
            .bind(&movie.imdb_id)
            .bind(&movie.title)
            .bind(&movie.plot)
            .bind(&movie.released)
            .bind(movie.year)
            .bind(movie.runtime)
            .bind(movie.imdb_rating)
            .bind(movie.imdb_votes)
            .bind(&movie.poster)
            .bind(movie.budget)
            .bind(movie.revenue)
            .bind(sqlx::types::Json(&movie.languages))
            .bind(sqlx::types::Json(&movie.countries))
            .execute(&mut *tx)
            .await?;

            for genre in &entry.genres {
                sqlx::query("INSERT OR IGNORE INTO genres (name) VALUES (?)")
                    .bind(genre)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("INSERT OR IGNORE INTO movie_genres (movie_id, genre) VALUES (?, ?)")
                    .bind(&movie.tmdb_id)
                    .bind(genre)
                    .execute(&mut *tx)
                    .await?;
            }

            for actor in &entry.actors {
                sqlx::query(
                    "INSERT INTO acted_in (person_id, movie_id, role) VALUES (?, ?, ?)
                     ON CONFLICT (person_id, movie_id) DO UPDATE SET role = excluded.role",
                )
                .bind(&actor.tmdb_id)
                .bind(&movie.tmdb_id)
                .bind(&actor.role)
                .execute(&mut *tx)
                .await?;
            }

            for director in &entry.directors {
                sqlx::query("INSERT OR IGNORE INTO directed (person_id, movie_id) VALUES (?, ?)")
                    .bind(director)
                    .bind(&movie.tmdb_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        info!(
            movies = catalog.movies.len(),
            people = catalog.people.len(),
            "Imported catalog"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::{EntityKind, SortOrder, SortRegistry};

    const CATALOG: &str = r#"{
        "people": [
            {"tmdbId": "p1", "name": "Keanu Reeves", "born": "1964-09-02"},
            {"tmdbId": "p2", "name": "Lana Wachowski", "born": "1965-06-21"},
            {"tmdbId": "p3", "name": "Carrie-Anne Moss", "born": "1967-08-21"},
            {"tmdbId": "p4", "name": "Sandra Bullock", "born": "1964-07-26"}
        ],
        "movies": [
            {"tmdbId": "603", "title": "The Matrix", "imdbRating": 8.7, "released": "1999-03-31",
             "poster": "matrix.jpg", "languages": ["English"],
             "genres": ["Action", "Sci-Fi"],
             "actors": [{"tmdbId": "p1", "role": "Neo"}, {"tmdbId": "p3", "role": "Trinity"}],
             "directors": ["p2"]},
            {"tmdbId": "604", "title": "The Matrix Reloaded", "imdbRating": 7.2,
             "released": "2003-05-15", "poster": "reloaded.jpg",
             "genres": ["Action", "Sci-Fi"],
             "actors": [{"tmdbId": "p1", "role": "Neo"}, {"tmdbId": "p3", "role": "Trinity"}],
             "directors": ["p2"]},
            {"tmdbId": "605", "title": "The Matrix Revolutions", "imdbRating": 6.7,
             "released": "2003-11-05", "genres": ["Action"],
             "actors": [{"tmdbId": "p1", "role": "Neo"}]},
            {"tmdbId": "1637", "title": "Speed", "imdbRating": 7.2, "released": "1994-06-10",
             "genres": ["Action", "Thriller"],
             "actors": [{"tmdbId": "p1", "role": "Jack"}, {"tmdbId": "p4", "role": "Annie"}]},
            {"tmdbId": "9999", "title": "Untitled", "genres": ["(no genres listed)"]}
        ]
    }"#;

    const USER: &str = "user-1";

    async fn repo() -> SqliteRepository {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.import_catalog(&Catalog::from_json(CATALOG).unwrap())
            .await
            .unwrap();
        repo.create_user(&User {
            user_id: USER.to_string(),
            email: "user@neoflix.local".to_string(),
            password: "hash".to_string(),
            name: "User".to_string(),
            created: None,
        })
        .await
        .unwrap();
        repo
    }

    fn page(kind: EntityKind, q: &str, sort: &str, order: SortOrder, skip: u32, limit: u32) -> Paging {
        Paging::new(&SortRegistry::standard(), kind, q, sort, order, skip, limit)
    }

    fn movie_page(sort: &str, order: SortOrder, skip: u32, limit: u32) -> Paging {
        page(EntityKind::Movie, "", sort, order, skip, limit)
    }

    fn ids(movies: &[MovieListItem]) -> Vec<&str> {
        movies.iter().map(|m| m.movie.tmdb_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_anonymous_never_sees_favorites() {
        let repo = repo().await;
        repo.save_favorite(USER, "603").await.unwrap();

        let movies = repo
            .find_all_movies("", &movie_page("title", SortOrder::Asc, 0, 10))
            .await
            .unwrap();
        assert_eq!(movies.len(), 5);
        assert!(movies.iter().all(|m| !m.favorite));

        let details = repo.find_movie("603", "").await.unwrap();
        assert!(!details.favorite);
    }

    #[tokio::test]
    async fn test_favorite_round_trip() {
        let repo = repo().await;

        let saved = repo.save_favorite(USER, "604").await.unwrap();
        assert!(saved.favorite);
        assert_eq!(saved.movie.tmdb_id, "604");
        // Saving twice is harmless.
        repo.save_favorite(USER, "604").await.unwrap();

        let favorites = repo
            .find_favorites(USER, &movie_page("title", SortOrder::Asc, 0, 6))
            .await
            .unwrap();
        assert_eq!(ids(&favorites), vec!["604"]);
        assert!(favorites[0].favorite);

        let listed = repo
            .find_all_movies(USER, &movie_page("title", SortOrder::Asc, 0, 10))
            .await
            .unwrap();
        let flagged: Vec<&str> = listed
            .iter()
            .filter(|m| m.favorite)
            .map(|m| m.movie.tmdb_id.as_str())
            .collect();
        assert_eq!(flagged, vec!["604"]);
        assert!(repo.find_movie("604", USER).await.unwrap().favorite);

        let removed = repo.delete_favorite(USER, "604").await.unwrap();
        assert!(!removed.favorite);
        let favorites = repo
            .find_favorites(USER, &movie_page("title", SortOrder::Asc, 0, 6))
            .await
            .unwrap();
        assert!(favorites.is_empty());

        let action = repo
            .find_movies_by_genre("Action", USER, &movie_page("title", SortOrder::Asc, 0, 10))
            .await
            .unwrap();
        let reloaded = action.iter().find(|m| m.movie.tmdb_id == "604").unwrap();
        assert!(!reloaded.favorite);
        assert!(!repo.find_movie("604", USER).await.unwrap().favorite);

        let err = repo.delete_favorite(USER, "604").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reimport_keeps_user_data() {
        let repo = repo().await;
        repo.save_favorite(USER, "603").await.unwrap();
        repo.save_rating(USER, "603", 5).await.unwrap();

        let mut catalog = Catalog::from_json(CATALOG).unwrap();
        catalog.movies[0].movie.title = "The Matrix (1999)".to_string();
        catalog.movies[0].actors[0].role = Some("Thomas Anderson".to_string());
        repo.import_catalog(&catalog).await.unwrap();

        let favorites = repo
            .find_favorites(USER, &movie_page("title", SortOrder::Asc, 0, 6))
            .await
            .unwrap();
        assert_eq!(ids(&favorites), vec!["603"]);

        let movie = repo.find_movie("603", USER).await.unwrap();
        assert_eq!(movie.movie.title, "The Matrix (1999)");
        assert!(movie.favorite);
        assert_eq!(movie.rating_count, 1);
        let neo = movie.actors.iter().find(|a| a.person.tmdb_id == "p1").unwrap();
        assert_eq!(neo.role.as_deref(), Some("Thomas Anderson"));
    }

    #[tokio::test]
    async fn test_favorite_needs_user_and_movie() {
        let repo = repo().await;
        let err = repo.save_favorite("nobody", "603").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        let err = repo.save_favorite(USER, "0").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_consecutive_pages_do_not_overlap() {
        let repo = repo().await;
        // 604 and 1637 tie on imdbRating.
        let first = repo
            .find_all_movies("", &movie_page("imdbRating", SortOrder::Desc, 0, 2))
            .await
            .unwrap();
        let second = repo
            .find_all_movies("", &movie_page("imdbRating", SortOrder::Desc, 2, 2))
            .await
            .unwrap();
        assert_eq!(ids(&first), vec!["603", "1637"]);
        assert_eq!(ids(&second), vec!["604", "605"]);
    }

    #[tokio::test]
    async fn test_null_sort_column_is_excluded() {
        let repo = repo().await;
        let movies = repo
            .find_all_movies("", &movie_page("imdbRating", SortOrder::Asc, 0, 10))
            .await
            .unwrap();
        assert!(!ids(&movies).contains(&"9999"));

        let movies = repo
            .find_all_movies("", &movie_page("score", SortOrder::Asc, 0, 10))
            .await
            .unwrap();
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn test_title_filter_is_case_insensitive() {
        let repo = repo().await;
        let page = page(EntityKind::Movie, "matrix re", "title", SortOrder::Asc, 0, 10);
        let movies = repo.find_all_movies("", &page).await.unwrap();
        assert_eq!(ids(&movies), vec!["604", "605"]);
    }

    #[tokio::test]
    async fn test_movies_by_relationship() {
        let repo = repo().await;
        let all = movie_page("released", SortOrder::Asc, 0, 10);

        let thrillers = repo.find_movies_by_genre("Thriller", "", &all).await.unwrap();
        assert_eq!(ids(&thrillers), vec!["1637"]);

        let keanu = repo.find_movies_by_actor("p1", "", &all).await.unwrap();
        assert_eq!(ids(&keanu), vec!["1637", "603", "604", "605"]);

        let lana = repo.find_movies_by_director("p2", "", &all).await.unwrap();
        assert_eq!(ids(&lana), vec!["603", "604"]);
    }

    #[tokio::test]
    async fn test_find_movie_details() {
        let repo = repo().await;
        let movie = repo.find_movie("603", USER).await.unwrap();
        assert_eq!(movie.movie.title, "The Matrix");
        assert_eq!(movie.movie.languages, vec!["English".to_string()]);
        let roles: Vec<_> = movie.actors.iter().map(|a| a.role.as_deref()).collect();
        assert_eq!(roles, vec![Some("Trinity"), Some("Neo")]);
        assert_eq!(movie.directors[0].name, "Lana Wachowski");
        let genres: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(genres, vec!["Action", "Sci-Fi"]);
        assert_eq!(movie.rating_count, 0);

        let err = repo.find_movie("0", USER).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_similar_movies() {
        let repo = repo().await;
        let similar = repo
            .find_similar_movies("603", "", &movie_page("title", SortOrder::Asc, 0, 10))
            .await
            .unwrap();
        let similar_ids: Vec<&str> = similar.iter().map(|m| m.movie.tmdb_id.as_str()).collect();
        assert_eq!(similar_ids, vec!["604", "1637", "605"]);
        assert!((similar[0].score - 7.2 * 5.0).abs() < 1e-9);

        let first = repo
            .find_similar_movies("603", "", &movie_page("title", SortOrder::Asc, 0, 1))
            .await
            .unwrap();
        let second = repo
            .find_similar_movies("603", "", &movie_page("title", SortOrder::Asc, 1, 1))
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first[0].movie.tmdb_id, second[0].movie.tmdb_id);
    }

    #[tokio::test]
    async fn test_genres() {
        let repo = repo().await;
        let genres = repo.find_all_genres().await.unwrap();
        let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Action", "Sci-Fi", "Thriller"]);
        assert_eq!(genres[0].movies, 4);
        assert_eq!(genres[0].poster.as_deref(), Some("matrix.jpg"));
        assert_eq!(genres[2].poster, None);

        let genre = repo.find_genre("Sci-Fi").await.unwrap();
        assert_eq!(genre.movies, 2);
        assert!(matches!(
            repo.find_genre("(no genres listed)").await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_people() {
        let repo = repo().await;
        let people = repo
            .find_all_people(&page(EntityKind::Person, "", "movieCount", SortOrder::Desc, 0, 2))
            .await
            .unwrap();
        let names: Vec<&str> = people.iter().map(|p| p.person.name.as_str()).collect();
        // Lana and Carrie-Anne tie on two movies each.
        assert_eq!(names, vec!["Keanu Reeves", "Lana Wachowski"]);
        assert_eq!(people[0].movie_count, 4);

        let filtered = repo
            .find_all_people(&page(EntityKind::Person, "Wach", "name", SortOrder::Asc, 0, 6))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        let filtered = repo
            .find_all_people(&page(EntityKind::Person, "wach", "name", SortOrder::Asc, 0, 6))
            .await
            .unwrap();
        assert!(filtered.is_empty());

        let keanu = repo.find_person("p1").await.unwrap();
        assert_eq!(keanu.acted_count, 4);
        assert_eq!(keanu.directed_count, 0);
        assert!(matches!(repo.find_person("p0").await, Err(DbError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_similar_people() {
        let repo = repo().await;
        let similar = repo
            .find_similar_people("p3", &page(EntityKind::Person, "", "name", SortOrder::Asc, 0, 6))
            .await
            .unwrap();
        let ids: Vec<&str> = similar.iter().map(|p| p.person.person.tmdb_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(similar[0].in_common.len(), 2);
        assert!(similar[1].in_common.iter().all(|m| m.kind == "DIRECTED"));
    }

    #[tokio::test]
    async fn test_ratings_upsert() {
        let repo = repo().await;
        let rated = repo.save_rating(USER, "603", 4).await.unwrap();
        assert_eq!(rated.rating, 4);
        repo.save_rating(USER, "603", 5).await.unwrap();

        let reviews = repo
            .find_ratings("603", &page(EntityKind::Rating, "", "timestamp", SortOrder::Desc, 0, 6))
            .await
            .unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, 5);
        assert_eq!(reviews[0].user.name, "User");
        assert_eq!(repo.find_movie("603", USER).await.unwrap().rating_count, 1);

        let err = repo.save_rating(USER, "0", 5).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let repo = repo().await;
        let err = repo
            .create_user(&User {
                user_id: "user-2".to_string(),
                email: "user@neoflix.local".to_string(),
                password: "hash".to_string(),
                name: "Other".to_string(),
                created: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists(ref m) if m.contains("already exists")));
    }
}

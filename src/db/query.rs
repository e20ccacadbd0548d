//! SQL composition for the paged list endpoints.
//!
//! Only two kinds of text are ever pushed into a query: fixed fragments from
//! this module and sort columns looked up from a registry-approved field name.
//! Every request-supplied value (ids, filters, favorites, the paging window)
//! goes through `push_bind`.

use sqlx::{QueryBuilder, Sqlite};

use crate::paging::{Paging, SortOrder};

pub const MOVIE_COLUMNS: &str = "m.tmdb_id, m.imdb_id, m.title, m.plot, m.released, m.year, \
     m.runtime, m.imdb_rating, m.imdb_votes, m.poster, m.budget, m.revenue, m.languages, m.countries";

pub const PERSON_COLUMNS: &str = "p.tmdb_id, p.name, p.born, p.died, p.bio, p.poster, p.url";

/// The relationship that selects which movies a list contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieFilter<'a> {
    All,
    Genre(&'a str),
    Actor(&'a str),
    Director(&'a str),
}

/// `score` only exists on similarity results. On plain lists it maps to a
/// NULL column, which the `IS NOT NULL` guard turns into an empty page.
pub fn movie_sort_column(field: &str) -> &'static str {
    match field {
        "title" => "m.title",
        "released" => "m.released",
        "imdbRating" => "m.imdb_rating",
        _ => "NULL",
    }
}

pub fn person_sort_column(field: &str) -> &'static str {
    match field {
        "born" => "p.born",
        "movieCount" => "movie_count",
        _ => "p.name",
    }
}

pub fn rating_sort_column(field: &str) -> &'static str {
    match field {
        "timestamp" => "r.timestamp",
        _ => "r.rating",
    }
}

/// `m.tmdb_id IN (...)` over the user's favorites, or a constant false.
fn push_favorite_flag<'a>(qb: &mut QueryBuilder<'a, Sqlite>, favorites: &'a [String]) {
    if favorites.is_empty() {
        qb.push("0");
        return;
    }
    qb.push("m.tmdb_id IN (");
    let mut ids = qb.separated(", ");
    for id in favorites {
        ids.push_bind(id.as_str());
    }
    ids.push_unseparated(")");
}

/// Case-insensitive substring match on the title. SQLite's `lower()` only
/// folds ASCII letters, so non-ASCII titles match case-sensitively.
fn push_title_filter<'a>(qb: &mut QueryBuilder<'a, Sqlite>, page: &'a Paging) {
    if let Some(q) = page.query() {
        qb.push(" AND instr(lower(m.title), lower(")
            .push_bind(q)
            .push(")) > 0");
    }
}

/// Order by the sort column, then by the primary key so that consecutive
/// pages never overlap.
fn push_order(qb: &mut QueryBuilder<'_, Sqlite>, column: &'static str, order: SortOrder, key: &str) {
    qb.push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(order.as_sql())
        .push(", ")
        .push(key)
        .push(" ASC");
}

fn push_window(qb: &mut QueryBuilder<'_, Sqlite>, page: &Paging) {
    qb.push(" LIMIT ")
        .push_bind(i64::from(page.limit()))
        .push(" OFFSET ")
        .push_bind(i64::from(page.skip()));
}

/// A page of movies matching `filter`, each flagged against `favorites`.
pub fn movie_list<'a>(
    filter: MovieFilter<'a>,
    favorites: &'a [String],
    page: &'a Paging,
) -> QueryBuilder<'a, Sqlite> {
    let column = movie_sort_column(page.sort());

    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(MOVIE_COLUMNS).push(", ");
    push_favorite_flag(&mut qb, favorites);
    qb.push(" AS favorite FROM movies m");

    match filter {
        MovieFilter::All => {}
        MovieFilter::Genre(name) => {
            qb.push(" JOIN movie_genres g ON g.movie_id = m.tmdb_id AND g.genre = ")
                .push_bind(name);
        }
        MovieFilter::Actor(person_id) => {
            qb.push(" JOIN acted_in r ON r.movie_id = m.tmdb_id AND r.person_id = ")
                .push_bind(person_id);
        }
        MovieFilter::Director(person_id) => {
            qb.push(" JOIN directed r ON r.movie_id = m.tmdb_id AND r.person_id = ")
                .push_bind(person_id);
        }
    }

    qb.push(" WHERE ").push(column).push(" IS NOT NULL");
    push_title_filter(&mut qb, page);
    push_order(&mut qb, column, page.order(), "m.tmdb_id");
    push_window(&mut qb, page);
    qb
}

/// A page of the movies `user_id` has favorited. Every row is a favorite.
pub fn favorite_list<'a>(user_id: &'a str, page: &'a Paging) -> QueryBuilder<'a, Sqlite> {
    let column = movie_sort_column(page.sort());

    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(MOVIE_COLUMNS)
        .push(", 1 AS favorite FROM favorites f JOIN movies m ON m.tmdb_id = f.movie_id WHERE f.user_id = ")
        .push_bind(user_id);
    push_title_filter(&mut qb, page);
    push_order(&mut qb, column, page.order(), "m.tmdb_id");
    push_window(&mut qb, page);
    qb
}

/// Movies sharing genres, actors or directors with the anchor movie, scored
/// by `imdb_rating * shared connections`. Ignores the page's sort field.
pub fn similar_movies<'a>(
    movie_id: &'a str,
    favorites: &'a [String],
    page: &'a Paging,
) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new("WITH shared AS (");
    qb.push(
        "SELECT other.movie_id AS movie_id FROM movie_genres anchor \
         JOIN movie_genres other ON other.genre = anchor.genre WHERE anchor.movie_id = ",
    )
    .push_bind(movie_id);
    qb.push(
        " UNION ALL SELECT other.movie_id FROM acted_in anchor \
         JOIN acted_in other ON other.person_id = anchor.person_id WHERE anchor.movie_id = ",
    )
    .push_bind(movie_id);
    qb.push(
        " UNION ALL SELECT other.movie_id FROM directed anchor \
         JOIN directed other ON other.person_id = anchor.person_id WHERE anchor.movie_id = ",
    )
    .push_bind(movie_id);
    qb.push(") SELECT ")
        .push(MOVIE_COLUMNS)
        .push(", m.imdb_rating * count(*) AS score, ");
    push_favorite_flag(&mut qb, favorites);
    qb.push(" AS favorite FROM shared s JOIN movies m ON m.tmdb_id = s.movie_id WHERE m.tmdb_id <> ")
        .push_bind(movie_id)
        .push(" AND m.imdb_rating IS NOT NULL GROUP BY m.tmdb_id ORDER BY score DESC, m.tmdb_id ASC");
    push_window(&mut qb, page);
    qb
}

pub fn people_list(page: &Paging) -> QueryBuilder<'_, Sqlite> {
    let column = person_sort_column(page.sort());

    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(PERSON_COLUMNS).push(
        ", (SELECT count(*) FROM acted_in a WHERE a.person_id = p.tmdb_id) \
         + (SELECT count(*) FROM directed d WHERE d.person_id = p.tmdb_id) AS movie_count \
         FROM people p",
    );
    if let Some(q) = page.query() {
        qb.push(" WHERE instr(p.name, ").push_bind(q).push(") > 0");
    }
    push_order(&mut qb, column, page.order(), "p.tmdb_id");
    push_window(&mut qb, page);
    qb
}

/// People who acted in or directed the same movies as the anchor person,
/// most shared credits first.
pub fn similar_people<'a>(person_id: &'a str, page: &'a Paging) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new("WITH mine AS (SELECT movie_id FROM acted_in WHERE person_id = ");
    qb.push_bind(person_id)
        .push(" UNION SELECT movie_id FROM directed WHERE person_id = ")
        .push_bind(person_id)
        .push(
            "), links AS (SELECT person_id, movie_id FROM acted_in \
             UNION ALL SELECT person_id, movie_id FROM directed) SELECT ",
        )
        .push(PERSON_COLUMNS)
        .push(
            ", (SELECT count(*) FROM acted_in a WHERE a.person_id = p.tmdb_id) AS acted_count, \
             (SELECT count(*) FROM directed d WHERE d.person_id = p.tmdb_id) AS directed_count \
             FROM links l JOIN mine ON mine.movie_id = l.movie_id \
             JOIN people p ON p.tmdb_id = l.person_id WHERE l.person_id <> ",
        )
        .push_bind(person_id)
        .push(" GROUP BY p.tmdb_id ORDER BY count(*) DESC, p.tmdb_id ASC");
    push_window(&mut qb, page);
    qb
}

pub fn rating_list<'a>(movie_id: &'a str, page: &'a Paging) -> QueryBuilder<'a, Sqlite> {
    let column = rating_sort_column(page.sort());

    let mut qb = QueryBuilder::new(
        "SELECT r.rating, r.timestamp, u.user_id, u.name FROM ratings r \
         JOIN users u ON u.user_id = r.user_id WHERE r.movie_id = ",
    );
    qb.push_bind(movie_id);
    push_order(&mut qb, column, page.order(), "u.user_id");
    push_window(&mut qb, page);
    qb
}

use async_trait::async_trait;

use super::catalog::Catalog;
use super::model::*;
use crate::paging::Paging;

/// Movie lists and lookups. An empty `user_id` means an anonymous caller,
/// for whom every `favorite` flag is false.
#[async_trait]
pub trait MovieRepo: Send + Sync {
    async fn find_all_movies(&self, user_id: &str, page: &Paging) -> DbResult<Vec<MovieListItem>>;
    async fn find_movies_by_genre(
        &self,
        genre: &str,
        user_id: &str,
        page: &Paging,
    ) -> DbResult<Vec<MovieListItem>>;
    async fn find_movies_by_actor(
        &self,
        person_id: &str,
        user_id: &str,
        page: &Paging,
    ) -> DbResult<Vec<MovieListItem>>;
    async fn find_movies_by_director(
        &self,
        person_id: &str,
        user_id: &str,
        page: &Paging,
    ) -> DbResult<Vec<MovieListItem>>;
    async fn find_movie(&self, id: &str, user_id: &str) -> DbResult<MovieDetails>;
    async fn find_similar_movies(
        &self,
        id: &str,
        user_id: &str,
        page: &Paging,
    ) -> DbResult<Vec<SimilarMovie>>;
}

#[async_trait]
pub trait GenreRepo: Send + Sync {
    async fn find_all_genres(&self) -> DbResult<Vec<Genre>>;
    async fn find_genre(&self, name: &str) -> DbResult<Genre>;
}

#[async_trait]
pub trait PeopleRepo: Send + Sync {
    async fn find_all_people(&self, page: &Paging) -> DbResult<Vec<PersonListItem>>;
    async fn find_person(&self, id: &str) -> DbResult<PersonDetails>;
    async fn find_similar_people(&self, id: &str, page: &Paging) -> DbResult<Vec<SimilarPerson>>;
}

#[async_trait]
pub trait RatingRepo: Send + Sync {
    async fn find_ratings(&self, movie_id: &str, page: &Paging) -> DbResult<Vec<Review>>;
    async fn save_rating(&self, user_id: &str, movie_id: &str, rating: i64) -> DbResult<RatedMovie>;
}

#[async_trait]
pub trait FavoriteRepo: Send + Sync {
    async fn find_favorites(&self, user_id: &str, page: &Paging) -> DbResult<Vec<MovieListItem>>;
    async fn save_favorite(&self, user_id: &str, movie_id: &str) -> DbResult<MovieListItem>;
    async fn delete_favorite(&self, user_id: &str, movie_id: &str) -> DbResult<MovieListItem>;
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> DbResult<User>;
    async fn create_user(&self, user: &User) -> DbResult<()>;
}

#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn import_catalog(&self, catalog: &Catalog) -> DbResult<()>;
}

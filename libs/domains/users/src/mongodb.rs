//! MongoDB implementations of the users repositories

use async_trait::async_trait;
use database::DatabaseError;
use mongodb::{Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{TokenKind, User, VerificationToken};
use crate::repository::{TokenRepository, UserRepository};

pub const USERS_COLLECTION: &str = "users";
pub const TOKENS_COLLECTION: &str = "verification-tokens";

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<User>(USERS_COLLECTION),
        }
    }

    pub async fn create_indexes(&self) -> UserResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: User) -> UserResult<User> {
        match self.collection.insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(e) if DatabaseError::is_duplicate_key(&e) => Err(UserError::DuplicateEmail(user.email)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> UserResult<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        Ok(self
            .collection
            .find_one(doc! { "email": email.to_lowercase() })
            .await?)
    }

    #[instrument(skip(self, user), fields(id = %user.id))]
    async fn update(&self, user: &User) -> UserResult<()> {
        let result = self
            .collection
            .replace_one(doc! { "_id": &user.id }, user)
            .await?;
        if result.matched_count == 0 {
            return Err(UserError::NotFound(user.id.clone()));
        }
        Ok(())
    }
}

pub struct MongoTokenRepository {
    collection: Collection<VerificationToken>,
}

impl MongoTokenRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<VerificationToken>(TOKENS_COLLECTION),
        }
    }

    pub async fn create_indexes(&self) -> UserResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "value": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "userId": 1, "type": 1 })
                .build(),
        ];
        self.collection.create_indexes(indexes).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenRepository for MongoTokenRepository {
    #[instrument(skip(self, token), fields(user_id = %token.user_id, kind = %token.kind))]
    async fn create(&self, token: VerificationToken) -> UserResult<VerificationToken> {
        self.collection.insert_one(&token).await?;
        Ok(token)
    }

    #[instrument(skip(self, value))]
    async fn find(&self, value: &str, kind: TokenKind) -> UserResult<Option<VerificationToken>> {
        Ok(self
            .collection
            .find_one(doc! { "value": value, "type": kind.as_ref() })
            .await?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> UserResult<()> {
        self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_for_user(&self, user_id: &str, kind: TokenKind) -> UserResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "userId": user_id, "type": kind.as_ref() })
            .await?;
        Ok(result.deleted_count)
    }
}

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

use crate::entity::{OwnerKind, user};
use crate::error::AppError;

/// Weak reference from a file to the domain entity owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerRef {
    User(i32),
    Article(i32),
    Event(i32),
    Orphan,
}

impl OwnerRef {
    pub fn new(kind: OwnerKind, id: i32) -> Self {
        match kind {
            OwnerKind::User => Self::User(id),
            OwnerKind::Article => Self::Article(id),
            OwnerKind::Event => Self::Event(id),
        }
    }

    /// Rebuild from the nullable column pair. A half-set pair is an orphan.
    pub fn from_columns(kind: Option<OwnerKind>, id: Option<i32>) -> Self {
        match (kind, id) {
            (Some(kind), Some(id)) => Self::new(kind, id),
            _ => Self::Orphan,
        }
    }

    pub fn kind(&self) -> Option<OwnerKind> {
        match self {
            Self::User(_) => Some(OwnerKind::User),
            Self::Article(_) => Some(OwnerKind::Article),
            Self::Event(_) => Some(OwnerKind::Event),
            Self::Orphan => None,
        }
    }

    pub fn id(&self) -> Option<i32> {
        match self {
            Self::User(id) | Self::Article(id) | Self::Event(id) => Some(*id),
            Self::Orphan => None,
        }
    }

    /// Parse the `{kind}` path segment used by owner-scoped routes.
    pub fn parse(kind: &str, id: i32) -> Result<Self, AppError> {
        let kind = match kind {
            "user" | "users" => OwnerKind::User,
            "article" | "articles" => OwnerKind::Article,
            "event" | "events" => OwnerKind::Event,
            other => {
                return Err(AppError::Validation(format!("Unknown owner kind '{other}'")));
            }
        };
        Ok(Self::new(kind, id))
    }
}

/// Answers whether the entity behind an [`OwnerRef`] exists, without the
/// file subsystem depending on every owning domain model.
#[async_trait]
pub trait OwnerResolver: Send + Sync {
    async fn exists(&self, owner: &OwnerRef) -> Result<bool, DbErr>;
}

/// Resolves users from the local `user` table. Articles and events are
/// owned by other services and are reported as unknown.
pub struct DbOwnerResolver {
    db: DatabaseConnection,
}

impl DbOwnerResolver {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OwnerResolver for DbOwnerResolver {
    async fn exists(&self, owner: &OwnerRef) -> Result<bool, DbErr> {
        match owner {
            OwnerRef::User(id) => Ok(user::Entity::find_by_id(*id).one(&self.db).await?.is_some()),
            OwnerRef::Article(_) | OwnerRef::Event(_) => {
                tracing::debug!(?owner, "owner kind is not resolvable locally");
                Ok(false)
            }
            OwnerRef::Orphan => Ok(false),
        }
    }
}

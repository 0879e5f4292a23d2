use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::DomainError;

/// Group key used for events that carry neither a session nor a user.
pub const ANONYMOUS_GROUP: &str = "anon";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InteractionId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    View,
    Wishlist,
    Cart,
    Order,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [Self::View, Self::Wishlist, Self::Cart, Self::Order];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Wishlist => "wishlist",
            Self::Cart => "cart",
            Self::Order => "order",
        }
    }

    /// Weight the storefront attaches when it logs this kind of event.
    /// Orders carry their signal by presence alone.
    pub fn default_weight(self) -> i64 {
        match self {
            Self::View => 1,
            Self::Wishlist => 2,
            Self::Cart => 3,
            Self::Order => 1,
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(Self::View),
            "wishlist" => Ok(Self::Wishlist),
            "cart" => Ok(Self::Cart),
            "order" => Ok(Self::Order),
            other => Err(DomainError::UnknownEventKind(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub id: InteractionId,
    pub user_id: Option<i64>,
    pub session_key: Option<String>,
    pub product_id: ProductId,
    pub kind: EventKind,
    pub weight: i64,
    pub created_at: DateTime<Utc>,
}

impl InteractionEvent {
    /// Co-occurrence grouping key: session token, then authenticated user,
    /// then the shared anonymous bucket.
    pub fn group_key(&self) -> String {
        match (&self.session_key, self.user_id) {
            (Some(session), _) if !session.trim().is_empty() => session.clone(),
            (_, Some(user_id)) => format!("user:{user_id}"),
            _ => ANONYMOUS_GROUP.to_string(),
        }
    }
}

/// An event as handed over by the storefront, before it has been assigned an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewInteraction {
    pub user_id: Option<i64>,
    pub session_key: Option<String>,
    pub product_id: ProductId,
    pub kind: EventKind,
    pub weight: i64,
    pub created_at: DateTime<Utc>,
}

impl NewInteraction {
    pub fn new(session_key: impl Into<String>, product_id: ProductId, kind: EventKind) -> Self {
        Self {
            user_id: None,
            session_key: Some(session_key.into()),
            product_id,
            kind,
            weight: kind.default_weight(),
            created_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.weight <= 0 {
            return Err(DomainError::InvariantViolation(format!(
                "interaction weight must be positive, got {}",
                self.weight
            )));
        }
        Ok(())
    }

    pub fn into_event(self, id: InteractionId) -> InteractionEvent {
        InteractionEvent {
            id,
            user_id: self.user_id,
            session_key: self.session_key,
            product_id: self.product_id,
            kind: self.kind,
            weight: self.weight,
            created_at: self.created_at,
        }
    }
}

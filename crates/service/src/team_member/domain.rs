use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pagination::{ListQuery, OrderDirection, Projection};

use super::errors::TeamMemberError;

/// Prefix of every single-record cache key.
pub const ENTITY_KIND: &str = "team_member";

/// Cache key for one team member, e.g. `team_member_detail_42`.
pub fn detail_cache_key(id: u64) -> String {
    format!("{ENTITY_KIND}_detail_{id}")
}

/// Domain team member (business view).
///
/// Every field defaults so a truncated or empty cache payload decodes into
/// a zero-valued record, which readers treat as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamMember {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TeamMember {
    /// A record that has not been persisted yet.
    pub fn new(name: impl Into<String>, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: name.into(), username: username.into(), email: email.into(), ..Default::default() }
    }

    /// Row materialized under `Projection::IdOnly`.
    pub fn id_only(id: u64) -> Self {
        Self { id, ..Default::default() }
    }

    pub fn exists(&self) -> bool { self.id > 0 }
}

impl From<models::team_member::Model> for TeamMember {
    fn from(m: models::team_member::Model) -> Self {
        Self {
            id: u64::try_from(m.id).unwrap_or_default(),
            name: m.name,
            username: m.username,
            email: m.email,
            created_at: Some(m.created_at.with_timezone(&Utc)),
            updated_at: Some(m.updated_at.with_timezone(&Utc)),
        }
    }
}

/// Point-lookup filter. Populated fields are AND-ed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailQuery {
    pub id: Option<u64>,
    pub not_id: Option<u64>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub projection: Projection,
}

impl DetailQuery {
    pub fn by_id(id: u64) -> Self {
        Self { id: Some(id), ..Default::default() }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Exclude one id from the match. `0` means no exclusion.
    pub fn excluding(mut self, id: u64) -> Self {
        self.not_id = (id > 0).then_some(id);
        self
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Whether `member` satisfies every populated filter.
    pub fn matches(&self, member: &TeamMember) -> bool {
        self.id.map_or(true, |id| member.id == id)
            && self.not_id.map_or(true, |id| member.id != id)
            && self.email.as_deref().map_or(true, |e| member.email == e)
            && self.username.as_deref().map_or(true, |u| member.username == u)
    }
}

/// Create input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub username: String,
    pub email: String,
}

/// Update input; every attribute is replaced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
}

impl CreateRequest {
    pub fn validate(&self) -> Result<(), TeamMemberError> {
        validate_attributes(&self.name, &self.username, &self.email)
    }

    /// Lowercase the unique keys so uniqueness is case-insensitive.
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_lowercase();
        self.username = self.username.trim().to_lowercase();
        self
    }
}

impl UpdateRequest {
    pub fn validate(&self) -> Result<(), TeamMemberError> {
        if self.id == 0 {
            return Err(TeamMemberError::Validation("id must be >= 1".into()));
        }
        validate_attributes(&self.name, &self.username, &self.email)
    }

    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_lowercase();
        self.username = self.username.trim().to_lowercase();
        self
    }
}

fn validate_attributes(name: &str, username: &str, email: &str) -> Result<(), TeamMemberError> {
    if name.trim().is_empty() {
        return Err(TeamMemberError::Validation("name is required".into()));
    }
    if username.trim().is_empty() {
        return Err(TeamMemberError::Validation("username is required".into()));
    }
    if !is_email_shaped(email.trim()) {
        return Err(TeamMemberError::Validation("email is invalid".into()));
    }
    Ok(())
}

fn is_email_shaped(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Raw list parameters as decoded from the transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRequest {
    pub search: String,
    /// `0` selects the default page size.
    pub limit: u64,
    /// 1-based; `0` selects the first page.
    pub page: u64,
    pub order_field: String,
    pub order_direction: String,
    pub no_limit: bool,
}

impl ListRequest {
    /// Normalize and validate into a repository query.
    pub fn validate(self) -> Result<ListQuery, TeamMemberError> {
        let direction = self.order_direction.trim().to_uppercase();
        let order_direction = if direction.is_empty() {
            None
        } else {
            Some(
                direction
                    .parse::<OrderDirection>()
                    .map_err(|_| TeamMemberError::Validation("order_direction is invalid".into()))?,
            )
        };

        let field = self.order_field.trim().to_lowercase();
        if order_direction.is_some() && field.is_empty() {
            return Err(TeamMemberError::Validation("order_field required".into()));
        }
        if !field.is_empty() && models::team_member::sortable_column(&field).is_none() {
            return Err(TeamMemberError::Validation("order_field is invalid".into()));
        }

        let query = ListQuery {
            search: self.search.trim().to_lowercase(),
            page: self.page,
            limit: self.limit,
            order_field: (!field.is_empty()).then_some(field),
            order_direction,
            no_limit: self.no_limit,
            ..Default::default()
        };
        Ok(query.with_defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_kind_detail_id() {
        assert_eq!(detail_cache_key(1), "team_member_detail_1");
        assert_eq!(detail_cache_key(5), "team_member_detail_5");
    }

    #[test]
    fn empty_payload_decodes_to_absent_member() {
        let decoded: TeamMember = serde_json::from_str("{}").unwrap();
        assert!(!decoded.exists());
    }

    #[test]
    fn excluding_zero_is_no_exclusion() {
        assert_eq!(DetailQuery::default().excluding(0).not_id, None);
        assert_eq!(DetailQuery::default().excluding(7).not_id, Some(7));
    }

    #[test]
    fn detail_query_matches_all_populated_fields() {
        let m = TeamMember { id: 3, name: "A".into(), username: "u1".into(), email: "a@x.com".into(), ..Default::default() };
        assert!(DetailQuery::by_id(3).matches(&m));
        assert!(DetailQuery::default().email("a@x.com").matches(&m));
        assert!(!DetailQuery::default().email("a@x.com").excluding(3).matches(&m));
        assert!(!DetailQuery::by_id(3).username("u2").matches(&m));
    }

    #[test]
    fn create_request_rules() {
        let ok = CreateRequest { name: "A".into(), username: "u1".into(), email: "a@x.com".into() };
        assert!(ok.validate().is_ok());

        let bad_email = CreateRequest { email: "a.x.com".into(), ..ok.clone() };
        assert!(matches!(bad_email.validate(), Err(TeamMemberError::Validation(_))));

        let no_name = CreateRequest { name: "  ".into(), ..ok.clone() };
        assert!(matches!(no_name.validate(), Err(TeamMemberError::Validation(_))));

        let normalized = CreateRequest { username: "U1".into(), email: "A@X.com".into(), ..ok }.normalized();
        assert_eq!(normalized.username, "u1");
        assert_eq!(normalized.email, "a@x.com");
    }

    #[test]
    fn update_request_requires_id() {
        let req = UpdateRequest { id: 0, name: "A".into(), username: "u1".into(), email: "a@x.com".into() };
        assert_eq!(req.validate(), Err(TeamMemberError::Validation("id must be >= 1".into())));
    }

    #[test]
    fn empty_list_request_gets_defaults() {
        let q = ListRequest::default().validate().unwrap();
        assert_eq!((q.page, q.limit, q.offset), (1, 10, 0));
        assert_eq!(q.order_direction, None);
        assert!(!q.skip_defaults);
    }

    #[test]
    fn list_request_normalizes_case() {
        let q = ListRequest {
            search: "Adam".into(),
            order_field: "Created_At".into(),
            order_direction: "desc".into(),
            page: 2,
            limit: 20,
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(q.search, "adam");
        assert_eq!(q.ordering(), Some(("created_at", OrderDirection::Desc)));
        assert_eq!(q.offset, 20);
    }

    #[test]
    fn bogus_direction_fails_regardless_of_other_fields() {
        let bare = ListRequest { order_direction: "bogus".into(), ..Default::default() };
        assert!(matches!(bare.validate(), Err(TeamMemberError::Validation(_))));

        let with_field = ListRequest { order_direction: "bogus".into(), order_field: "email".into(), page: 3, ..Default::default() };
        assert_eq!(with_field.validate(), Err(TeamMemberError::Validation("order_direction is invalid".into())));
    }

    #[test]
    fn direction_without_field_is_rejected() {
        let req = ListRequest { order_direction: "ASC".into(), ..Default::default() };
        assert_eq!(req.validate(), Err(TeamMemberError::Validation("order_field required".into())));
    }

    #[test]
    fn unknown_order_field_is_rejected() {
        let req = ListRequest { order_field: "password; drop table".into(), order_direction: "ASC".into(), ..Default::default() };
        assert_eq!(req.validate(), Err(TeamMemberError::Validation("order_field is invalid".into())));
    }
}

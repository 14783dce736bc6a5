//! Team member records: store gateway, cache gateway, duplicate checker and
//! the service orchestrating them.

pub mod cache;
pub mod domain;
pub mod duplicate;
pub mod errors;
pub mod repo;
pub mod repository;
pub mod service;

pub use cache::{CacheBackend, CacheGateway, MokaCacheBackend};
pub use domain::{CreateRequest, DetailQuery, ListRequest, TeamMember, UpdateRequest};
pub use errors::{TeamMemberError, UniqueField};
pub use repo::SeaOrmTeamMemberRepository;
pub use repository::TeamMemberRepository;
pub use service::{TeamMemberConfig, TeamMemberService};

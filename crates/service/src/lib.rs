//! Service layer for team member records.
//! - Store access sits behind `TeamMemberRepository`; cache access behind `CacheBackend`.
//! - `TeamMemberService` is the only entry point callers use.
//! - Errors surface as `TeamMemberError`; backend details are logged, not returned.

pub mod pagination;
pub mod team_member;
#[cfg(test)]
pub mod test_support;

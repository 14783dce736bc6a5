pub mod errors;
pub mod db;
pub mod team_member;

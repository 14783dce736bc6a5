pub mod seaorm;

pub use seaorm::SeaOrmTeamMemberRepository;

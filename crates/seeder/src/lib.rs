pub mod error;
pub mod seeder;

pub use error::SeederError;
pub use seeder::{SeedResult, Seeder, SeederConfig};

pub mod assets;
pub mod cloudinary;
pub mod media;
pub mod projects;
pub mod renderer;
pub mod screenshots;
pub mod seeding;

pub use assets::*;
pub use cloudinary::*;
pub use media::*;
pub use projects::*;
pub use renderer::*;
pub use screenshots::*;
pub use seeding::*;

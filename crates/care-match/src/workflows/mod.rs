pub mod directory;
pub mod intake;

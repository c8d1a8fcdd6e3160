mod command;
mod player;
#[cfg(test)]
pub mod stub;
mod ytdl;

pub use player::Player;
pub use ytdl::{ClipTransfer, Ytdl};

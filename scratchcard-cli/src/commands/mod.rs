pub mod ledger;
pub mod play;
pub mod prizes;
pub mod share;
pub mod store;
pub mod sync;

pub use ledger::{handle_check, handle_winner_command, WinnerCommands};
pub use play::{handle_play, PlayArgs};
pub use prizes::{handle_prize_command, PrizeCommands};
pub use share::{handle_share_command, ShareCommands};
pub use store::{handle_store_command, StoreCommands};
pub use sync::{handle_sync_command, SyncCommands};

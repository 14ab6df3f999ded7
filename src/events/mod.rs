//! # Events Module
//!
//! Progress events for UI layers.
//!
//! ## Design
//! The core library emits events through channels, allowing the CLI (or any
//! other front-end) to subscribe and display progress without the core
//! knowing about terminals.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Dedup(DedupEvent::StageStarted { stage, candidates }) = event {
//!             println!("{}: {} candidates", stage, candidates);
//!         }
//!     }
//! });
//!
//! let groups = check_duplicates_with_events(&paths, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
